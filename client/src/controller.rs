//! # Client Controller
//!
//! One owned object wiring the subsystems together: the session that puts
//! the local player into a room, the subscriptions feeding full-state
//! snapshots in, the reconciler and room-state sync that turn those
//! snapshots into scene mutations, and the writer helpers the UI calls.
//!
//! Without a store the controller runs local-only: the fire still burns,
//! but nothing is shared and every remote-facing call quietly does nothing.

use std::sync::Arc;

use log::{debug, warn};

use campfire_shared::constants::avatar::TINT_PALETTE;
use campfire_shared::error::CampfireResult;
use campfire_shared::player::{AvatarKind, Profile};
use campfire_shared::room::{RoomState, Weather};
use campfire_shared::types::Color;
use rand::seq::SliceRandom;

use crate::ai::FlameDirectives;
use crate::chat::{self, ChatHistory};
use crate::config::ClientConfig;
use crate::reconcile::{snapshot_from_documents, EntityReconciler};
use crate::room_state::{self, RoomEffects, RoomStateSync};
use crate::scene::SceneHooks;
use crate::session::{anonymous_uid, SessionLifecycle};
use crate::store::{paths, RealtimeStore, Snapshot, Subscription};

/// Top-level client state for one player in one room
pub struct CampfireClient {
    config: ClientConfig,
    store: Option<Arc<dyn RealtimeStore>>,
    session: SessionLifecycle,
    profile: Profile,
    reconciler: EntityReconciler,
    room_sync: RoomStateSync,
    history: ChatHistory,
    players_sub: Option<Subscription>,
    state_sub: Option<Subscription>,
    messages_sub: Option<Subscription>,
}

impl CampfireClient {
    /// Build a client. `None` for the store selects local-only mode, the
    /// degraded path used when the backing service is not configured.
    pub fn new(config: ClientConfig, store: Option<Arc<dyn RealtimeStore>>) -> Self {
        if store.is_none() {
            warn!("no realtime store configured; running local-only");
        }
        let room_id = config.room_id();
        let profile = Profile {
            name: config.display_name.clone(),
            kind: AvatarKind::Human,
            color: Color::from_hex(TINT_PALETTE[0]).unwrap_or(Color::new(0x1d, 0x4e, 0xd8)),
        };
        Self {
            config,
            store,
            session: SessionLifecycle::new(room_id, anonymous_uid()),
            profile,
            reconciler: EntityReconciler::new(),
            room_sync: RoomStateSync::new(),
            history: ChatHistory::default(),
            players_sub: None,
            state_sub: None,
            messages_sub: None,
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn room_id(&self) -> &str {
        self.session.room_id()
    }

    pub fn uid(&self) -> &str {
        self.session.uid()
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    pub fn history(&self) -> &ChatHistory {
        &self.history
    }

    pub fn is_online(&self) -> bool {
        self.store.is_some()
    }

    /// Join the room with the given profile and open the three snapshot
    /// subscriptions. Local-only mode joins nothing and subscribes to
    /// nothing.
    pub fn join(&mut self, profile: Profile) -> CampfireResult<()> {
        self.profile = profile;
        let Some(store) = self.store.clone() else {
            debug!("local-only join; nothing shared");
            return Ok(());
        };
        self.session.join(store.as_ref(), &self.profile)?;

        let room = self.session.room_id().to_string();
        self.players_sub = Some(store.subscribe_collection(&paths::players(&room)));
        self.state_sub = Some(store.subscribe_document(&paths::state(&room)));
        self.messages_sub = Some(store.subscribe_collection(&paths::messages(&room)));
        Ok(())
    }

    /// Drain pending snapshots and reconcile them into the scene and
    /// effects. Call once per frame; cheap when nothing changed.
    pub fn pump(&mut self, scene: &mut dyn SceneHooks, fx: &mut dyn RoomEffects) {
        if let Some(sub) = self.players_sub.as_mut() {
            if let Some(Snapshot::Collection(docs)) = sub.latest() {
                let snapshot = snapshot_from_documents(&docs);
                self.reconciler.reconcile(&snapshot, scene);
            }
        }
        if let Some(sub) = self.state_sub.as_mut() {
            if let Some(Snapshot::Document(doc)) = sub.latest() {
                match doc.map(serde_json::from_value::<RoomState>) {
                    Some(Ok(state)) => self.room_sync.apply(&state, fx),
                    Some(Err(e)) => warn!("unreadable room state snapshot: {e}"),
                    None => {}
                }
            }
        }
        if let Some(sub) = self.messages_sub.as_mut() {
            if let Some(Snapshot::Collection(docs)) = sub.latest() {
                self.history = ChatHistory::from_snapshot(&docs);
            }
        }
    }

    /// Send a chat message as the local player
    pub fn send_chat(&self, text: &str) -> CampfireResult<Option<String>> {
        let Some(store) = &self.store else { return Ok(None) };
        chat::send(
            store.as_ref(),
            self.session.room_id(),
            self.session.uid(),
            self.profile.kind,
            text,
        )
    }

    /// Push the current profile's chosen fields to the player document
    pub fn update_profile(&mut self, profile: Profile) -> CampfireResult<()> {
        self.profile = profile;
        let Some(store) = &self.store else { return Ok(()) };
        self.session.update_profile(store.as_ref(), &self.profile)
    }

    /// Reroll the avatar: a random kind and a random palette tint
    pub fn randomize_avatar(&mut self) -> CampfireResult<Profile> {
        let mut rng = rand::thread_rng();
        let kind = *AvatarKind::ALL.choose(&mut rng).unwrap_or(&AvatarKind::Human);
        let tint = TINT_PALETTE.choose(&mut rng).copied().unwrap_or(TINT_PALETTE[0]);
        let profile = Profile {
            name: self.profile.name.clone(),
            kind,
            color: Color::from_hex(tint).unwrap_or(self.profile.color),
        };
        self.update_profile(profile.clone())?;
        Ok(profile)
    }

    /// Flip the shared holiday flag from its last-applied value
    pub fn toggle_holiday(&self) -> CampfireResult<()> {
        let Some(store) = &self.store else { return Ok(()) };
        room_state::set_holiday(store.as_ref(), self.session.room_id(), !self.room_sync.holiday())
    }

    /// Advance the shared companion to the next kind in the cycle
    pub fn cycle_companion(&self) -> CampfireResult<()> {
        let Some(store) = &self.store else { return Ok(()) };
        room_state::cycle_companion(
            store.as_ref(),
            self.session.room_id(),
            self.room_sync.companion(),
        )?;
        Ok(())
    }

    pub fn set_weather(&self, weather: Weather) -> CampfireResult<()> {
        let Some(store) = &self.store else { return Ok(()) };
        room_state::set_weather(store.as_ref(), self.session.room_id(), weather)
    }

    pub fn set_fire_color(&self, color: Color) -> CampfireResult<()> {
        let Some(store) = &self.store else { return Ok(()) };
        room_state::set_fire_color(store.as_ref(), self.session.room_id(), color)
    }

    /// Broadcast a story to the room; returns the playback token
    pub fn broadcast_story(&self, text: &str) -> CampfireResult<Option<String>> {
        let Some(store) = &self.store else { return Ok(None) };
        room_state::broadcast_story(store.as_ref(), self.session.room_id(), text).map(Some)
    }

    /// Forward the shared part of a fire reply's directives to the room.
    /// Intensity stays local to the caller.
    pub fn apply_directives(&self, directives: &FlameDirectives) -> CampfireResult<()> {
        let Some(store) = &self.store else { return Ok(()) };
        if let Some(patch) = directives.to_patch() {
            store.set(&paths::state(self.session.room_id()), patch, true)?;
        }
        Ok(())
    }

    /// Leave the room: close subscriptions, then best-effort delete the
    /// player document.
    pub fn leave(&mut self) {
        self.players_sub = None;
        self.state_sub = None;
        self.messages_sub = None;
        if let Some(store) = &self.store {
            self.session.leave(store.as_ref());
        }
    }
}

impl Drop for CampfireClient {
    fn drop(&mut self) {
        self.leave();
    }
}
