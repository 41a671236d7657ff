//! # Session Lifecycle
//!
//! Governs a client's membership in a room: the stale-check-and-reset of
//! the shared room state at join time, the upsert of the local player
//! document, profile updates, and the best-effort departure delete.
//!
//! Departure is advisory only: the delete races process teardown and may
//! never land, so remote clients cannot treat a lingering document as
//! proof of presence. A heartbeat-expiry sweep would close that gap; the
//! current store schema does not implement one.

use std::sync::Arc;

use log::{debug, info, warn};
use rand::Rng;
use serde_json::json;

use campfire_shared::error::{CampfireError, CampfireResult};
use campfire_shared::player::{PlayerDoc, Profile};
use campfire_shared::room::RoomState;

use crate::store::{paths, RealtimeStore};

/// A client's view of its own room membership. Only the departing client
/// ever observes `Unjoined` again; remotely, departure is just absence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    Unjoined,
    /// Stale check and player upsert in flight
    Joining,
    Joined,
}

/// Join/leave state for one local player in one room
#[derive(Debug)]
pub struct SessionLifecycle {
    room_id: String,
    uid: String,
    membership: Membership,
}

impl SessionLifecycle {
    pub fn new(room_id: impl Into<String>, uid: impl Into<String>) -> Self {
        Self {
            room_id: room_id.into(),
            uid: uid.into(),
            membership: Membership::Unjoined,
        }
    }

    pub fn room_id(&self) -> &str {
        &self.room_id
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    pub fn membership(&self) -> Membership {
        self.membership
    }

    /// Join the room: reset the shared state if stale, otherwise refresh
    /// its heartbeat, then upsert the local player document with a random
    /// placement angle. Returns the assigned angle.
    pub fn join(&mut self, store: &dyn RealtimeStore, profile: &Profile) -> CampfireResult<f32> {
        self.membership = Membership::Joining;
        let now = store.now_ms();
        let state_path = paths::state(&self.room_id);

        match store.get(&state_path)? {
            None => {
                info!("initializing new room {}", self.room_id);
                self.write_defaults(store, &state_path, now)?;
            }
            Some(doc) => match serde_json::from_value::<RoomState>(doc) {
                Ok(state) if state.is_stale(now) => {
                    info!("room {} is stale, resetting", self.room_id);
                    self.write_defaults(store, &state_path, now)?;
                }
                Ok(_) => {
                    // Heartbeat only; every other shared field is preserved.
                    store.set(&state_path, json!({ "lastActive": now }), true)?;
                }
                Err(e) => {
                    warn!("room {} state unreadable ({e}), resetting", self.room_id);
                    self.write_defaults(store, &state_path, now)?;
                }
            },
        }

        let angle = rand::thread_rng().gen_range(0.0..std::f32::consts::TAU);
        let player = PlayerDoc {
            uid: self.uid.clone(),
            name: profile.name.clone(),
            kind: profile.kind,
            color: profile.color,
            angle,
            last_seen: now,
        };
        let fields = serde_json::to_value(&player).map_err(|e| CampfireError::InvalidDocument {
            path: paths::player(&self.room_id, &self.uid),
            reason: e.to_string(),
        })?;
        store.set(&paths::player(&self.room_id, &self.uid), fields, false)?;

        self.membership = Membership::Joined;
        info!("joined room {} as {}", self.room_id, self.uid);
        Ok(angle)
    }

    fn write_defaults(
        &self,
        store: &dyn RealtimeStore,
        state_path: &str,
        now: i64,
    ) -> CampfireResult<()> {
        let defaults = RoomState::defaults_at(now);
        let fields = serde_json::to_value(&defaults).map_err(|e| CampfireError::InvalidDocument {
            path: state_path.to_string(),
            reason: e.to_string(),
        })?;
        // Destructive replace: companion, weather, and any story broadcast
        // are all cleared along with the flags.
        store.set(state_path, fields, false)
    }

    /// Merge-patch the local player's chosen fields. Never touches the
    /// server-assigned `angle` or `lastSeen`.
    pub fn update_profile(
        &self,
        store: &dyn RealtimeStore,
        profile: &Profile,
    ) -> CampfireResult<()> {
        if self.membership != Membership::Joined {
            return Err(CampfireError::NotJoined);
        }
        store.set(
            &paths::player(&self.room_id, &self.uid),
            json!({
                "name": profile.name,
                "type": profile.kind,
                "color": profile.color,
            }),
            true,
        )
    }

    /// Best-effort departure: delete the player document. Failure is
    /// logged, never propagated — remote clients will observe the absence
    /// on their next snapshot either way (or not at all, see module docs).
    pub fn leave(&mut self, store: &dyn RealtimeStore) {
        if self.membership == Membership::Unjoined {
            return;
        }
        let path = paths::player(&self.room_id, &self.uid);
        if let Err(e) = store.delete(&path) {
            warn!("departure delete for {path} failed: {e}");
        } else {
            debug!("deleted player document {path}");
        }
        self.membership = Membership::Unjoined;
    }
}

/// Deletes the player document when dropped, so teardown paths that never
/// call `leave` still announce the departure. Best-effort by construction.
pub struct DepartureGuard {
    store: Arc<dyn RealtimeStore>,
    path: String,
}

impl DepartureGuard {
    pub fn new(store: Arc<dyn RealtimeStore>, room_id: &str, uid: &str) -> Self {
        Self { store, path: paths::player(room_id, uid) }
    }
}

impl Drop for DepartureGuard {
    fn drop(&mut self) {
        if let Err(e) = self.store.delete(&self.path) {
            warn!("departure delete for {} failed: {e}", self.path);
        }
    }
}

/// Generate a transient anonymous identity for this connection
pub fn anonymous_uid() -> String {
    let mut rng = rand::thread_rng();
    (0..20).map(|_| rng.sample(rand::distributions::Alphanumeric) as char).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Clock, ManualClock, MemoryStore, RealtimeStore};
    use campfire_shared::constants::room::STALE_THRESHOLD_MS;
    use campfire_shared::player::AvatarKind;
    use campfire_shared::room::{CompanionKind, Weather};
    use campfire_shared::types::Color;
    use std::sync::Arc;

    fn profile(name: &str) -> Profile {
        Profile {
            name: name.to_string(),
            kind: AvatarKind::Human,
            color: Color::from_hex("#1d4ed8").unwrap(),
        }
    }

    fn room_state(store: &MemoryStore) -> RoomState {
        let doc = store.get(&paths::state("lobby")).unwrap().unwrap();
        serde_json::from_value(doc).unwrap()
    }

    #[test]
    fn first_join_creates_room_defaults_and_player_doc() {
        let clock = Arc::new(ManualClock::at(1_000));
        let store = MemoryStore::with_clock(clock);
        let mut session = SessionLifecycle::new("lobby", "u1");

        assert_eq!(session.membership(), Membership::Unjoined);
        let angle = session.join(&store, &profile("Ash")).unwrap();
        assert_eq!(session.membership(), Membership::Joined);
        assert!((0.0..std::f32::consts::TAU).contains(&angle));

        let state = room_state(&store);
        assert!(!state.holiday_mode);
        assert_eq!(state.last_active, 1_000);

        let player = store.get(&paths::player("lobby", "u1")).unwrap().unwrap();
        assert_eq!(player["name"], "Ash");
        assert_eq!(player["lastSeen"], 1_000);
    }

    #[test]
    fn stale_room_is_reset_to_defaults() {
        let clock = Arc::new(ManualClock::at(0));
        let store = MemoryStore::with_clock(Arc::clone(&clock) as Arc<dyn Clock>);

        let mut first = SessionLifecycle::new("lobby", "u1");
        first.join(&store, &profile("Ash")).unwrap();
        store
            .set(
                &paths::state("lobby"),
                serde_json::json!({
                    "isHolidayMode": true,
                    "companionType": "deer",
                    "weather": "snow",
                }),
                true,
            )
            .unwrap();

        // Two hours later, well past the one hour threshold
        clock.advance(2 * STALE_THRESHOLD_MS);
        let mut second = SessionLifecycle::new("lobby", "u2");
        second.join(&store, &profile("Brook")).unwrap();

        let state = room_state(&store);
        assert!(!state.holiday_mode);
        assert_eq!(state.companion, CompanionKind::None);
        assert_eq!(state.weather, Weather::Clear);
        assert_eq!(state.last_active, clock.now_ms());
    }

    #[test]
    fn fresh_room_join_is_heartbeat_only() {
        let clock = Arc::new(ManualClock::at(0));
        let store = MemoryStore::with_clock(Arc::clone(&clock) as Arc<dyn Clock>);

        let mut first = SessionLifecycle::new("lobby", "u1");
        first.join(&store, &profile("Ash")).unwrap();
        store
            .set(&paths::state("lobby"), serde_json::json!({"isHolidayMode": true}), true)
            .unwrap();

        // Ten minutes later: inside the staleness window
        clock.advance(600_000);
        let mut second = SessionLifecycle::new("lobby", "u2");
        second.join(&store, &profile("Brook")).unwrap();

        let state = room_state(&store);
        assert!(state.holiday_mode, "non-heartbeat fields must be preserved");
        assert_eq!(state.last_active, 600_000);
    }

    #[test]
    fn update_profile_preserves_server_assigned_fields() {
        let store = MemoryStore::new();
        let mut session = SessionLifecycle::new("lobby", "u1");
        session.join(&store, &profile("Ash")).unwrap();

        let before = store.get(&paths::player("lobby", "u1")).unwrap().unwrap();
        let assigned_angle = before["angle"].clone();

        session
            .update_profile(
                &store,
                &Profile {
                    name: "Ashlyn".to_string(),
                    kind: AvatarKind::Skeleton,
                    color: Color::from_hex("#b91c1c").unwrap(),
                },
            )
            .unwrap();

        let after = store.get(&paths::player("lobby", "u1")).unwrap().unwrap();
        assert_eq!(after["name"], "Ashlyn");
        assert_eq!(after["type"], "skeleton");
        assert_eq!(after["angle"], assigned_angle);
    }

    #[test]
    fn update_profile_requires_membership() {
        let store = MemoryStore::new();
        let session = SessionLifecycle::new("lobby", "u1");
        assert!(matches!(
            session.update_profile(&store, &profile("Ash")),
            Err(CampfireError::NotJoined)
        ));
    }

    #[test]
    fn leave_deletes_the_player_document() {
        let store = MemoryStore::new();
        let mut session = SessionLifecycle::new("lobby", "u1");
        session.join(&store, &profile("Ash")).unwrap();
        assert_eq!(store.collection_len(&paths::players("lobby")), 1);

        session.leave(&store);
        assert_eq!(session.membership(), Membership::Unjoined);
        assert_eq!(store.collection_len(&paths::players("lobby")), 0);
    }

    #[test]
    fn departure_guard_deletes_on_drop() {
        let store: Arc<MemoryStore> = Arc::new(MemoryStore::new());
        let mut session = SessionLifecycle::new("lobby", "u1");
        session.join(store.as_ref(), &profile("Ash")).unwrap();

        {
            let _guard = DepartureGuard::new(store.clone(), "lobby", "u1");
        }
        assert_eq!(store.collection_len(&paths::players("lobby")), 0);
    }

    #[test]
    fn anonymous_uids_are_distinct() {
        let a = anonymous_uid();
        let b = anonymous_uid();
        assert_eq!(a.len(), 20);
        assert_ne!(a, b);
    }
}
