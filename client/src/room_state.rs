//! # Shared Room State Sync
//!
//! One-way broadcast over the single `rooms/{room}/state/global` document:
//! any client merge-patches a field, every client (the writer included)
//! observes it through the same snapshot subscription and applies it via a
//! small per-field applier. Each applier is echo-suppressed — an incoming
//! value equal to the already-applied one triggers nothing — so echoed
//! snapshots never cause redundant rebuilds or feedback loops.

use log::debug;
use serde_json::json;

use campfire_shared::constants::scene::{COMPANION_RING_RADIUS, COMPANION_TINT};
use campfire_shared::error::CampfireResult;
use campfire_shared::room::{CompanionKind, RoomState, Weather};
use campfire_shared::types::{Color, Transform, Vector3};

use crate::scene::{CompanionSpecies, MeshKind, SceneHandle, SceneHooks};
use crate::store::{paths, RealtimeStore};

/// Per-field appliers the sync dispatches into. Implemented by whatever
/// owns the actual visuals (decoration toggles, particles, fire light).
pub trait RoomEffects {
    /// Toggle holiday decorations
    fn set_holiday(&mut self, on: bool);

    /// Rebuild the companion animals at the fire
    fn set_companions(&mut self, kind: CompanionKind);

    /// Retarget the fire-color lerp
    fn set_fire_target(&mut self, color: Color);

    /// Swap weather particle visibility
    fn set_weather(&mut self, weather: Weather);

    /// Begin playback of a newly broadcast story
    fn play_story(&mut self, story_id: &str, text: &str);
}

/// Tracks the last-applied value of every shared field and forwards only
/// real changes to the effects.
#[derive(Debug)]
pub struct RoomStateSync {
    holiday: bool,
    companion: CompanionKind,
    fire_color: Color,
    weather: Weather,
    last_story_id: Option<String>,
}

impl Default for RoomStateSync {
    fn default() -> Self {
        // Matches the scene a client builds before its first snapshot.
        let fresh = RoomState::defaults_at(0);
        Self {
            holiday: fresh.holiday_mode,
            companion: fresh.companion,
            fire_color: fresh.fire_color,
            weather: fresh.weather,
            last_story_id: None,
        }
    }
}

impl RoomStateSync {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn holiday(&self) -> bool {
        self.holiday
    }

    pub fn companion(&self) -> CompanionKind {
        self.companion
    }

    pub fn fire_color(&self) -> Color {
        self.fire_color
    }

    pub fn weather(&self) -> Weather {
        self.weather
    }

    /// Apply one room-state snapshot, dispatching changed fields only.
    pub fn apply(&mut self, state: &RoomState, fx: &mut dyn RoomEffects) {
        if state.holiday_mode != self.holiday {
            self.holiday = state.holiday_mode;
            fx.set_holiday(state.holiday_mode);
        }
        if state.companion != self.companion {
            self.companion = state.companion;
            fx.set_companions(state.companion);
        }
        if state.fire_color != self.fire_color {
            self.fire_color = state.fire_color;
            fx.set_fire_target(state.fire_color);
        }
        if state.weather != self.weather {
            self.weather = state.weather;
            fx.set_weather(state.weather);
        }
        // A story replays only when its token changes; repeat snapshots of
        // the same broadcast are ignored.
        if let (Some(story_id), Some(text)) = (&state.story_id, &state.story_text) {
            if self.last_story_id.as_deref() != Some(story_id.as_str()) {
                self.last_story_id = Some(story_id.clone());
                fx.play_story(story_id, text);
            }
        }
    }
}

// --- Writer side: single-field merge patches ---

pub fn set_holiday(store: &dyn RealtimeStore, room: &str, on: bool) -> CampfireResult<()> {
    debug!("broadcast holiday={on} to {room}");
    store.set(&paths::state(room), json!({ "isHolidayMode": on }), true)
}

/// Advance the shared companion to the next kind in the cycle
pub fn cycle_companion(
    store: &dyn RealtimeStore,
    room: &str,
    current: CompanionKind,
) -> CampfireResult<CompanionKind> {
    let next = current.next();
    store.set(&paths::state(room), json!({ "companionType": next }), true)?;
    Ok(next)
}

pub fn set_fire_color(store: &dyn RealtimeStore, room: &str, color: Color) -> CampfireResult<()> {
    store.set(&paths::state(room), json!({ "fireColor": color }), true)
}

pub fn set_weather(store: &dyn RealtimeStore, room: &str, weather: Weather) -> CampfireResult<()> {
    store.set(&paths::state(room), json!({ "weather": weather }), true)
}

/// Broadcast a story to the room. The id is the store's timestamp so every
/// broadcast gets a fresh token even for identical text.
pub fn broadcast_story(store: &dyn RealtimeStore, room: &str, text: &str) -> CampfireResult<String> {
    let story_id = store.now_ms().to_string();
    store.set(
        &paths::state(room),
        json!({ "storyText": text, "storyId": story_id }),
        true,
    )?;
    Ok(story_id)
}

// --- Companion placement ---

/// Owns the companion meshes and rebuilds them when the shared kind
/// changes. Rebuild is wholesale: clear everything, then create the new
/// set, exactly as a changed `companionType` requires.
#[derive(Debug, Default)]
pub struct CompanionRig {
    handles: Vec<SceneHandle>,
}

impl CompanionRig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.handles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }

    /// Tear down the current set and build the one `kind` asks for.
    /// With all three out, the deer sits to the right of the fire, the
    /// fox to the left, and the cow behind; a lone companion takes the
    /// right-hand spot.
    pub fn rebuild(&mut self, kind: CompanionKind, scene: &mut dyn SceneHooks) {
        for handle in self.handles.drain(..) {
            scene.remove(handle);
        }

        let right = Vector3::new(COMPANION_RING_RADIUS, 0.0, 0.0);
        let left = Vector3::new(-COMPANION_RING_RADIUS, 0.0, 0.0);
        let behind = Vector3::new(0.0, 0.0, -COMPANION_RING_RADIUS);

        let placements: Vec<(CompanionSpecies, Vector3)> = match kind {
            CompanionKind::None => vec![],
            CompanionKind::Deer => vec![(CompanionSpecies::Deer, right)],
            CompanionKind::Fox => vec![(CompanionSpecies::Fox, right)],
            CompanionKind::Cow => vec![(CompanionSpecies::Cow, right)],
            CompanionKind::All => vec![
                (CompanionSpecies::Deer, right),
                (CompanionSpecies::Fox, left),
                (CompanionSpecies::Cow, behind),
            ],
        };

        let tint = Color::from_hex(COMPANION_TINT).unwrap_or(Color::new(0x8d, 0x6e, 0x63));
        for (species, position) in placements {
            // Face the fire at the origin.
            let yaw = position.x.atan2(position.z) + std::f32::consts::PI;
            let handle = scene.create(
                MeshKind::Companion(species),
                tint,
                Transform::new(position, yaw),
            );
            self.handles.push(handle);
        }
        debug!("companion rig rebuilt for {}", kind.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::RecordingScene;
    use crate::store::MemoryStore;

    #[derive(Default)]
    struct CountingEffects {
        holiday: Vec<bool>,
        companions: Vec<CompanionKind>,
        fire: Vec<Color>,
        weather: Vec<Weather>,
        stories: Vec<(String, String)>,
    }

    impl RoomEffects for CountingEffects {
        fn set_holiday(&mut self, on: bool) {
            self.holiday.push(on);
        }
        fn set_companions(&mut self, kind: CompanionKind) {
            self.companions.push(kind);
        }
        fn set_fire_target(&mut self, color: Color) {
            self.fire.push(color);
        }
        fn set_weather(&mut self, weather: Weather) {
            self.weather.push(weather);
        }
        fn play_story(&mut self, story_id: &str, text: &str) {
            self.stories.push((story_id.to_string(), text.to_string()));
        }
    }

    #[test]
    fn equal_snapshot_triggers_no_appliers() {
        let mut sync = RoomStateSync::new();
        let mut fx = CountingEffects::default();

        // Snapshot equal to the freshly built scene
        sync.apply(&RoomState::defaults_at(123), &mut fx);
        assert!(fx.holiday.is_empty());
        assert!(fx.companions.is_empty());
        assert!(fx.fire.is_empty());
        assert!(fx.weather.is_empty());
    }

    #[test]
    fn changed_fields_dispatch_exactly_once() {
        let mut sync = RoomStateSync::new();
        let mut fx = CountingEffects::default();

        let mut state = RoomState::defaults_at(0);
        state.holiday_mode = true;
        state.fire_color = Color::from_hex("#0000ff").unwrap();

        sync.apply(&state, &mut fx);
        assert_eq!(fx.holiday, vec![true]);
        assert_eq!(fx.fire, vec![Color::from_hex("#0000ff").unwrap()]);

        // Echoed snapshot: nothing fires again
        sync.apply(&state, &mut fx);
        assert_eq!(fx.holiday.len(), 1);
        assert_eq!(fx.fire.len(), 1);
    }

    #[test]
    fn same_story_id_never_replays() {
        let mut sync = RoomStateSync::new();
        let mut fx = CountingEffects::default();

        let mut state = RoomState::defaults_at(0);
        state.story_id = Some("42".to_string());
        state.story_text = Some("Once upon a fire.".to_string());

        sync.apply(&state, &mut fx);
        sync.apply(&state, &mut fx);
        assert_eq!(fx.stories.len(), 1);

        // New token, same text: plays again
        state.story_id = Some("43".to_string());
        sync.apply(&state, &mut fx);
        assert_eq!(fx.stories.len(), 2);
    }

    #[test]
    fn cycle_companion_patches_only_that_field() {
        let store = MemoryStore::new();
        store
            .set(
                &paths::state("lobby"),
                serde_json::to_value(RoomState::defaults_at(5)).unwrap(),
                false,
            )
            .unwrap();

        let next = cycle_companion(&store, "lobby", CompanionKind::None).unwrap();
        assert_eq!(next, CompanionKind::Deer);

        let doc = store.get(&paths::state("lobby")).unwrap().unwrap();
        assert_eq!(doc["companionType"], "deer");
        assert_eq!(doc["lastActive"], 5, "other fields untouched");
    }

    #[test]
    fn companion_rig_rebuilds_wholesale() {
        let mut rig = CompanionRig::new();
        let mut scene = RecordingScene::new();

        rig.rebuild(CompanionKind::Deer, &mut scene);
        assert_eq!(rig.len(), 1);
        assert_eq!(scene.len(), 1);

        rig.rebuild(CompanionKind::All, &mut scene);
        assert_eq!(rig.len(), 3);
        assert_eq!(scene.len(), 3);

        rig.rebuild(CompanionKind::None, &mut scene);
        assert!(rig.is_empty());
        assert!(scene.is_empty());
    }
}
