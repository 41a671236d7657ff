//! # Campfire Client Module
//!
//! This crate provides the client-side synchronization core for the shared
//! virtual campfire: it maps full-state snapshots delivered by a realtime
//! document store onto a locally owned scene graph, and manages the session
//! that puts a player into (and out of) a room.
//!
//! The system is organized into several sub-modules:
//! - `store`: Realtime document store surface and subscriptions
//! - `scene`: Scene mutation hooks the reconciler calls into
//! - `reconcile`: Snapshot reconciliation against local instances
//! - `session`: Join/leave lifecycle and stale-room reset
//! - `room_state`: Shared room state broadcast and per-field appliers
//! - `chat`: Append-only room chat
//! - `ai`: AI proxy response parsing and fire command tags
//! - `story`: Cancellable story narration playback
//! - `controller`: One owned object wiring the above together

// Module declarations
pub mod store;       // Realtime store surface
pub mod scene;       // Scene mutation hooks
pub mod reconcile;   // Snapshot reconciliation
pub mod session;     // Room membership lifecycle
pub mod room_state;  // Shared room state sync
pub mod chat;        // Room chat
pub mod ai;          // AI proxy parsing
pub mod story;       // Story playback
pub mod config;      // Client configuration
pub mod controller;  // Top-level wiring

// Re-export commonly used items
pub use config::ClientConfig;
pub use controller::CampfireClient;
pub use reconcile::EntityReconciler;
pub use room_state::{CompanionRig, RoomEffects, RoomStateSync};
pub use scene::{CompanionSpecies, MeshKind, SceneHandle, SceneHooks};
pub use session::{Membership, SessionLifecycle};
pub use store::{MemoryStore, RealtimeStore, Snapshot, Subscription};
pub use story::{Narrator, StoryPlayer};
