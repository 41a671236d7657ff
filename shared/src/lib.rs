//! # SharedModule
//!
//! Shared types and utilities used by the campfire client crate. This module
//! contains the document schemas stored in the realtime database (players,
//! room state, chat messages), common value types, and the error taxonomy,
//! to ensure consistency between what clients write and what they expect to
//! read back in snapshots.

// Export module structure
pub mod types;
pub mod player;
pub mod room;
pub mod chat;
pub mod constants;
pub mod error;

// Re-export commonly used items for convenience
pub use types::{Color, Vector3, Transform};
pub use player::{AvatarKind, PlayerDoc, Profile};
pub use room::{CompanionKind, Weather, RoomState};
pub use chat::ChatMessage;
pub use error::{CampfireError, CampfireResult};
