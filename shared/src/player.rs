//! # Player Documents
//!
//! Schema for the per-player document each client upserts into
//! `rooms/{room}/players/{uid}`. Remote snapshots of this collection are
//! the reconciler's only input, so deserialization is strict: a document
//! missing its identity, avatar, or placement angle is ignored rather than
//! propagated into the scene.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::Color;

/// The avatar shapes a player can wear
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AvatarKind {
    Human,
    Mage,
    Dog,
    Skeleton,
}

impl AvatarKind {
    /// Every selectable kind, in the order the avatar roll cycles them
    pub const ALL: [AvatarKind; 4] = [
        AvatarKind::Human,
        AvatarKind::Mage,
        AvatarKind::Dog,
        AvatarKind::Skeleton,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AvatarKind::Human => "human",
            AvatarKind::Mage => "mage",
            AvatarKind::Dog => "dog",
            AvatarKind::Skeleton => "skeleton",
        }
    }
}

/// The locally chosen parts of a player document: what the client controls,
/// as opposed to what the server assigns (angle, lastSeen).
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub kind: AvatarKind,
    pub color: Color,
}

/// A player document as stored in `rooms/{room}/players/{uid}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerDoc {
    /// Stable identity, unique per connection
    pub uid: String,

    /// Display name; purely metadata, never rebuilds geometry
    #[serde(default = "default_name")]
    pub name: String,

    /// Avatar shape
    #[serde(rename = "type")]
    pub kind: AvatarKind,

    /// Avatar tint
    pub color: Color,

    /// Placement angle on the fire ring, radians, assigned once at join
    pub angle: f32,

    /// Server-assigned timestamp of the last write (ms since epoch)
    #[serde(rename = "lastSeen", default)]
    pub last_seen: i64,
}

fn default_name() -> String {
    "Traveler".to_string()
}

impl PlayerDoc {
    /// Validate a raw snapshot document. Returns `None` for documents
    /// missing required fields or carrying unparseable values.
    pub fn from_document(value: &Value) -> Option<PlayerDoc> {
        serde_json::from_value(value.clone()).ok()
    }
}
