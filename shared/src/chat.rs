//! # Chat Messages
//!
//! Schema for the append-only `rooms/{room}/messages` collection. Messages
//! are never edited or deleted; display order is derived from the
//! server-assigned timestamp.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::player::AvatarKind;

/// One chat message document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Author identity
    pub uid: String,

    pub text: String,

    /// Avatar the author wore when sending, for the chat icon
    #[serde(rename = "avatarType")]
    pub avatar: AvatarKind,

    /// Server-assigned send time (ms since epoch)
    #[serde(default)]
    pub timestamp: i64,
}

impl ChatMessage {
    /// Validate a raw snapshot document; `None` if malformed.
    pub fn from_document(value: &Value) -> Option<ChatMessage> {
        serde_json::from_value(value.clone()).ok()
    }
}
