//! # Client Configuration
//!
//! Where the client connects and who it claims to be. Built once at
//! startup from whatever the host embedding passes in; no globals.

use rand::Rng;

use campfire_shared::constants::room::{DEFAULT_ROOM, ROOM_TOKEN_LEN};
use campfire_shared::constants::APP_ID;

/// Configuration for one client connection
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Application namespace, part of every document path's provenance
    pub app_id: String,

    /// Room to join; `None` selects the default room
    pub room: Option<String>,

    /// Display name for the local player
    pub display_name: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            app_id: APP_ID.to_string(),
            room: None,
            display_name: "Traveler".to_string(),
        }
    }
}

impl ClientConfig {
    /// The room this configuration resolves to
    pub fn room_id(&self) -> String {
        match &self.room {
            Some(room) => room_from_fragment(Some(room)),
            None => room_from_fragment(None),
        }
    }
}

/// Resolve a room id from a URL-fragment-style hint: a non-empty fragment
/// is the room id verbatim (sans leading `#`), an empty or absent one maps
/// to the default room.
pub fn room_from_fragment(fragment: Option<&str>) -> String {
    match fragment {
        Some(raw) => {
            let trimmed = raw.trim_start_matches('#').trim();
            if trimmed.is_empty() {
                DEFAULT_ROOM.to_string()
            } else {
                trimmed.to_string()
            }
        }
        None => DEFAULT_ROOM.to_string(),
    }
}

/// Mint a fresh shareable room id: `room-` plus a random base36 token
pub fn generate_room_id() -> String {
    const CHARSET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    let token: String = (0..ROOM_TOKEN_LEN)
        .map(|_| CHARSET[rng.gen_range(0..CHARSET.len())] as char)
        .collect();
    format!("room-{token}")
}
