//! # Room State Document
//!
//! Schema for the single shared state document per room,
//! `rooms/{room}/state/global`. Any client may merge-patch individual
//! fields; every client (the writer included) observes changes through the
//! same snapshot subscription. `lastActive` doubles as the staleness
//! signal: a room untouched for longer than the threshold is reset to
//! defaults by the next joiner.

use serde::{Deserialize, Serialize};

use crate::constants::room::STALE_THRESHOLD_MS;
use crate::types::Color;

/// Which companion animals sit at the fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompanionKind {
    None,
    Deer,
    Fox,
    Cow,
    All,
}

impl CompanionKind {
    /// The next kind in the cycle the companion button walks through
    pub fn next(&self) -> CompanionKind {
        match self {
            CompanionKind::None => CompanionKind::Deer,
            CompanionKind::Deer => CompanionKind::Fox,
            CompanionKind::Fox => CompanionKind::Cow,
            CompanionKind::Cow => CompanionKind::All,
            CompanionKind::All => CompanionKind::None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CompanionKind::None => "none",
            CompanionKind::Deer => "deer",
            CompanionKind::Fox => "fox",
            CompanionKind::Cow => "cow",
            CompanionKind::All => "all",
        }
    }
}

/// Shared weather around the fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Weather {
    Clear,
    Snow,
    Rain,
}

impl Weather {
    pub fn as_str(&self) -> &'static str {
        match self {
            Weather::Clear => "clear",
            Weather::Snow => "snow",
            Weather::Rain => "rain",
        }
    }
}

/// The shared room state document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoomState {
    #[serde(rename = "isHolidayMode")]
    pub holiday_mode: bool,

    #[serde(rename = "companionType")]
    pub companion: CompanionKind,

    #[serde(rename = "fireColor")]
    pub fire_color: Color,

    pub weather: Weather,

    /// Refreshed on every join; ms since epoch
    #[serde(rename = "lastActive")]
    pub last_active: i64,

    /// Opaque token identifying the current story broadcast. Repeat
    /// snapshots carrying the same token must not replay the story.
    #[serde(rename = "storyId", default, skip_serializing_if = "Option::is_none")]
    pub story_id: Option<String>,

    #[serde(rename = "storyText", default, skip_serializing_if = "Option::is_none")]
    pub story_text: Option<String>,
}

impl RoomState {
    /// A fresh room: holiday off, no companion, orange fire, clear sky.
    pub fn defaults_at(now_ms: i64) -> Self {
        Self {
            holiday_mode: false,
            companion: CompanionKind::None,
            fire_color: Color::new(0xff, 0x66, 0x00),
            weather: Weather::Clear,
            last_active: now_ms,
            story_id: None,
            story_text: None,
        }
    }

    /// Whether a joining client must reset this room before using it
    pub fn is_stale(&self, now_ms: i64) -> bool {
        now_ms - self.last_active > STALE_THRESHOLD_MS
    }
}
