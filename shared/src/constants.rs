//! # Shared Constants
//!
//! Constants used across the campfire client modules.

/// Application namespace written into document paths and logs
pub const APP_ID: &str = "cozy-nights-v7";

/// Room and session constants
pub mod room {
    /// A room untouched for longer than this is reset on the next join (ms)
    pub const STALE_THRESHOLD_MS: i64 = 3_600_000;

    /// Room used when no fragment names one
    pub const DEFAULT_ROOM: &str = "lobby";

    /// Length of the random token in generated room ids (`room-xxxxxx`)
    pub const ROOM_TOKEN_LEN: usize = 6;
}

/// Scene placement constants
pub mod scene {
    /// Radius of the ring players stand on around the fire
    pub const AVATAR_RING_RADIUS: f32 = 4.5;

    /// Radius companions sit at, inside the player ring
    pub const COMPANION_RING_RADIUS: f32 = 3.5;

    /// Every companion animal shares this wooden-brown tint
    pub const COMPANION_TINT: &str = "#8d6e63";
}

/// Avatar constants
pub mod avatar {
    /// Tints the avatar roll picks from
    pub const TINT_PALETTE: [&str; 6] = [
        "#1d4ed8", "#15803d", "#b91c1c", "#a21caf", "#c2410c", "#4338ca",
    ];
}

/// Chat constants
pub mod chat {
    /// Number of most-recent messages kept in the history view
    pub const HISTORY_LIMIT: usize = 20;
}

/// Story playback constants
pub mod story {
    /// Pause between narrated sentences (ms)
    pub const LINE_DELAY_MS: u64 = 1_500;
}
