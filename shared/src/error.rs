//! # Error Taxonomy
//!
//! Failure classes for the campfire client. None of these are fatal to the
//! process: a failed store write or AI call is surfaced to the feature that
//! triggered it and the scene keeps running.

use thiserror::Error;

/// Result type used throughout the campfire crates
pub type CampfireResult<T> = Result<T, CampfireError>;

#[derive(Debug, Error)]
pub enum CampfireError {
    /// Realtime-store credentials absent; multiplayer degrades to
    /// local-only. Logged once, never retried.
    #[error("realtime store configuration missing; multiplayer disabled")]
    ConfigurationMissing,

    /// A store read/write or AI call failed in transit. Surfaced to the
    /// initiating feature, no automatic retry.
    #[error("network operation failed: {0}")]
    Network(String),

    /// AI proxy response missing the expected text/audio field
    #[error("malformed AI response: missing {0}")]
    MalformedResponse(&'static str),

    /// A snapshot document failed validation
    #[error("invalid document at {path}: {reason}")]
    InvalidDocument { path: String, reason: String },

    /// An operation that requires room membership ran before `join`
    #[error("not joined to a room")]
    NotJoined,
}
