//! # Realtime Store Surface
//!
//! The subset of a realtime document database the campfire client consumes:
//! point reads and writes plus snapshot subscriptions. The store never
//! delivers deltas — every notification is a full current-state dump of the
//! subscribed document or collection, and the reconciler is responsible for
//! diffing it against local state.
//!
//! Subscriptions are explicit, cancellable handles rather than ambient
//! callbacks, so teardown does not depend on process-exit races.

pub mod memory;

use std::sync::mpsc::{Receiver, TryRecvError};

use serde_json::Value;

use campfire_shared::error::CampfireResult;

pub use memory::MemoryStore;

/// Time source for server-assigned timestamps and staleness checks
pub trait Clock: Send + Sync {
    /// Milliseconds since the Unix epoch
    fn now_ms(&self) -> i64;
}

/// Wall-clock time
#[derive(Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as i64)
            .unwrap_or(0)
    }
}

/// Manually advanced time, for tests that exercise staleness windows
#[derive(Debug, Default)]
pub struct ManualClock {
    now: std::sync::atomic::AtomicI64,
}

impl ManualClock {
    pub fn at(now_ms: i64) -> Self {
        Self { now: std::sync::atomic::AtomicI64::new(now_ms) }
    }

    pub fn advance(&self, delta_ms: i64) {
        self.now.fetch_add(delta_ms, std::sync::atomic::Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(std::sync::atomic::Ordering::SeqCst)
    }
}

/// One full-state snapshot delivered to a subscriber
#[derive(Debug, Clone, PartialEq)]
pub enum Snapshot {
    /// Every document currently in the subscribed collection
    Collection(Vec<Value>),

    /// The subscribed document's current fields, or `None` if deleted
    Document(Option<Value>),
}

/// A long-lived subscription handle yielding a sequence of snapshot values.
///
/// Snapshots arrive at arbitrary intervals; `latest` collapses any backlog
/// to the most recent state, which is all a full-state consumer needs.
/// Dropping the handle detaches it from the store.
pub struct Subscription {
    rx: Receiver<Snapshot>,
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(rx: Receiver<Snapshot>, cancel: Box<dyn FnOnce() + Send>) -> Self {
        Self { rx, cancel: Some(cancel) }
    }

    /// Next pending snapshot, if any
    pub fn poll(&mut self) -> Option<Snapshot> {
        match self.rx.try_recv() {
            Ok(snapshot) => Some(snapshot),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Drain all pending snapshots and return only the most recent one
    pub fn latest(&mut self) -> Option<Snapshot> {
        let mut latest = None;
        while let Some(snapshot) = self.poll() {
            latest = Some(snapshot);
        }
        latest
    }

    /// Detach from the store explicitly
    pub fn unsubscribe(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Client surface of the realtime document store.
///
/// Paths are hierarchical strings: a collection path like
/// `rooms/lobby/players` holds documents at `rooms/lobby/players/{id}`.
pub trait RealtimeStore: Send + Sync {
    /// Read a single document; `Ok(None)` if it does not exist
    fn get(&self, path: &str) -> CampfireResult<Option<Value>>;

    /// Write a document. With `merge` set, only the given fields are
    /// patched; otherwise the document is replaced wholesale.
    fn set(&self, path: &str, fields: Value, merge: bool) -> CampfireResult<()>;

    /// Delete a document (no-op if absent)
    fn delete(&self, path: &str) -> CampfireResult<()>;

    /// Append a document with a store-generated id; returns the id
    fn add(&self, collection: &str, fields: Value) -> CampfireResult<String>;

    /// Subscribe to full-collection snapshots. The current snapshot is
    /// delivered immediately, then again after every change.
    fn subscribe_collection(&self, path: &str) -> Subscription;

    /// Subscribe to full-document snapshots, with the same delivery rule
    fn subscribe_document(&self, path: &str) -> Subscription;

    /// The store's authoritative time (ms since epoch)
    fn now_ms(&self) -> i64;
}

/// Document path builders for the campfire collections
pub mod paths {
    /// `rooms/{room}/players` — one document per present player
    pub fn players(room: &str) -> String {
        format!("rooms/{room}/players")
    }

    /// `rooms/{room}/players/{uid}`
    pub fn player(room: &str, uid: &str) -> String {
        format!("rooms/{room}/players/{uid}")
    }

    /// `rooms/{room}/state/global` — the single shared room state document
    pub fn state(room: &str) -> String {
        format!("rooms/{room}/state/global")
    }

    /// `rooms/{room}/messages` — append-only chat
    pub fn messages(room: &str) -> String {
        format!("rooms/{room}/messages")
    }
}
