//! # In-Process Store
//!
//! A `RealtimeStore` backed by process memory, delivering snapshots
//! synchronously on every mutation. It serves two purposes: it is the
//! degraded local-only backend when no store credentials are configured,
//! and it stands in for the real backend in tests — multiple clients
//! sharing one `MemoryStore` observe each other exactly as they would
//! through the hosted service.

use std::collections::{BTreeMap, HashMap};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Arc, Mutex};

use log::debug;
use serde_json::Value;

use campfire_shared::error::CampfireResult;

use super::{Clock, RealtimeStore, Snapshot, Subscription, SystemClock};

#[derive(Clone, Copy, PartialEq, Eq)]
enum SubKind {
    Collection,
    Document,
}

struct SubEntry {
    path: String,
    kind: SubKind,
    tx: Sender<Snapshot>,
}

#[derive(Default)]
struct Inner {
    /// Document path -> fields
    docs: BTreeMap<String, Value>,
    subs: HashMap<u64, SubEntry>,
    next_sub_id: u64,
    next_doc_id: u64,
}

pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner::default())), clock }
    }

    /// Number of documents currently in `collection`
    pub fn collection_len(&self, collection: &str) -> usize {
        let inner = self.inner.lock().unwrap();
        collection_docs(&inner.docs, collection).len()
    }

    fn notify(&self, changed_doc: &str) {
        let mut inner = self.inner.lock().unwrap();
        let collection = parent_collection(changed_doc);

        // Senders whose receiving Subscription was dropped are pruned here.
        let mut dead = Vec::new();
        let mut deliveries = Vec::new();
        for (&id, sub) in &inner.subs {
            let snapshot = match sub.kind {
                SubKind::Document if sub.path == changed_doc => {
                    Snapshot::Document(inner.docs.get(changed_doc).cloned())
                }
                SubKind::Collection if Some(sub.path.as_str()) == collection => {
                    Snapshot::Collection(collection_docs(&inner.docs, &sub.path))
                }
                _ => continue,
            };
            deliveries.push((id, snapshot));
        }
        for (id, snapshot) in deliveries {
            if inner.subs[&id].tx.send(snapshot).is_err() {
                dead.push(id);
            }
        }
        for id in dead {
            inner.subs.remove(&id);
        }
    }

    fn subscribe(&self, path: &str, kind: SubKind) -> Subscription {
        let (tx, rx) = channel();
        let id;
        {
            let mut inner = self.inner.lock().unwrap();
            id = inner.next_sub_id;
            inner.next_sub_id += 1;

            // Deliver the current state immediately, like the hosted
            // service does on attach.
            let initial = match kind {
                SubKind::Document => Snapshot::Document(inner.docs.get(path).cloned()),
                SubKind::Collection => {
                    Snapshot::Collection(collection_docs(&inner.docs, path))
                }
            };
            let _ = tx.send(initial);

            inner.subs.insert(id, SubEntry { path: path.to_string(), kind, tx });
        }
        debug!("subscribed #{id} to {path}");

        let registry = Arc::clone(&self.inner);
        Subscription::new(
            rx,
            Box::new(move || {
                registry.lock().unwrap().subs.remove(&id);
            }),
        )
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RealtimeStore for MemoryStore {
    fn get(&self, path: &str) -> CampfireResult<Option<Value>> {
        Ok(self.inner.lock().unwrap().docs.get(path).cloned())
    }

    fn set(&self, path: &str, fields: Value, merge: bool) -> CampfireResult<()> {
        {
            let mut inner = self.inner.lock().unwrap();
            if merge && inner.docs.contains_key(path) {
                if let Some(existing) = inner.docs.get_mut(path) {
                    merge_fields(existing, fields);
                }
            } else {
                inner.docs.insert(path.to_string(), fields);
            }
        }
        self.notify(path);
        Ok(())
    }

    fn delete(&self, path: &str) -> CampfireResult<()> {
        let existed = self.inner.lock().unwrap().docs.remove(path).is_some();
        if existed {
            self.notify(path);
        }
        Ok(())
    }

    fn add(&self, collection: &str, fields: Value) -> CampfireResult<String> {
        let path;
        {
            let mut inner = self.inner.lock().unwrap();
            let doc_id = format!("d{:06}", inner.next_doc_id);
            inner.next_doc_id += 1;
            path = format!("{collection}/{doc_id}");
            inner.docs.insert(path.clone(), fields);
        }
        self.notify(&path);
        // Path layout guarantees the separator exists.
        Ok(path.rsplit('/').next().unwrap_or_default().to_string())
    }

    fn subscribe_collection(&self, path: &str) -> Subscription {
        self.subscribe(path, SubKind::Collection)
    }

    fn subscribe_document(&self, path: &str) -> Subscription {
        self.subscribe(path, SubKind::Document)
    }

    fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }
}

/// All documents directly under `collection`, in path order
fn collection_docs(docs: &BTreeMap<String, Value>, collection: &str) -> Vec<Value> {
    let prefix = format!("{collection}/");
    docs.range(prefix.clone()..)
        .take_while(|(path, _)| path.starts_with(&prefix))
        .filter(|(path, _)| !path[prefix.len()..].contains('/'))
        .map(|(_, value)| value.clone())
        .collect()
}

fn parent_collection(doc_path: &str) -> Option<&str> {
    doc_path.rsplit_once('/').map(|(parent, _)| parent)
}

/// Shallow field merge, matching the store's `merge: true` write mode
fn merge_fields(existing: &mut Value, fields: Value) {
    match (existing.as_object_mut(), fields) {
        (Some(target), Value::Object(patch)) => {
            for (key, value) in patch {
                target.insert(key, value);
            }
        }
        (_, fields) => *existing = fields,
    }
}
