//! # Room Chat
//!
//! Append-only messages under `rooms/{room}/messages`. The history view is
//! the newest messages by server timestamp, displayed oldest-first.

use log::debug;
use serde_json::{json, Value};

use campfire_shared::chat::ChatMessage;
use campfire_shared::constants::chat::HISTORY_LIMIT;
use campfire_shared::error::CampfireResult;
use campfire_shared::player::AvatarKind;

use crate::store::{paths, RealtimeStore};

/// Append one message; empty/whitespace text is a no-op. Returns the
/// store-assigned document id when a message was sent.
pub fn send(
    store: &dyn RealtimeStore,
    room: &str,
    uid: &str,
    avatar: AvatarKind,
    text: &str,
) -> CampfireResult<Option<String>> {
    let text = text.trim();
    if text.is_empty() {
        return Ok(None);
    }
    let id = store.add(
        &paths::messages(room),
        json!({
            "uid": uid,
            "text": text,
            "avatarType": avatar,
            "timestamp": store.now_ms(),
        }),
    )?;
    Ok(Some(id))
}

/// The display-ordered chat history derived from a collection snapshot
#[derive(Debug, Default, Clone)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    /// Build from a full collection snapshot: keep the newest
    /// `HISTORY_LIMIT` messages, then flip to oldest-first for display.
    /// Malformed documents are skipped.
    pub fn from_snapshot(docs: &[Value]) -> Self {
        let mut messages: Vec<ChatMessage> = docs
            .iter()
            .filter_map(|doc| {
                let parsed = ChatMessage::from_document(doc);
                if parsed.is_none() {
                    debug!("ignoring malformed chat document: {doc}");
                }
                parsed
            })
            .collect();
        messages.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        messages.truncate(HISTORY_LIMIT);
        messages.reverse();
        Self { messages }
    }

    /// Oldest-first
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use serde_json::json;

    fn message(uid: &str, text: &str, ts: i64) -> Value {
        json!({"uid": uid, "text": text, "avatarType": "human", "timestamp": ts})
    }

    #[test]
    fn send_appends_with_store_timestamp() {
        let store = MemoryStore::new();
        let id = send(&store, "lobby", "u1", AvatarKind::Mage, "hello").unwrap();
        assert!(id.is_some());
        assert_eq!(store.collection_len(&paths::messages("lobby")), 1);
    }

    #[test]
    fn send_ignores_empty_text() {
        let store = MemoryStore::new();
        let id = send(&store, "lobby", "u1", AvatarKind::Mage, "   ").unwrap();
        assert!(id.is_none());
        assert_eq!(store.collection_len(&paths::messages("lobby")), 0);
    }

    #[test]
    fn history_is_newest_n_displayed_oldest_first() {
        let docs: Vec<Value> = (0..30).map(|i| message("u1", &format!("m{i}"), i)).collect();
        let history = ChatHistory::from_snapshot(&docs);

        let texts: Vec<&str> = history.messages().iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts.len(), HISTORY_LIMIT);
        assert_eq!(texts.first(), Some(&"m10"), "oldest kept message first");
        assert_eq!(texts.last(), Some(&"m29"), "newest message last");
    }

    #[test]
    fn history_skips_malformed_documents() {
        let docs = vec![
            message("u1", "ok", 1),
            json!({"text": "no author"}),
            message("u2", "also ok", 2),
        ];
        let history = ChatHistory::from_snapshot(&docs);
        assert_eq!(history.messages().len(), 2);
    }
}
