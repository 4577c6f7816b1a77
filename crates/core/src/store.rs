//! Conversation Store
//!
//! The ordered message timeline of one session plus the two store-wide status
//! flags the front-end renders as loading and speaking indicators.

use crate::message::{HistoryTurn, Message, MessageKind, Role};
use chrono::{Duration, Utc};
use serde::Serialize;
use uuid::Uuid;

/// A reentrancy guard. `Pending` while the operation that owns it is in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Status {
    #[default]
    Idle,
    Pending,
}

impl Status {
    pub fn is_pending(&self) -> bool {
        matches!(self, Status::Pending)
    }
}

/// Owns the timeline of exactly one session.
///
/// Only `TutorSession` mutates a store; the front-end reads it through the
/// session's watch channel.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ConversationStore {
    messages: Vec<Message>,
    awaiting_response: Status,
    speaking: Status,
}

impl ConversationStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn awaiting_response(&self) -> Status {
        self.awaiting_response
    }

    pub fn speaking(&self) -> Status {
        self.speaking
    }

    pub fn is_awaiting_response(&self) -> bool {
        self.awaiting_response.is_pending()
    }

    pub fn is_speaking(&self) -> bool {
        self.speaking.is_pending()
    }

    /// Projects every text message currently in the timeline, in order.
    pub fn history(&self) -> Vec<HistoryTurn> {
        self.messages
            .iter()
            .filter(|m| m.is_text())
            .map(HistoryTurn::from)
            .collect()
    }

    /// The most recent assistant text, the usual source for `visualize` and `speak`.
    pub fn last_assistant_text(&self) -> Option<&Message> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant && m.is_text())
    }

    /// Appends a new message, keeping timestamps strictly increasing even when
    /// the clock reports the same instant twice.
    pub(crate) fn append(&mut self, role: Role, kind: MessageKind, content: String) -> &Message {
        let mut created_at = Utc::now();
        if let Some(last) = self.messages.last() {
            if created_at <= last.created_at {
                created_at = last.created_at + Duration::microseconds(1);
            }
        }
        self.messages.push(Message {
            id: Uuid::new_v4(),
            role,
            content,
            kind,
            created_at,
        });
        &self.messages[self.messages.len() - 1]
    }

    pub(crate) fn set_awaiting_response(&mut self, status: Status) {
        self.awaiting_response = status;
    }

    pub(crate) fn set_speaking(&mut self, status: Status) {
        self.speaking = status;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_store_is_empty_and_idle() {
        let store = ConversationStore::new();
        assert!(store.is_empty());
        assert_eq!(store.awaiting_response(), Status::Idle);
        assert_eq!(store.speaking(), Status::Idle);
    }

    #[test]
    fn test_append_keeps_order_and_strictly_increasing_timestamps() {
        let mut store = ConversationStore::new();
        for i in 0..50 {
            store.append(Role::User, MessageKind::Text, format!("message {i}"));
        }

        assert_eq!(store.len(), 50);
        for pair in store.messages().windows(2) {
            assert!(pair[0].created_at < pair[1].created_at);
            assert_ne!(pair[0].id, pair[1].id);
        }
        assert_eq!(store.messages()[0].content, "message 0");
        assert_eq!(store.messages()[49].content, "message 49");
    }

    #[test]
    fn test_history_skips_images() {
        let mut store = ConversationStore::new();
        store.append(Role::User, MessageKind::Text, "Explain photosynthesis".into());
        store.append(Role::Assistant, MessageKind::Text, "Plants convert light...".into());
        store.append(Role::Assistant, MessageKind::Image, "data:image/png;base64,AAAA".into());

        let history = store.history();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].role, Role::User);
        assert_eq!(history[1].content, "Plants convert light...");
    }

    #[test]
    fn test_last_assistant_text() {
        let mut store = ConversationStore::new();
        assert!(store.last_assistant_text().is_none());

        store.append(Role::User, MessageKind::Text, "Hi".into());
        store.append(Role::Assistant, MessageKind::Text, "Hello!".into());
        store.append(Role::Assistant, MessageKind::Image, "data:image/png;base64,AAAA".into());

        let last = store.last_assistant_text().unwrap();
        assert_eq!(last.content, "Hello!");
    }

    #[test]
    fn test_flags_are_independent() {
        let mut store = ConversationStore::new();
        store.set_awaiting_response(Status::Pending);
        assert!(store.is_awaiting_response());
        assert!(!store.is_speaking());

        store.set_speaking(Status::Pending);
        store.set_awaiting_response(Status::Idle);
        assert!(!store.is_awaiting_response());
        assert!(store.is_speaking());
    }
}
