//! Timeline Models
//!
//! The immutable `Message` records that make up a tutoring timeline, and the
//! `HistoryTurn` projection sent to the provider as conversation context.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// How a message's `content` is to be interpreted by the front-end.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// Plain prose.
    Text,
    /// An opaque image reference, e.g. a `data:` URI.
    Image,
    /// An opaque audio handle.
    Audio,
}

/// A single entry of the timeline. Created only by the conversation store and
/// never modified afterwards.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub kind: MessageKind,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_text(&self) -> bool {
        self.kind == MessageKind::Text
    }
}

/// A prior text message as the provider sees it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HistoryTurn {
    pub role: Role,
    pub content: String,
}

impl From<&Message> for HistoryTurn {
    fn from(message: &Message) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_display() {
        assert_eq!(format!("{}", Role::User), "user");
        assert_eq!(format!("{}", Role::Assistant), "assistant");
    }

    #[test]
    fn test_message_serialization() {
        let message = Message {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: "Recursion is...".to_string(),
            kind: MessageKind::Text,
            created_at: Utc::now(),
        };

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("Recursion is..."));
        assert!(json.contains("Assistant"));
        assert!(json.contains("Text"));
    }

    #[test]
    fn test_history_turn_from_message() {
        let message = Message {
            id: Uuid::new_v4(),
            role: Role::User,
            content: "What is a monad?".to_string(),
            kind: MessageKind::Text,
            created_at: Utc::now(),
        };

        let turn = HistoryTurn::from(&message);
        assert_eq!(turn.role, Role::User);
        assert_eq!(turn.content, "What is a monad?");
    }

    #[test]
    fn test_invalid_enum_deserialization() {
        let result: Result<Role, _> = serde_json::from_str(r#""Moderator""#);
        assert!(result.is_err());

        let result: Result<MessageKind, _> = serde_json::from_str(r#""Video""#);
        assert!(result.is_err());
    }
}
