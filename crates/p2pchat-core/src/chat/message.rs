//! Chat message envelope
//!
//! This module provides the [`ChatMessage`] struct, the unit exchanged over
//! one chat stream and buffered in the receiver's [`Inbox`](super::Inbox).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ulid::Ulid;

use crate::error::{ChatError, ChatResult};

/// A chat message as written on the wire and returned from the inbox.
///
/// Usernames, not peer identities, are carried at this layer. Messages are
/// immutable once constructed and the `id` is never reused.
///
/// # Example
///
/// ```ignore
/// let message = ChatMessage::new("alice", "bob", "hi");
/// let bytes = message.encode()?;
/// assert_eq!(ChatMessage::decode(&bytes)?, message);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Sender-assigned unique identifier (ULID string)
    pub id: String,
    /// Sender's username
    pub from_user: String,
    /// Recipient's username
    pub to_user: String,
    /// Message text
    pub content: String,
    /// Sender-assigned creation time
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// Create a new message with a fresh id, stamped with the current time.
    pub fn new(
        from_user: impl Into<String>,
        to_user: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Ulid::new().to_string(),
            from_user: from_user.into(),
            to_user: to_user.into(),
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    /// Encode the message to its wire form using postcard.
    pub fn encode(&self) -> ChatResult<Vec<u8>> {
        postcard::to_allocvec(self)
            .map_err(|e| ChatError::Serialization(format!("Failed to encode chat message: {}", e)))
    }

    /// Decode a message from its wire form.
    pub fn decode(bytes: &[u8]) -> ChatResult<Self> {
        postcard::from_bytes(bytes)
            .map_err(|e| ChatError::Decode(format!("Failed to decode chat message: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_message_creation() {
        let msg = ChatMessage::new("alice", "bob", "Hello, world!");

        assert_eq!(msg.from_user, "alice");
        assert_eq!(msg.to_user, "bob");
        assert_eq!(msg.content, "Hello, world!");
        assert!(Ulid::from_string(&msg.id).is_ok());
    }

    #[test]
    fn test_ids_are_unique() {
        let a = ChatMessage::new("alice", "bob", "same");
        let b = ChatMessage::new("alice", "bob", "same");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_wire_roundtrip_preserves_timestamp() {
        let msg = ChatMessage::new("alice", "bob", "hi");
        let bytes = msg.encode().unwrap();
        let decoded = ChatMessage::decode(&bytes).unwrap();
        assert_eq!(decoded, msg);
    }

    #[test]
    fn test_decode_garbage_fails() {
        for bytes in [&b""[..], &b"\xff\xff\xff"[..], &b"not a chat message"[..]] {
            let err = ChatMessage::decode(bytes).unwrap_err();
            assert!(matches!(err, ChatError::Decode(_)), "unexpected error: {err}");
        }
    }

    #[test]
    fn test_json_field_names() {
        let msg = ChatMessage::new("alice", "bob", "hi");
        let json = serde_json::to_value(&msg).unwrap();
        for field in ["id", "from_user", "to_user", "content", "timestamp"] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }
}
