//! Chat Message Data Structure
//!
//! Represents a message in a conversation, either confirmed by the server or
//! still pending locally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::conversation::ConversationId;

/// Server-assigned message id
pub type MessageId = i64;

/// Server-assigned user id
pub type UserId = i64;

/// Represents a chat message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    /// Server id; `None` until the server has accepted the message
    #[serde(default)]
    pub id: Option<MessageId>,
    /// Conversation this message belongs to
    pub conversation_id: ConversationId,
    /// User who sent the message, when known
    #[serde(default)]
    pub sender_id: Option<UserId>,
    /// Message text
    pub content: String,
    /// When the message was sent
    pub created_at: DateTime<Utc>,
    /// Correlation id chosen by the sending client and echoed by the server
    #[serde(default)]
    pub client_ref: Option<Uuid>,
    /// Shown locally but not yet confirmed by the server
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub pending: bool,
}

impl ChatMessage {
    /// Build the local, not-yet-confirmed rendition of an outgoing message
    pub fn optimistic(
        conversation_id: ConversationId,
        content: impl Into<String>,
        client_ref: Uuid,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: None,
            conversation_id,
            sender_id: None,
            content: content.into(),
            created_at,
            client_ref: Some(client_ref),
            pending: true,
        }
    }

    /// Whether this message carries the given correlation id
    pub fn answers(&self, client_ref: Uuid) -> bool {
        self.client_ref == Some(client_ref)
    }

    /// Get a preview of the message (first N characters)
    pub fn preview(&self, max_len: usize) -> String {
        if self.content.chars().count() <= max_len {
            self.content.clone()
        } else {
            let mut preview: String = self.content.chars().take(max_len.saturating_sub(3)).collect();
            preview.push_str("...");
            preview
        }
    }
}

/// Request to send a message
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SendMessageRequest {
    pub content: String,
    pub client_ref: Uuid,
}

/// Response for listing messages
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListMessagesResponse {
    pub messages: Vec<ChatMessage>,
}
