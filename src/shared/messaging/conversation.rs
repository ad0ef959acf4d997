//! Conversation Data Structure
//!
//! Represents a conversation summary as listed in the inbox.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Server-assigned conversation id
pub type ConversationId = i64;

/// Represents a conversation between users
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Conversation {
    /// Unique conversation ID
    pub id: ConversationId,
    /// Display title (other participant's name or group name)
    #[serde(default)]
    pub title: String,
    /// Preview text of last message
    #[serde(default)]
    pub last_message_preview: String,
    /// Timestamp of last message
    #[serde(default)]
    pub last_message_at: Option<DateTime<Utc>>,
    /// Number of unread messages
    #[serde(default)]
    pub unread_count: u32,
}

impl Conversation {
    /// Whether the server's last message is at least as recent as `at`
    pub fn has_activity_since(&self, at: DateTime<Utc>) -> bool {
        self.last_message_at.is_some_and(|last| last >= at)
    }
}

/// Response for listing conversations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConversationsResponse {
    pub conversations: Vec<Conversation>,
}
