//! Messaging Module
//!
//! Wire types for direct messaging:
//!
//! - `Conversation` - A conversation summary as shown in the conversation list
//! - `ChatMessage` - A message in a conversation
//!
//! # Usage
//!
//! ```rust
//! use socialsync::shared::messaging::{ChatMessage, Conversation};
//! ```

pub mod conversation;
pub mod message;

pub use conversation::{Conversation, ConversationId, ListConversationsResponse};
pub use message::{ChatMessage, ListMessagesResponse, MessageId, SendMessageRequest, UserId};
