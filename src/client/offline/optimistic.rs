//! # Optimistic Updates
//!
//! Local effects of queued actions, shown before the backend confirms them.
//!
//! ## Merge Rules
//!
//! The visible value of a cache entry is always its server snapshot with the
//! overlay applied in order, computed by [`OptimisticMerger::merge`]:
//! - **Message lists** are merged by id union: overlay messages are appended
//!   after the last server-known message unless the server already carries
//!   them (same correlation id or same message id)
//! - **Conversation fields** are last-writer-wins: an overlay preview replaces
//!   the server's only when it is newer than the server's last activity
//!
//! The merger owns no data; everything here is a pure function of the
//! snapshot and the overlay.

use crate::client::cache::{CacheKey, CacheValue};
use crate::client::offline::queue::{ActionId, ActionKind, PendingAction};
use crate::shared::messaging::{ChatMessage, Conversation, ConversationId};
use chrono::{DateTime, Utc};

/// Longest preview written into the conversation list, in characters
pub const PREVIEW_CHARS: usize = 80;

/// One not-yet-confirmed local change to a cache entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptimisticMutation {
    /// Id of the action that produced this change
    pub correlation_id: ActionId,
    pub applied_at: DateTime<Utc>,
    /// The action was delivered; the next reconciliation drops this entry
    pub settled: bool,
    pub change: Mutation,
}

impl OptimisticMutation {
    pub fn new(correlation_id: ActionId, applied_at: DateTime<Utc>, change: Mutation) -> Self {
        Self {
            correlation_id,
            applied_at,
            settled: false,
            change,
        }
    }
}

/// The change itself
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    /// Show an outgoing message at the end of a conversation
    AppendMessage(ChatMessage),
    /// Bump a conversation's preview and activity time
    TouchConversation {
        conversation_id: ConversationId,
        preview: String,
        at: DateTime<Utc>,
    },
}

/// Pure merge and confirmation logic for optimistic overlays
#[derive(Debug, Default, Clone, Copy)]
pub struct OptimisticMerger;

impl OptimisticMerger {
    /// Cache entries an action affects, with the change for each
    pub fn mutations_for(action: &PendingAction) -> Vec<(CacheKey, OptimisticMutation)> {
        match &action.kind {
            ActionKind::SendMessage {
                conversation_id,
                content,
            } => {
                let message = ChatMessage::optimistic(
                    *conversation_id,
                    content.clone(),
                    action.id.as_uuid(),
                    action.created_at,
                );
                let touch = Mutation::TouchConversation {
                    conversation_id: *conversation_id,
                    preview: message.preview(PREVIEW_CHARS),
                    at: action.created_at,
                };
                vec![
                    (
                        CacheKey::Messages(*conversation_id),
                        OptimisticMutation::new(
                            action.id,
                            action.created_at,
                            Mutation::AppendMessage(message),
                        ),
                    ),
                    (
                        CacheKey::ConversationList,
                        OptimisticMutation::new(action.id, action.created_at, touch),
                    ),
                ]
            }
            // Posts, comments and likes have no cached view here.
            ActionKind::CreatePost { .. }
            | ActionKind::CreateComment { .. }
            | ActionKind::LikePost { .. } => Vec::new(),
        }
    }

    /// Server snapshot with the overlay applied in order
    pub fn merge(snapshot: &CacheValue, overlay: &[OptimisticMutation]) -> CacheValue {
        let mut merged = snapshot.clone();
        for mutation in overlay {
            Self::apply(&mut merged, mutation);
        }
        merged
    }

    /// Whether the server value already reflects this mutation
    pub fn is_confirmed(mutation: &OptimisticMutation, snapshot: &CacheValue) -> bool {
        match (&mutation.change, snapshot) {
            (Mutation::AppendMessage(message), CacheValue::Messages(messages)) => {
                messages.iter().any(|existing| same_message(existing, message, mutation.correlation_id))
            }
            (
                Mutation::TouchConversation {
                    conversation_id,
                    at,
                    ..
                },
                CacheValue::Conversations(conversations),
            ) => conversations
                .iter()
                .find(|conversation| conversation.id == *conversation_id)
                .is_some_and(|conversation| conversation.has_activity_since(*at)),
            // A mutation for a different kind of value has nothing to confirm.
            _ => true,
        }
    }

    fn apply(value: &mut CacheValue, mutation: &OptimisticMutation) {
        match (&mutation.change, value) {
            (Mutation::AppendMessage(message), CacheValue::Messages(messages)) => {
                if !messages
                    .iter()
                    .any(|existing| same_message(existing, message, mutation.correlation_id))
                {
                    messages.push(message.clone());
                }
            }
            (
                Mutation::TouchConversation {
                    conversation_id,
                    preview,
                    at,
                },
                CacheValue::Conversations(conversations),
            ) => {
                if let Some(conversation) = conversations
                    .iter_mut()
                    .find(|conversation| conversation.id == *conversation_id)
                {
                    touch(conversation, preview, *at);
                }
            }
            _ => {
                tracing::debug!(
                    correlation_id = %mutation.correlation_id,
                    "mutation does not apply to this value"
                );
            }
        }
    }
}

fn same_message(existing: &ChatMessage, local: &ChatMessage, correlation_id: ActionId) -> bool {
    existing.answers(correlation_id.as_uuid())
        || (local.id.is_some() && existing.id == local.id)
}

fn touch(conversation: &mut Conversation, preview: &str, at: DateTime<Utc>) {
    if !conversation.has_activity_since(at) {
        conversation.last_message_preview = preview.to_string();
        conversation.last_message_at = Some(at);
    }
}
