//! # Pending Action Queue
//!
//! The durable, ordered log of mutating actions the backend has not confirmed.
//!
//! ## Features
//!
//! - **Persistent Queue**: actions survive process restarts
//! - **Insertion Order**: replay follows enqueue order; ids are UUIDv7 so they
//!   sort by creation time as well
//! - **Fail-Safe Load**: an unreadable persisted list resets to empty instead
//!   of raising
//!
//! Actions are immutable once appended. They leave the queue only through
//! [`PersistentActionStore::remove`].
//!
//! ## Usage
//!
//! ```rust,no_run
//! use socialsync::client::local_db::MemoryStore;
//! use socialsync::client::offline::queue::{ActionKind, PendingAction, PersistentActionStore};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), socialsync::client::error::StoreError> {
//! let mut store = PersistentActionStore::open(Arc::new(MemoryStore::new())).await;
//! let action = PendingAction::new(ActionKind::LikePost { post_id: 42 }, chrono::Utc::now());
//! store.append(action.clone()).await?;
//!
//! for pending in store.list() {
//!     // Dispatch...
//!     store.remove(pending.id).await?;
//! }
//! # Ok(())
//! # }
//! ```

use crate::client::error::StoreError;
use crate::client::local_db::KeyValueStore;
use crate::shared::error::SharedError;
use crate::shared::feed::PostId;
use crate::shared::messaging::ConversationId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Well-known storage key for the serialized queue
pub const PENDING_ACTIONS_KEY: &str = "pending_actions";

/// Longest accepted post, comment or message body, in characters
pub const MAX_BODY_CHARS: usize = 5_000;

/// Unique, time-ordered id of a pending action.
///
/// Doubles as the correlation id carried by the request (`client_ref`) and
/// by the optimistic overlay entries the action produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(Uuid);

impl ActionId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for ActionId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for ActionId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// What the user asked for, with the payload each kind needs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload")]
pub enum ActionKind {
    CreatePost {
        body: String,
    },
    CreateComment {
        post_id: PostId,
        body: String,
    },
    LikePost {
        post_id: PostId,
    },
    SendMessage {
        conversation_id: ConversationId,
        content: String,
    },
}

impl ActionKind {
    /// Stable name used in logs and notices
    pub fn name(&self) -> &'static str {
        match self {
            ActionKind::CreatePost { .. } => "CreatePost",
            ActionKind::CreateComment { .. } => "CreateComment",
            ActionKind::LikePost { .. } => "LikePost",
            ActionKind::SendMessage { .. } => "SendMessage",
        }
    }

    /// Human-readable description for user notices
    pub fn describe(&self) -> String {
        match self {
            ActionKind::CreatePost { .. } => "your post".to_string(),
            ActionKind::CreateComment { post_id, .. } => format!("your comment on post {}", post_id),
            ActionKind::LikePost { post_id } => format!("your like on post {}", post_id),
            ActionKind::SendMessage {
                conversation_id, ..
            } => format!("your message in conversation {}", conversation_id),
        }
    }

    /// Reject payloads the backend could never accept
    pub fn validate(&self) -> Result<(), SharedError> {
        match self {
            ActionKind::CreatePost { body } => validate_body("body", body),
            ActionKind::CreateComment { post_id, body } => {
                validate_id("post_id", *post_id)?;
                validate_body("body", body)
            }
            ActionKind::LikePost { post_id } => validate_id("post_id", *post_id),
            ActionKind::SendMessage {
                conversation_id,
                content,
            } => {
                validate_id("conversation_id", *conversation_id)?;
                validate_body("content", content)
            }
        }
    }
}

fn validate_body(field: &str, text: &str) -> Result<(), SharedError> {
    if text.trim().is_empty() {
        return Err(SharedError::validation(field, "cannot be empty"));
    }
    if text.chars().count() > MAX_BODY_CHARS {
        return Err(SharedError::validation(
            field,
            format!("cannot exceed {} characters", MAX_BODY_CHARS),
        ));
    }
    Ok(())
}

fn validate_id(field: &str, id: i64) -> Result<(), SharedError> {
    if id <= 0 {
        return Err(SharedError::validation(field, "must be a positive id"));
    }
    Ok(())
}

/// A queued, not-yet-confirmed action
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingAction {
    pub id: ActionId,
    pub kind: ActionKind,
    pub created_at: DateTime<Utc>,
}

impl PendingAction {
    pub fn new(kind: ActionKind, created_at: DateTime<Utc>) -> Self {
        Self {
            id: ActionId::new(),
            kind,
            created_at,
        }
    }
}

/// Durable ordered list of pending actions.
///
/// The whole list is serialized as one JSON array under
/// [`PENDING_ACTIONS_KEY`]. The in-memory copy is only updated once the
/// write that reflects it has succeeded.
pub struct PersistentActionStore {
    kv: Arc<dyn KeyValueStore>,
    actions: Vec<PendingAction>,
}

impl PersistentActionStore {
    /// Load the persisted queue. Missing, unreadable or corrupt data yields an
    /// empty queue.
    pub async fn open(kv: Arc<dyn KeyValueStore>) -> Self {
        let actions = match kv.get(PENDING_ACTIONS_KEY).await {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<PendingAction>>(&raw) {
                Ok(actions) => actions,
                Err(e) => {
                    tracing::warn!(error = %e, "persisted action queue is corrupt, resetting");
                    if let Err(e) = kv.remove(PENDING_ACTIONS_KEY).await {
                        tracing::error!(error = %e, "failed to clear corrupt action queue");
                    }
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read action queue, starting empty");
                Vec::new()
            }
        };

        tracing::debug!(pending = actions.len(), "action queue loaded");
        Self { kv, actions }
    }

    /// Append an action; durable once this returns `Ok`
    pub async fn append(&mut self, action: PendingAction) -> Result<(), StoreError> {
        let mut next = self.actions.clone();
        next.push(action);
        self.persist(&next).await?;
        self.actions = next;
        Ok(())
    }

    /// Pending actions in insertion order
    pub fn list(&self) -> Vec<PendingAction> {
        self.actions.clone()
    }

    pub fn get(&self, id: ActionId) -> Option<&PendingAction> {
        self.actions.iter().find(|action| action.id == id)
    }

    pub fn contains(&self, id: ActionId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Remove an action. Removing an absent id does nothing.
    pub async fn remove(&mut self, id: ActionId) -> Result<(), StoreError> {
        if !self.contains(id) {
            return Ok(());
        }
        let next: Vec<PendingAction> = self
            .actions
            .iter()
            .filter(|action| action.id != id)
            .cloned()
            .collect();
        self.persist(&next).await?;
        self.actions = next;
        Ok(())
    }

    async fn persist(&self, actions: &[PendingAction]) -> Result<(), StoreError> {
        let raw = serde_json::to_string(actions)?;
        self.kv.set(PENDING_ACTIONS_KEY, &raw).await.map_err(|e| {
            tracing::error!(error = %e, "failed to persist action queue");
            e
        })
    }
}

impl fmt::Debug for PersistentActionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PersistentActionStore")
            .field("actions", &self.actions)
            .finish_non_exhaustive()
    }
}
