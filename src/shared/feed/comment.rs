//! Comment Data Structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::post::PostId;

/// Server-assigned comment id
pub type CommentId = i64;

/// A comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Comment {
    pub id: CommentId,
    pub post_id: PostId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub client_ref: Option<Uuid>,
}

/// Request to comment on a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateCommentRequest {
    pub body: String,
    pub client_ref: Uuid,
}
