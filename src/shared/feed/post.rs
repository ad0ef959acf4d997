//! Post Data Structures
//!
//! Posts on the public feed and the requests that create or like them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Server-assigned post id
pub type PostId = i64;

/// A post on the feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Post {
    pub id: PostId,
    pub body: String,
    #[serde(default)]
    pub like_count: u32,
    pub created_at: DateTime<Utc>,
    /// Correlation id echoed back from the creating request
    #[serde(default)]
    pub client_ref: Option<Uuid>,
}

/// Request to create a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreatePostRequest {
    pub body: String,
    pub client_ref: Uuid,
}

/// Request to like a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikePostRequest {
    pub client_ref: Uuid,
}

/// Response after liking a post
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LikeResponse {
    pub post_id: PostId,
    pub like_count: u32,
    #[serde(default = "default_liked")]
    pub liked: bool,
}

fn default_liked() -> bool {
    true
}
