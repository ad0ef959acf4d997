//! Feed Module
//!
//! Wire types for the public feed: posts, comments and likes.

pub mod comment;
pub mod post;

pub use comment::{Comment, CommentId, CreateCommentRequest};
pub use post::{CreatePostRequest, LikePostRequest, LikeResponse, Post, PostId};
