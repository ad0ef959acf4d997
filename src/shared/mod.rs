//! Shared Module
//!
//! Types shared between the sync core and its collaborators: the wire-level
//! domain entities exchanged with the backend, the shared error type and the
//! application configuration.
//!
//! # Overview
//!
//! Everything here is plain data designed for JSON serialization; nothing in
//! this module performs I/O.

/// Feed entities: posts, comments, likes
pub mod feed;

/// Messaging entities: conversations and messages
pub mod messaging;

/// Shared error types
pub mod error;

/// Application configuration
pub mod config;

/// Re-export commonly used types for convenience
pub use config::{AppConfig, AppConfigBuilder, BackoffSettings, CacheSettings, ConfigError, SyncSettings};
pub use error::SharedError;
pub use feed::{Comment, Post};
pub use messaging::{ChatMessage, Conversation};
