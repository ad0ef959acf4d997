//! # Local Database Module
//!
//! Durable key-value storage used by the offline queue and the badge counter.
//!
//! ## Architecture
//!
//! Everything the client persists is a JSON document stored under a well-known
//! key. Two backends implement [`KeyValueStore`]:
//! - **LocalDatabase**: SQLite file in WAL mode, fully synchronous commits, so a
//!   value written before a crash is still there on restart
//! - **MemoryStore**: process-local map for tests and ephemeral sessions
//!
//! Readers must tolerate missing or malformed values; the store itself never
//! interprets them.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use socialsync::client::local_db::{KeyValueStore, LocalDatabase};
//!
//! # async fn example() -> Result<(), socialsync::client::error::StoreError> {
//! let db = LocalDatabase::open_default().await?;
//! db.set("badge_count", "3").await?;
//! assert_eq!(db.get("badge_count").await?.as_deref(), Some("3"));
//! # Ok(())
//! # }
//! ```

pub mod schema;
mod sqlite;

pub use sqlite::LocalDatabase;

use crate::client::error::StoreError;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Result type for local storage operations
pub type Result<T> = std::result::Result<T, StoreError>;

/// Persisted string values under string keys.
///
/// A successful `set` or `remove` is durable when it returns.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> Result<()>;

    async fn remove(&self, key: &str) -> Result<()>;
}

/// In-memory store; nothing survives the process
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.values.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.values
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.values.write().await.remove(key);
        Ok(())
    }
}
