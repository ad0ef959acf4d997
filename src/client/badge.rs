//! Displayed-counter state.
//!
//! The unread badge survives restarts under [`BADGE_COUNT_KEY`]. A missing or
//! malformed value reads as zero.

use crate::client::error::StoreError;
use crate::client::local_db::KeyValueStore;
use crate::client::notify::UserNotifier;
use std::sync::Arc;

/// Well-known storage key for the badge count
pub const BADGE_COUNT_KEY: &str = "badge_count";

/// Persisted badge counter that reports changes downstream
pub struct BadgeCounter {
    kv: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn UserNotifier>,
}

impl BadgeCounter {
    pub fn new(kv: Arc<dyn KeyValueStore>, notifier: Arc<dyn UserNotifier>) -> Self {
        Self { kv, notifier }
    }

    /// Current persisted count
    pub async fn current(&self) -> u32 {
        match self.kv.get(BADGE_COUNT_KEY).await {
            Ok(Some(raw)) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "malformed badge count, treating as zero");
                0
            }),
            Ok(None) => 0,
            Err(e) => {
                tracing::warn!(error = %e, "could not read badge count");
                0
            }
        }
    }

    /// Persist `count` and refresh the badge if it changed
    pub async fn update(&self, count: u32) -> Result<bool, StoreError> {
        if self.current().await == count {
            return Ok(false);
        }
        self.kv.set(BADGE_COUNT_KEY, &count.to_string()).await?;
        self.notifier.refresh_badge_count(count);
        Ok(true)
    }
}

impl std::fmt::Debug for BadgeCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BadgeCounter").finish_non_exhaustive()
    }
}
