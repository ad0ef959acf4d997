//! # Sync State
//!
//! What the engine is doing right now, published for a "syncing…" indicator.

use chrono::{DateTime, Utc};

/// Engine state machine
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum EngineState {
    #[default]
    Idle,
    Draining,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncStatus {
    pub state: EngineState,
    /// Actions still waiting in the queue
    pub pending: usize,
    /// Last time a drain emptied the queue
    pub last_synced_at: Option<DateTime<Utc>>,
    /// Most recent retryable or storage failure
    pub last_error: Option<String>,
    /// When the scheduled retry fires
    pub next_retry_at: Option<DateTime<Utc>>,
}

impl SyncStatus {
    pub fn is_syncing(&self) -> bool {
        self.state == EngineState::Draining
    }

    /// Whether there is undelivered work
    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }
}
