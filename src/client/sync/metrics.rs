//! # Sync Metrics
//!
//! Counters for drains and dispatches.

use chrono::{DateTime, Utc};
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncMetrics {
    pub drains: u64,
    pub dispatched: u64,
    pub succeeded: u64,
    pub rejected: u64,
    pub retryable_failures: u64,
    /// Actions dropped after exhausting the retry policy
    pub evicted: u64,
    pub last_drain_duration: Option<Duration>,
    last_drain_start: Option<DateTime<Utc>>,
}

impl SyncMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_drain_start(&mut self, at: DateTime<Utc>) {
        self.last_drain_start = Some(at);
        self.drains += 1;
    }

    /// A clock that stepped backwards records a zero duration
    pub fn record_drain_end(&mut self, at: DateTime<Utc>) {
        if let Some(start) = self.last_drain_start.take() {
            self.last_drain_duration = Some((at - start).to_std().unwrap_or_default());
        }
    }

    /// Share of dispatches that succeeded
    pub fn success_rate(&self) -> f64 {
        if self.dispatched == 0 {
            0.0
        } else {
            self.succeeded as f64 / self.dispatched as f64
        }
    }
}
