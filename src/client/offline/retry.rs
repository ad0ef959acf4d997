//! # Retry Logic and Backoff Strategies
//!
//! Decides how long to wait before re-draining after a retryable failure and
//! when an action has failed for long enough to be given up on.
//!
//! ## Features
//!
//! - **Exponential Backoff**: doubling intervals, capped
//! - **Fixed Backoff**: the same interval every time
//! - **Retry Ceiling**: optional maximum attempt count
//! - **Age Eviction**: optional maximum age for an undeliverable action
//!
//! Delays carry no jitter so retry timing stays reproducible under a manual
//! clock.

use crate::shared::config::{BackoffSettings, SyncSettings};
use chrono::{DateTime, Utc};
use std::time::Duration;

/// Backoff strategy configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackoffStrategy {
    /// Fixed interval between retries
    Fixed(Duration),
    /// `base * 2^(attempt-1)`, never more than `max`
    Exponential { base: Duration, max: Duration },
}

impl BackoffStrategy {
    /// Delay after the `attempt`-th consecutive failure (1-based)
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            BackoffStrategy::Fixed(interval) => interval,
            BackoffStrategy::Exponential { base, max } => {
                let exponent = attempt.saturating_sub(1).min(31);
                base.checked_mul(1u32 << exponent)
                    .map_or(max, |delay| delay.min(max))
            }
        }
    }
}

impl Default for BackoffStrategy {
    fn default() -> Self {
        BackoffSettings::default().into()
    }
}

impl From<BackoffSettings> for BackoffStrategy {
    fn from(settings: BackoffSettings) -> Self {
        match settings {
            BackoffSettings::Fixed { interval_ms } => {
                BackoffStrategy::Fixed(Duration::from_millis(interval_ms))
            }
            BackoffSettings::Exponential { base_ms, max_ms } => BackoffStrategy::Exponential {
                base: Duration::from_millis(base_ms),
                max: Duration::from_millis(max_ms),
            },
        }
    }
}

/// When and whether to retry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryPolicy {
    pub backoff: BackoffStrategy,
    /// Give up after this many failed attempts
    pub max_attempts: Option<u32>,
    /// Give up on actions older than this
    pub max_age: Option<chrono::Duration>,
}

impl RetryPolicy {
    pub fn from_settings(settings: &SyncSettings) -> Self {
        Self {
            backoff: settings.backoff.clone().into(),
            max_attempts: settings.max_attempts,
            max_age: settings.max_action_age(),
        }
    }

    /// Whether an action that has now failed `attempts` times should be dropped
    pub fn gives_up(&self, attempts: u32, created_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        if self.max_attempts.is_some_and(|max| attempts >= max) {
            return true;
        }
        self.max_age.is_some_and(|max_age| now - created_at >= max_age)
    }
}
