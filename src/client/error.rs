//! Client Error Types
//!
//! Errors produced at the client's boundaries: durable storage, dispatching a
//! pending action, fetching remote state and the enqueue entry point.
//!
//! Only [`crate::client::sync::SyncEngine`] decides what a [`DispatchError`]
//! means for the queue; every other component just reports it.

use crate::shared::config::ConfigError;
use crate::shared::error::SharedError;
use thiserror::Error;

/// Durable storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    /// SQLite error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Filesystem error while preparing the database location
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Value could not be encoded for storage
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result of a single dispatch attempt that did not succeed
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DispatchError {
    /// No response was received (connection failure, timeout)
    #[error("network unavailable: {reason}")]
    NetworkUnavailable {
        /// What went wrong on the transport
        reason: String,
    },

    /// The server refused the request; resubmitting it cannot succeed
    #[error("server rejected request ({status}): {message}")]
    ServerRejected {
        /// HTTP status code
        status: u16,
        /// Body or reason returned by the server
        message: String,
    },

    /// The server failed in a way that may clear up on its own
    #[error("server failure ({status})")]
    ServerTransientFailure {
        /// HTTP status code
        status: u16,
    },
}

impl DispatchError {
    /// Whether the action should stay queued and be attempted again
    pub fn is_retryable(&self) -> bool {
        !matches!(self, DispatchError::ServerRejected { .. })
    }

    pub fn network(reason: impl Into<String>) -> Self {
        Self::NetworkUnavailable {
            reason: reason.into(),
        }
    }
}

/// Failure to fetch a remote state cache entry
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FetchError {
    #[error("network unavailable: {0}")]
    Network(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Decode(String),
}

/// Errors surfaced by the enqueue entry point
#[derive(Debug, Error)]
pub enum SyncError {
    /// The action payload failed validation and was not queued
    #[error(transparent)]
    Invalid(#[from] SharedError),

    /// The action could not be persisted
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failures while bringing the client up
#[derive(Debug, Error)]
pub enum InitError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Store(#[from] StoreError),

    /// The HTTP client could not be built
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}
