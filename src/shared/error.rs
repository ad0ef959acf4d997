//! Shared Error Types
//!
//! Errors raised while building payloads, independent of the transport or
//! storage in use. Validation failures reject an action before it is queued.
//!
//! # Usage
//!
//! ```rust
//! use socialsync::shared::error::SharedError;
//!
//! let error = SharedError::validation("body", "Post body cannot be empty");
//! assert!(error.to_string().contains("body"));
//! ```
use thiserror::Error;

/// Shared error types
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SharedError {
    /// Data validation error
    #[error("Validation error in field '{field}': {message}")]
    ValidationError {
        /// The field that failed validation
        field: String,
        /// Human-readable error message
        message: String,
    },
}

impl SharedError {
    /// Create a new validation error
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}
