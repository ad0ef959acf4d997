//! Common test utilities and helpers
//!
//! This module provides shared utilities for all tests including:
//! - Scripted dispatcher and fetcher doubles
//! - A notifier that records what the user was told
//! - An engine harness wired over in-memory storage and a manual clock

#![allow(dead_code)]

pub mod dispatcher;
pub mod notifier;

// Re-export commonly used utilities
pub use dispatcher::*;
pub use fetcher::*;
pub use harness::*;
pub use notifier::*;
