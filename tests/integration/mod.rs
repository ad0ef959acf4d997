//! Integration tests for the sync core
//!
//! Exercises the engine, cache, HTTP client and SQLite store together
//! through the public API.

#[path = "../common/mod.rs"]
mod common;

mod api;
