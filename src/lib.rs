// Increase recursion limit for complex async operations
#![recursion_limit = "256"]

//! SocialSync - Offline-First Sync Core
//!
//! SocialSync keeps a social app usable without a network: posts, comments,
//! likes and chat messages written offline are queued durably, shown at once
//! through optimistic updates, and delivered in order when connectivity
//! returns.
//!
//! # Module Structure
//!
//! - **`shared`** - Types shared with the backend
//!   - Feed entities (posts, comments, likes)
//!   - Messaging entities (conversations, messages)
//!   - Configuration and error types
//!
//! - **`client`** - The sync core
//!   - Persistent pending action queue over a key-value store
//!   - Drain engine with retry and backoff
//!   - Remote state cache with optimistic overlays and reconciliation
//!   - HTTP dispatcher for the backend API
//!
//! # Usage
//!
//! ```rust,no_run
//! use socialsync::client::{Config, ConnectivityState, SyncRuntime};
//! use socialsync::client::offline::ActionKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut runtime = SyncRuntime::builder(Config::default()).build().await?;
//! runtime.start();
//!
//! runtime
//!     .engine()
//!     .enqueue(ActionKind::CreatePost { body: "hello".to_string() })
//!     .await?;
//!
//! // The platform reports connectivity; the engine drains on reconnect
//! runtime.connectivity().report(ConnectivityState::Offline);
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! - **Queue**: guarded by an async mutex; only one drain runs at a time
//! - **Cache**: entries live behind `Arc<RwLock<>>`; fetches run outside the lock
//! - **Observers**: connectivity and status changes are delivered over channels
//!
//! # Error Handling
//!
//! - Custom error types in `shared::error` and `client::error`
//! - Dispatch failures are classified as retryable or rejected
//! - Storage failures surface to the caller; nothing is silently dropped

/// Shared types and data structures
pub mod shared;

/// Client-side sync core
pub mod client;
