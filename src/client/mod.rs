//! Client Sync Core
//!
//! Everything a client needs to keep working through flaky connectivity:
//! a durable queue of user actions, a drain engine that delivers them in
//! order, and a cache of server state with optimistic overlays.
//!
//! # Architecture
//!
//! - **`config`** - Configuration management (server URL, token, database path)
//! - **`local_db`** - Key-value storage, backed by SQLite on disk
//! - **`offline`** - Pending action queue, retry policy, optimistic mutations
//! - **`cache`** - Remote state cache with freshness rules
//! - **`api_client`** - HTTP dispatcher and fetcher for the backend
//! - **`sync`** - Drain engine, connectivity and visibility monitors, scheduler
//! - **`badge`** - Persisted unread badge count
//! - **`runtime`** - Wires the above together for the app's lifetime
//!
//! # Module Structure
//!
//! ```text
//! client/
//! ├── mod.rs         - Module exports and documentation
//! ├── api_client.rs  - HTTP dispatcher and fetcher
//! ├── badge.rs       - Unread badge count
//! ├── cache/         - Remote state cache
//! ├── clock.rs       - Injectable time source
//! ├── config.rs      - Configuration management
//! ├── error.rs       - Client error types
//! ├── local_db/      - Key-value storage
//! ├── notify.rs      - User notification seam
//! ├── offline/       - Queue, retry, optimistic state
//! ├── runtime.rs     - Lifecycle wiring
//! ├── signal.rs      - Observable values
//! └── sync/          - Drain engine and monitors
//! ```
//!
//! # Example
//!
//! ```rust,no_run
//! use socialsync::client::{Config, SyncRuntime};
//! use socialsync::client::offline::ActionKind;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut runtime = SyncRuntime::builder(Config::default()).build().await?;
//! runtime.start();
//! runtime
//!     .engine()
//!     .enqueue(ActionKind::LikePost { post_id: 42 })
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod api_client;
pub mod badge;
pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod local_db;
pub mod notify;
pub mod offline;
pub mod runtime;
pub mod signal;
pub mod sync;

pub use api_client::{ActionDispatcher, ApiClient, DispatchResponse};
pub use badge::BadgeCounter;
pub use cache::{CacheKey, CacheValue, RemoteFetcher, RemoteStateCache};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::Config;
pub use error::{DispatchError, FetchError, InitError, StoreError, SyncError};
pub use local_db::{KeyValueStore, LocalDatabase, MemoryStore};
pub use notify::{TracingNotifier, UserNotifier};
pub use runtime::{SyncRuntime, SyncRuntimeBuilder};
pub use signal::{Signal, Subscription};
pub use sync::{ConnectivityMonitor, ConnectivityState, SyncEngine, SyncStatus};
