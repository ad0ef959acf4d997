//! Lifecycle-scoped wiring of the sync core.
//!
//! [`SyncRuntime`] owns every long-lived component. It is built once at
//! application start, replays whatever the queue still holds, and tears its
//! listeners and timers down on [`SyncRuntime::shutdown`] (or drop).

use crate::client::api_client::{ActionDispatcher, ApiClient};
use crate::client::badge::BadgeCounter;
use crate::client::cache::{CachePolicies, RemoteFetcher, RemoteStateCache};
use crate::client::clock::{Clock, SystemClock};
use crate::client::config::Config;
use crate::client::error::InitError;
use crate::client::local_db::{KeyValueStore, LocalDatabase};
use crate::client::notify::{TracingNotifier, UserNotifier};
use crate::client::offline::queue::PersistentActionStore;
use crate::client::offline::retry::RetryPolicy;
use crate::client::sync::{
    ConnectivityMonitor, ConnectivityState, RefetchScheduler, SchedulerHandle, SyncEngine, SyncHandle,
    VisibilityMonitor,
};
use std::sync::Arc;

/// Builder for [`SyncRuntime`]
pub struct SyncRuntimeBuilder {
    config: Config,
    kv: Option<Arc<dyn KeyValueStore>>,
    dispatcher: Option<Arc<dyn ActionDispatcher>>,
    fetcher: Option<Arc<dyn RemoteFetcher>>,
    notifier: Arc<dyn UserNotifier>,
    clock: Arc<dyn Clock>,
    connectivity: ConnectivityState,
}

impl SyncRuntimeBuilder {
    /// Storage backend; defaults to the SQLite database at the configured path
    pub fn store(mut self, kv: Arc<dyn KeyValueStore>) -> Self {
        self.kv = Some(kv);
        self
    }

    /// Dispatcher; defaults to the HTTP client
    pub fn dispatcher(mut self, dispatcher: Arc<dyn ActionDispatcher>) -> Self {
        self.dispatcher = Some(dispatcher);
        self
    }

    /// Fetcher; defaults to the HTTP client
    pub fn fetcher(mut self, fetcher: Arc<dyn RemoteFetcher>) -> Self {
        self.fetcher = Some(fetcher);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn UserNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Connectivity at start, before the platform reports anything
    pub fn initial_connectivity(mut self, state: ConnectivityState) -> Self {
        self.connectivity = state;
        self
    }

    pub async fn build(self) -> Result<SyncRuntime, InitError> {
        let kv: Arc<dyn KeyValueStore> = match self.kv {
            Some(kv) => kv,
            None => Arc::new(LocalDatabase::open(self.config.database_path()).await?),
        };

        let (dispatcher, fetcher) = match (self.dispatcher, self.fetcher) {
            (Some(dispatcher), Some(fetcher)) => (dispatcher, fetcher),
            (dispatcher, fetcher) => {
                let api = Arc::new(ApiClient::new(self.config.clone())?);
                (
                    dispatcher.unwrap_or_else(|| api.clone() as Arc<dyn ActionDispatcher>),
                    fetcher.unwrap_or_else(|| api.clone() as Arc<dyn RemoteFetcher>),
                )
            }
        };

        let app = self.config.app();
        let badge = Arc::new(BadgeCounter::new(Arc::clone(&kv), Arc::clone(&self.notifier)));
        let cache = Arc::new(
            RemoteStateCache::new(fetcher, Arc::clone(&self.clock), CachePolicies::from(&app.cache))
                .with_badge(Arc::clone(&badge)),
        );
        let connectivity = Arc::new(ConnectivityMonitor::new(self.connectivity));
        let visibility = Arc::new(VisibilityMonitor::default());

        let store = PersistentActionStore::open(kv).await;
        let engine = SyncEngine::builder(store, dispatcher, Arc::clone(&connectivity), Arc::clone(&cache))
            .notifier(self.notifier)
            .clock(Arc::clone(&self.clock))
            .retry_policy(RetryPolicy::from_settings(&app.sync))
            .dispatch_timeout(app.sync.dispatch_timeout())
            .build();

        Ok(SyncRuntime {
            engine,
            cache,
            connectivity,
            visibility,
            badge,
            clock: self.clock,
            engine_handle: None,
            scheduler_handle: None,
        })
    }
}

/// The running sync core
pub struct SyncRuntime {
    engine: Arc<SyncEngine>,
    cache: Arc<RemoteStateCache>,
    connectivity: Arc<ConnectivityMonitor>,
    visibility: Arc<VisibilityMonitor>,
    badge: Arc<BadgeCounter>,
    clock: Arc<dyn Clock>,
    engine_handle: Option<SyncHandle>,
    scheduler_handle: Option<SchedulerHandle>,
}

impl SyncRuntime {
    pub fn builder(config: Config) -> SyncRuntimeBuilder {
        SyncRuntimeBuilder {
            config,
            kv: None,
            dispatcher: None,
            fetcher: None,
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            connectivity: ConnectivityState::Online,
        }
    }

    /// Start listeners and the refetch scheduler, then replay the queue
    pub fn start(&mut self) {
        if self.engine_handle.is_some() {
            return;
        }
        self.engine_handle = Some(self.engine.start());
        let scheduler = RefetchScheduler::new(
            Arc::clone(&self.cache),
            Arc::clone(&self.connectivity),
            Arc::clone(&self.visibility),
            Arc::clone(&self.clock),
        );
        self.scheduler_handle = Some(scheduler.start());

        let pending = self.engine.status().pending;
        if pending > 0 && self.connectivity.is_online() {
            tracing::info!(pending, "replaying pending actions");
            self.engine.trigger_drain();
        }
    }

    /// Stop listeners, timers and the scheduler
    pub fn shutdown(&mut self) {
        if let Some(mut handle) = self.scheduler_handle.take() {
            handle.shutdown();
        }
        if let Some(mut handle) = self.engine_handle.take() {
            handle.shutdown();
        }
    }

    pub fn is_running(&self) -> bool {
        self.engine_handle.is_some()
    }

    pub fn engine(&self) -> &Arc<SyncEngine> {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<RemoteStateCache> {
        &self.cache
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn visibility(&self) -> &Arc<VisibilityMonitor> {
        &self.visibility
    }

    pub fn badge(&self) -> &Arc<BadgeCounter> {
        &self.badge
    }
}

impl Drop for SyncRuntime {
    fn drop(&mut self) {
        self.shutdown();
    }
}
