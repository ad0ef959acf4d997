//! # Refetch Scheduler
//!
//! Keeps cached server state fresh while the app runs.
//!
//! - **Periodic tick**: refetches stale or invalidated keys while online
//! - **Focus**: returning to the foreground refetches keys whose policy asks
//!   for it
//! - **Reconnect**: coming back online refetches stale keys at once
//!
//! The tick runs on the injected clock, so tests drive it with a manual clock.

use crate::client::cache::RemoteStateCache;
use crate::client::clock::Clock;
use crate::client::sync::network_monitor::{ConnectivityMonitor, ConnectivityState};
use crate::client::sync::visibility::{Visibility, VisibilityMonitor};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;

/// Synchronization scheduler for cache refetches
pub struct RefetchScheduler {
    cache: Arc<RemoteStateCache>,
    connectivity: Arc<ConnectivityMonitor>,
    visibility: Arc<VisibilityMonitor>,
    clock: Arc<dyn Clock>,
    tick: Duration,
}

impl RefetchScheduler {
    /// The tick defaults to the shortest refetch interval of any key kind
    pub fn new(
        cache: Arc<RemoteStateCache>,
        connectivity: Arc<ConnectivityMonitor>,
        visibility: Arc<VisibilityMonitor>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let policies = cache.policies();
        let tick = policies
            .conversations
            .refetch_interval
            .min(policies.messages.refetch_interval);
        Self {
            cache,
            connectivity,
            visibility,
            clock,
            tick,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Run one periodic step. Returns how many keys were refreshed.
    pub async fn tick(&self) -> usize {
        if !self.connectivity.is_online() {
            tracing::debug!("offline, skipping refetch tick");
            return 0;
        }
        self.cache.refetch_stale().await
    }

    /// Spawn the scheduler loop
    pub fn start(self) -> SchedulerHandle {
        let mut visibility = self.visibility.subscribe();
        let mut connectivity = self.connectivity.subscribe();
        let scheduler = self;

        let task = tokio::spawn(async move {
            tracing::info!(tick_ms = scheduler.tick.as_millis() as u64, "refetch scheduler started");
            loop {
                tokio::select! {
                    _ = scheduler.clock.sleep(scheduler.tick) => {
                        scheduler.tick().await;
                    }
                    change = visibility.recv() => match change {
                        Some(Visibility::Foreground) if scheduler.connectivity.is_online() => {
                            let refreshed = scheduler.cache.on_focus().await;
                            tracing::debug!(refreshed, "refetched on focus");
                        }
                        Some(_) => {}
                        None => break,
                    },
                    change = connectivity.recv() => match change {
                        Some(ConnectivityState::Online) => {
                            scheduler.tick().await;
                        }
                        Some(ConnectivityState::Offline) => {}
                        None => break,
                    },
                }
            }
        });

        SchedulerHandle { task: Some(task) }
    }
}

/// Running scheduler; stops when shut down or dropped
#[derive(Debug)]
pub struct SchedulerHandle {
    task: Option<JoinHandle<()>>,
}

impl SchedulerHandle {
    pub fn shutdown(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            tracing::info!("refetch scheduler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
