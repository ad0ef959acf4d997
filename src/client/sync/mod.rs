//! # Sync Engine
//!
//! Drains the pending action queue through the dispatcher whenever the device
//! is online, and keeps the cache's optimistic state in step with the outcome.
//!
//! ## Architecture
//!
//! - **Network Monitor**: connectivity state and transitions
//! - **Visibility**: foreground/background transitions
//! - **Engine**: the `Idle`/`Draining` state machine below
//! - **Scheduler**: periodic and focus-driven cache refetches
//! - **Sync State**: status published for a "syncing…" indicator
//! - **Metrics**: counters for drains and dispatches
//!
//! ## Draining
//!
//! A drain starts when an action is enqueued while online, when connectivity
//! returns with work queued, when a retry timer fires, or on request. It
//! dispatches the head of the queue, one action at a time, in enqueue order:
//! - **Success**: the action is removed and its optimistic effects settle
//! - **Rejected**: the action is removed, its optimistic effects are rolled
//!   back and the user is told; draining continues
//! - **Retryable failure**: draining stops, the action and everything behind
//!   it stay queued, and a retry is scheduled after the backoff delay
//!
//! Only one drain runs at a time. A dispatch that exceeds the dispatch timeout
//! counts as a network failure.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use socialsync::client::offline::ActionKind;
//! use socialsync::client::sync::SyncEngine;
//! use std::sync::Arc;
//!
//! # async fn example(engine: Arc<SyncEngine>) -> Result<(), socialsync::client::error::SyncError> {
//! let handle = engine.start();
//! engine
//!     .enqueue(ActionKind::CreatePost { body: "hello".to_string() })
//!     .await?;
//!
//! let status = engine.status();
//! println!("pending: {}", status.pending);
//! drop(handle);
//! # Ok(())
//! # }
//! ```

pub mod metrics;
pub mod network_monitor;
pub mod scheduler;
pub mod sync_state;
pub mod visibility;

pub use metrics::SyncMetrics;
pub use network_monitor::{ConnectivityMonitor, ConnectivityState};
pub use scheduler::{RefetchScheduler, SchedulerHandle};
pub use sync_state::{EngineState, SyncStatus};
pub use visibility::{Visibility, VisibilityMonitor};

use crate::client::api_client::{ActionDispatcher, DispatchResponse};
use crate::client::cache::RemoteStateCache;
use crate::client::clock::{shifted, Clock, SystemClock};
use crate::client::error::{DispatchError, StoreError, SyncError};
use crate::client::notify::{TracingNotifier, UserNotifier};
use crate::client::offline::optimistic::OptimisticMerger;
use crate::client::offline::queue::{ActionId, ActionKind, PendingAction, PersistentActionStore};
use crate::client::offline::retry::RetryPolicy;
use crate::client::signal::{Signal, Subscription};
use std::collections::HashMap;
use std::sync::{Arc, Mutex as StdMutex, PoisonError, Weak};
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Default bound on a single dispatch
pub const DEFAULT_DISPATCH_TIMEOUT: Duration = Duration::from_secs(15);

/// Why a drain ended before the queue was empty
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DrainStop {
    Offline,
    /// A retryable failure; the drain resumes after `delay`
    RetryScheduled { delay: Duration },
    /// The queue could not be updated
    Storage(String),
}

/// What one drain did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DrainReport {
    pub dispatched: usize,
    pub succeeded: usize,
    pub rejected: usize,
    pub evicted: usize,
    /// `None` when the queue was drained completely
    pub stopped: Option<DrainStop>,
}

enum Step {
    Continue,
    Stop(DrainStop),
}

/// Orchestrates draining of the pending action queue
pub struct SyncEngine {
    store: Mutex<PersistentActionStore>,
    dispatcher: Arc<dyn ActionDispatcher>,
    connectivity: Arc<ConnectivityMonitor>,
    cache: Arc<RemoteStateCache>,
    notifier: Arc<dyn UserNotifier>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    dispatch_timeout: Duration,
    drain_lock: Mutex<()>,
    attempts: StdMutex<HashMap<ActionId, u32>>,
    retry_task: StdMutex<Option<JoinHandle<()>>>,
    status: Signal<SyncStatus>,
    metrics: StdMutex<SyncMetrics>,
    this: Weak<SyncEngine>,
}

/// Builder for [`SyncEngine`]
pub struct SyncEngineBuilder {
    store: PersistentActionStore,
    dispatcher: Arc<dyn ActionDispatcher>,
    connectivity: Arc<ConnectivityMonitor>,
    cache: Arc<RemoteStateCache>,
    notifier: Arc<dyn UserNotifier>,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
    dispatch_timeout: Duration,
}

impl SyncEngineBuilder {
    pub fn notifier(mut self, notifier: Arc<dyn UserNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn dispatch_timeout(mut self, timeout: Duration) -> Self {
        self.dispatch_timeout = timeout;
        self
    }

    pub fn build(self) -> Arc<SyncEngine> {
        let pending = self.store.len();
        Arc::new_cyclic(|this| SyncEngine {
            store: Mutex::new(self.store),
            dispatcher: self.dispatcher,
            connectivity: self.connectivity,
            cache: self.cache,
            notifier: self.notifier,
            clock: self.clock,
            policy: self.policy,
            dispatch_timeout: self.dispatch_timeout,
            drain_lock: Mutex::new(()),
            attempts: StdMutex::new(HashMap::new()),
            retry_task: StdMutex::new(None),
            status: Signal::new(SyncStatus {
                pending,
                ..SyncStatus::default()
            }),
            metrics: StdMutex::new(SyncMetrics::new()),
            this: this.clone(),
        })
    }
}

impl SyncEngine {
    pub fn builder(
        store: PersistentActionStore,
        dispatcher: Arc<dyn ActionDispatcher>,
        connectivity: Arc<ConnectivityMonitor>,
        cache: Arc<RemoteStateCache>,
    ) -> SyncEngineBuilder {
        SyncEngineBuilder {
            store,
            dispatcher,
            connectivity,
            cache,
            notifier: Arc::new(TracingNotifier),
            clock: Arc::new(SystemClock),
            policy: RetryPolicy::default(),
            dispatch_timeout: DEFAULT_DISPATCH_TIMEOUT,
        }
    }

    /// Queue an action, show its effect at once and start draining if online.
    ///
    /// The action is durable when this returns `Ok`.
    pub async fn enqueue(&self, kind: ActionKind) -> Result<ActionId, SyncError> {
        kind.validate()?;
        let action = PendingAction::new(kind, self.clock.now());

        // The store stays locked until the overlay is in place, so a running
        // drain cannot settle the action before its effects exist.
        let pending = {
            let mut store = self.store.lock().await;
            store.append(action.clone()).await?;
            for (key, mutation) in OptimisticMerger::mutations_for(&action) {
                self.cache.apply_optimistic(key, mutation).await;
            }
            store.len()
        };
        tracing::info!(action_id = %action.id, kind = action.kind.name(), pending, "action enqueued");

        self.update_status(|status| status.pending = pending);

        if self.connectivity.is_online() {
            self.trigger_drain();
        }
        Ok(action.id)
    }

    /// Drain now, cancelling any scheduled retry. Waits for a drain already
    /// in progress to finish first.
    pub async fn request_sync(&self) -> DrainReport {
        self.cancel_retry();
        self.drain().await
    }

    /// Dispatch queued actions in order until the queue is empty or a
    /// retryable failure stops the drain.
    pub async fn drain(&self) -> DrainReport {
        let _guard = self.drain_lock.lock().await;
        let mut report = DrainReport::default();

        let started_at = self.clock.now();
        self.with_metrics(|metrics| metrics.record_drain_start(started_at));
        self.update_status(|status| status.state = EngineState::Draining);
        tracing::debug!("drain started");

        loop {
            if !self.connectivity.is_online() {
                report.stopped = Some(DrainStop::Offline);
                break;
            }

            let head = self.store.lock().await.list().into_iter().next();
            let Some(action) = head else {
                break;
            };

            match self.step(&action, &mut report).await {
                Step::Continue => {}
                Step::Stop(stop) => {
                    report.stopped = Some(stop);
                    break;
                }
            }
        }

        let pending = self.store.lock().await.len();
        let now = self.clock.now();
        self.with_metrics(|metrics| metrics.record_drain_end(now));
        self.update_status(|status| {
            status.state = EngineState::Idle;
            status.pending = pending;
            if pending == 0 {
                status.last_synced_at = Some(now);
                status.last_error = None;
                status.next_retry_at = None;
            }
        });

        tracing::info!(
            dispatched = report.dispatched,
            succeeded = report.succeeded,
            rejected = report.rejected,
            evicted = report.evicted,
            pending,
            stopped = ?report.stopped,
            "drain finished"
        );
        report
    }

    /// Current status
    pub fn status(&self) -> SyncStatus {
        self.status.get()
    }

    /// Receive every status change
    pub fn subscribe_status(&self) -> Subscription<SyncStatus> {
        self.status.subscribe()
    }

    pub fn metrics(&self) -> SyncMetrics {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Pending actions in queue order
    pub async fn pending(&self) -> Vec<PendingAction> {
        self.store.lock().await.list()
    }

    pub fn connectivity(&self) -> &Arc<ConnectivityMonitor> {
        &self.connectivity
    }

    pub fn cache(&self) -> &Arc<RemoteStateCache> {
        &self.cache
    }

    /// Listen for connectivity transitions and drain whenever the device
    /// comes back online with work queued.
    pub fn start(&self) -> SyncHandle {
        let mut changes = self.connectivity.subscribe();
        let weak = self.this.clone();

        let listener = tokio::spawn(async move {
            while let Some(state) = changes.recv().await {
                if state != ConnectivityState::Online {
                    continue;
                }
                let Some(engine) = weak.upgrade() else {
                    break;
                };
                if !engine.store.lock().await.is_empty() {
                    tracing::info!("back online with pending actions, draining");
                    engine.cancel_retry();
                    engine.trigger_drain();
                }
            }
        });

        SyncHandle {
            listener: Some(listener),
            engine: self.this.clone(),
        }
    }

    async fn step(&self, action: &PendingAction, report: &mut DrainReport) -> Step {
        report.dispatched += 1;
        self.with_metrics(|metrics| metrics.dispatched += 1);
        tracing::debug!(action_id = %action.id, kind = action.kind.name(), "dispatching action");

        let outcome = match tokio::time::timeout(self.dispatch_timeout, self.dispatcher.dispatch(action)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(DispatchError::network("dispatch timed out")),
        };

        match outcome {
            Ok(response) => match self.complete(action, response).await {
                Ok(()) => {
                    report.succeeded += 1;
                    Step::Continue
                }
                Err(e) => self.storage_failure(e),
            },
            Err(error) if !error.is_retryable() => {
                let notice = format!(
                    "Couldn't deliver {} ({}): {}",
                    action.kind.describe(),
                    action.kind.name(),
                    error
                );
                match self.discard(action, &notice).await {
                    Ok(()) => {
                        tracing::warn!(action_id = %action.id, kind = action.kind.name(), error = %error, "action rejected");
                        report.rejected += 1;
                        self.with_metrics(|metrics| metrics.rejected += 1);
                        Step::Continue
                    }
                    Err(e) => self.storage_failure(e),
                }
            }
            Err(error) => self.retry_later(action, error, report).await,
        }
    }

    async fn retry_later(&self, action: &PendingAction, error: DispatchError, report: &mut DrainReport) -> Step {
        let attempt = {
            let mut attempts = self.attempts.lock().unwrap_or_else(PoisonError::into_inner);
            let count = attempts.entry(action.id).or_insert(0);
            *count = count.saturating_add(1);
            *count
        };
        self.with_metrics(|metrics| metrics.retryable_failures += 1);

        let now = self.clock.now();
        if self.policy.gives_up(attempt, action.created_at, now) {
            let notice = format!(
                "Gave up delivering {} ({}) after {} attempts: {}",
                action.kind.describe(),
                action.kind.name(),
                attempt,
                error
            );
            return match self.discard(action, &notice).await {
                Ok(()) => {
                    tracing::warn!(action_id = %action.id, attempt, "action evicted after repeated failures");
                    report.evicted += 1;
                    self.with_metrics(|metrics| metrics.evicted += 1);
                    Step::Continue
                }
                Err(e) => self.storage_failure(e),
            };
        }

        let delay = self.policy.backoff.delay_for(attempt);
        tracing::warn!(
            action_id = %action.id,
            attempt,
            delay_ms = delay.as_millis() as u64,
            error = %error,
            "dispatch failed, will retry"
        );
        self.update_status(|status| {
            status.last_error = Some(error.to_string());
            status.next_retry_at = Some(shifted(now, delay));
        });
        self.schedule_retry(delay);
        Step::Stop(DrainStop::RetryScheduled { delay })
    }

    async fn complete(&self, action: &PendingAction, response: DispatchResponse) -> Result<(), StoreError> {
        self.store.lock().await.remove(action.id).await?;
        self.forget_attempts(action.id);
        self.with_metrics(|metrics| metrics.succeeded += 1);
        tracing::info!(action_id = %action.id, kind = action.kind.name(), "action delivered");

        self.cache.settle(action.id).await;
        if let DispatchResponse::Message(message) = response {
            self.cache.absorb_sent_message(message).await;
        }
        for (key, _) in OptimisticMerger::mutations_for(action) {
            self.cache.invalidate(key).await;
        }
        Ok(())
    }

    /// Drop an action that can never be delivered
    async fn discard(&self, action: &PendingAction, notice: &str) -> Result<(), StoreError> {
        self.store.lock().await.remove(action.id).await?;
        self.forget_attempts(action.id);
        self.cache.rollback(action.id).await;
        self.notifier.notify_user(notice);
        Ok(())
    }

    fn storage_failure(&self, error: StoreError) -> Step {
        tracing::error!(error = %error, "could not update action queue, stopping drain");
        let message = error.to_string();
        self.update_status(|status| status.last_error = Some(message.clone()));
        Step::Stop(DrainStop::Storage(message))
    }

    pub(crate) fn trigger_drain(&self) {
        let Some(engine) = self.this.upgrade() else {
            return;
        };
        tokio::spawn(async move {
            engine.drain().await;
        });
    }

    fn schedule_retry(&self, delay: Duration) {
        let engine = self.this.clone();
        let clock = Arc::clone(&self.clock);
        let task = tokio::spawn(async move {
            clock.sleep(delay).await;
            if let Some(engine) = engine.upgrade() {
                if engine.connectivity.is_online() {
                    engine.trigger_drain();
                }
            }
        });

        let previous = self
            .retry_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(task);
        if let Some(previous) = previous {
            previous.abort();
        }
    }

    fn cancel_retry(&self) {
        let task = self
            .retry_task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(task) = task {
            task.abort();
            self.update_status(|status| status.next_retry_at = None);
        }
    }

    fn forget_attempts(&self, id: ActionId) {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
    }

    fn update_status(&self, change: impl FnOnce(&mut SyncStatus)) {
        let mut status = self.status.get();
        change(&mut status);
        self.status.set(status);
    }

    fn with_metrics(&self, record: impl FnOnce(&mut SyncMetrics)) {
        let mut metrics = self.metrics.lock().unwrap_or_else(PoisonError::into_inner);
        record(&mut *metrics);
    }
}

impl Drop for SyncEngine {
    fn drop(&mut self) {
        if let Some(task) = self
            .retry_task
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
        {
            task.abort();
        }
    }
}

impl std::fmt::Debug for SyncEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncEngine")
            .field("status", &self.status.get())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

/// Running engine listeners; stops them on shutdown or drop
#[derive(Debug)]
pub struct SyncHandle {
    listener: Option<JoinHandle<()>>,
    engine: Weak<SyncEngine>,
}

impl SyncHandle {
    /// Stop listening for connectivity and cancel any scheduled retry
    pub fn shutdown(&mut self) {
        if let Some(listener) = self.listener.take() {
            listener.abort();
            tracing::info!("sync engine stopped");
        }
        if let Some(engine) = self.engine.upgrade() {
            engine.cancel_retry();
        }
    }
}

impl Drop for SyncHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
