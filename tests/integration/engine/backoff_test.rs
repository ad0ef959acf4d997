use crate::common::*;
use assert_matches::assert_matches;
use async_trait::async_trait;
use socialsync::client::api_client::{ActionDispatcher, DispatchResponse};
use socialsync::client::cache::{CachePolicies, RemoteStateCache};
use socialsync::client::clock::ManualClock;
use socialsync::client::error::DispatchError;
use socialsync::client::local_db::MemoryStore;
use socialsync::client::offline::{ActionKind, BackoffStrategy, PendingAction, PersistentActionStore, RetryPolicy};
use socialsync::client::sync::{ConnectivityMonitor, ConnectivityState, DrainStop, SyncEngine};
use std::sync::Arc;
use std::time::Duration;

fn exponential(base_secs: u64, max_secs: u64) -> RetryPolicy {
    RetryPolicy {
        backoff: BackoffStrategy::Exponential {
            base: Duration::from_secs(base_secs),
            max: Duration::from_secs(max_secs),
        },
        ..RetryPolicy::default()
    }
}

#[tokio::test]
async fn test_retry_timer_follows_backoff() {
    let h = Harness::with_policy(exponential(1, 3)).await;
    h.dispatcher.push_transient(503).push_offline().push_transient(502);

    h.engine.enqueue(ActionKind::LikePost { post_id: 9 }).await.unwrap();
    h.go_online();

    let report = h.engine.drain().await;
    assert_eq!(
        report.stopped,
        Some(DrainStop::RetryScheduled {
            delay: Duration::from_secs(1)
        })
    );
    assert_eq!(h.engine.status().next_retry_at, Some(epoch() + chrono::Duration::seconds(1)));

    // Not yet due
    h.advance(Duration::from_millis(999)).await;
    assert_eq!(h.dispatcher.calls(), 1);

    h.advance(Duration::from_millis(1)).await;
    h.wait_for_calls(2).await;
    h.wait_status(|status| status.next_retry_at == Some(epoch() + chrono::Duration::seconds(3)) && !status.is_syncing())
        .await;

    h.advance(Duration::from_secs(2)).await;
    h.wait_for_calls(3).await;
    // 4s, capped to 3s
    let status = h
        .wait_status(|status| status.next_retry_at == Some(epoch() + chrono::Duration::seconds(6)) && !status.is_syncing())
        .await;
    assert_eq!(status.pending, 1);
    assert!(status.last_error.is_some());

    h.advance(Duration::from_secs(3)).await;
    h.settle().await;
    assert_eq!(h.dispatcher.calls(), 4);
    assert_eq!(h.engine.status().next_retry_at, None);
    assert_eq!(h.engine.metrics().retryable_failures, 3);
}

#[tokio::test]
async fn test_gives_up_after_max_attempts() {
    let policy = RetryPolicy {
        backoff: BackoffStrategy::Fixed(Duration::from_millis(10)),
        max_attempts: Some(2),
        max_age: None,
    };
    let h = Harness::with_policy(policy).await;
    h.dispatcher.push_transient(500).push_transient(500);

    h.engine.enqueue(ActionKind::LikePost { post_id: 1 }).await.unwrap();
    h.engine.enqueue(ActionKind::LikePost { post_id: 2 }).await.unwrap();
    h.go_online();

    let first = h.engine.drain().await;
    assert_matches!(first.stopped, Some(DrainStop::RetryScheduled { .. }));

    let second = h.engine.request_sync().await;
    assert_eq!(second.evicted, 1);
    assert_eq!(second.succeeded, 1);
    assert!(h.engine.pending().await.is_empty());

    let notices = h.notifier.messages();
    assert_eq!(notices.len(), 1);
    assert!(notices[0].starts_with("Gave up delivering"));
}

#[tokio::test]
async fn test_gives_up_on_old_actions() {
    let policy = RetryPolicy {
        max_age: Some(chrono::Duration::hours(1)),
        ..RetryPolicy::default()
    };
    let h = Harness::with_policy(policy).await;
    h.dispatcher.push_offline();

    h.engine.enqueue(ActionKind::LikePost { post_id: 1 }).await.unwrap();
    h.clock.advance(Duration::from_secs(2 * 60 * 60));
    h.go_online();

    let report = h.engine.drain().await;
    assert_eq!(report.evicted, 1);
    assert_eq!(report.stopped, None);
}

struct Hanging;

#[async_trait]
impl ActionDispatcher for Hanging {
    async fn dispatch(&self, _action: &PendingAction) -> Result<DispatchResponse, DispatchError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn test_slow_dispatch_times_out_as_network_failure() {
    let clock = Arc::new(ManualClock::new(epoch()));
    let cache = Arc::new(RemoteStateCache::new(
        Arc::new(ScriptedFetcher::new()),
        clock.clone(),
        CachePolicies::default(),
    ));
    let store = PersistentActionStore::open(Arc::new(MemoryStore::new())).await;
    let engine = SyncEngine::builder(
        store,
        Arc::new(Hanging),
        Arc::new(ConnectivityMonitor::new(ConnectivityState::Offline)),
        cache,
    )
    .clock(clock)
    .dispatch_timeout(Duration::from_secs(15))
    .build();

    engine.enqueue(ActionKind::LikePost { post_id: 1 }).await.unwrap();
    engine.connectivity().report(ConnectivityState::Online);
    let report = engine.drain().await;

    assert_matches!(report.stopped, Some(DrainStop::RetryScheduled { .. }));
    assert_eq!(engine.status().pending, 1);
    assert_eq!(
        engine.status().last_error.as_deref(),
        Some("network unavailable: dispatch timed out")
    );
}
