use crate::common::*;
use socialsync::client::cache::{CacheKey, CacheValue};
use socialsync::client::error::FetchError;
use socialsync::client::local_db::KeyValueStore;
use socialsync::client::sync::{ConnectivityState, RefetchScheduler, Visibility, VisibilityMonitor};
use std::sync::Arc;
use std::time::Duration;

fn unread(value: Option<CacheValue>) -> u32 {
    value.map_or(0, |value| value.unread_total())
}

#[tokio::test]
async fn test_superseded_fetch_is_discarded() {
    let h = Harness::offline().await;
    h.fetcher.set_conversations(vec![conversation(7, 1, None)]);
    h.fetcher.gate();

    let slow = {
        let cache = Arc::clone(&h.cache);
        tokio::spawn(async move { cache.get(CacheKey::ConversationList).await })
    };
    h.fetcher.wait_started().await;

    h.cache
        .reconcile(
            CacheKey::ConversationList,
            CacheValue::Conversations(vec![conversation(7, 3, Some(epoch()))]),
        )
        .await;
    h.fetcher.release();

    let entry = slow.await.unwrap().unwrap();
    assert_eq!(entry.visible().unread_total(), 3);
    assert_eq!(unread(h.cache.peek(CacheKey::ConversationList).await), 3);
}

#[tokio::test]
async fn test_badge_follows_unread_total() {
    let h = Harness::offline().await;
    h.fetcher
        .set_conversations(vec![conversation(1, 2, None), conversation(2, 3, None)]);

    h.cache.get(CacheKey::ConversationList).await.unwrap();
    assert_eq!(h.notifier.badges(), vec![5]);
    assert_eq!(h.kv.get("badge_count").await.unwrap().as_deref(), Some("5"));

    // Unchanged total, no refresh
    h.cache.invalidate(CacheKey::ConversationList).await;
    h.cache.get(CacheKey::ConversationList).await.unwrap();
    assert_eq!(h.notifier.badges(), vec![5]);

    h.fetcher.set_conversations(vec![conversation(1, 0, None)]);
    h.cache.invalidate(CacheKey::ConversationList).await;
    h.cache.get(CacheKey::ConversationList).await.unwrap();
    assert_eq!(h.notifier.badges(), vec![5, 0]);
}

#[tokio::test]
async fn test_failed_fetch_keeps_cached_value() {
    let h = Harness::offline().await;
    h.fetcher.set_conversations(vec![conversation(1, 4, None)]);
    h.cache.get(CacheKey::ConversationList).await.unwrap();

    h.fetcher.set_offline(true);
    h.cache.invalidate(CacheKey::ConversationList).await;
    let entry = h.cache.get(CacheKey::ConversationList).await.unwrap();
    assert_eq!(entry.visible().unread_total(), 4);

    let missing = h.cache.get(CacheKey::Messages(9)).await;
    assert!(matches!(missing, Err(FetchError::Network(_))));
}

#[tokio::test]
async fn test_mount_refetches_when_policy_asks() {
    let h = Harness::offline().await;
    h.cache.get(CacheKey::Messages(3)).await.unwrap();
    h.cache.mount(CacheKey::Messages(3)).await.unwrap();
    assert_eq!(h.fetcher.calls(), 2);
}

#[tokio::test]
async fn test_scheduler_tick_skipped_offline() {
    let h = Harness::offline().await;
    h.cache.get(CacheKey::ConversationList).await.unwrap();
    h.clock.advance(Duration::from_secs(60));

    let scheduler = RefetchScheduler::new(
        Arc::clone(&h.cache),
        Arc::clone(&h.connectivity),
        Arc::new(VisibilityMonitor::default()),
        h.clock.clone(),
    );
    assert_eq!(scheduler.tick().await, 0);

    h.go_online();
    assert_eq!(scheduler.tick().await, 1);
}

#[tokio::test]
async fn test_scheduler_refetches_on_focus_and_reconnect() {
    let h = Harness::offline().await;
    h.cache.get(CacheKey::ConversationList).await.unwrap();
    let visibility = Arc::new(VisibilityMonitor::default());

    let mut handle = RefetchScheduler::new(
        Arc::clone(&h.cache),
        Arc::clone(&h.connectivity),
        Arc::clone(&visibility),
        h.clock.clone(),
    )
    .start();
    assert!(handle.is_running());

    // Focus while offline fetches nothing
    visibility.report(Visibility::Background);
    visibility.report(Visibility::Foreground);
    yield_many().await;
    assert_eq!(h.fetcher.calls(), 1);

    h.connectivity.report(ConnectivityState::Online);
    visibility.report(Visibility::Background);
    visibility.report(Visibility::Foreground);
    yield_many().await;
    assert_eq!(h.fetcher.calls(), 2);

    handle.shutdown();
    assert!(!handle.is_running());
}
