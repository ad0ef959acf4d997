use crate::common::*;
use pretty_assertions::assert_eq;
use socialsync::client::clock::ManualClock;
use socialsync::client::local_db::{KeyValueStore, LocalDatabase};
use socialsync::client::offline::{ActionKind, PersistentActionStore, PENDING_ACTIONS_KEY};
use socialsync::client::sync::ConnectivityState;
use socialsync::client::{Config, SyncRuntime};
use std::sync::Arc;
use tempfile::TempDir;

async fn build_runtime(
    db: &LocalDatabase,
    dispatcher: Arc<ScriptedDispatcher>,
    connectivity: ConnectivityState,
) -> SyncRuntime {
    SyncRuntime::builder(Config::new())
        .store(Arc::new(db.clone()))
        .dispatcher(dispatcher)
        .fetcher(Arc::new(ScriptedFetcher::new()))
        .notifier(Arc::new(RecordingNotifier::new()))
        .clock(Arc::new(ManualClock::new(epoch())))
        .initial_connectivity(connectivity)
        .build()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_queue_survives_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("local.db");

    let queued = vec![
        ActionKind::CreatePost {
            body: "draft".to_string(),
        },
        ActionKind::SendMessage {
            conversation_id: 7,
            content: "on my way".to_string(),
        },
    ];

    {
        let db = LocalDatabase::open(&path).await.unwrap();
        let dispatcher = Arc::new(ScriptedDispatcher::new());
        let runtime = build_runtime(&db, dispatcher.clone(), ConnectivityState::Offline).await;
        for kind in queued.clone() {
            runtime.engine().enqueue(kind).await.unwrap();
        }
        assert_eq!(dispatcher.calls(), 0);
        drop(runtime);
        db.close().await;
    }

    let db = LocalDatabase::open(&path).await.unwrap();
    let dispatcher = Arc::new(ScriptedDispatcher::new());
    let mut runtime = build_runtime(&db, dispatcher.clone(), ConnectivityState::Online).await;
    assert_eq!(runtime.engine().status().pending, 2);

    runtime.start();
    tokio::time::timeout(std::time::Duration::from_secs(5), async {
        while !runtime.engine().pending().await.is_empty() {
            tokio::task::yield_now().await;
        }
    })
    .await
    .expect("replay did not finish");

    let replayed: Vec<ActionKind> = dispatcher.seen().into_iter().map(|action| action.kind).collect();
    assert_eq!(replayed, queued);
    runtime.shutdown();
}

#[tokio::test]
async fn test_corrupt_queue_is_discarded() {
    let dir = TempDir::new().unwrap();
    let db = LocalDatabase::open(dir.path().join("local.db")).await.unwrap();
    db.set(PENDING_ACTIONS_KEY, "{not json").await.unwrap();

    let store = PersistentActionStore::open(Arc::new(db.clone())).await;
    assert!(store.is_empty());
    assert_eq!(db.get(PENDING_ACTIONS_KEY).await.unwrap(), None);
}

#[tokio::test]
async fn test_badge_count_persists() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("local.db");

    {
        let db = LocalDatabase::open(&path).await.unwrap();
        let runtime = build_runtime(&db, Arc::new(ScriptedDispatcher::new()), ConnectivityState::Offline).await;
        assert!(runtime.badge().update(12).await.unwrap());
        db.close().await;
    }

    let db = LocalDatabase::open(&path).await.unwrap();
    let runtime = build_runtime(&db, Arc::new(ScriptedDispatcher::new()), ConnectivityState::Offline).await;
    assert_eq!(runtime.badge().current().await, 12);
}
