//! Properties of the persistent action store

use crate::{action_kind, block_on};
use chrono::Utc;
use proptest::prelude::*;
use socialsync::client::local_db::{KeyValueStore, MemoryStore};
use socialsync::client::offline::{PendingAction, PersistentActionStore};
use std::sync::Arc;

proptest! {
    #[test]
    fn test_append_keeps_order_across_reopen(kinds in prop::collection::vec(action_kind(), 0..20)) {
        block_on(async {
            let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
            let mut store = PersistentActionStore::open(Arc::clone(&kv)).await;
            let mut appended = Vec::new();
            for kind in kinds {
                let action = PendingAction::new(kind, Utc::now());
                store.append(action.clone()).await.unwrap();
                appended.push(action);
            }

            let reopened = PersistentActionStore::open(kv).await;
            prop_assert_eq!(store.list(), appended.clone());
            prop_assert_eq!(reopened.list(), appended);
            Ok::<(), TestCaseError>(())
        })?;
    }

    #[test]
    fn test_remove_is_idempotent(
        kinds in prop::collection::vec(action_kind(), 1..10),
        pick in any::<prop::sample::Index>(),
    ) {
        block_on(async {
            let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
            let mut store = PersistentActionStore::open(Arc::clone(&kv)).await;
            for kind in kinds {
                store.append(PendingAction::new(kind, Utc::now())).await.unwrap();
            }

            let before = store.list();
            let victim = before[pick.index(before.len())].id;
            store.remove(victim).await.unwrap();
            let once = store.list();
            store.remove(victim).await.unwrap();

            prop_assert_eq!(store.list(), once.clone());
            prop_assert_eq!(once.len(), before.len() - 1);
            prop_assert!(!store.contains(victim));

            let expected: Vec<_> = before.into_iter().filter(|action| action.id != victim).collect();
            prop_assert_eq!(PersistentActionStore::open(kv).await.list(), expected);
            Ok::<(), TestCaseError>(())
        })?;
    }
}
