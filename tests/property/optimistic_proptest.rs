//! Overlay merge and reconciliation properties

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use socialsync::client::cache::CacheValue;
use socialsync::client::offline::{
    reconcile_overlay, ActionKind, Mutation, OptimisticMerger, OptimisticMutation, PendingAction,
};
use socialsync::shared::messaging::ChatMessage;

fn sends(contents: &[String]) -> Vec<(PendingAction, OptimisticMutation)> {
    let start = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap();
    contents
        .iter()
        .enumerate()
        .map(|(i, content)| {
            let action = PendingAction::new(
                ActionKind::SendMessage {
                    conversation_id: 7,
                    content: content.clone(),
                },
                start + Duration::seconds(i as i64),
            );
            let (_, mutation) = OptimisticMerger::mutations_for(&action)
                .into_iter()
                .next()
                .unwrap();
            (action, mutation)
        })
        .collect()
}

fn server_copy(mutation: &OptimisticMutation, id: i64) -> ChatMessage {
    match &mutation.change {
        Mutation::AppendMessage(message) => ChatMessage {
            id: Some(id),
            pending: false,
            ..message.clone()
        },
        other => panic!("unexpected mutation {:?}", other),
    }
}

proptest! {
    #[test]
    fn test_confirmed_prefix_leaves_rest_pending(
        contents in prop::collection::vec("[a-z]{1,12}", 1..10),
        confirmed in 0usize..10,
    ) {
        let confirmed = confirmed.min(contents.len());
        let sent = sends(&contents);
        let overlay: Vec<_> = sent.iter().map(|(_, mutation)| mutation.clone()).collect();

        let server: Vec<ChatMessage> = overlay[..confirmed]
            .iter()
            .enumerate()
            .map(|(i, mutation)| server_copy(mutation, i as i64 + 1))
            .collect();
        let snapshot = CacheValue::Messages(server.clone());

        let (retained, result) = reconcile_overlay(&snapshot, overlay.clone());
        prop_assert_eq!(result.confirmed.len(), confirmed);
        prop_assert_eq!(&retained[..], &overlay[confirmed..]);

        // Merging before or after reconciliation shows the same list
        let before = OptimisticMerger::merge(&snapshot, &overlay);
        let after = OptimisticMerger::merge(&snapshot, &retained);
        prop_assert_eq!(&before, &after);

        let CacheValue::Messages(visible) = after else {
            panic!("messages expected");
        };
        prop_assert_eq!(visible.len(), contents.len());
        prop_assert_eq!(&visible[..confirmed], &server[..]);
    }

    #[test]
    fn test_fully_confirmed_overlay_is_invisible(contents in prop::collection::vec("[a-z]{1,12}", 0..10)) {
        let overlay: Vec<_> = sends(&contents).into_iter().map(|(_, mutation)| mutation).collect();
        let server: Vec<ChatMessage> = overlay
            .iter()
            .enumerate()
            .map(|(i, mutation)| server_copy(mutation, i as i64 + 1))
            .collect();
        let snapshot = CacheValue::Messages(server);

        prop_assert_eq!(OptimisticMerger::merge(&snapshot, &overlay), snapshot.clone());
        let (retained, _) = reconcile_overlay(&snapshot, overlay);
        prop_assert!(retained.is_empty());
    }
}
