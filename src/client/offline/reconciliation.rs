//! # State Reconciliation
//!
//! Decides which overlay entries survive a new server snapshot. An entry is
//! dropped once the snapshot confirms it, or once its action was delivered
//! (settled); everything else is still in flight and is kept in order.

use crate::client::cache::CacheValue;
use crate::client::offline::optimistic::{OptimisticMerger, OptimisticMutation};
use crate::client::offline::queue::ActionId;

/// Outcome of reconciling one cache entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconciliationResult {
    /// Overlay entries the server snapshot now reflects
    pub confirmed: Vec<ActionId>,
    /// Delivered entries dropped without a visible confirmation
    pub settled: Vec<ActionId>,
    /// Entries kept because their action is still in flight
    pub still_pending: Vec<ActionId>,
}

impl ReconciliationResult {
    pub fn dropped(&self) -> usize {
        self.confirmed.len() + self.settled.len()
    }
}

/// Split `overlay` into what the new `snapshot` has absorbed and what remains
pub fn reconcile_overlay(
    snapshot: &CacheValue,
    overlay: Vec<OptimisticMutation>,
) -> (Vec<OptimisticMutation>, ReconciliationResult) {
    let mut result = ReconciliationResult::default();
    let mut retained = Vec::with_capacity(overlay.len());

    for mutation in overlay {
        if OptimisticMerger::is_confirmed(&mutation, snapshot) {
            result.confirmed.push(mutation.correlation_id);
        } else if mutation.settled {
            result.settled.push(mutation.correlation_id);
        } else {
            result.still_pending.push(mutation.correlation_id);
            retained.push(mutation);
        }
    }

    (retained, result)
}
