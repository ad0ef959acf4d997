//! # Offline Actions
//!
//! Everything needed to accept a mutating action while offline and show its
//! effect at once.
//!
//! ## Key Components
//!
//! - `queue.rs`: pending action model and the durable action store
//! - `retry.rs`: backoff and give-up policy for retryable failures
//! - `optimistic.rs`: overlay mutations and the merge of overlay onto snapshot
//! - `reconciliation.rs`: which overlay entries a new snapshot confirms

pub mod optimistic;
pub mod queue;
pub mod reconciliation;
pub mod retry;

pub use optimistic::{Mutation, OptimisticMerger, OptimisticMutation};
pub use queue::{ActionId, ActionKind, PendingAction, PersistentActionStore, PENDING_ACTIONS_KEY};
pub use reconciliation::{reconcile_overlay, ReconciliationResult};
pub use retry::{BackoffStrategy, RetryPolicy};
