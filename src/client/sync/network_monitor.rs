//! # Network Monitor
//!
//! Holds the connectivity state reported by the platform and publishes every
//! transition. Nothing here polls: the platform integration calls
//! [`ConnectivityMonitor::report`] when it observes a change.
//!
//! ## Features
//!
//! - **Connectivity Detection**: Online/offline status, read synchronously
//! - **Real-time Updates**: channel or callback subscriptions, explicitly
//!   removable

use crate::client::signal::{Signal, Subscription, SubscriptionId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConnectivityState {
    Online,
    Offline,
}

/// Owner of the connectivity state
#[derive(Debug)]
pub struct ConnectivityMonitor {
    state: Signal<ConnectivityState>,
}

impl ConnectivityMonitor {
    pub fn new(initial: ConnectivityState) -> Self {
        tracing::debug!(state = ?initial, "connectivity monitor created");
        Self {
            state: Signal::new(initial),
        }
    }

    pub fn current(&self) -> ConnectivityState {
        self.state.get()
    }

    pub fn is_online(&self) -> bool {
        self.current() == ConnectivityState::Online
    }

    /// Record a platform connectivity event. Returns whether it was a transition.
    pub fn report(&self, state: ConnectivityState) -> bool {
        let changed = self.state.set(state);
        if changed {
            tracing::info!(state = ?state, "connectivity changed");
        }
        changed
    }

    pub fn subscribe(&self) -> Subscription<ConnectivityState> {
        self.state.subscribe()
    }

    pub fn on_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&ConnectivityState) + Send + Sync + 'static,
    {
        self.state.on_change(callback)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.state.unsubscribe(id);
    }
}

impl Default for ConnectivityMonitor {
    fn default() -> Self {
        Self::new(ConnectivityState::Offline)
    }
}
