//! Foreground/background state of the app, as reported by the platform.

use crate::client::signal::{Signal, Subscription, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Foreground,
    Background,
}

#[derive(Debug)]
pub struct VisibilityMonitor {
    state: Signal<Visibility>,
}

impl VisibilityMonitor {
    pub fn new(initial: Visibility) -> Self {
        Self {
            state: Signal::new(initial),
        }
    }

    pub fn current(&self) -> Visibility {
        self.state.get()
    }

    pub fn report(&self, visibility: Visibility) -> bool {
        let changed = self.state.set(visibility);
        if changed {
            tracing::debug!(visibility = ?visibility, "visibility changed");
        }
        changed
    }

    pub fn subscribe(&self) -> Subscription<Visibility> {
        self.state.subscribe()
    }

    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.state.unsubscribe(id);
    }
}

impl Default for VisibilityMonitor {
    fn default() -> Self {
        Self::new(Visibility::Foreground)
    }
}
