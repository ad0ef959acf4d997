//! # Signals
//!
//! A value that changes over time and tells its subscribers about each change.
//! Connectivity, app visibility and sync status are all published this way.
//!
//! Subscribing and unsubscribing are explicit: every subscription gets a
//! [`SubscriptionId`], and [`Signal::unsubscribe`] removes it. A channel
//! subscription also goes away once its [`Subscription`] is dropped.
//! Subscribers are not notified in any guaranteed order.
//!
//! ## Usage
//!
//! ```rust
//! use socialsync::client::signal::Signal;
//!
//! # async fn example() {
//! let signal = Signal::new(0u32);
//! let mut changes = signal.subscribe();
//! signal.set(1);
//! assert_eq!(changes.recv().await, Some(1));
//! # }
//! ```

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;

/// Handle identifying one subscription
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Callback<T> = Arc<dyn Fn(&T) + Send + Sync>;

enum Subscriber<T> {
    Channel(mpsc::UnboundedSender<T>),
    Callback(Callback<T>),
}

struct SignalInner<T> {
    value: T,
    next_id: u64,
    subscribers: Vec<(SubscriptionId, Subscriber<T>)>,
}

/// Observable value with explicit subscriptions
pub struct Signal<T> {
    inner: Mutex<SignalInner<T>>,
}

/// Receiving end of a channel subscription
#[derive(Debug)]
pub struct Subscription<T> {
    id: SubscriptionId,
    receiver: mpsc::UnboundedReceiver<T>,
}

impl<T> Subscription<T> {
    pub fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Wait for the next change; `None` once unsubscribed
    pub async fn recv(&mut self) -> Option<T> {
        self.receiver.recv().await
    }

    /// Next change if one is already buffered
    pub fn try_recv(&mut self) -> Option<T> {
        self.receiver.try_recv().ok()
    }
}

impl<T: Clone + PartialEq + Send + 'static> Signal<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Mutex::new(SignalInner {
                value: initial,
                next_id: 0,
                subscribers: Vec::new(),
            }),
        }
    }

    /// Current value
    pub fn get(&self) -> T {
        self.lock().value.clone()
    }

    /// Replace the value, notifying subscribers if it changed.
    ///
    /// Returns whether a change was published.
    pub fn set(&self, value: T) -> bool {
        let callbacks: Vec<Callback<T>> = {
            let mut inner = self.lock();
            if inner.value == value {
                return false;
            }
            inner.value = value.clone();
            inner.subscribers.retain(|(_, subscriber)| match subscriber {
                Subscriber::Channel(sender) => sender.send(value.clone()).is_ok(),
                Subscriber::Callback(_) => true,
            });
            inner
                .subscribers
                .iter()
                .filter_map(|(_, subscriber)| match subscriber {
                    Subscriber::Callback(callback) => Some(Arc::clone(callback)),
                    Subscriber::Channel(_) => None,
                })
                .collect()
        };

        // Callbacks run outside the lock so they may read or update the signal.
        for callback in callbacks {
            callback(&value);
        }
        true
    }

    /// Subscribe through a channel
    pub fn subscribe(&self) -> Subscription<T> {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.register(Subscriber::Channel(sender));
        Subscription { id, receiver }
    }

    /// Subscribe with a callback invoked on every change
    pub fn on_change<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        self.register(Subscriber::Callback(Arc::new(callback)))
    }

    /// Remove a subscription. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.lock().subscribers.retain(|(existing, _)| *existing != id);
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        let mut inner = self.lock();
        inner.subscribers.retain(|(_, subscriber)| match subscriber {
            Subscriber::Channel(sender) => !sender.is_closed(),
            Subscriber::Callback(_) => true,
        });
        inner.subscribers.len()
    }

    fn register(&self, subscriber: Subscriber<T>) -> SubscriptionId {
        let mut inner = self.lock();
        let id = SubscriptionId(inner.next_id);
        inner.next_id += 1;
        inner.subscribers.push((id, subscriber));
        id
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SignalInner<T>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("subscribers", &inner.subscribers.len())
            .finish()
    }
}
