//! # User Notifications
//!
//! Outward-facing collaborator the core reports to: a notice for an action
//! that can never be delivered, and the badge count for downstream display.
//! Both calls are fire-and-forget; the core never waits on or inspects them.

/// Receiver of user-facing notices
pub trait UserNotifier: Send + Sync {
    /// Tell the user something they need to know about (e.g. a dropped action)
    fn notify_user(&self, message: &str);

    /// Update the notification badge
    fn refresh_badge_count(&self, count: u32);
}

/// Notifier that only writes to the log
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl UserNotifier for TracingNotifier {
    fn notify_user(&self, message: &str) {
        tracing::warn!(notice = %message, "user notice");
    }

    fn refresh_badge_count(&self, count: u32) {
        tracing::info!(count, "badge count updated");
    }
}
