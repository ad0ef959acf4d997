//! Notifier double that records every call

use socialsync::client::notify::UserNotifier;
use std::sync::Mutex;

#[derive(Default)]
pub struct RecordingNotifier {
    messages: Mutex<Vec<String>>,
    badges: Mutex<Vec<u32>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn badges(&self) -> Vec<u32> {
        self.badges.lock().unwrap().clone()
    }
}

impl UserNotifier for RecordingNotifier {
    fn notify_user(&self, message: &str) {
        self.messages.lock().unwrap().push(message.to_string());
    }

    fn refresh_badge_count(&self, count: u32) {
        self.badges.lock().unwrap().push(count);
    }
}
