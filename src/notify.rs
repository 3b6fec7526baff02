//! Notification port
//!
//! The toast widget itself lives outside the engine. The engine only hands it
//! a message and never waits for or inspects the result.

use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub title: String,
    pub message: String,
    /// Placement hint for the widget (e.g. "top-right")
    pub location: String,
    pub dismissable: bool,
}

/// Fire-and-forget sink for user-visible messages
pub trait Notifier {
    fn notify(&self, notification: Notification);
}

/// Writes notifications to the log (native host)
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        info!(
            title = %notification.title,
            location = %notification.location,
            "{}",
            notification.message
        );
    }
}

/// Keeps every notification for later inspection
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    sent: RefCell<Vec<Notification>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.borrow().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent.borrow().iter().map(|n| n.message.clone()).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.sent.borrow_mut().push(notification);
    }
}
