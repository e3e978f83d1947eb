//! Transient user notifications.
//!
//! Page-level controllers report outcomes here; the presentation layer
//! drains the receiver and shows them (toasts, status lines).

use serde::Serialize;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    pub timestamp: String,
}

/// Sending half of the notification stream.
///
/// A notifier without a receiver, or whose receiver was dropped, discards
/// everything it is given.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    sender: Option<mpsc::UnboundedSender<Notification>>,
}

impl Notifier {
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Notification>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { sender: Some(tx) }, rx)
    }

    pub fn disabled() -> Self {
        Self::default()
    }

    pub fn success(&self, message: impl Into<String>) {
        self.emit(NotificationLevel::Success, message.into());
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(NotificationLevel::Error, message.into());
    }

    fn emit(&self, level: NotificationLevel, message: String) {
        let Some(sender) = &self.sender else {
            return;
        };
        let notification = Notification {
            level,
            message,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };
        // Receiver gone means nobody is displaying notifications anymore.
        let _ = sender.send(notification);
    }
}
