//! User-facing capture notifications.

use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub title: String,
    pub message: String,
}

impl Notification {
    pub fn credentials_updated(count: usize) -> Self {
        Self {
            title: "n8n credentials updated".to_string(),
            message: format!("Found {} credentials", count),
        }
    }
}

/// Best-effort delivery. Implementations must return promptly and swallow
/// their own failures.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: &Notification);
}

/// Writes notifications to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notification: &Notification) {
        info!("{}: {}", notification.title, notification.message);
    }
}
