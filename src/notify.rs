//! Notification log and desktop notifications.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use crate::model::{EntityId, Notification, Timestamp};

/// Entries kept in the in-store log
pub const DEFAULT_NOTIFICATION_CAP: usize = 20;

/// Whether the user allowed desktop notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationPermission {
    Granted,
    Denied,
    #[default]
    Default,
}

/// Desktop notification sink
pub trait Notifier {
    fn permission(&self) -> NotificationPermission;
    fn display(&self, title: &str, body: &str);

    /// Show only when permission was granted
    fn show(&self, title: &str, body: &str) {
        if self.permission() == NotificationPermission::Granted {
            self.display(title, body);
        }
    }
}

/// Never shows anything
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn permission(&self) -> NotificationPermission {
        NotificationPermission::Denied
    }

    fn display(&self, _title: &str, _body: &str) {}
}

/// Emits notifications as log events
#[derive(Debug, Clone, Copy)]
pub struct LogNotifier {
    permission: NotificationPermission,
}

impl LogNotifier {
    pub fn new(permission: NotificationPermission) -> Self {
        Self { permission }
    }
}

impl Notifier for LogNotifier {
    fn permission(&self) -> NotificationPermission {
        self.permission
    }

    fn display(&self, title: &str, body: &str) {
        tracing::info!(title, body, "desktop notification");
    }
}

/// Keeps every displayed notification; clones share the same buffer
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    permission: NotificationPermission,
    shown: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn granted() -> Self {
        Self::with_permission(NotificationPermission::Granted)
    }

    pub fn with_permission(permission: NotificationPermission) -> Self {
        Self {
            permission,
            shown: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn shown(&self) -> Vec<(String, String)> {
        self.shown
            .lock()
            .map(|shown| shown.clone())
            .unwrap_or_default()
    }
}

impl Notifier for RecordingNotifier {
    fn permission(&self) -> NotificationPermission {
        self.permission
    }

    fn display(&self, title: &str, body: &str) {
        if let Ok(mut shown) = self.shown.lock() {
            shown.push((title.to_string(), body.to_string()));
        }
    }
}

/// Prepend a new unread entry and trim the log to `cap`
pub fn push_notification(
    log: &mut Vec<Notification>,
    id: EntityId,
    message: impl Into<String>,
    now: Timestamp,
    cap: usize,
) {
    log.insert(
        0,
        Notification {
            id,
            message: message.into(),
            read: false,
            timestamp: now,
        },
    );
    log.truncate(cap);
}

pub fn unread_count(log: &[Notification]) -> usize {
    log.iter().filter(|entry| !entry.read).count()
}

/// Badge text: nothing when all read, "9+" past nine
pub fn unread_badge(log: &[Notification]) -> Option<String> {
    match unread_count(log) {
        0 => None,
        n if n > 9 => Some("9+".to_string()),
        n => Some(n.to_string()),
    }
}
