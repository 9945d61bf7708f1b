//! Result notifications for queue actions.
//!
//! The queue controller reports every action outcome through a [`Notifier`].
//! Presentation layers decide how to surface them (toast, WebSocket push, log).

mod handle;

pub use handle::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Whether a notification reports a success or a failure.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum NotificationLevel {
    Success,
    Error,
}

/// A single user-facing outcome message.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    /// Ticket the outcome refers to, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ticket_id: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn success(message: impl Into<String>, ticket_id: Option<&str>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
            ticket_id: ticket_id.map(String::from),
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: impl Into<String>, ticket_id: Option<&str>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            ticket_id: ticket_id.map(String::from),
            timestamp: Utc::now(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.level == NotificationLevel::Error
    }
}

/// Sink for action outcome notifications.
///
/// Implementations must not block; a notification that can't be delivered is
/// dropped (and logged), never propagated back to the action.
pub trait Notifier: Send + Sync {
    fn notify(&self, notification: Notification);
}

/// Notifier that only writes log lines.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            NotificationLevel::Success => tracing::info!(
                ticket_id = notification.ticket_id.as_deref(),
                "{}",
                notification.message
            ),
            NotificationLevel::Error => tracing::warn!(
                ticket_id = notification.ticket_id.as_deref(),
                "{}",
                notification.message
            ),
        }
    }
}
