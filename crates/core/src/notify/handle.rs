use tokio::sync::mpsc;

use super::{Notification, Notifier};

/// Channel-backed notifier.
///
/// This is cheaply cloneable and can be shared across tasks. Notifications are
/// pushed without blocking; a full or closed channel drops the notification
/// and logs the reason.
#[derive(Clone)]
pub struct NotificationHandle {
    tx: mpsc::Sender<Notification>,
}

impl NotificationHandle {
    /// Create a new handle from a channel sender
    pub fn new(tx: mpsc::Sender<Notification>) -> Self {
        Self { tx }
    }

    /// Create a handle together with the receiving end of its channel.
    pub fn channel(buffer_size: usize) -> (Self, mpsc::Receiver<Notification>) {
        let (tx, rx) = mpsc::channel(buffer_size);
        (Self::new(tx), rx)
    }

    /// Try to send a notification without blocking
    ///
    /// Returns true if the notification was queued, false otherwise.
    pub fn try_send(&self, notification: Notification) -> bool {
        match self.tx.try_send(notification) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!("Failed to deliver notification: {}", e);
                false
            }
        }
    }
}

impl Notifier for NotificationHandle {
    fn notify(&self, notification: Notification) {
        self.try_send(notification);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::NotificationLevel;

    #[test]
    fn test_notify_delivers() {
        let (handle, mut rx) = NotificationHandle::channel(10);

        handle.notify(Notification::success("Ticket assigned successfully!", Some("t-1")));

        let received = rx.try_recv().expect("Should receive notification");
        assert_eq!(received.level, NotificationLevel::Success);
        assert_eq!(received.message, "Ticket assigned successfully!");
    }

    #[test]
    fn test_multiple_handles_same_channel() {
        let (handle1, mut rx) = NotificationHandle::channel(10);
        let handle2 = handle1.clone();

        handle1.notify(Notification::success("first", None));
        handle2.notify(Notification::error("second", None));

        assert_eq!(rx.try_recv().unwrap().message, "first");
        assert_eq!(rx.try_recv().unwrap().message, "second");
    }

    #[test]
    fn test_try_send_full_channel() {
        let (handle, _rx) = NotificationHandle::channel(1);

        assert!(handle.try_send(Notification::success("fits", None)));
        // Second should fail (channel full)
        assert!(!handle.try_send(Notification::success("dropped", None)));
    }

    #[test]
    fn test_notify_closed_channel() {
        let (handle, rx) = NotificationHandle::channel(10);
        drop(rx);

        // This should not panic, just log an error
        handle.notify(Notification::error("nobody listening", None));
        assert!(!handle.try_send(Notification::error("still nobody", None)));
    }
}
