//! User-facing notifications and client events.
//!
//! The API client raises [`ClientEvent`]s over an unbounded channel; the
//! application drains them into a [`NotificationManager`] and reacts to
//! forced logouts.

use std::collections::VecDeque;
use std::fmt;
use std::time::{Duration, Instant};

use tokio::sync::mpsc;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    Info,
    Success,
    Warning,
    Error,
}

impl NotificationKind {
    /// Get the prefix printed before the message.
    pub fn icon(&self) -> &'static str {
        match self {
            NotificationKind::Info => "ℹ",
            NotificationKind::Success => "✓",
            NotificationKind::Warning => "⚠",
            NotificationKind::Error => "✗",
        }
    }

    /// How long notifications of this kind stay visible.
    pub fn default_duration(&self) -> Duration {
        match self {
            NotificationKind::Info | NotificationKind::Success => Duration::from_secs(3),
            NotificationKind::Warning => Duration::from_secs(4),
            NotificationKind::Error => Duration::from_secs(5),
        }
    }
}

/// A single notification message.
#[derive(Debug, Clone)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: String,
    /// Secondary line, usually the server's `detail`.
    pub caption: Option<String>,
    pub created_at: Instant,
    pub duration: Duration,
}

impl Notification {
    /// Create a notification with the kind's default duration.
    pub fn new(kind: NotificationKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            caption: None,
            created_at: Instant::now(),
            duration: kind.default_duration(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Info, message)
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Success, message)
    }

    pub fn warning(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Warning, message)
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::new(NotificationKind::Error, message)
    }

    /// Attach a caption.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.caption = Some(caption.into());
        self
    }

    /// Create a notification with a custom duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Check if the notification has expired.
    pub fn is_expired(&self) -> bool {
        self.created_at.elapsed() > self.duration
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.kind.icon(), self.message)?;
        if let Some(caption) = &self.caption {
            write!(f, ": {}", caption)?;
        }
        Ok(())
    }
}

/// Events raised by the API client for the application to handle.
#[derive(Debug, Clone)]
pub enum ClientEvent {
    /// Show a notification.
    Notify(Notification),
    /// The session could not be refreshed; the user must log in again.
    LoginRequired,
}

/// Sending half of the client event channel.
pub type EventSender = mpsc::UnboundedSender<ClientEvent>;

/// Receiving half of the client event channel.
pub type EventReceiver = mpsc::UnboundedReceiver<ClientEvent>;

/// Create a client event channel.
pub fn channel() -> (EventSender, EventReceiver) {
    mpsc::unbounded_channel()
}

/// A bounded queue of notifications with expiry.
#[derive(Debug)]
pub struct NotificationManager {
    notifications: VecDeque<Notification>,
    max_visible: usize,
    login_required: bool,
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationManager {
    pub fn new() -> Self {
        Self::with_max_visible(3)
    }

    /// Create a notification manager with a custom max visible count.
    pub fn with_max_visible(max_visible: usize) -> Self {
        Self {
            notifications: VecDeque::new(),
            max_visible,
            login_required: false,
        }
    }

    /// Add a notification, dropping the oldest past the limit.
    pub fn push(&mut self, notification: Notification) {
        self.notifications.push_back(notification);
        while self.notifications.len() > self.max_visible {
            self.notifications.pop_front();
        }
    }

    pub fn info(&mut self, message: impl Into<String>) {
        self.push(Notification::info(message));
    }

    pub fn success(&mut self, message: impl Into<String>) {
        self.push(Notification::success(message));
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.push(Notification::warning(message));
    }

    pub fn error(&mut self, message: impl Into<String>) {
        self.push(Notification::error(message));
    }

    /// Pull every pending event off the channel without waiting.
    ///
    /// Returns the number of events handled.
    pub fn drain(&mut self, events: &mut EventReceiver) -> usize {
        let mut handled = 0;
        while let Ok(event) = events.try_recv() {
            match event {
                ClientEvent::Notify(notification) => self.push(notification),
                ClientEvent::LoginRequired => self.login_required = true,
            }
            handled += 1;
        }
        handled
    }

    /// Whether a forced logout was seen since the last call. Resets the flag.
    pub fn take_login_required(&mut self) -> bool {
        std::mem::take(&mut self.login_required)
    }

    /// Remove expired notifications.
    pub fn tick(&mut self) {
        self.notifications.retain(|n| !n.is_expired());
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.notifications.is_empty()
    }

    pub fn len(&self) -> usize {
        self.notifications.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Notification> {
        self.notifications.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_notification_default_durations() {
        assert_eq!(Notification::info("x").duration, Duration::from_secs(3));
        assert_eq!(Notification::success("x").duration, Duration::from_secs(3));
        assert_eq!(Notification::warning("x").duration, Duration::from_secs(4));
        assert_eq!(Notification::error("x").duration, Duration::from_secs(5));
    }

    #[test]
    fn test_notification_display_with_caption() {
        let n = Notification::warning("Resource not found").with_caption("Issue 42");
        assert_eq!(n.to_string(), "⚠ Resource not found: Issue 42");
        assert_eq!(Notification::success("Saved").to_string(), "✓ Saved");
    }

    #[test]
    fn test_notification_is_expired() {
        let n = Notification::info("Test").with_duration(Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert!(n.is_expired());
        assert!(!Notification::info("Test").is_expired());
    }

    #[test]
    fn test_notification_manager_max_visible() {
        let mut manager = NotificationManager::with_max_visible(2);
        manager.info("first");
        manager.error("second");
        manager.success("third");

        assert_eq!(manager.len(), 2);
        let messages: Vec<_> = manager.iter().map(|n| n.message.as_str()).collect();
        assert_eq!(messages, vec!["second", "third"]);
    }

    #[test]
    fn test_notification_manager_tick() {
        let mut manager = NotificationManager::new();
        manager.push(Notification::info("short").with_duration(Duration::from_millis(0)));
        manager.warning("long");
        std::thread::sleep(Duration::from_millis(5));

        manager.tick();
        assert_eq!(manager.len(), 1);
        manager.clear();
        assert!(manager.is_empty());
    }

    #[tokio::test]
    async fn test_drain_events() {
        let (tx, mut rx) = channel();
        tx.send(ClientEvent::Notify(Notification::error("Server error")))
            .unwrap();
        tx.send(ClientEvent::LoginRequired).unwrap();

        let mut manager = NotificationManager::new();
        assert_eq!(manager.drain(&mut rx), 2);
        assert_eq!(manager.len(), 1);
        assert!(manager.take_login_required());
        assert!(!manager.take_login_required());
    }
}
