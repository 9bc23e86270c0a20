//! User-facing toast messages.
//!
//! Services push here instead of failing the user action; the front-end drains
//! the queue and shows whatever arrived.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NotificationLevel {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for NotificationLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            NotificationLevel::Success => "success",
            NotificationLevel::Info => "info",
            NotificationLevel::Warning => "warning",
            NotificationLevel::Error => "error",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

/// Shared, cloneable notification queue.
#[derive(Debug, Clone, Default)]
pub struct Notifier {
    queue: Arc<Mutex<Vec<Notification>>>,
}

impl Notifier {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, level: NotificationLevel, message: impl Into<String>) {
        let message = message.into();
        debug!(%level, %message, "notification");
        self.lock().push(Notification { level, message });
    }

    pub fn success(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Success, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Info, message);
    }

    pub fn warning(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Warning, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.push(NotificationLevel::Error, message);
    }

    /// Take every pending notification, oldest first.
    #[must_use]
    pub fn drain(&self) -> Vec<Notification> {
        std::mem::take(&mut *self.lock())
    }

    #[must_use]
    pub fn snapshot(&self) -> Vec<Notification> {
        self.lock().clone()
    }

    #[must_use]
    pub fn count(&self, level: NotificationLevel) -> usize {
        self.lock().iter().filter(|n| n.level == level).count()
    }

    // A panicking writer cannot leave a half-pushed Vec behind.
    fn lock(&self) -> MutexGuard<'_, Vec<Notification>> {
        self.queue.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drain_empties_in_order() {
        let notifier = Notifier::new();
        notifier.success("saved");
        notifier.warning("progress not saved");

        let clone = notifier.clone();
        assert_eq!(clone.count(NotificationLevel::Warning), 1);

        let drained = notifier.drain();
        assert_eq!(
            drained.iter().map(|n| n.level).collect::<Vec<_>>(),
            vec![NotificationLevel::Success, NotificationLevel::Warning]
        );
        assert!(clone.snapshot().is_empty());
    }
}
