//! Notifier that records instead of delivering.

use guestlist_core::notification::{Notification, Notifier, WebhookKind};
use std::sync::{Arc, Mutex, PoisonError};

/// Captures every notification handed to it, in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingNotifier {
    recorded: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingNotifier {
    /// Creates an empty recorder
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything recorded so far
    #[must_use]
    pub fn notifications(&self) -> Vec<Notification> {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Kinds recorded so far, in order
    #[must_use]
    pub fn kinds(&self) -> Vec<WebhookKind> {
        self.notifications().iter().map(Notification::kind).collect()
    }

    /// How many notifications of `kind` were recorded
    #[must_use]
    pub fn count(&self, kind: WebhookKind) -> usize {
        self.kinds().into_iter().filter(|k| *k == kind).count()
    }

    /// Forgets everything recorded
    pub fn clear(&self) {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notification: Notification) {
        self.recorded
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notification);
    }
}
