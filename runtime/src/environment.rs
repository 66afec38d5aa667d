//! Dependencies injected into the lifecycle managers.

use guestlist_core::environment::Clock;
use guestlist_core::export::{CsvRenderer, ExportRenderer};
use guestlist_core::invite::InviteLinkBuilder;
use guestlist_core::notification::Notifier;
use guestlist_core::store::{EditionStore, GuestStore};
use std::sync::Arc;

/// Everything a lifecycle manager needs from the outside world.
///
/// Cloning is cheap; every collaborator is behind an `Arc`.
#[derive(Clone)]
pub struct LifecycleEnvironment {
    /// Source of "now" for every timestamp written
    pub clock: Arc<dyn Clock>,
    /// Edition persistence
    pub editions: Arc<dyn EditionStore>,
    /// Guest and preselection persistence
    pub guests: Arc<dyn GuestStore>,
    /// Receives a notification after each committed transition
    pub notifier: Arc<dyn Notifier>,
    /// Builds invite links
    pub invites: InviteLinkBuilder,
    /// Renders archive exports
    pub exporter: Arc<dyn ExportRenderer>,
}

impl LifecycleEnvironment {
    /// Creates an environment that exports archives as CSV
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        editions: Arc<dyn EditionStore>,
        guests: Arc<dyn GuestStore>,
        notifier: Arc<dyn Notifier>,
        invites: InviteLinkBuilder,
    ) -> Self {
        Self {
            clock,
            editions,
            guests,
            notifier,
            invites,
            exporter: Arc::new(CsvRenderer),
        }
    }

    /// Replaces the archive export renderer
    #[must_use]
    pub fn with_exporter(mut self, exporter: Arc<dyn ExportRenderer>) -> Self {
        self.exporter = exporter;
        self
    }
}
