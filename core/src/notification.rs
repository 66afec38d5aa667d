//! Webhook notifications produced by lifecycle transitions.
//!
//! A `Notification` is a description of something that happened, built by the lifecycle
//! managers after a transition commits. Delivering it is the dispatcher's job; nothing
//! here performs I/O.

use crate::types::{Guest, Preselection};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;

/// The four event kinds that can be delivered to a webhook endpoint
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookKind {
    /// A guest was invited (directly or through promotion)
    GuestAdded,
    /// A guest confirmed attendance
    GuestConfirmed,
    /// A guest was checked in at the venue
    GuestCheckedIn,
    /// A preselection became a guest
    PreselectionPromoted,
}

impl WebhookKind {
    /// Every kind, in declaration order
    pub const ALL: [Self; 4] = [
        Self::GuestAdded,
        Self::GuestConfirmed,
        Self::GuestCheckedIn,
        Self::PreselectionPromoted,
    ];

    /// Wire name, used as the payload's `event` field
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::GuestAdded => "guest_added",
            Self::GuestConfirmed => "guest_confirmed",
            Self::GuestCheckedIn => "guest_checked_in",
            Self::PreselectionPromoted => "preselection_promoted",
        }
    }
}

impl fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A committed state change to announce
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Notification {
    /// A guest was created
    GuestAdded {
        /// Snapshot after creation
        guest: Guest,
    },
    /// A guest confirmed
    GuestConfirmed {
        /// Snapshot after confirmation
        guest: Guest,
    },
    /// A guest was checked in
    GuestCheckedIn {
        /// Snapshot after check-in
        guest: Guest,
    },
    /// A preselection was promoted
    PreselectionPromoted {
        /// The preselection after promotion
        preselection: Preselection,
        /// The guest it became
        guest: Guest,
    },
}

impl Notification {
    /// Which endpoint this notification goes to
    #[must_use]
    pub const fn kind(&self) -> WebhookKind {
        match self {
            Self::GuestAdded { .. } => WebhookKind::GuestAdded,
            Self::GuestConfirmed { .. } => WebhookKind::GuestConfirmed,
            Self::GuestCheckedIn { .. } => WebhookKind::GuestCheckedIn,
            Self::PreselectionPromoted { .. } => WebhookKind::PreselectionPromoted,
        }
    }

    /// The guest the notification is about
    #[must_use]
    pub const fn guest(&self) -> &Guest {
        match self {
            Self::GuestAdded { guest }
            | Self::GuestConfirmed { guest }
            | Self::GuestCheckedIn { guest }
            | Self::PreselectionPromoted { guest, .. } => guest,
        }
    }

    /// Canonical JSON body for the endpoint.
    ///
    /// Every payload carries `event` and `occurred_at`; the timestamp is the one the
    /// transition wrote, so replays of the same notification produce the same body.
    #[must_use]
    pub fn payload(&self) -> Value {
        let kind = self.kind().as_str();
        match self {
            Self::GuestAdded { guest } => json!({
                "event": kind,
                "occurred_at": guest.registered_at,
                "guest": guest,
            }),
            Self::GuestConfirmed { guest } => json!({
                "event": kind,
                "occurred_at": guest.confirmed_at,
                "guest": guest,
            }),
            Self::GuestCheckedIn { guest } => json!({
                "event": kind,
                "occurred_at": guest.checked_in_at,
                "checked_in_by": guest.checked_in_by,
                "guest": guest,
            }),
            Self::PreselectionPromoted {
                preselection,
                guest,
            } => json!({
                "event": kind,
                "occurred_at": preselection.promoted_at,
                "preselection": preselection,
                "guest_id": guest.id,
                "invite_url": guest.invite_url,
            }),
        }
    }
}

/// Sink for committed transitions.
///
/// `notify` must return immediately: delivery happens off the caller's path and its
/// outcome never reaches the transition that produced the notification.
pub trait Notifier: Send + Sync {
    /// Schedules delivery of `notification`
    fn notify(&self, notification: Notification);
}

/// Notifier that drops everything, for deployments without webhooks
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _notification: Notification) {}
}
