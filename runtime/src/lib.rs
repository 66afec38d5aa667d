//! # Guestlist Runtime
//!
//! The lifecycle managers that own every state change of editions, guests and
//! preselections, plus the webhook dispatcher that announces committed transitions.
//!
//! Managers are thin orchestrators: validation and state rules come from
//! `guestlist-core`, persistence goes through the store traits, and each committed
//! transition hands a [`Notification`](guestlist_core::Notification) to the injected
//! [`Notifier`](guestlist_core::Notifier). Delivery never feeds back into the result.
//!
//! ## Example
//!
//! ```rust,ignore
//! use guestlist_runtime::{EditionLifecycle, GuestLifecycle, LifecycleEnvironment};
//!
//! let env = LifecycleEnvironment::new(clock, store.clone(), store, notifier, invites);
//! let guests = GuestLifecycle::new(env.clone());
//! let ana = guests.invite(profile).await?;
//! let ana = guests.confirm(GuestLookup::Id(ana.id)).await?;
//! guests.check_in(ana.id, "staff1").await?;
//! ```

pub mod editions;
pub mod environment;
pub mod guests;
pub mod metrics;
pub mod webhook;

pub use editions::{ArchiveResult, EditionLifecycle};
pub use environment::LifecycleEnvironment;
pub use guests::{GuestLifecycle, Promotion};
pub use webhook::{DeliveryError, DeliveryOutcome, WebhookConfig, WebhookDispatcher};
