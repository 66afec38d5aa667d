//! # Guestlist Core
//!
//! Domain types and pure rules for managing invited guests across editions of a
//! recurring event.
//!
//! ## Core Concepts
//!
//! - **Edition**: a time-boxed instance of the event; exactly one is active
//! - **Guest**: an invited participant, `invited → confirmed → checked-in`
//! - **Preselection**: a candidate not yet invited; promoted into a guest
//! - **Notification**: description of a committed transition, delivered by webhooks
//! - **Stores**: traits the lifecycle managers persist through
//!
//! This crate performs no I/O. The managers live in `guestlist-runtime`, the stores in
//! `guestlist-postgres` and `guestlist-testing`.
//!
//! ## Example
//!
//! ```
//! use guestlist_core::invite::build_invite_url;
//!
//! let url = build_invite_url("ana@x.com", Some("Bruno"), "https://evento.example.com/confirmar");
//! assert!(url.ends_with("emailconf=ana@x.com&utm_source=Bruno"));
//! ```

pub mod environment;
pub mod error;
pub mod export;
pub mod invite;
pub mod naming;
pub mod notification;
pub mod phone;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use error::{LifecycleError, StoreError};
pub use notification::{Notification, Notifier, WebhookKind};
pub use types::*;

/// Result type for lifecycle operations
pub type LifecycleResult<T> = Result<T, LifecycleError>;
