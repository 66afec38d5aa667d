//! Axum HTTP surface for the guestlist lifecycle managers.
//!
//! Handlers are a thin imperative shell: parse the request, call one
//! `EditionLifecycle` or `GuestLifecycle` operation, map the result.
//!
//! ```text
//! HTTP request ─▶ handler ─▶ lifecycle manager ─▶ store
//!                    │               │
//!                    ◀── AppError ◀──┘ (LifecycleError)
//! ```
//!
//! Errors map to statuses as follows: validation 422, not found 404, conflict 409,
//! precondition 412, storage 500 with a generic message.

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod router;
pub mod state;

pub use config::{Config, ConfigError};
pub use error::AppError;
pub use extract::ApiJson;
pub use router::build_router;
pub use state::AppState;
