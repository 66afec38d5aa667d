//! Offline check-in support for door-staff clients.
//!
//! - [`ledger`]: durable record of check-ins captured while offline
//! - [`gateway`]: the server's check-in transition, over HTTP or in-process
//! - [`reconciler`]: optimistic local check-in plus periodic replay
//! - [`config`]: client settings from the environment

#![forbid(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod gateway;
pub mod ledger;
pub mod reconciler;

pub use config::ClientConfig;
pub use gateway::{CheckinGateway, GatewayError, HttpCheckinGateway, LocalCheckinGateway};
pub use ledger::{CheckinLedger, FileLedger, LedgerError, MemoryLedger, OfflineCheckinRecord};
pub use reconciler::{CheckinOutcome, OfflineError, OfflineReconciler, SyncReport};
