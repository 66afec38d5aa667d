//! Offline check-in reconciler.
//!
//! Door staff keep checking guests in while the venue network is down. A check-in the
//! server cannot be reached for is written to the ledger and shown as done locally.
//! Replay submits the captured time as the intended check-in time, so the server
//! records when the guest actually arrived.
//!
//! A guest reads as checked in when the server says so or when an unsynced local
//! record exists. That predicate gates `check_in`, which keeps the ledger at one
//! record per guest for this reconciler.
//!
//! The ledger may be shared with reconcilers in other processes, typically a door
//! client capturing check-ins and a sync agent replaying them. Every write merges
//! into the stored records, and each replay pass starts by merging, so records
//! captured elsewhere are picked up instead of overwritten.

use crate::gateway::{CheckinGateway, GatewayError};
use crate::ledger::{CheckinLedger, LedgerError, OfflineCheckinRecord};
use chrono::{DateTime, Utc};
use guestlist_core::LifecycleError;
use guestlist_core::environment::Clock;
use guestlist_core::types::{Guest, GuestId};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, PoisonError};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// Reconciler errors.
#[derive(Error, Debug)]
pub enum OfflineError {
    /// The server refused the check-in (not confirmed, unknown guest, ...)
    #[error("check-in rejected: {0}")]
    Rejected(#[source] LifecycleError),

    /// The ledger could not be read or written
    #[error(transparent)]
    Ledger(#[from] LedgerError),
}

/// What happened to a check-in attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CheckinOutcome {
    /// The server checked the guest in
    Confirmed(Guest),
    /// The server was unreachable; the check-in was queued for replay
    Queued(OfflineCheckinRecord),
    /// The guest already reads as checked in; nothing was submitted
    AlreadyCheckedIn,
}

/// Result of one replay pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Records the server accepted
    pub synced: usize,
    /// Records the server already had (conflict); marked synced too
    pub already_present: usize,
    /// Records left unsynced for the next pass
    pub still_pending: usize,
    /// Records skipped because a request for the guest was already in flight
    pub skipped_in_flight: usize,
}

#[derive(Default)]
struct LocalState {
    records: Vec<OfflineCheckinRecord>,
    server_checked_in: HashMap<GuestId, DateTime<Utc>>,
}

impl LocalState {
    fn has_unsynced(&self, guest_id: GuestId) -> bool {
        self.records
            .iter()
            .any(|record| record.guest_id == guest_id && !record.synced)
    }

    fn is_checked_in(&self, guest_id: GuestId) -> bool {
        self.server_checked_in.contains_key(&guest_id) || self.has_unsynced(guest_id)
    }

    fn mark_synced(&mut self, guest_id: GuestId) {
        for record in &mut self.records {
            if record.guest_id == guest_id {
                record.synced = true;
            }
        }
    }

    fn observe(&mut self, guest: &Guest) {
        match guest.checked_in_at {
            Some(at) => {
                self.server_checked_in.insert(guest.id, at);
            }
            None => {
                self.server_checked_in.remove(&guest.id);
            }
        }
    }
}

/// Guests with a request outstanding. The guard removes its entry when dropped, so
/// a cancelled request does not block the guest forever.
#[derive(Default)]
struct InFlight {
    guests: std::sync::Mutex<HashSet<GuestId>>,
}

impl InFlight {
    fn claim(self: &Arc<Self>, guest_id: GuestId) -> Option<InFlightGuard> {
        let inserted = self
            .guests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(guest_id);
        inserted.then(|| InFlightGuard {
            in_flight: Arc::clone(self),
            guest_id,
        })
    }
}

struct InFlightGuard {
    in_flight: Arc<InFlight>,
    guest_id: GuestId,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight
            .guests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.guest_id);
    }
}

struct Inner {
    gateway: Arc<dyn CheckinGateway>,
    ledger: Arc<dyn CheckinLedger>,
    clock: Arc<dyn Clock>,
    state: Mutex<LocalState>,
    in_flight: Arc<InFlight>,
}

/// Client-side check-in front end with an offline queue. Clones share state.
#[derive(Clone)]
pub struct OfflineReconciler {
    inner: Arc<Inner>,
}

impl OfflineReconciler {
    /// Opens the reconciler over an existing ledger, picking up records left unsynced
    /// by a previous run.
    ///
    /// # Errors
    ///
    /// `Ledger` if the ledger cannot be loaded
    pub async fn open(
        gateway: Arc<dyn CheckinGateway>,
        ledger: Arc<dyn CheckinLedger>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, OfflineError> {
        let records = ledger.load().await?;
        let pending = records.iter().filter(|record| !record.synced).count();
        if pending > 0 {
            info!(pending, "loaded unsynced offline check-ins");
        }

        Ok(Self {
            inner: Arc::new(Inner {
                gateway,
                ledger,
                clock,
                state: Mutex::new(LocalState {
                    records,
                    server_checked_in: HashMap::new(),
                }),
                in_flight: Arc::default(),
            }),
        })
    }

    /// Whether the guest reads as checked in: confirmed by the server, or captured
    /// offline and not yet synced.
    pub async fn is_checked_in(&self, guest_id: GuestId) -> bool {
        self.inner.state.lock().await.is_checked_in(guest_id)
    }

    /// Replaces the local view of server check-ins with `guests`.
    pub async fn apply_server_snapshot(&self, guests: &[Guest]) {
        let mut state = self.inner.state.lock().await;
        state.server_checked_in = guests
            .iter()
            .filter_map(|guest| guest.checked_in_at.map(|at| (guest.id, at)))
            .collect();
    }

    /// Fetches the confirmed guest list and applies it as the server snapshot.
    ///
    /// # Errors
    ///
    /// The gateway error if the list cannot be fetched
    pub async fn refresh(&self) -> Result<Vec<Guest>, GatewayError> {
        let guests = self.inner.gateway.confirmed_guests().await?;
        self.apply_server_snapshot(&guests).await;
        Ok(guests)
    }

    /// Checks a guest in, queueing the check-in when the server is unreachable.
    ///
    /// # Errors
    ///
    /// - `Rejected` if the server refuses (not confirmed, unknown guest, ...)
    /// - `Ledger` if a queued record cannot be persisted
    pub async fn check_in(
        &self,
        guest_id: GuestId,
        checked_in_by: &str,
    ) -> Result<CheckinOutcome, OfflineError> {
        if self.is_checked_in(guest_id).await {
            debug!(%guest_id, "guest already reads as checked in");
            return Ok(CheckinOutcome::AlreadyCheckedIn);
        }
        let Some(_guard) = self.inner.in_flight.claim(guest_id) else {
            debug!(%guest_id, "check-in already in flight");
            return Ok(CheckinOutcome::AlreadyCheckedIn);
        };

        match self
            .inner
            .gateway
            .check_in(guest_id, checked_in_by, None)
            .await
        {
            Ok(guest) => {
                self.inner.state.lock().await.observe(&guest);
                info!(%guest_id, checked_in_by, "checked in guest online");
                Ok(CheckinOutcome::Confirmed(guest))
            }
            Err(GatewayError::Unreachable(reason)) => {
                let record = OfflineCheckinRecord::captured(
                    guest_id,
                    checked_in_by.to_string(),
                    self.inner.clock.now(),
                );
                let mut state = self.inner.state.lock().await;
                if state.is_checked_in(guest_id) {
                    return Ok(CheckinOutcome::AlreadyCheckedIn);
                }
                state.records.push(record.clone());
                state.records = self.inner.ledger.merge(state.records.clone()).await?;
                warn!(%guest_id, checked_in_by, %reason, "server unreachable, check-in queued");
                Ok(CheckinOutcome::Queued(record))
            }
            Err(GatewayError::Rejected(error)) => Err(OfflineError::Rejected(error)),
        }
    }

    /// One replay pass over the unsynced records.
    ///
    /// The pass first merges with the stored ledger, picking up records other
    /// writers captured since the last pass. Records whose guest already has a request in flight are skipped. A conflict
    /// means the server already has the check-in, so the record counts as synced.
    /// Anything else stays pending for the next pass.
    ///
    /// # Errors
    ///
    /// `Ledger` if the ledger cannot be read or the updated records cannot be persisted
    pub async fn sync_pending(&self) -> Result<SyncReport, OfflineError> {
        let pending: Vec<OfflineCheckinRecord> = {
            let mut state = self.inner.state.lock().await;
            state.records = self.inner.ledger.merge(state.records.clone()).await?;
            state
                .records
                .iter()
                .filter(|record| !record.synced)
                .cloned()
                .collect()
        };

        let mut report = SyncReport::default();
        for record in pending {
            let Some(_guard) = self.inner.in_flight.claim(record.guest_id) else {
                report.skipped_in_flight += 1;
                continue;
            };

            let result = self
                .inner
                .gateway
                .check_in(
                    record.guest_id,
                    &record.checked_in_by,
                    Some(record.captured_at),
                )
                .await;

            let mut state = self.inner.state.lock().await;
            match result {
                Ok(guest) => {
                    state.observe(&guest);
                    state.mark_synced(record.guest_id);
                    report.synced += 1;
                    info!(guest_id = %record.guest_id, captured_at = %record.captured_at, "replayed offline check-in");
                }
                Err(error) if error.is_conflict() => {
                    state
                        .server_checked_in
                        .entry(record.guest_id)
                        .or_insert(record.captured_at);
                    state.mark_synced(record.guest_id);
                    report.already_present += 1;
                    debug!(guest_id = %record.guest_id, "server already had the check-in");
                }
                Err(error) => {
                    report.still_pending += 1;
                    warn!(guest_id = %record.guest_id, error = %error, "offline check-in replay failed");
                    continue;
                }
            }
            state.records = self.inner.ledger.merge(state.records.clone()).await?;
        }

        if report != SyncReport::default() {
            info!(
                synced = report.synced,
                already_present = report.already_present,
                still_pending = report.still_pending,
                skipped_in_flight = report.skipped_in_flight,
                "offline sync pass finished"
            );
        }
        Ok(report)
    }

    /// Every record in the ledger, synced or not
    pub async fn records(&self) -> Vec<OfflineCheckinRecord> {
        self.inner.state.lock().await.records.clone()
    }

    /// Number of records awaiting replay
    pub async fn pending_count(&self) -> usize {
        self.inner
            .state
            .lock()
            .await
            .records
            .iter()
            .filter(|record| !record.synced)
            .count()
    }

    /// Runs `sync_pending` every `interval` until `shutdown` turns `true`.
    ///
    /// Ledger failures are logged and retried on the next tick.
    pub async fn run(&self, interval: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        info!(interval_secs = interval.as_secs_f64(), "offline reconciler started");

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    if let Err(e) = self.sync_pending().await {
                        warn!(error = %e, "offline sync pass failed");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("offline reconciler stopped");
    }
}
