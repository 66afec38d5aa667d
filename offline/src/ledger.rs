//! Durable ledger of check-ins captured while the server was unreachable.
//!
//! Records are never deleted. Replay flips `synced` to `true`, which keeps an audit
//! trail of what was captured offline and when.
//!
//! The door client that captures records and the agent that replays them may run in
//! different processes over the same file. Writers therefore go through
//! [`CheckinLedger::merge`], which folds the caller's view into what is stored instead
//! of overwriting it.

use chrono::{DateTime, Utc};
use guestlist_core::types::GuestId;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tracing::warn;

const LOCK_RETRY: Duration = Duration::from_millis(25);
const LOCK_TIMEOUT: Duration = Duration::from_secs(5);
const STALE_LOCK_AGE: Duration = Duration::from_secs(30);

/// A check-in captured locally, pending (or done) replay against the server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfflineCheckinRecord {
    /// Guest that arrived
    pub guest_id: GuestId,
    /// Staff member who let them in
    pub checked_in_by: String,
    /// When the arrival was captured; replayed as the check-in time
    pub captured_at: DateTime<Utc>,
    /// Whether the server has acknowledged the check-in
    pub synced: bool,
}

impl OfflineCheckinRecord {
    /// A fresh, unsynced record
    #[must_use]
    pub const fn captured(guest_id: GuestId, checked_in_by: String, captured_at: DateTime<Utc>) -> Self {
        Self {
            guest_id,
            checked_in_by,
            captured_at,
            synced: false,
        }
    }

    fn same_capture(&self, other: &Self) -> bool {
        self.guest_id == other.guest_id && self.captured_at == other.captured_at
    }
}

/// Folds `local` into `stored`. Records are matched by guest and capture time; a
/// record is synced if either side says so. Stored order is kept and records only
/// `local` knows about are appended.
#[must_use]
pub fn merge_records(
    mut stored: Vec<OfflineCheckinRecord>,
    local: Vec<OfflineCheckinRecord>,
) -> Vec<OfflineCheckinRecord> {
    for record in local {
        match stored.iter_mut().find(|existing| existing.same_capture(&record)) {
            Some(existing) => existing.synced |= record.synced,
            None => stored.push(record),
        }
    }
    stored
}

/// Ledger persistence errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Reading or writing the ledger file failed
    #[error("ledger I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// The ledger file is not valid JSON
    #[error("ledger is corrupt: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Another writer held the ledger lock for too long
    #[error("ledger is locked by another writer: {}", .0.display())]
    Locked(PathBuf),
}

/// Boxed future returned by [`CheckinLedger`] methods.
pub type LedgerFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, LedgerError>> + Send + 'a>>;

/// Storage for offline check-in records.
///
/// Several reconcilers may share one ledger. Each keeps its own view and calls
/// [`merge`](Self::merge) after every change, adopting the returned list.
pub trait CheckinLedger: Send + Sync {
    /// All records, in capture order. An absent ledger is empty.
    fn load(&self) -> LedgerFuture<'_, Vec<OfflineCheckinRecord>>;

    /// Replaces the stored records.
    fn persist(&self, records: Vec<OfflineCheckinRecord>) -> LedgerFuture<'_, ()>;

    /// Merges `records` into the stored ones (see [`merge_records`]), persists the
    /// result and returns it. Atomic against other writers of the same ledger.
    fn merge(&self, records: Vec<OfflineCheckinRecord>) -> LedgerFuture<'_, Vec<OfflineCheckinRecord>>;
}

/// JSON file ledger. Writes go to a sibling temp file first and are renamed into
/// place, so a crash mid-write leaves the previous ledger intact.
///
/// `merge` holds a sibling `.lock` file, created exclusively, for the whole
/// read-merge-write. A lock older than 30 seconds is treated as left behind by a
/// crashed writer and removed.
#[derive(Clone, Debug)]
pub struct FileLedger {
    path: PathBuf,
    lock_timeout: Duration,
}

impl FileLedger {
    /// Ledger stored at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock_timeout: LOCK_TIMEOUT,
        }
    }

    /// How long `merge` waits for another writer's lock (default 5 seconds)
    #[must_use]
    pub fn with_lock_timeout(mut self, timeout: Duration) -> Self {
        self.lock_timeout = timeout;
        self
    }

    /// Location of the ledger file
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.file_name().unwrap_or_default().to_os_string();
        name.push(suffix);
        self.path.with_file_name(name)
    }

    fn temp_path(&self) -> PathBuf {
        self.sibling(".tmp")
    }

    fn lock_path(&self) -> PathBuf {
        self.sibling(".lock")
    }

    async fn ensure_parent(&self) -> Result<(), LedgerError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    async fn lock(&self) -> Result<LedgerLock, LedgerError> {
        self.ensure_parent().await?;
        let path = self.lock_path();
        let deadline = tokio::time::Instant::now() + self.lock_timeout;
        loop {
            match tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await
            {
                Ok(_) => return Ok(LedgerLock { path }),
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if lock_is_stale(&path).await {
                        warn!(lock = %path.display(), "removing stale ledger lock");
                        match tokio::fs::remove_file(&path).await {
                            Ok(()) => continue,
                            Err(e) if e.kind() == ErrorKind::NotFound => continue,
                            Err(e) => return Err(e.into()),
                        }
                    }
                    if tokio::time::Instant::now() >= deadline {
                        return Err(LedgerError::Locked(path));
                    }
                    tokio::time::sleep(LOCK_RETRY).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

async fn lock_is_stale(path: &Path) -> bool {
    let Ok(metadata) = tokio::fs::metadata(path).await else {
        return false;
    };
    metadata
        .modified()
        .ok()
        .and_then(|modified| SystemTime::now().duration_since(modified).ok())
        .is_some_and(|age| age > STALE_LOCK_AGE)
}

/// Exclusive hold on a ledger file, released on drop.
struct LedgerLock {
    path: PathBuf,
}

impl Drop for LedgerLock {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            warn!(lock = %self.path.display(), error = %e, "failed to release ledger lock");
        }
    }
}

impl CheckinLedger for FileLedger {
    fn load(&self) -> LedgerFuture<'_, Vec<OfflineCheckinRecord>> {
        Box::pin(async move {
            match tokio::fs::read(&self.path).await {
                Ok(bytes) if bytes.is_empty() => Ok(Vec::new()),
                Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
                Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
                Err(e) => Err(e.into()),
            }
        })
    }

    fn persist(&self, records: Vec<OfflineCheckinRecord>) -> LedgerFuture<'_, ()> {
        Box::pin(async move {
            self.ensure_parent().await?;
            let bytes = serde_json::to_vec_pretty(&records)?;
            let temp = self.temp_path();
            tokio::fs::write(&temp, bytes).await?;
            tokio::fs::rename(&temp, &self.path).await?;
            Ok(())
        })
    }

    fn merge(&self, records: Vec<OfflineCheckinRecord>) -> LedgerFuture<'_, Vec<OfflineCheckinRecord>> {
        Box::pin(async move {
            let _lock = self.lock().await?;
            let merged = merge_records(self.load().await?, records);
            self.persist(merged.clone()).await?;
            Ok(merged)
        })
    }
}

/// In-memory ledger. Clones share the same records, which lets a test "restart" a
/// reconciler over the ledger a previous one wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryLedger {
    records: Arc<Mutex<Vec<OfflineCheckinRecord>>>,
}

impl MemoryLedger {
    /// Empty ledger
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the stored records
    #[must_use]
    pub fn snapshot(&self) -> Vec<OfflineCheckinRecord> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl CheckinLedger for MemoryLedger {
    fn load(&self) -> LedgerFuture<'_, Vec<OfflineCheckinRecord>> {
        let records = self.snapshot();
        Box::pin(async move { Ok(records) })
    }

    fn persist(&self, records: Vec<OfflineCheckinRecord>) -> LedgerFuture<'_, ()> {
        *self.records.lock().unwrap_or_else(PoisonError::into_inner) = records;
        Box::pin(async { Ok(()) })
    }

    fn merge(&self, records: Vec<OfflineCheckinRecord>) -> LedgerFuture<'_, Vec<OfflineCheckinRecord>> {
        let mut stored = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        let merged = merge_records(std::mem::take(&mut *stored), records);
        stored.clone_from(&merged);
        Box::pin(async move { Ok(merged) })
    }
}
