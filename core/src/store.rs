//! Store traits for editions, guests and preselections.
//!
//! The lifecycle managers never talk to a database directly. They go through these
//! traits, which spell out exactly which writes must be atomic:
//!
//! - `find_or_create_active`, `create_active`, `activate` and `archive_and_rotate` keep
//!   the "at most one active edition" invariant without read-then-write races.
//! - `mark_confirmed`, `mark_checked_in` and `clear_check_in` are conditional updates:
//!   they return `None` when the guard did not hold, so two racing check-ins yield one
//!   winner.
//! - `promote` inserts the guest and flips the preselection in one transaction.
//!
//! # Implementations
//!
//! - `PgLifecycleStore` (in `guestlist-postgres`): production implementation
//! - `InMemoryStore` (in `guestlist-testing`): fast, deterministic testing
//!
//! # Dyn Compatibility
//!
//! Methods return `Pin<Box<dyn Future>>` instead of using `async fn` so the stores can
//! be shared as `Arc<dyn EditionStore>` / `Arc<dyn GuestStore>`.

use crate::error::StoreError;
use crate::types::{
    EditionId, EditionSummary, EventEdition, Guest, GuestId, Preselection, PreselectionId,
};
use chrono::{DateTime, Utc};
use std::future::Future;
use std::pin::Pin;

/// Boxed future returned by every store method
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Result of an archive-and-rotate attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ArchiveOutcome {
    /// The edition was archived and `next` is now the only active edition
    Rotated {
        /// The edition as archived
        archived: EventEdition,
        /// The freshly created active edition
        next: EventEdition,
    },
    /// No edition with that id
    NotFound,
    /// The edition had been archived before; nothing changed
    AlreadyArchived,
}

/// Result of a promotion attempt
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PromotionOutcome {
    /// Guest created and preselection marked promoted, in one transaction
    Promoted {
        /// The new guest
        guest: Guest,
        /// The preselection after promotion
        preselection: Preselection,
    },
    /// No preselection with that id
    NotFound,
    /// The preselection was promoted before; nothing changed
    AlreadyPromoted,
}

/// Durable storage of event editions.
pub trait EditionStore: Send + Sync {
    /// Returns the active, non-archived edition, inserting `candidate` as the active
    /// edition if there is none. Atomic: concurrent callers all observe the same edition.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn find_or_create_active(&self, candidate: EventEdition) -> StoreFuture<'_, EventEdition>;

    /// Deactivates every active edition and inserts `edition` as the active one.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn create_active(&self, edition: EventEdition) -> StoreFuture<'_, EventEdition>;

    /// Loads an edition.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn get_edition(&self, id: EditionId) -> StoreFuture<'_, Option<EventEdition>>;

    /// Deactivates the current active edition and activates `id`, leaving `archived`
    /// untouched. Returns `None`, changing nothing, if `id` does not exist or is archived.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn activate(&self, id: EditionId) -> StoreFuture<'_, Option<EventEdition>>;

    /// Archives `id` (`archived = true`, `active = false`, `ended_at`) and inserts `next`
    /// as the active edition, in one transaction.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn archive_and_rotate(
        &self,
        id: EditionId,
        ended_at: DateTime<Utc>,
        next: EventEdition,
    ) -> StoreFuture<'_, ArchiveOutcome>;

    /// All editions, newest start date first, with guest and preselection counts.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn list_editions(&self) -> StoreFuture<'_, Vec<EditionSummary>>;
}

/// Durable storage of guests and preselections.
pub trait GuestStore: Send + Sync {
    /// Inserts a new guest.
    ///
    /// # Errors
    ///
    /// `UniqueViolation` if the email or phone is taken
    fn insert_guest(&self, guest: Guest) -> StoreFuture<'_, Guest>;

    /// Loads a guest by id.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn get_guest(&self, id: GuestId) -> StoreFuture<'_, Option<Guest>>;

    /// Finds the guest owning an (unmasked) phone number.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn find_guest_by_phone(&self, phone: String) -> StoreFuture<'_, Option<Guest>>;

    /// Guests of an edition, in no particular order.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn list_guests(&self, edition_id: EditionId) -> StoreFuture<'_, Vec<Guest>>;

    /// Overwrites identity, enrichment and invite link of an existing guest. Lifecycle
    /// fields are not written. Returns `None` if the guest does not exist.
    ///
    /// # Errors
    ///
    /// `UniqueViolation` if the new email or phone is taken
    fn update_guest_profile(&self, guest: Guest) -> StoreFuture<'_, Option<Guest>>;

    /// Sets `status = confirmed, confirmed_at = at` if the guest has not confirmed yet.
    /// Returns `None` when the guest is missing or already confirmed.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn mark_confirmed(&self, id: GuestId, at: DateTime<Utc>) -> StoreFuture<'_, Option<Guest>>;

    /// Sets `checked_in_at`/`checked_in_by` if the guest is confirmed and not checked in.
    /// Returns `None` when the guard does not hold.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn mark_checked_in(
        &self,
        id: GuestId,
        at: DateTime<Utc>,
        by: String,
    ) -> StoreFuture<'_, Option<Guest>>;

    /// Clears `checked_in_at`/`checked_in_by` if the guest is checked in.
    /// Returns `None` when the guard does not hold.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn clear_check_in(&self, id: GuestId) -> StoreFuture<'_, Option<Guest>>;

    /// Inserts a pending preselection.
    ///
    /// # Errors
    ///
    /// `UniqueViolation` if the phone is taken by another preselection
    fn insert_preselection(&self, preselection: Preselection) -> StoreFuture<'_, Preselection>;

    /// Loads a preselection by id.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn get_preselection(&self, id: PreselectionId) -> StoreFuture<'_, Option<Preselection>>;

    /// Preselections of an edition, in no particular order.
    ///
    /// # Errors
    ///
    /// `Database` if the store is unavailable
    fn list_preselections(&self, edition_id: EditionId) -> StoreFuture<'_, Vec<Preselection>>;

    /// Inserts `guest` and marks the preselection promoted, in one transaction.
    ///
    /// # Errors
    ///
    /// `UniqueViolation` if the guest's email or phone is taken; nothing is written then
    fn promote(
        &self,
        id: PreselectionId,
        guest: Guest,
        promoted_at: DateTime<Utc>,
    ) -> StoreFuture<'_, PromotionOutcome>;
}
