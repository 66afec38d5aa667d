//! In-memory implementation of both store traits.
//!
//! One mutex guards all three maps, so every method is atomic just like a single
//! database transaction. Uniqueness is checked globally (across editions), matching the
//! `PostgreSQL` schema.

use chrono::{DateTime, Utc};
use guestlist_core::StoreError;
use guestlist_core::store::{
    ArchiveOutcome, EditionStore, GuestStore, PromotionOutcome, StoreFuture,
};
use guestlist_core::types::{
    EditionId, EditionSummary, EventEdition, Guest, GuestId, Preselection,
    PreselectionId, PreselectionStatus,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    editions: HashMap<EditionId, EventEdition>,
    guests: HashMap<GuestId, Guest>,
    preselections: HashMap<PreselectionId, Preselection>,
}

impl State {
    fn active_edition(&self) -> Option<&EventEdition> {
        self.editions
            .values()
            .find(|edition| edition.active && !edition.archived)
    }

    fn deactivate_all(&mut self) {
        for edition in self.editions.values_mut() {
            edition.active = false;
        }
    }

    fn check_guest_unique(&self, guest: &Guest) -> Result<(), StoreError> {
        for other in self.guests.values().filter(|other| other.id != guest.id) {
            if other.email == guest.email {
                return Err(unique("email"));
            }
            if other.phone == guest.phone {
                return Err(unique("phone"));
            }
        }
        Ok(())
    }

    fn insert_guest(&mut self, guest: Guest) -> Result<Guest, StoreError> {
        if !self.editions.contains_key(&guest.edition_id) {
            return Err(StoreError::Database(format!(
                "edition {} does not exist",
                guest.edition_id
            )));
        }
        self.check_guest_unique(&guest)?;
        self.guests.insert(guest.id, guest.clone());
        Ok(guest)
    }
}

fn unique(field: &str) -> StoreError {
    StoreError::UniqueViolation {
        field: field.to_string(),
    }
}

/// Mutex-guarded maps implementing [`EditionStore`] and [`GuestStore`].
///
/// Clones share state. [`InMemoryStore::set_unavailable`] makes every call fail with
/// `StoreError::Database`, for exercising storage failure paths.
#[derive(Clone, Debug, Default)]
pub struct InMemoryStore {
    state: Arc<Mutex<State>>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryStore {
    /// Creates an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes subsequent calls fail (`true`) or succeed again (`false`)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of editions with `active = true`
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.lock()
            .map(|state| state.editions.values().filter(|e| e.active).count())
            .unwrap_or_default()
    }

    /// Every stored guest, for assertions
    #[must_use]
    pub fn all_guests(&self) -> Vec<Guest> {
        self.lock()
            .map(|state| state.guests.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Every stored edition, for assertions
    #[must_use]
    pub fn all_editions(&self) -> Vec<EventEdition> {
        self.lock()
            .map(|state| state.editions.values().cloned().collect())
            .unwrap_or_default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StoreError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Database("store unavailable".to_string()));
        }
        self.state
            .lock()
            .map_err(|_| StoreError::Database("store mutex poisoned".to_string()))
    }

    fn with_state<T, F>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut State) -> Result<T, StoreError>,
    {
        let mut state = self.lock()?;
        f(&mut state)
    }
}

impl EditionStore for InMemoryStore {
    fn find_or_create_active(&self, candidate: EventEdition) -> StoreFuture<'_, EventEdition> {
        let result = self.with_state(|state| {
            if let Some(active) = state.active_edition() {
                return Ok(active.clone());
            }
            state.editions.insert(candidate.id, candidate.clone());
            Ok(candidate)
        });
        Box::pin(async move { result })
    }

    fn create_active(&self, edition: EventEdition) -> StoreFuture<'_, EventEdition> {
        let result = self.with_state(|state| {
            state.deactivate_all();
            state.editions.insert(edition.id, edition.clone());
            Ok(edition)
        });
        Box::pin(async move { result })
    }

    fn get_edition(&self, id: EditionId) -> StoreFuture<'_, Option<EventEdition>> {
        let result = self.with_state(|state| Ok(state.editions.get(&id).cloned()));
        Box::pin(async move { result })
    }

    fn activate(&self, id: EditionId) -> StoreFuture<'_, Option<EventEdition>> {
        let result = self.with_state(|state| {
            match state.editions.get(&id) {
                Some(edition) if !edition.archived => {}
                _ => return Ok(None),
            }
            state.deactivate_all();
            Ok(state.editions.get_mut(&id).map(|edition| {
                edition.active = true;
                edition.clone()
            }))
        });
        Box::pin(async move { result })
    }

    fn archive_and_rotate(
        &self,
        id: EditionId,
        ended_at: DateTime<Utc>,
        next: EventEdition,
    ) -> StoreFuture<'_, ArchiveOutcome> {
        let result = self.with_state(|state| {
            let archived = match state.editions.get_mut(&id) {
                None => return Ok(ArchiveOutcome::NotFound),
                Some(edition) if edition.archived => return Ok(ArchiveOutcome::AlreadyArchived),
                Some(edition) => {
                    edition.archived = true;
                    edition.active = false;
                    edition.ended_at = Some(ended_at);
                    edition.clone()
                }
            };
            state.deactivate_all();
            state.editions.insert(next.id, next.clone());
            Ok(ArchiveOutcome::Rotated { archived, next })
        });
        Box::pin(async move { result })
    }

    fn list_editions(&self) -> StoreFuture<'_, Vec<EditionSummary>> {
        let result = self.with_state(|state| {
            let mut summaries: Vec<EditionSummary> = state
                .editions
                .values()
                .map(|edition| EditionSummary {
                    edition: edition.clone(),
                    guest_count: state
                        .guests
                        .values()
                        .filter(|g| g.edition_id == edition.id)
                        .count() as u64,
                    preselection_count: state
                        .preselections
                        .values()
                        .filter(|p| p.edition_id == edition.id)
                        .count() as u64,
                })
                .collect();
            summaries.sort_by(|a, b| b.edition.started_at.cmp(&a.edition.started_at));
            Ok(summaries)
        });
        Box::pin(async move { result })
    }
}

impl GuestStore for InMemoryStore {
    fn insert_guest(&self, guest: Guest) -> StoreFuture<'_, Guest> {
        let result = self.with_state(|state| state.insert_guest(guest));
        Box::pin(async move { result })
    }

    fn get_guest(&self, id: GuestId) -> StoreFuture<'_, Option<Guest>> {
        let result = self.with_state(|state| Ok(state.guests.get(&id).cloned()));
        Box::pin(async move { result })
    }

    fn find_guest_by_phone(&self, phone: String) -> StoreFuture<'_, Option<Guest>> {
        let result = self.with_state(|state| {
            Ok(state.guests.values().find(|g| g.phone == phone).cloned())
        });
        Box::pin(async move { result })
    }

    fn list_guests(&self, edition_id: EditionId) -> StoreFuture<'_, Vec<Guest>> {
        let result = self.with_state(|state| {
            Ok(state
                .guests
                .values()
                .filter(|g| g.edition_id == edition_id)
                .cloned()
                .collect())
        });
        Box::pin(async move { result })
    }

    fn update_guest_profile(&self, guest: Guest) -> StoreFuture<'_, Option<Guest>> {
        let result = self.with_state(|state| {
            state.check_guest_unique(&guest)?;
            Ok(state.guests.get_mut(&guest.id).map(|stored| {
                stored.name = guest.name;
                stored.email = guest.email;
                stored.phone = guest.phone;
                stored.company = guest.company;
                stored.role = guest.role;
                stored.invite_url = guest.invite_url;
                stored.enrichment = guest.enrichment;
                stored.clone()
            }))
        });
        Box::pin(async move { result })
    }

    fn mark_confirmed(&self, id: GuestId, at: DateTime<Utc>) -> StoreFuture<'_, Option<Guest>> {
        let result = self.with_state(|state| {
            Ok(state
                .guests
                .get_mut(&id)
                .and_then(|g| g.confirm(at).then(|| g.clone())))
        });
        Box::pin(async move { result })
    }

    fn mark_checked_in(
        &self,
        id: GuestId,
        at: DateTime<Utc>,
        by: String,
    ) -> StoreFuture<'_, Option<Guest>> {
        let result = self.with_state(|state| {
            Ok(state
                .guests
                .get_mut(&id)
                .and_then(|g| g.check_in(at, by).ok().map(|()| g.clone())))
        });
        Box::pin(async move { result })
    }

    fn clear_check_in(&self, id: GuestId) -> StoreFuture<'_, Option<Guest>> {
        let result = self.with_state(|state| {
            Ok(state
                .guests
                .get_mut(&id)
                .and_then(|g| g.undo_check_in().ok().map(|()| g.clone())))
        });
        Box::pin(async move { result })
    }

    fn insert_preselection(&self, preselection: Preselection) -> StoreFuture<'_, Preselection> {
        let result = self.with_state(|state| {
            if state
                .preselections
                .values()
                .any(|p| p.phone == preselection.phone)
            {
                return Err(unique("phone"));
            }
            state
                .preselections
                .insert(preselection.id, preselection.clone());
            Ok(preselection)
        });
        Box::pin(async move { result })
    }

    fn get_preselection(&self, id: PreselectionId) -> StoreFuture<'_, Option<Preselection>> {
        let result = self.with_state(|state| Ok(state.preselections.get(&id).cloned()));
        Box::pin(async move { result })
    }

    fn list_preselections(&self, edition_id: EditionId) -> StoreFuture<'_, Vec<Preselection>> {
        let result = self.with_state(|state| {
            Ok(state
                .preselections
                .values()
                .filter(|p| p.edition_id == edition_id)
                .cloned()
                .collect())
        });
        Box::pin(async move { result })
    }

    fn promote(
        &self,
        id: PreselectionId,
        guest: Guest,
        promoted_at: DateTime<Utc>,
    ) -> StoreFuture<'_, PromotionOutcome> {
        let result = self.with_state(|state| {
            match state.preselections.get(&id) {
                None => return Ok(PromotionOutcome::NotFound),
                Some(p) if p.status == PreselectionStatus::Promoted => {
                    return Ok(PromotionOutcome::AlreadyPromoted);
                }
                Some(_) => {}
            }
            // Guest first: a unique violation must leave the preselection pending.
            let guest = state.insert_guest(guest)?;
            let preselection = state
                .preselections
                .get_mut(&id)
                .map(|p| {
                    p.status = PreselectionStatus::Promoted;
                    p.promoted_at = Some(promoted_at);
                    p.clone()
                })
                .ok_or_else(|| StoreError::Database(format!("preselection {id} vanished")))?;
            Ok(PromotionOutcome::Promoted {
                guest,
                preselection,
            })
        });
        Box::pin(async move { result })
    }
}
