//! Guest lifecycle: `preselected → invited → confirmed → checked-in`, with undo of the
//! check-in as the only backward edge.
//!
//! Every write is a conditional update at the store. When a guard fails there (a
//! concurrent request won the race), the guest is reloaded and the failure is reported
//! with the same error the in-memory rules would have produced.

use crate::editions::EditionLifecycle;
use crate::environment::LifecycleEnvironment;
use crate::metrics::LifecycleMetrics;
use chrono::{DateTime, Utc};
use guestlist_core::notification::Notification;
use guestlist_core::phone::remove_phone_mask;
use guestlist_core::store::PromotionOutcome;
use guestlist_core::types::{
    required, CheckinStats, Guest, GuestId, GuestLookup, GuestProfile, GuestUpdate, Preselection,
    PreselectionId, PreselectionProfile,
};
use guestlist_core::{LifecycleError, LifecycleResult};
use serde::Serialize;
use tracing::{debug, info, instrument};

/// Result of promoting a preselection
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Promotion {
    /// The guest created from the preselection
    pub guest: Guest,
    /// The preselection, now promoted
    pub preselection: Preselection,
}

/// Owns every write to guests and preselections.
#[derive(Clone)]
pub struct GuestLifecycle {
    env: LifecycleEnvironment,
    editions: EditionLifecycle,
}

impl GuestLifecycle {
    /// Creates the manager
    #[must_use]
    pub fn new(env: LifecycleEnvironment) -> Self {
        let editions = EditionLifecycle::new(env.clone());
        Self { env, editions }
    }

    /// Invites a guest into the active edition.
    ///
    /// # Errors
    ///
    /// - `Validation` if a profile field is blank
    /// - `Conflict` if the email or phone is taken
    /// - `Storage` if the store fails
    #[instrument(skip(self, profile), fields(email = %profile.email))]
    pub async fn invite(&self, profile: GuestProfile) -> LifecycleResult<Guest> {
        let profile = profile.validate()?;
        let edition = self.editions.get_or_create_active().await?;
        let invite_url = self
            .env
            .invites
            .build(&profile.email, Some(&profile.referrer), None);

        let guest = Guest::invited(edition.id, profile, invite_url, self.env.clock.now());
        let guest = self.env.guests.insert_guest(guest).await?;

        info!(guest_id = %guest.id, edition_id = %guest.edition_id, "invited guest");
        LifecycleMetrics::record_transition("guest_invited");
        self.env.notifier.notify(Notification::GuestAdded {
            guest: guest.clone(),
        });
        Ok(guest)
    }

    /// Confirms attendance. Confirming twice returns the stored guest unchanged and
    /// notifies nothing the second time.
    ///
    /// # Errors
    ///
    /// - `Validation` if the phone lookup is blank
    /// - `NotFound` if no guest matches
    /// - `Storage` if the store fails
    #[instrument(skip(self))]
    pub async fn confirm(&self, lookup: GuestLookup) -> LifecycleResult<Guest> {
        let guest = self.find(lookup).await?;
        if guest.is_confirmed() {
            debug!(guest_id = %guest.id, "guest already confirmed");
            return Ok(guest);
        }

        match self
            .env
            .guests
            .mark_confirmed(guest.id, self.env.clock.now())
            .await?
        {
            Some(confirmed) => {
                info!(guest_id = %confirmed.id, "confirmed guest");
                LifecycleMetrics::record_transition("guest_confirmed");
                self.env.notifier.notify(Notification::GuestConfirmed {
                    guest: confirmed.clone(),
                });
                Ok(confirmed)
            }
            // Someone else confirmed first; their write is the one that counts.
            None => self.require(guest.id).await,
        }
    }

    /// Applies identity and enrichment changes captured at confirmation, and recomputes
    /// the invite link. Absent fields keep their current value.
    ///
    /// # Errors
    ///
    /// - `Validation` if a provided identity field is blank
    /// - `NotFound` if the guest does not exist
    /// - `Conflict` if the new email or phone is taken
    /// - `Storage` if the store fails
    #[instrument(skip(self, update))]
    pub async fn enrich_on_confirm(&self, id: GuestId, update: GuestUpdate) -> LifecycleResult<Guest> {
        let mut guest = self.require(id).await?;
        guest.apply_update(update)?;
        guest.invite_url = self
            .env
            .invites
            .build(&guest.email, Some(&guest.referrer), None);

        let guest = self
            .env
            .guests
            .update_guest_profile(guest)
            .await?
            .ok_or_else(|| LifecycleError::not_found("guest", id))?;

        info!(guest_id = %guest.id, "enriched guest profile");
        LifecycleMetrics::record_transition("guest_enriched");
        Ok(guest)
    }

    /// Checks a confirmed guest in, stamped with the server clock.
    ///
    /// # Errors
    ///
    /// See [`GuestLifecycle::check_in_at`]
    pub async fn check_in(&self, id: GuestId, checked_in_by: &str) -> LifecycleResult<Guest> {
        self.check_in_at(id, checked_in_by, None).await
    }

    /// Checks a confirmed guest in at `at`, or now when `at` is `None`. Offline replays
    /// pass the moment the check-in was captured.
    ///
    /// # Errors
    ///
    /// - `Validation` if `checked_in_by` is blank
    /// - `NotFound` if the guest does not exist
    /// - `Precondition` if the guest has not confirmed
    /// - `Conflict` if the guest is already checked in
    /// - `Storage` if the store fails
    #[instrument(skip(self))]
    pub async fn check_in_at(
        &self,
        id: GuestId,
        checked_in_by: &str,
        at: Option<DateTime<Utc>>,
    ) -> LifecycleResult<Guest> {
        let checked_in_by = required("checked_in_by", checked_in_by)?;
        let guest = self.require(id).await?;
        guest.ensure_can_check_in()?;

        let at = at.unwrap_or_else(|| self.env.clock.now());
        match self
            .env
            .guests
            .mark_checked_in(id, at, checked_in_by)
            .await?
        {
            Some(checked_in) => {
                info!(
                    guest_id = %checked_in.id,
                    checked_in_by = checked_in.checked_in_by.as_deref().unwrap_or_default(),
                    "checked in guest"
                );
                LifecycleMetrics::record_transition("guest_checked_in");
                self.env.notifier.notify(Notification::GuestCheckedIn {
                    guest: checked_in.clone(),
                });
                Ok(checked_in)
            }
            None => {
                let current = self.require(id).await?;
                current.ensure_can_check_in()?;
                Err(LifecycleError::Conflict(format!(
                    "guest {id} is already checked in"
                )))
            }
        }
    }

    /// Reverts a check-in, leaving the guest confirmed. Sends no webhook.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the guest does not exist
    /// - `Precondition` if the guest is not checked in
    /// - `Storage` if the store fails
    #[instrument(skip(self))]
    pub async fn undo_check_in(
        &self,
        id: GuestId,
        undone_by: &str,
        reason: Option<&str>,
    ) -> LifecycleResult<Guest> {
        let guest = self.require(id).await?;
        guest.clone().undo_check_in()?;

        match self.env.guests.clear_check_in(id).await? {
            Some(reverted) => {
                info!(
                    guest_id = %reverted.id,
                    undone_by,
                    reason = reason.unwrap_or_default(),
                    previously_checked_in_by = guest.checked_in_by.as_deref().unwrap_or_default(),
                    "undid guest check-in"
                );
                LifecycleMetrics::record_transition("guest_check_in_undone");
                Ok(reverted)
            }
            None => {
                let mut current = self.require(id).await?;
                current.undo_check_in()?;
                Err(LifecycleError::Precondition(format!(
                    "guest {id} is not checked in"
                )))
            }
        }
    }

    /// Confirmed guests of the active edition, optionally filtered by a case-insensitive
    /// search over name, email, phone and company. Guests not yet checked in come first,
    /// then alphabetical by name.
    ///
    /// # Errors
    ///
    /// `Storage` if the store fails
    pub async fn list_confirmed(&self, search: Option<&str>) -> LifecycleResult<Vec<Guest>> {
        let edition = self.editions.get_or_create_active().await?;
        let needle = search.unwrap_or_default();
        let mut guests: Vec<Guest> = self
            .env
            .guests
            .list_guests(edition.id)
            .await?
            .into_iter()
            .filter(|guest| guest.is_confirmed() && guest.matches(needle))
            .collect();
        guests.sort_by_cached_key(|guest| (guest.is_checked_in(), guest.name.to_lowercase()));
        Ok(guests)
    }

    /// Adds a candidate to the active edition's preselection pool.
    ///
    /// # Errors
    ///
    /// - `Validation` if a required field is blank
    /// - `Conflict` if the phone is already preselected
    /// - `Storage` if the store fails
    #[instrument(skip(self, profile), fields(name = %profile.name))]
    pub async fn preselect(&self, profile: PreselectionProfile) -> LifecycleResult<Preselection> {
        let profile = profile.validate()?;
        let edition = self.editions.get_or_create_active().await?;
        let preselection = Preselection::pending(edition.id, profile, self.env.clock.now());
        let preselection = self.env.guests.insert_preselection(preselection).await?;

        info!(preselection_id = %preselection.id, edition_id = %preselection.edition_id, "added preselection");
        LifecycleMetrics::record_transition("preselection_added");
        Ok(preselection)
    }

    /// Turns a pending preselection into an invited guest of the active edition, in one
    /// store transaction.
    ///
    /// # Errors
    ///
    /// - `Validation` if `referrer` is blank
    /// - `NotFound` if the preselection does not exist
    /// - `Conflict` if it was already promoted or a guest has the same phone or email
    /// - `Storage` if the store fails
    #[instrument(skip(self))]
    pub async fn promote(&self, id: PreselectionId, referrer: &str) -> LifecycleResult<Promotion> {
        let referrer = required("referrer", referrer)?;
        let preselection = self
            .env
            .guests
            .get_preselection(id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("preselection", id))?;
        if preselection.is_promoted() {
            return Err(already_promoted(id));
        }
        if self
            .env
            .guests
            .find_guest_by_phone(preselection.phone.clone())
            .await?
            .is_some()
        {
            return Err(LifecycleError::Conflict(format!(
                "a guest with phone {} already exists",
                preselection.phone
            )));
        }

        let edition = self.editions.get_or_create_active().await?;
        let invite_url = self
            .env
            .invites
            .build(preselection.invite_token(), Some(&referrer), None);
        let now = self.env.clock.now();
        let guest = Guest::invited(
            edition.id,
            preselection.to_guest_profile(referrer),
            invite_url,
            now,
        );

        match self.env.guests.promote(id, guest, now).await? {
            PromotionOutcome::Promoted {
                guest,
                preselection,
            } => {
                info!(preselection_id = %preselection.id, guest_id = %guest.id, "promoted preselection");
                LifecycleMetrics::record_transition("preselection_promoted");
                self.env.notifier.notify(Notification::GuestAdded {
                    guest: guest.clone(),
                });
                self.env.notifier.notify(Notification::PreselectionPromoted {
                    preselection: preselection.clone(),
                    guest: guest.clone(),
                });
                Ok(Promotion {
                    guest,
                    preselection,
                })
            }
            PromotionOutcome::NotFound => Err(LifecycleError::not_found("preselection", id)),
            PromotionOutcome::AlreadyPromoted => Err(already_promoted(id)),
        }
    }

    /// Loads one guest
    ///
    /// # Errors
    ///
    /// - `NotFound` if the guest does not exist
    /// - `Storage` if the store fails
    pub async fn get(&self, id: GuestId) -> LifecycleResult<Guest> {
        self.require(id).await
    }

    /// Guests of the active edition, by name
    ///
    /// # Errors
    ///
    /// `Storage` if the store fails
    pub async fn list_guests(&self) -> LifecycleResult<Vec<Guest>> {
        let edition = self.editions.get_or_create_active().await?;
        let mut guests = self.env.guests.list_guests(edition.id).await?;
        guests.sort_by_cached_key(|guest| guest.name.to_lowercase());
        Ok(guests)
    }

    /// Preselections of the active edition, pending first, then by name
    ///
    /// # Errors
    ///
    /// `Storage` if the store fails
    pub async fn list_preselections(&self) -> LifecycleResult<Vec<Preselection>> {
        let edition = self.editions.get_or_create_active().await?;
        let mut preselections = self.env.guests.list_preselections(edition.id).await?;
        preselections.sort_by_cached_key(|p| (p.is_promoted(), p.name.to_lowercase()));
        Ok(preselections)
    }

    /// Invited, confirmed and checked-in counts for the active edition
    ///
    /// # Errors
    ///
    /// `Storage` if the store fails
    pub async fn checkin_stats(&self) -> LifecycleResult<CheckinStats> {
        let edition = self.editions.get_or_create_active().await?;
        let guests = self.env.guests.list_guests(edition.id).await?;
        Ok(guests.iter().fold(CheckinStats::default(), |mut stats, guest| {
            stats.invited += 1;
            if guest.is_confirmed() {
                stats.confirmed += 1;
            }
            if guest.is_checked_in() {
                stats.checked_in += 1;
            }
            stats
        }))
    }

    async fn find(&self, lookup: GuestLookup) -> LifecycleResult<Guest> {
        match lookup {
            GuestLookup::Id(id) => self.require(id).await,
            GuestLookup::Phone(phone) => {
                let phone = remove_phone_mask(&phone);
                if phone.is_empty() {
                    return Err(LifecycleError::Validation("phone is required".to_string()));
                }
                self.env
                    .guests
                    .find_guest_by_phone(phone.clone())
                    .await?
                    .ok_or_else(|| LifecycleError::not_found("guest with phone", phone))
            }
        }
    }

    async fn require(&self, id: GuestId) -> LifecycleResult<Guest> {
        self.env
            .guests
            .get_guest(id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("guest", id))
    }
}

fn already_promoted(id: PreselectionId) -> LifecycleError {
    LifecycleError::Conflict(format!("preselection {id} already promoted"))
}
