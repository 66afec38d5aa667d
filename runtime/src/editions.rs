//! Edition lifecycle: find-or-create the active edition, explicit creation, archival
//! with rotation, and switching.

use crate::environment::LifecycleEnvironment;
use crate::metrics::LifecycleMetrics;
use guestlist_core::export::EditionExport;
use guestlist_core::naming::{edition_name_for, next_month_start};
use guestlist_core::store::ArchiveOutcome;
use guestlist_core::types::{required, EditionId, EditionSummary, EventEdition};
use guestlist_core::{LifecycleError, LifecycleResult};
use serde::Serialize;
use tracing::{info, instrument};

/// Everything archival produces
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArchiveResult {
    /// The edition as archived
    pub archived: EventEdition,
    /// The edition that became active in the same step
    pub active: EventEdition,
    /// CSV exports of the archived edition
    pub export: EditionExport,
}

/// Owns every write to editions.
#[derive(Clone)]
pub struct EditionLifecycle {
    env: LifecycleEnvironment,
}

impl EditionLifecycle {
    /// Creates the manager
    #[must_use]
    pub const fn new(env: LifecycleEnvironment) -> Self {
        Self { env }
    }

    /// Returns the active edition, creating one named after the current month if none
    /// exists.
    ///
    /// # Errors
    ///
    /// `Storage` if the store fails
    #[instrument(skip(self))]
    pub async fn get_or_create_active(&self) -> LifecycleResult<EventEdition> {
        let now = self.env.clock.now();
        let candidate = EventEdition::new_active(edition_name_for(now), None, now);
        let candidate_id = candidate.id;

        let edition = self.env.editions.find_or_create_active(candidate).await?;
        if edition.id == candidate_id {
            info!(edition_id = %edition.id, name = %edition.name, "created active edition");
            LifecycleMetrics::record_transition("edition_created");
        }
        Ok(edition)
    }

    /// Creates a new edition and makes it the only active one.
    ///
    /// # Errors
    ///
    /// - `Validation` if `name` is blank
    /// - `Storage` if the store fails
    #[instrument(skip(self, description))]
    pub async fn create(&self, name: &str, description: Option<String>) -> LifecycleResult<EventEdition> {
        let name = required("name", name)?;
        let description = description
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty());

        let edition = EventEdition::new_active(name, description, self.env.clock.now());
        let edition = self.env.editions.create_active(edition).await?;

        info!(edition_id = %edition.id, name = %edition.name, "created active edition");
        LifecycleMetrics::record_transition("edition_created");
        Ok(edition)
    }

    /// Archives an edition, exports its guests and preselections, and activates a new
    /// edition for the month after the archived one started.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the edition does not exist
    /// - `Conflict` if it was already archived
    /// - `Storage` if the store fails
    #[instrument(skip(self))]
    pub async fn archive(&self, id: EditionId) -> LifecycleResult<ArchiveResult> {
        let edition = self.require(id).await?;
        if edition.archived {
            return Err(already_archived(id));
        }

        let mut guests = self.env.guests.list_guests(id).await?;
        guests.sort_by_key(|guest| guest.registered_at);
        let mut preselections = self.env.guests.list_preselections(id).await?;
        preselections.sort_by_key(|preselection| preselection.created_at);
        let export = EditionExport::render(self.env.exporter.as_ref(), &guests, &preselections);

        let next_start = next_month_start(edition.started_at);
        let next = EventEdition::new_active(edition_name_for(next_start), None, next_start);

        match self
            .env
            .editions
            .archive_and_rotate(id, self.env.clock.now(), next)
            .await?
        {
            ArchiveOutcome::Rotated { archived, next } => {
                info!(
                    edition_id = %archived.id,
                    next_edition_id = %next.id,
                    next_name = %next.name,
                    guests = guests.len(),
                    preselections = preselections.len(),
                    "archived edition"
                );
                LifecycleMetrics::record_transition("edition_archived");
                Ok(ArchiveResult {
                    archived,
                    active: next,
                    export,
                })
            }
            ArchiveOutcome::NotFound => Err(LifecycleError::not_found("edition", id)),
            ArchiveOutcome::AlreadyArchived => Err(already_archived(id)),
        }
    }

    /// Makes `id` the active edition, deactivating the previous one. Archived flags are
    /// left alone, so an archived edition cannot be switched to.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the edition does not exist
    /// - `Conflict` if the edition is archived
    /// - `Storage` if the store fails
    #[instrument(skip(self))]
    pub async fn switch_to(&self, id: EditionId) -> LifecycleResult<EventEdition> {
        let target = self.require(id).await?;
        if target.archived {
            return Err(is_archived(id));
        }

        let Some(edition) = self.env.editions.activate(id).await? else {
            let current = self.require(id).await?;
            return Err(if current.archived {
                is_archived(id)
            } else {
                LifecycleError::not_found("edition", id)
            });
        };

        info!(edition_id = %edition.id, name = %edition.name, "switched active edition");
        LifecycleMetrics::record_transition("edition_activated");
        Ok(edition)
    }

    /// All editions, newest first, with their counts
    ///
    /// # Errors
    ///
    /// `Storage` if the store fails
    pub async fn list(&self) -> LifecycleResult<Vec<EditionSummary>> {
        Ok(self.env.editions.list_editions().await?)
    }

    /// Loads one edition
    ///
    /// # Errors
    ///
    /// - `NotFound` if the edition does not exist
    /// - `Storage` if the store fails
    pub async fn get(&self, id: EditionId) -> LifecycleResult<EventEdition> {
        self.require(id).await
    }

    async fn require(&self, id: EditionId) -> LifecycleResult<EventEdition> {
        self.env
            .editions
            .get_edition(id)
            .await?
            .ok_or_else(|| LifecycleError::not_found("edition", id))
    }
}

fn already_archived(id: EditionId) -> LifecycleError {
    LifecycleError::Conflict(format!("edition {id} already archived"))
}

fn is_archived(id: EditionId) -> LifecycleError {
    LifecycleError::Conflict(format!("edition {id} is archived and cannot be activated"))
}
