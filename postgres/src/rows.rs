//! Row decoding and error mapping.

use guestlist_core::StoreError;
use guestlist_core::types::{
    EditionId, EditionSummary, Enrichment, EventEdition, Guest, GuestId, GuestStatus,
    Preselection, PreselectionId, PreselectionStatus,
};
use sqlx::Row;
use sqlx::postgres::PgRow;

/// Maps a sqlx error, turning unique violations into `StoreError::UniqueViolation`
/// named after the colliding field.
pub(crate) fn map_error(error: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &error {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some("guests_email_key") => "email",
                Some("guests_phone_key" | "preselections_phone_key") => "phone",
                Some("event_editions_single_active") => "active edition",
                Some(other) => other,
                None => "unknown",
            };
            return StoreError::UniqueViolation {
                field: field.to_string(),
            };
        }
    }
    StoreError::Database(error.to_string())
}

fn decode(error: sqlx::Error) -> StoreError {
    StoreError::Serialization(error.to_string())
}

pub(crate) fn edition(row: &PgRow) -> Result<EventEdition, StoreError> {
    Ok(EventEdition {
        id: EditionId::from_uuid(row.try_get("id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        description: row.try_get("description").map_err(decode)?,
        started_at: row.try_get("started_at").map_err(decode)?,
        ended_at: row.try_get("ended_at").map_err(decode)?,
        active: row.try_get("active").map_err(decode)?,
        archived: row.try_get("archived").map_err(decode)?,
    })
}

pub(crate) fn edition_summary(row: &PgRow) -> Result<EditionSummary, StoreError> {
    let guest_count: i64 = row.try_get("guest_count").map_err(decode)?;
    let preselection_count: i64 = row.try_get("preselection_count").map_err(decode)?;
    Ok(EditionSummary {
        edition: edition(row)?,
        guest_count: u64::try_from(guest_count).unwrap_or_default(),
        preselection_count: u64::try_from(preselection_count).unwrap_or_default(),
    })
}

pub(crate) fn guest(row: &PgRow) -> Result<Guest, StoreError> {
    let status: String = row.try_get("status").map_err(decode)?;
    let status = GuestStatus::parse(&status)
        .ok_or_else(|| StoreError::Serialization(format!("unknown guest status {status}")))?;

    Ok(Guest {
        id: GuestId::from_uuid(row.try_get("id").map_err(decode)?),
        edition_id: EditionId::from_uuid(row.try_get("edition_id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        phone: row.try_get("phone").map_err(decode)?,
        company: row.try_get("company").map_err(decode)?,
        role: row.try_get("role").map_err(decode)?,
        referrer: row.try_get("referrer").map_err(decode)?,
        invite_url: row.try_get("invite_url").map_err(decode)?,
        status,
        registered_at: row.try_get("registered_at").map_err(decode)?,
        confirmed_at: row.try_get("confirmed_at").map_err(decode)?,
        checked_in_at: row.try_get("checked_in_at").map_err(decode)?,
        checked_in_by: row.try_get("checked_in_by").map_err(decode)?,
        enrichment: Enrichment {
            preferred_name: row.try_get("preferred_name").map_err(decode)?,
            profile_url: row.try_get("profile_url").map_err(decode)?,
            company_size: row.try_get("company_size").map_err(decode)?,
            industry: row.try_get("industry").map_err(decode)?,
            product_description: row.try_get("product_description").map_err(decode)?,
            revenue_band: row.try_get("revenue_band").map_err(decode)?,
            business_model: row.try_get("business_model").map_err(decode)?,
        },
    })
}

pub(crate) fn preselection(row: &PgRow) -> Result<Preselection, StoreError> {
    let status: String = row.try_get("status").map_err(decode)?;
    let status = PreselectionStatus::parse(&status).ok_or_else(|| {
        StoreError::Serialization(format!("unknown preselection status {status}"))
    })?;

    Ok(Preselection {
        id: PreselectionId::from_uuid(row.try_get("id").map_err(decode)?),
        edition_id: EditionId::from_uuid(row.try_get("edition_id").map_err(decode)?),
        name: row.try_get("name").map_err(decode)?,
        phone: row.try_get("phone").map_err(decode)?,
        company: row.try_get("company").map_err(decode)?,
        role: row.try_get("role").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        status,
        created_at: row.try_get("created_at").map_err(decode)?,
        promoted_at: row.try_get("promoted_at").map_err(decode)?,
    })
}
