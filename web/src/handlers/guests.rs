//! Guest endpoints.
//!
//! Every list is scoped to the active edition. Check-in endpoints are what the
//! door staff's client calls, including when it replays offline check-ins.

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Utc};
use guestlist_core::types::{CheckinStats, Guest, GuestId, GuestLookup, GuestProfile, GuestUpdate};
use serde::Deserialize;
use uuid::Uuid;

// ============================================================================
// Request Types
// ============================================================================

/// Query string for the confirmed-guest search.
#[derive(Debug, Default, Deserialize)]
pub struct SearchQuery {
    /// Case-insensitive needle over name, email, phone and company
    pub q: Option<String>,
}

/// Identifies the guest confirming attendance.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ConfirmRequest {
    /// Guest id, preferred when present
    pub id: Option<Uuid>,
    /// Phone, masked or not
    pub phone: Option<String>,
}

/// Check-in request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CheckInRequest {
    /// Staff member performing the check-in
    pub checked_in_by: String,
    /// Time of arrival when it differs from the time of the request (offline replay)
    pub checked_in_at: Option<DateTime<Utc>>,
}

/// Undo check-in request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UndoCheckInRequest {
    /// Staff member reverting the check-in
    pub undone_by: String,
    /// Free-text reason, logged only
    pub reason: Option<String>,
}

// ============================================================================
// Handlers
// ============================================================================

/// All guests of the active edition.
///
/// # Errors
///
/// 500 if the store fails
pub async fn list_guests(State(state): State<AppState>) -> Result<Json<Vec<Guest>>, AppError> {
    Ok(Json(state.guests.list_guests().await?))
}

/// Invite a guest into the active edition.
///
/// # Errors
///
/// 422 on missing fields, 409 on a duplicate email or phone
pub async fn invite_guest(
    State(state): State<AppState>,
    ApiJson(profile): ApiJson<GuestProfile>,
) -> Result<(StatusCode, Json<Guest>), AppError> {
    let guest = state.guests.invite(profile).await?;
    Ok((StatusCode::CREATED, Json(guest)))
}

/// Confirmed guests, not yet checked in first.
///
/// # Errors
///
/// 500 if the store fails
pub async fn list_confirmed(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<Guest>>, AppError> {
    Ok(Json(state.guests.list_confirmed(query.q.as_deref()).await?))
}

/// Invited / confirmed / checked-in totals for the active edition.
///
/// # Errors
///
/// 500 if the store fails
pub async fn checkin_stats(State(state): State<AppState>) -> Result<Json<CheckinStats>, AppError> {
    Ok(Json(state.guests.checkin_stats().await?))
}

/// One guest.
///
/// # Errors
///
/// 404 for an unknown guest
pub async fn get_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Guest>, AppError> {
    Ok(Json(state.guests.get(GuestId::from_uuid(id)).await?))
}

/// Confirm attendance by id or phone. Confirming twice returns the guest unchanged.
///
/// # Errors
///
/// 422 when neither id nor phone is given, 404 for an unknown guest
pub async fn confirm_guest(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<ConfirmRequest>,
) -> Result<Json<Guest>, AppError> {
    let lookup = GuestLookup::from_parts(request.id.map(GuestId::from_uuid), request.phone)?;
    Ok(Json(state.guests.confirm(lookup).await?))
}

/// Overlay profile and enrichment fields.
///
/// # Errors
///
/// 404 for an unknown guest, 409 if the new email or phone is taken
pub async fn enrich_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(update): ApiJson<GuestUpdate>,
) -> Result<Json<Guest>, AppError> {
    Ok(Json(
        state
            .guests
            .enrich_on_confirm(GuestId::from_uuid(id), update)
            .await?,
    ))
}

/// Check a confirmed guest in.
///
/// # Errors
///
/// 412 if the guest has not confirmed, 409 if already checked in
pub async fn check_in_guest(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<CheckInRequest>,
) -> Result<Json<Guest>, AppError> {
    let guest = state
        .guests
        .check_in_at(
            GuestId::from_uuid(id),
            &request.checked_in_by,
            request.checked_in_at,
        )
        .await?;
    Ok(Json(guest))
}

/// Revert a check-in.
///
/// # Errors
///
/// 412 if the guest is not checked in
pub async fn undo_check_in(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<UndoCheckInRequest>,
) -> Result<Json<Guest>, AppError> {
    let guest = state
        .guests
        .undo_check_in(
            GuestId::from_uuid(id),
            &request.undone_by,
            request.reason.as_deref(),
        )
        .await?;
    Ok(Json(guest))
}
