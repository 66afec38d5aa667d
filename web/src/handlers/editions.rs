//! Edition endpoints.
//!
//! - GET /api/editions - All editions with guest and preselection counts
//! - POST /api/editions - Create an edition and make it active
//! - GET /api/editions/active - The active edition, created on demand
//! - POST /api/editions/:id/archive - Archive, export and rotate
//! - POST /api/editions/:id/activate - Switch the active edition

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use guestlist_core::types::{EditionId, EditionSummary, EventEdition};
use guestlist_runtime::ArchiveResult;
use serde::Deserialize;
use uuid::Uuid;

/// Request to create an edition.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CreateEditionRequest {
    /// Display name
    pub name: String,
    /// Optional free-text description
    pub description: Option<String>,
}

/// List editions, most recent first.
///
/// # Errors
///
/// 500 if the store fails
pub async fn list_editions(
    State(state): State<AppState>,
) -> Result<Json<Vec<EditionSummary>>, AppError> {
    Ok(Json(state.editions.list().await?))
}

/// Create an edition; it becomes the active one.
///
/// # Errors
///
/// 422 on a blank name
pub async fn create_edition(
    State(state): State<AppState>,
    ApiJson(request): ApiJson<CreateEditionRequest>,
) -> Result<(StatusCode, Json<EventEdition>), AppError> {
    let edition = state
        .editions
        .create(&request.name, request.description)
        .await?;
    Ok((StatusCode::CREATED, Json(edition)))
}

/// Current active edition.
///
/// # Errors
///
/// 500 if the store fails
pub async fn active_edition(
    State(state): State<AppState>,
) -> Result<Json<EventEdition>, AppError> {
    Ok(Json(state.editions.get_or_create_active().await?))
}

/// Archive an edition and return its exports along with the new active edition.
///
/// # Errors
///
/// 404 for an unknown edition, 409 if it is already archived
pub async fn archive_edition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArchiveResult>, AppError> {
    Ok(Json(state.editions.archive(EditionId::from_uuid(id)).await?))
}

/// Make an edition the active one.
///
/// # Errors
///
/// 404 for an unknown edition, 409 if it is archived
pub async fn activate_edition(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<EventEdition>, AppError> {
    Ok(Json(state.editions.switch_to(EditionId::from_uuid(id)).await?))
}
