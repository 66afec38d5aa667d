//! Preselection endpoints.

use crate::error::AppError;
use crate::extract::ApiJson;
use crate::state::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use guestlist_core::types::{Preselection, PreselectionId, PreselectionProfile};
use guestlist_runtime::Promotion;
use serde::Deserialize;
use uuid::Uuid;

/// Promotion request.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct PromoteRequest {
    /// Attribution tag for the invite link
    pub referrer: String,
}

/// Preselection pool of the active edition, pending candidates first.
///
/// # Errors
///
/// 500 if the store fails
pub async fn list_preselections(
    State(state): State<AppState>,
) -> Result<Json<Vec<Preselection>>, AppError> {
    Ok(Json(state.guests.list_preselections().await?))
}

/// Add a candidate to the pool.
///
/// # Errors
///
/// 422 on missing fields, 409 on a duplicate phone
pub async fn create_preselection(
    State(state): State<AppState>,
    ApiJson(profile): ApiJson<PreselectionProfile>,
) -> Result<(StatusCode, Json<Preselection>), AppError> {
    let preselection = state.guests.preselect(profile).await?;
    Ok((StatusCode::CREATED, Json(preselection)))
}

/// Turn a candidate into an invited guest.
///
/// # Errors
///
/// 404 for an unknown preselection, 409 if already promoted or the phone is taken
pub async fn promote_preselection(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    ApiJson(request): ApiJson<PromoteRequest>,
) -> Result<(StatusCode, Json<Promotion>), AppError> {
    let promotion = state
        .guests
        .promote(PreselectionId::from_uuid(id), &request.referrer)
        .await?;
    Ok((StatusCode::CREATED, Json(promotion)))
}
