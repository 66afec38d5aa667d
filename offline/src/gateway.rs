//! The server-side check-in transition as seen from the client.
//!
//! A gateway separates two kinds of failure. `Unreachable` (network, timeout,
//! server error) is what lets the client queue a check-in offline. `Rejected` carries
//! a domain error the server decided on.

use chrono::{DateTime, Utc};
use guestlist_core::LifecycleError;
use guestlist_core::types::{Guest, GuestId};
use guestlist_runtime::GuestLifecycle;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use thiserror::Error;

/// Gateway errors.
#[derive(Error, Debug)]
pub enum GatewayError {
    /// The server could not be reached or failed to answer
    #[error("server unreachable: {0}")]
    Unreachable(String),

    /// The server refused the check-in
    #[error("server rejected the request: {0}")]
    Rejected(#[source] LifecycleError),
}

impl GatewayError {
    /// Whether the server reports the guest as already checked in
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Rejected(LifecycleError::Conflict(_)))
    }
}

/// Boxed future returned by [`CheckinGateway`] methods.
pub type GatewayFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, GatewayError>> + Send + 'a>>;

/// Access to the server's check-in transition and confirmed-guest list.
pub trait CheckinGateway: Send + Sync {
    /// Checks the guest in. `at` is the intended check-in time for replays.
    fn check_in<'a>(
        &'a self,
        guest_id: GuestId,
        checked_in_by: &'a str,
        at: Option<DateTime<Utc>>,
    ) -> GatewayFuture<'a, Guest>;

    /// Confirmed guests of the active edition, as the server sees them.
    fn confirmed_guests(&self) -> GatewayFuture<'_, Vec<Guest>>;
}

// ============================================================================
// HTTP
// ============================================================================

#[derive(Serialize)]
struct CheckInBody<'a> {
    checked_in_by: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    checked_in_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
}

/// Gateway over the server's JSON API.
#[derive(Clone, Debug)]
pub struct HttpCheckinGateway {
    client: reqwest::Client,
    base_url: String,
}

impl HttpCheckinGateway {
    /// Gateway against `base_url` (e.g. `http://localhost:8080`). Every request is
    /// bounded by `timeout`.
    ///
    /// # Errors
    ///
    /// `Unreachable` if the HTTP client cannot be built
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    async fn decode<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
        guest_id: Option<GuestId>,
    ) -> Result<T, GatewayError> {
        let status = response.status();
        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| GatewayError::Unreachable(format!("invalid response body: {e}")));
        }
        if status.is_server_error() {
            return Err(GatewayError::Unreachable(format!("server answered {status}")));
        }

        let body: ErrorBody = response.json().await.unwrap_or_else(|_| ErrorBody {
            code: String::new(),
            message: status.to_string(),
        });
        let error = match (status.as_u16(), body.code.as_str()) {
            (404, _) | (_, "NOT_FOUND") => LifecycleError::not_found(
                "guest",
                guest_id.map_or_else(|| body.message.clone(), |id| id.to_string()),
            ),
            (409, _) | (_, "CONFLICT") => LifecycleError::Conflict(body.message),
            (412, _) | (_, "PRECONDITION_FAILED") => LifecycleError::Precondition(body.message),
            _ => LifecycleError::Validation(body.message),
        };
        Err(GatewayError::Rejected(error))
    }
}

impl CheckinGateway for HttpCheckinGateway {
    fn check_in<'a>(
        &'a self,
        guest_id: GuestId,
        checked_in_by: &'a str,
        at: Option<DateTime<Utc>>,
    ) -> GatewayFuture<'a, Guest> {
        Box::pin(async move {
            let url = format!("{}/api/guests/{guest_id}/check-in", self.base_url);
            let response = self
                .client
                .post(&url)
                .json(&CheckInBody {
                    checked_in_by,
                    checked_in_at: at,
                })
                .send()
                .await
                .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
            Self::decode(response, Some(guest_id)).await
        })
    }

    fn confirmed_guests(&self) -> GatewayFuture<'_, Vec<Guest>> {
        Box::pin(async move {
            let url = format!("{}/api/guests/confirmed", self.base_url);
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|e| GatewayError::Unreachable(e.to_string()))?;
            Self::decode(response, None).await
        })
    }
}

// ============================================================================
// In-process
// ============================================================================

/// Gateway calling a `GuestLifecycle` directly, for clients sharing the server's
/// process. Storage failures count as unreachable.
#[derive(Clone)]
pub struct LocalCheckinGateway {
    guests: GuestLifecycle,
}

impl LocalCheckinGateway {
    /// Wraps the guest manager
    #[must_use]
    pub const fn new(guests: GuestLifecycle) -> Self {
        Self { guests }
    }
}

fn classify(error: LifecycleError) -> GatewayError {
    match error {
        LifecycleError::Storage(e) => GatewayError::Unreachable(e.to_string()),
        other => GatewayError::Rejected(other),
    }
}

impl CheckinGateway for LocalCheckinGateway {
    fn check_in<'a>(
        &'a self,
        guest_id: GuestId,
        checked_in_by: &'a str,
        at: Option<DateTime<Utc>>,
    ) -> GatewayFuture<'a, Guest> {
        Box::pin(async move {
            self.guests
                .check_in_at(guest_id, checked_in_by, at)
                .await
                .map_err(classify)
        })
    }

    fn confirmed_guests(&self) -> GatewayFuture<'_, Vec<Guest>> {
        Box::pin(async move { self.guests.list_confirmed(None).await.map_err(classify) })
    }
}
