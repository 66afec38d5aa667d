//! Error types for web handlers.
//!
//! Bridges lifecycle errors and HTTP responses through Axum's `IntoResponse`.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use guestlist_core::LifecycleError;
use serde::Serialize;
use std::fmt;

/// Application error type for web handlers.
///
/// Carries the status, a stable code the client can branch on, a user-facing message
/// and, for server errors, the underlying cause (logged, never sent to the client).
///
/// # Examples
///
/// ```ignore
/// async fn handler(State(state): State<AppState>) -> Result<Json<Guest>, AppError> {
///     Ok(Json(state.guests.get(id).await?))
/// }
/// ```
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
    code: &'static str,
    source: Option<anyhow::Error>,
}

impl AppError {
    /// Create a new application error.
    #[must_use]
    pub const fn new(status: StatusCode, message: String, code: &'static str) -> Self {
        Self {
            status,
            message,
            code,
            source: None,
        }
    }

    /// Attach the underlying cause.
    #[must_use]
    pub fn with_source(mut self, source: anyhow::Error) -> Self {
        self.source = Some(source);
        self
    }

    /// Create a 422 Unprocessable Entity error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::UNPROCESSABLE_ENTITY,
            message.into(),
            "VALIDATION_ERROR",
        )
    }

    /// Create a 404 Not Found error.
    #[must_use]
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message.into(), "NOT_FOUND")
    }

    /// Create a 409 Conflict error.
    #[must_use]
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, message.into(), "CONFLICT")
    }

    /// Create a 412 Precondition Failed error.
    #[must_use]
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::PRECONDITION_FAILED,
            message.into(),
            "PRECONDITION_FAILED",
        )
    }

    /// Create a 500 Internal Server Error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            message.into(),
            "INTERNAL_SERVER_ERROR",
        )
    }

    /// HTTP status of the response
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }

    /// Machine-readable error code
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        // Well-formed JSON of the wrong shape is a validation failure; the rest
        // (syntax, content type) keeps axum's status.
        if matches!(rejection, JsonRejection::JsonDataError(_)) {
            Self::validation(rejection.body_text())
        } else {
            Self::new(rejection.status(), rejection.body_text(), "INVALID_BODY")
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

/// Error response body (JSON).
#[derive(Debug, Serialize)]
struct ErrorResponse {
    code: &'static str,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            match &self.source {
                Some(source) => tracing::error!(
                    status = %self.status,
                    code = self.code,
                    error = %source,
                    "Internal server error"
                ),
                None => tracing::error!(status = %self.status, code = self.code, "Internal server error"),
            }
        }

        let body = ErrorResponse {
            code: self.code,
            message: self.message,
        };

        (self.status, Json(body)).into_response()
    }
}

impl From<LifecycleError> for AppError {
    fn from(err: LifecycleError) -> Self {
        match err {
            LifecycleError::Validation(message) => Self::validation(message),
            LifecycleError::NotFound { .. } => Self::not_found(err.to_string()),
            LifecycleError::Conflict(message) => Self::conflict(message),
            LifecycleError::Precondition(message) => Self::precondition(message),
            LifecycleError::Storage(source) => {
                Self::internal("An internal error occurred").with_source(source.into())
            }
        }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::internal("An internal error occurred").with_source(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use guestlist_core::StoreError;

    #[test]
    fn test_error_display() {
        let err = AppError::validation("name is required");
        assert_eq!(err.to_string(), "[VALIDATION_ERROR] name is required");
    }

    #[test]
    fn test_lifecycle_errors_map_to_statuses() {
        let cases = [
            (LifecycleError::Validation("x".into()), StatusCode::UNPROCESSABLE_ENTITY),
            (LifecycleError::not_found("guest", "1"), StatusCode::NOT_FOUND),
            (LifecycleError::Conflict("x".into()), StatusCode::CONFLICT),
            (LifecycleError::Precondition("x".into()), StatusCode::PRECONDITION_FAILED),
            (
                LifecycleError::Storage(StoreError::Database("down".into())),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            assert_eq!(AppError::from(err).status(), status);
        }
    }

    #[test]
    fn test_storage_message_is_generic() {
        let err = AppError::from(LifecycleError::Storage(StoreError::Database(
            "password authentication failed".into(),
        )));
        assert_eq!(err.message, "An internal error occurred");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_not_found_keeps_entity_and_id() {
        let err = AppError::from(LifecycleError::not_found("guest", "abc"));
        assert_eq!(err.code(), "NOT_FOUND");
        assert_eq!(err.message, "guest abc not found");
    }
}
