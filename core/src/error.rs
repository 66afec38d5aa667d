//! Error taxonomy for lifecycle operations and the stores behind them.

use thiserror::Error;

/// Errors returned by edition and guest lifecycle operations.
///
/// Every variant except `Storage` is a domain outcome the caller can act on; none of
/// them leave a partial write behind.
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Missing or empty required input.
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist.
    #[error("{entity} {id} not found")]
    NotFound {
        /// Entity kind (`guest`, `edition`, `preselection`)
        entity: &'static str,
        /// The identifier that was looked up
        id: String,
    },

    /// Uniqueness violation, or the action was already performed.
    #[error("{0}")]
    Conflict(String),

    /// Action attempted out of the allowed state order.
    #[error("{0}")]
    Precondition(String),

    /// The store failed for reasons unrelated to the domain.
    #[error("storage failure: {0}")]
    Storage(#[source] StoreError),
}

impl LifecycleError {
    /// Shorthand for a `NotFound` error
    #[must_use]
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Stable machine-readable code for the error kind
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::NotFound { .. } => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::Precondition(_) => "PRECONDITION_FAILED",
            Self::Storage(_) => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl From<StoreError> for LifecycleError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation { field } => {
                Self::Conflict(format!("a record with this {field} already exists"))
            }
            other => Self::Storage(other),
        }
    }
}

/// Errors reported by store implementations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique constraint rejected the write.
    #[error("unique constraint violated on {field}")]
    UniqueViolation {
        /// The field (or constraint) that collided
        field: String,
    },

    /// Database connection or query failure.
    #[error("database error: {0}")]
    Database(String),

    /// Stored data could not be decoded.
    #[error("serialization error: {0}")]
    Serialization(String),
}
