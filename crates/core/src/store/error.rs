//! Store errors.

use thiserror::Error;

/// Errors surfaced by a `LedgerStore`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Record not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unique constraint hit.
    #[error("Duplicate: {0}")]
    Duplicate(String),

    /// Compare-and-swap lost: the record is not in the expected status.
    #[error("{entity} is {actual}, expected {expected}")]
    StatusMismatch {
        /// What was being updated.
        entity: String,
        /// Status required by the update.
        expected: String,
        /// Status found.
        actual: String,
    },

    /// Posting touched a missing or inactive account.
    #[error("Account {0} is missing or inactive")]
    AccountUnavailable(String),

    /// Backend failure; the atomic unit was rolled back.
    #[error("Persistence failure: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Duplicate(_) => "DUPLICATE",
            Self::StatusMismatch { .. } => "CONCURRENT_MODIFICATION",
            Self::AccountUnavailable(_) => "ACCOUNT_INACTIVE",
            Self::Backend(_) => "PERSISTENCE_FAILURE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Duplicate(_) | Self::StatusMismatch { .. } => 409,
            Self::AccountUnavailable(_) => 422,
            Self::Backend(_) => 500,
        }
    }
}
