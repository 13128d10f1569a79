//! Engine error type.

use comptable_shared::AppError;
use thiserror::Error;

use crate::chart::ChartError;
use crate::closing::ClosingError;
use crate::exercise::ExerciseError;
use crate::journal::JournalError;
use crate::ledger::LedgerError;
use crate::store::StoreError;

/// Any error an engine operation can return.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Chart of accounts error.
    #[error(transparent)]
    Chart(#[from] ChartError),

    /// Exercise error.
    #[error(transparent)]
    Exercise(#[from] ExerciseError),

    /// Journal entry error.
    #[error(transparent)]
    Journal(#[from] JournalError),

    /// Ledger aggregation error.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Closing error.
    #[error(transparent)]
    Closing(#[from] ClosingError),

    /// Persistence error.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EngineError {
    /// Returns the error code of the wrapped error.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Chart(e) => e.error_code(),
            Self::Exercise(e) => e.error_code(),
            Self::Journal(e) => e.error_code(),
            Self::Ledger(e) => e.error_code(),
            Self::Closing(e) => e.error_code(),
            Self::Store(e) => e.error_code(),
        }
    }

    /// Returns the HTTP status code of the wrapped error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::Chart(e) => e.http_status_code(),
            Self::Exercise(e) => e.http_status_code(),
            Self::Journal(e) => e.http_status_code(),
            Self::Ledger(e) => e.http_status_code(),
            Self::Closing(e) => e.http_status_code(),
            Self::Store(e) => e.http_status_code(),
        }
    }
}

impl From<EngineError> for AppError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Store(StoreError::Backend(message)) => Self::Database(message),
            other => Self::from_status(other.http_status_code(), other.to_string()),
        }
    }
}
