//! Ledger aggregation errors.

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised while building ledgers.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Window start after window end.
    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange {
        /// Window start.
        from: NaiveDate,
        /// Window end.
        to: NaiveDate,
    },
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidDateRange { .. } => "INVALID_DATE_RANGE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidDateRange { .. } => 400,
        }
    }
}
