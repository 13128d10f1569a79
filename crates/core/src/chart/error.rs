//! Chart of accounts error types.

use thiserror::Error;

/// Errors raised while defining or resolving accounts.
#[derive(Debug, Error)]
pub enum ChartError {
    /// Account number does not match `^[1-9]\d*$`.
    #[error("Invalid account number '{0}': must start with a digit 1-9 and contain only digits")]
    InvalidAccountNumber(String),

    /// Account label is empty.
    #[error("Account {0} must have a label")]
    MissingLabel(String),

    /// Account number already exists in the exercise.
    #[error("Account {number} already exists in exercise {exercise}")]
    DuplicateAccount {
        /// The duplicated number.
        number: String,
        /// The exercise code.
        exercise: String,
    },

    /// Parent is not a strict prefix of the account number.
    #[error("Account {parent} cannot be the parent of {number}")]
    InvalidParent {
        /// The child account number.
        number: String,
        /// The rejected parent number.
        parent: String,
    },

    /// Parent account does not exist in the exercise.
    #[error("Parent account {0} not found")]
    ParentNotFound(String),

    /// Account not found in the exercise.
    #[error("Account not found: {0}")]
    AccountNotFound(String),
}

impl ChartError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAccountNumber(_) => "INVALID_ACCOUNT_NUMBER",
            Self::MissingLabel(_) => "MISSING_ACCOUNT_LABEL",
            Self::DuplicateAccount { .. } => "DUPLICATE_ACCOUNT",
            Self::InvalidParent { .. } => "INVALID_PARENT_ACCOUNT",
            Self::ParentNotFound(_) => "PARENT_ACCOUNT_NOT_FOUND",
            Self::AccountNotFound(_) => "UNKNOWN_ACCOUNT",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::InvalidAccountNumber(_) | Self::MissingLabel(_) | Self::InvalidParent { .. } => {
                400
            }
            Self::ParentNotFound(_) | Self::AccountNotFound(_) => 404,
            Self::DuplicateAccount { .. } => 409,
        }
    }
}
