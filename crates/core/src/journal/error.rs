//! Journal entry errors.

use comptable_shared::types::JournalEntryId;
use rust_decimal::Decimal;
use thiserror::Error;

use super::types::EntryStatus;

/// Errors raised while creating or transitioning entries.
#[derive(Debug, Error)]
pub enum JournalError {
    // ========== Structural Errors ==========
    /// Entry must have at least 2 lines.
    #[error("Entry must have at least 2 lines, got {0}")]
    InsufficientLines(usize),

    /// Line amount is zero or negative.
    #[error("Line {line}: amount must be positive, got {amount}")]
    NonPositiveAmount {
        /// 1-based line number.
        line: usize,
        /// The offending amount.
        amount: Decimal,
    },

    /// Journal code is empty.
    #[error("Journal code is required")]
    MissingJournalCode,

    /// A reason is required for this transition.
    #[error("A reason is required to {0} an entry")]
    MissingReason(&'static str),

    // ========== Business Rule Errors ==========
    /// Period of an operation entry is closed.
    #[error("period {period} of exercise {exercise} is closed")]
    PeriodClosed {
        /// Period label.
        period: String,
        /// Exercise code.
        exercise: String,
    },

    /// Budget oracle refused the amount.
    #[error("Insufficient budget on line {budget_line} for {amount}")]
    BudgetInsufficient {
        /// Budget line.
        budget_line: String,
        /// Requested amount.
        amount: Decimal,
    },

    /// Foreign-currency line without a usable rate.
    #[error("Line {line}: missing exchange rate for {currency}")]
    MissingExchangeRate {
        /// 1-based line number.
        line: usize,
        /// Line currency.
        currency: String,
    },

    /// Supplied base amount disagrees with amount × rate.
    #[error("Line {line}: base amount {supplied} inconsistent with amount × rate = {expected}")]
    InconsistentBaseAmount {
        /// 1-based line number.
        line: usize,
        /// amount × rate.
        expected: Decimal,
        /// Supplied base amount.
        supplied: Decimal,
    },

    /// Σ debit ≠ Σ credit beyond tolerance.
    #[error("entry not balanced, discrepancy = {discrepancy}")]
    Unbalanced {
        /// Σ base debit.
        debit: Decimal,
        /// Σ base credit.
        credit: Decimal,
        /// |debit − credit|.
        discrepancy: Decimal,
    },

    /// Accounts missing from the exercise chart.
    #[error("unknown accounts: {}", .0.join(", "))]
    UnknownAccounts(Vec<String>),

    /// Account is deactivated.
    #[error("Account {0} is inactive")]
    AccountInactive(String),

    // ========== State Errors ==========
    /// Transition not allowed from the current status.
    #[error("Invalid status transition from {from} to {to}")]
    InvalidTransition {
        /// Current status.
        from: EntryStatus,
        /// Requested status.
        to: EntryStatus,
    },

    /// Entry not found.
    #[error("Entry not found: {0}")]
    EntryNotFound(JournalEntryId),
}

impl JournalError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InsufficientLines(_) => "INSUFFICIENT_LINES",
            Self::NonPositiveAmount { .. } => "NON_POSITIVE_AMOUNT",
            Self::MissingJournalCode => "MISSING_JOURNAL_CODE",
            Self::MissingReason(_) => "MISSING_REASON",
            Self::PeriodClosed { .. } => "PERIOD_CLOSED",
            Self::BudgetInsufficient { .. } => "BUDGET_INSUFFICIENT",
            Self::MissingExchangeRate { .. } => "MISSING_EXCHANGE_RATE",
            Self::InconsistentBaseAmount { .. } => "INCONSISTENT_BASE_AMOUNT",
            Self::Unbalanced { .. } => "UNBALANCED",
            Self::UnknownAccounts(_) => "UNKNOWN_ACCOUNT",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::InvalidTransition { .. } => "INVALID_TRANSITION",
            Self::EntryNotFound(_) => "ENTRY_NOT_FOUND",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            // 400 Bad Request - malformed input
            Self::InsufficientLines(_)
            | Self::NonPositiveAmount { .. }
            | Self::MissingJournalCode
            | Self::MissingReason(_) => 400,

            // 404 Not Found
            Self::EntryNotFound(_) => 404,

            // 409 Conflict - state errors
            Self::InvalidTransition { .. } => 409,

            // 422 Unprocessable Entity - business rules
            Self::PeriodClosed { .. }
            | Self::BudgetInsufficient { .. }
            | Self::MissingExchangeRate { .. }
            | Self::InconsistentBaseAmount { .. }
            | Self::Unbalanced { .. }
            | Self::UnknownAccounts(_)
            | Self::AccountInactive(_) => 422,
        }
    }
}
