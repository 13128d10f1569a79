//! Closing engine errors.

use comptable_shared::types::ClosureId;
use thiserror::Error;

/// Errors raised by period closing, annual closing and carry-forward.
#[derive(Debug, Error)]
pub enum ClosingError {
    /// A CLOSED closure already exists for the period.
    #[error("period {period} of exercise {exercise} is already closed")]
    PeriodAlreadyClosed {
        /// Period label.
        period: String,
        /// Exercise code.
        exercise: String,
    },

    /// Blocking controls failed.
    #[error("period {period} cannot be closed: {}", .problems.join("; "))]
    ControlsFailed {
        /// Period label.
        period: String,
        /// Offending entries and failing checks.
        problems: Vec<String>,
    },

    /// Annual closing requested with open periods.
    #[error("periods not closed: {}", .0.join(", "))]
    PeriodsNotClosed(Vec<String>),

    /// Another annual closing holds the claim.
    #[error("Closing of exercise {0} is already in progress")]
    ExerciseClosingInProgress(String),

    /// Exercise already closed.
    #[error("Exercise {0} is already closed")]
    ExerciseAlreadyClosed(String),

    /// Carry-forward source is not closed.
    #[error("Source exercise {0} is not closed")]
    SourceNotClosed(String),

    /// Carry-forward destination is not open.
    #[error("Destination exercise {0} is not open")]
    DestinationNotOpen(String),

    /// Destination does not follow the source.
    #[error("Destination exercise {destination} does not start after source exercise {source_code}")]
    DestinationNotAfterSource {
        /// Source exercise code.
        source_code: String,
        /// Destination exercise code.
        destination: String,
    },

    /// Source already carried forward.
    #[error("Balances of exercise {0} have already been carried forward")]
    CarryForwardAlreadyDone(String),

    /// No balance-sheet account has a nonzero balance.
    #[error("Nothing to carry forward from exercise {0}")]
    NothingToCarryForward(String),

    /// Closure not found.
    #[error("Closure not found: {0}")]
    ClosureNotFound(ClosureId),

    /// Closure is not in force.
    #[error("Closure {0} is not closed")]
    ClosureNotClosed(ClosureId),

    /// Reopen without a reason.
    #[error("A reason is required to reopen a period")]
    MissingReason,
}

impl ClosingError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::PeriodAlreadyClosed { .. } => "PERIOD_ALREADY_CLOSED",
            Self::ControlsFailed { .. } => "CLOSING_CONTROLS_FAILED",
            Self::PeriodsNotClosed(_) => "PERIODS_NOT_CLOSED",
            Self::ExerciseClosingInProgress(_) => "EXERCISE_CLOSING_IN_PROGRESS",
            Self::ExerciseAlreadyClosed(_) => "EXERCISE_ALREADY_CLOSED",
            Self::SourceNotClosed(_) => "SOURCE_NOT_CLOSED",
            Self::DestinationNotOpen(_) => "DESTINATION_NOT_OPEN",
            Self::DestinationNotAfterSource { .. } => "DESTINATION_NOT_AFTER_SOURCE",
            Self::CarryForwardAlreadyDone(_) => "CARRY_FORWARD_ALREADY_DONE",
            Self::NothingToCarryForward(_) => "NOTHING_TO_CARRY_FORWARD",
            Self::ClosureNotFound(_) => "CLOSURE_NOT_FOUND",
            Self::ClosureNotClosed(_) => "CLOSURE_NOT_CLOSED",
            Self::MissingReason => "MISSING_REASON",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::MissingReason => 400,
            Self::ClosureNotFound(_) => 404,
            Self::PeriodAlreadyClosed { .. }
            | Self::ExerciseClosingInProgress(_)
            | Self::ExerciseAlreadyClosed(_)
            | Self::CarryForwardAlreadyDone(_)
            | Self::ClosureNotClosed(_) => 409,
            Self::ControlsFailed { .. }
            | Self::PeriodsNotClosed(_)
            | Self::SourceNotClosed(_)
            | Self::DestinationNotOpen(_)
            | Self::DestinationNotAfterSource { .. }
            | Self::NothingToCarryForward(_) => 422,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(
            ClosingError::PeriodsNotClosed(vec!["2024-03".into(), "2024-04".into()]).to_string(),
            "periods not closed: 2024-03, 2024-04"
        );
        assert_eq!(
            ClosingError::PeriodAlreadyClosed {
                period: "2024-01".into(),
                exercise: "2024".into()
            }
            .to_string(),
            "period 2024-01 of exercise 2024 is already closed"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(ClosingError::CarryForwardAlreadyDone("2024".into()).http_status_code(), 409);
        assert_eq!(ClosingError::NothingToCarryForward("2024".into()).http_status_code(), 422);
        assert_eq!(ClosingError::MissingReason.error_code(), "MISSING_REASON");
    }
}
