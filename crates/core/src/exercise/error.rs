//! Exercise and period calendar errors.

use chrono::NaiveDate;
use thiserror::Error;

use super::types::ExerciseStatus;

/// Errors raised on exercise lifecycle and period resolution.
#[derive(Debug, Error)]
pub enum ExerciseError {
    /// Exercise code is empty.
    #[error("Exercise code is required")]
    MissingCode,

    /// Start date after end date.
    #[error("Exercise start {start} is after its end {end}")]
    InvalidDates {
        /// Start date.
        start: NaiveDate,
        /// End date.
        end: NaiveDate,
    },

    /// Period label is not `YYYY-MM`.
    #[error("Invalid period label '{0}': expected YYYY-MM")]
    InvalidPeriodLabel(String),

    /// Exercise not found.
    #[error("Exercise not found: {0}")]
    ExerciseNotFound(String),

    /// An exercise with the same code already exists.
    #[error("Exercise {0} already exists")]
    DuplicateExercise(String),

    /// Exercise is not open for the requested operation.
    #[error("Exercise {code} is {status}, expected OPEN")]
    ExerciseNotOpen {
        /// Exercise code.
        code: String,
        /// Current status.
        status: ExerciseStatus,
    },

    /// Date falls outside the exercise.
    #[error("Date {date} is outside exercise {code}")]
    DateOutsideExercise {
        /// The offending date.
        date: NaiveDate,
        /// Exercise code.
        code: String,
    },

    /// Period label does not belong to the exercise.
    #[error("Period {period} is not part of exercise {code}")]
    PeriodNotInExercise {
        /// The period label.
        period: String,
        /// Exercise code.
        code: String,
    },
}

impl ExerciseError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::MissingCode => "MISSING_EXERCISE_CODE",
            Self::InvalidDates { .. } => "INVALID_EXERCISE_DATES",
            Self::InvalidPeriodLabel(_) => "INVALID_PERIOD",
            Self::ExerciseNotFound(_) => "EXERCISE_NOT_FOUND",
            Self::DuplicateExercise(_) => "DUPLICATE_EXERCISE",
            Self::ExerciseNotOpen { .. } => "EXERCISE_NOT_OPEN",
            Self::DateOutsideExercise { .. } => "DATE_OUTSIDE_EXERCISE",
            Self::PeriodNotInExercise { .. } => "PERIOD_NOT_IN_EXERCISE",
        }
    }

    /// Returns the HTTP status code for this error.
    #[must_use]
    pub fn http_status_code(&self) -> u16 {
        match self {
            Self::MissingCode | Self::InvalidDates { .. } | Self::InvalidPeriodLabel(_) => 400,
            Self::ExerciseNotFound(_) => 404,
            Self::DuplicateExercise(_) | Self::ExerciseNotOpen { .. } => 409,
            Self::DateOutsideExercise { .. } | Self::PeriodNotInExercise { .. } => 422,
        }
    }
}
