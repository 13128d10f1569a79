//! Exercise (fiscal year) types.

use chrono::{DateTime, NaiveDate, Utc};
use comptable_shared::types::{ExerciseId, UserId};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ExerciseError;
use super::period::PeriodLabel;

/// Exercise lifecycle status.
///
/// `OPEN → CLOSING → CLOSED`; a failed annual close releases
/// `CLOSING` back to `OPEN`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExerciseStatus {
    /// Accepting entries.
    Open,
    /// Annual closing claimed and running.
    Closing,
    /// Closed, read-only.
    Closed,
}

impl ExerciseStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "OPEN",
            Self::Closing => "CLOSING",
            Self::Closed => "CLOSED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "OPEN" => Some(Self::Open),
            "CLOSING" => Some(Self::Closing),
            "CLOSED" => Some(Self::Closed),
            _ => None,
        }
    }
}

impl fmt::Display for ExerciseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fiscal exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    /// Unique identifier.
    pub id: ExerciseId,
    /// Exercise code (e.g. "2024").
    pub code: String,
    /// First day.
    pub start_date: NaiveDate,
    /// Last day.
    pub end_date: NaiveDate,
    /// Lifecycle status.
    pub status: ExerciseStatus,
    /// Actor who closed the exercise.
    pub closed_by: Option<UserId>,
    /// When the exercise was closed.
    pub closed_at: Option<DateTime<Utc>>,
    /// Set once a carry-forward has landed in this exercise.
    pub opening_balances_validated: bool,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Exercise {
    /// Builds an open exercise.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is empty or `start > end`.
    pub fn new(
        code: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, ExerciseError> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(ExerciseError::MissingCode);
        }
        if start_date > end_date {
            return Err(ExerciseError::InvalidDates {
                start: start_date,
                end: end_date,
            });
        }

        Ok(Self {
            id: ExerciseId::new(),
            code,
            start_date,
            end_date,
            status: ExerciseStatus::Open,
            closed_by: None,
            closed_at: None,
            opening_balances_validated: false,
            created_at: Utc::now(),
        })
    }

    /// Returns true if entries may be created.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.status == ExerciseStatus::Open
    }

    /// Returns true if `date` falls inside the exercise.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Calendar months covered by the exercise, in order.
    #[must_use]
    pub fn periods(&self) -> Vec<PeriodLabel> {
        let mut periods = Vec::new();
        let mut current = PeriodLabel::from_date(self.start_date).ok();
        while let Some(period) = current {
            if period.first_day() > self.end_date {
                break;
            }
            periods.push(period);
            current = period.next();
        }
        periods
    }

    /// Returns true if the period overlaps the exercise.
    #[must_use]
    pub fn has_period(&self, period: &PeriodLabel) -> bool {
        period.first_day() <= self.end_date && period.last_day() >= self.start_date
    }

    /// Date window of `period`, clipped to the exercise.
    ///
    /// # Errors
    ///
    /// Returns `PeriodNotInExercise` if the period does not overlap.
    pub fn period_bounds(&self, period: &PeriodLabel) -> Result<(NaiveDate, NaiveDate), ExerciseError> {
        if !self.has_period(period) {
            return Err(ExerciseError::PeriodNotInExercise {
                period: period.to_string(),
                code: self.code.clone(),
            });
        }
        Ok((
            period.first_day().max(self.start_date),
            period.last_day().min(self.end_date),
        ))
    }

    /// Fails unless the exercise is open.
    ///
    /// # Errors
    ///
    /// Returns `ExerciseNotOpen` with the current status.
    pub fn ensure_open(&self) -> Result<(), ExerciseError> {
        if self.is_open() {
            Ok(())
        } else {
            Err(ExerciseError::ExerciseNotOpen {
                code: self.code.clone(),
                status: self.status,
            })
        }
    }

    /// Fails unless `date` is inside the exercise.
    ///
    /// # Errors
    ///
    /// Returns `DateOutsideExercise`.
    pub fn ensure_contains(&self, date: NaiveDate) -> Result<(), ExerciseError> {
        if self.contains(date) {
            Ok(())
        } else {
            Err(ExerciseError::DateOutsideExercise {
                date,
                code: self.code.clone(),
            })
        }
    }
}
