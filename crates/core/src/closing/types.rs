//! Closure and carry-forward records.

use chrono::{DateTime, Utc};
use comptable_shared::types::{CarryForwardId, ClosureId, ExerciseId, JournalEntryId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::exercise::PeriodLabel;

/// Granularity of a period closure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosureType {
    /// One month.
    Monthly,
    /// Quarter end.
    Quarterly,
    /// Last month of the exercise.
    Annual,
}

impl ClosureType {
    /// Returns the string representation of the type.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Monthly => "MONTHLY",
            Self::Quarterly => "QUARTERLY",
            Self::Annual => "ANNUAL",
        }
    }

    /// Parses a type from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "MONTHLY" => Some(Self::Monthly),
            "QUARTERLY" => Some(Self::Quarterly),
            "ANNUAL" => Some(Self::Annual),
            _ => None,
        }
    }
}

impl fmt::Display for ClosureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Status of a closure record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClosureStatus {
    /// Period closed.
    Closed,
    /// Closure lifted; the record is kept for history.
    Reopened,
}

impl ClosureStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Closed => "CLOSED",
            Self::Reopened => "REOPENED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "CLOSED" => Some(Self::Closed),
            "REOPENED" => Some(Self::Reopened),
            _ => None,
        }
    }
}

impl fmt::Display for ClosureStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Control results captured when a period is closed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlSnapshot {
    /// Entries examined (not rejected nor cancelled).
    pub entries_checked: usize,
    /// References of unbalanced entries.
    pub unbalanced_entries: Vec<String>,
    /// Trial balance verdict over the period window.
    pub trial_balance_balanced: bool,
    /// Trial balance diagnostics.
    pub trial_balance_diagnostics: Vec<String>,
    /// Posted lettrable lines without lettering.
    pub unlettered_lines: usize,
    /// Posted bank lines without reconciliation tag.
    pub unreconciled_bank_lines: usize,
}

impl ControlSnapshot {
    /// Blocking controls passed.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.unbalanced_entries.is_empty() && self.trial_balance_balanced
    }
}

/// Closure of one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeriodClosure {
    /// Unique identifier.
    pub id: ClosureId,
    /// Exercise.
    pub exercise_id: ExerciseId,
    /// Closed period.
    pub period: PeriodLabel,
    /// Granularity.
    pub closure_type: ClosureType,
    /// Status.
    pub status: ClosureStatus,
    /// Closing actor.
    pub closed_by: UserId,
    /// Closing time.
    pub closed_at: DateTime<Utc>,
    /// Controls at closing time.
    pub controls: ControlSnapshot,
    /// Findings recorded by the close.
    pub anomaly_count: usize,
    /// Why the period was reopened.
    pub reopen_reason: Option<String>,
    /// Reopening actor.
    pub reopened_by: Option<UserId>,
    /// Reopening time.
    pub reopened_at: Option<DateTime<Utc>>,
}

impl PeriodClosure {
    /// Builds a CLOSED record.
    #[must_use]
    pub fn closed(
        exercise_id: ExerciseId,
        period: PeriodLabel,
        closure_type: ClosureType,
        closed_by: UserId,
        controls: ControlSnapshot,
        anomaly_count: usize,
    ) -> Self {
        Self {
            id: ClosureId::new(),
            exercise_id,
            period,
            closure_type,
            status: ClosureStatus::Closed,
            closed_by,
            closed_at: Utc::now(),
            controls,
            anomaly_count,
            reopen_reason: None,
            reopened_by: None,
            reopened_at: None,
        }
    }

    /// Returns true while the closure is in force.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.status == ClosureStatus::Closed
    }
}

/// A balance carried into the next exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportedBalance {
    /// Account number.
    pub account_number: String,
    /// Debit carried.
    pub debit: Decimal,
    /// Credit carried.
    pub credit: Decimal,
}

/// Progress of a carry-forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CarryForwardStatus {
    /// Claimed, not yet completed.
    InProgress,
    /// Entry posted, balances recorded.
    Completed,
}

impl CarryForwardStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
        }
    }

    /// Parses a status from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            _ => None,
        }
    }
}

/// Carry-forward (à-nouveaux) from one exercise to the next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CarryForward {
    /// Unique identifier.
    pub id: CarryForwardId,
    /// Closed exercise.
    pub source_exercise_id: ExerciseId,
    /// Receiving exercise.
    pub destination_exercise_id: ExerciseId,
    /// Claim time.
    pub generated_at: DateTime<Utc>,
    /// Actor.
    pub generated_by: UserId,
    /// Posted carry-forward entry.
    pub entry_id: Option<JournalEntryId>,
    /// Balances carried.
    pub balances: Vec<ReportedBalance>,
    /// Progress.
    pub status: CarryForwardStatus,
}

impl CarryForward {
    /// Builds an in-progress claim.
    #[must_use]
    pub fn claim(source: ExerciseId, destination: ExerciseId, generated_by: UserId) -> Self {
        Self {
            id: CarryForwardId::new(),
            source_exercise_id: source,
            destination_exercise_id: destination,
            generated_at: Utc::now(),
            generated_by,
            entry_id: None,
            balances: Vec::new(),
            status: CarryForwardStatus::InProgress,
        }
    }
}
