//! Entry query filter.

use chrono::NaiveDate;
use comptable_shared::types::ExerciseId;
use serde::{Deserialize, Serialize};

use crate::exercise::PeriodLabel;
use crate::journal::{EntryStatus, EntryType, JournalEntry};

/// Criteria for listing entries; unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryFilter {
    /// Exercise.
    pub exercise_id: Option<ExerciseId>,
    /// Period.
    pub period: Option<PeriodLabel>,
    /// Status.
    pub status: Option<EntryStatus>,
    /// Entry type.
    pub entry_type: Option<EntryType>,
    /// Journal code.
    pub journal_code: Option<String>,
    /// Earliest entry date, inclusive.
    pub from: Option<NaiveDate>,
    /// Latest entry date, inclusive.
    pub to: Option<NaiveDate>,
}

impl EntryFilter {
    /// Every entry of an exercise.
    #[must_use]
    pub fn for_exercise(exercise_id: ExerciseId) -> Self {
        Self {
            exercise_id: Some(exercise_id),
            ..Self::default()
        }
    }

    /// Restricts to a period.
    #[must_use]
    pub fn with_period(mut self, period: PeriodLabel) -> Self {
        self.period = Some(period);
        self
    }

    /// Restricts to a status.
    #[must_use]
    pub fn with_status(mut self, status: EntryStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Restricts to an entry type.
    #[must_use]
    pub fn with_type(mut self, entry_type: EntryType) -> Self {
        self.entry_type = Some(entry_type);
        self
    }

    /// Restricts to a journal.
    #[must_use]
    pub fn with_journal(mut self, journal_code: impl Into<String>) -> Self {
        self.journal_code = Some(journal_code.into());
        self
    }

    /// Restricts to a date window.
    #[must_use]
    pub fn between(mut self, from: NaiveDate, to: NaiveDate) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    /// Returns true if `entry` satisfies every set criterion.
    #[must_use]
    pub fn matches(&self, entry: &JournalEntry) -> bool {
        self.exercise_id.is_none_or(|id| entry.exercise_id == id)
            && self.period.is_none_or(|p| entry.period == p)
            && self.status.is_none_or(|s| entry.status == s)
            && self.entry_type.is_none_or(|t| entry.entry_type == t)
            && self
                .journal_code
                .as_deref()
                .is_none_or(|code| entry.journal_code == code)
            && self.from.is_none_or(|from| entry.entry_date >= from)
            && self.to.is_none_or(|to| entry.entry_date <= to)
    }
}
