//! Persistence boundary of the ledger.
//!
//! Every method is one atomic unit. Implementations must guarantee:
//! - `insert_entry` allocates the next sequence for (exercise, journal)
//!   and writes header and lines together, or nothing at all;
//! - `post_entry` swaps VALIDATED → POSTED and applies every balance
//!   delta together, or nothing at all;
//! - claims and closures are compare-and-swap.

pub mod error;
pub mod filter;
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use comptable_shared::types::{
    CarryForwardId, ClosureId, ExerciseId, JournalEntryId, UserId,
};

use crate::chart::Account;
use crate::closing::{CarryForward, PeriodClosure, ReportedBalance};
use crate::exercise::Exercise;
use crate::journal::{EntryAction, JournalEntry, NewJournalEntry};
use crate::ledger::PostedLine;
use crate::validation::Anomaly;

pub use error::StoreError;
pub use filter::EntryFilter;
pub use memory::InMemoryStore;

/// Storage of exercises, accounts, entries, anomalies, closures and
/// carry-forwards.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // ========== Exercises ==========

    /// Inserts an exercise; `Duplicate` if the code exists.
    async fn insert_exercise(&self, exercise: &Exercise) -> Result<(), StoreError>;

    /// Loads an exercise.
    async fn exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StoreError>;

    /// OPEN → CLOSING; `StatusMismatch` otherwise.
    async fn claim_exercise_closing(&self, id: ExerciseId) -> Result<(), StoreError>;

    /// CLOSING → OPEN after a failed annual close.
    async fn release_exercise_closing(&self, id: ExerciseId) -> Result<(), StoreError>;

    /// CLOSING → CLOSED with actor and time.
    async fn finish_exercise_closing(
        &self,
        id: ExerciseId,
        closed_by: UserId,
        closed_at: DateTime<Utc>,
    ) -> Result<Exercise, StoreError>;

    /// Flags the exercise's opening balances as validated.
    async fn mark_opening_balances_validated(&self, id: ExerciseId) -> Result<(), StoreError>;

    // ========== Accounts ==========

    /// Inserts an account; `Duplicate` on (exercise, number).
    async fn insert_account(&self, account: &Account) -> Result<(), StoreError>;

    /// Loads an account by number.
    async fn account(
        &self,
        exercise_id: ExerciseId,
        number: &str,
    ) -> Result<Option<Account>, StoreError>;

    /// Lists the chart of an exercise ordered by number.
    async fn accounts(&self, exercise_id: ExerciseId) -> Result<Vec<Account>, StoreError>;

    /// Sets the active flag; balances are untouched.
    async fn set_account_active(
        &self,
        exercise_id: ExerciseId,
        number: &str,
        active: bool,
    ) -> Result<Account, StoreError>;

    // ========== Entries ==========

    /// Allocates the next sequence and persists the entry in DRAFT.
    async fn insert_entry(&self, entry: NewJournalEntry) -> Result<JournalEntry, StoreError>;

    /// Loads an entry with its lines.
    async fn entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError>;

    /// Lists entries ordered by (date, journal, sequence).
    async fn entries(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>, StoreError>;

    /// Applies a validate, reject or cancel action as a compare-and-swap.
    ///
    /// Post actions are refused; they go through `post_entry`.
    async fn transition_entry(
        &self,
        id: JournalEntryId,
        action: &EntryAction,
    ) -> Result<JournalEntry, StoreError>;

    /// VALIDATED → POSTED plus every balance delta, atomically.
    ///
    /// `AccountUnavailable` if any line's account is missing or inactive.
    async fn post_entry(
        &self,
        id: JournalEntryId,
        action: &EntryAction,
    ) -> Result<JournalEntry, StoreError>;

    /// Lines of POSTED entries, optionally for one account and up to a date.
    async fn posted_lines(
        &self,
        exercise_id: ExerciseId,
        account: Option<&str>,
        until: Option<NaiveDate>,
    ) -> Result<Vec<PostedLine>, StoreError>;

    // ========== Anomalies ==========

    /// Persists a batch of findings.
    async fn insert_anomalies(&self, anomalies: &[Anomaly]) -> Result<(), StoreError>;

    /// Lists findings of an exercise, optionally for one entry.
    async fn anomalies(
        &self,
        exercise_id: ExerciseId,
        entry_id: Option<JournalEntryId>,
    ) -> Result<Vec<Anomaly>, StoreError>;

    // ========== Period closures ==========

    /// Inserts a CLOSED closure; `Duplicate` if one is already in force
    /// for (exercise, period).
    async fn insert_period_closure(&self, closure: &PeriodClosure) -> Result<(), StoreError>;

    /// Loads a closure.
    async fn period_closure(&self, id: ClosureId) -> Result<Option<PeriodClosure>, StoreError>;

    /// Lists every closure of an exercise, history included.
    async fn period_closures(
        &self,
        exercise_id: ExerciseId,
    ) -> Result<Vec<PeriodClosure>, StoreError>;

    /// CLOSED → REOPENED with reason, actor and time.
    async fn reopen_period_closure(
        &self,
        id: ClosureId,
        reason: &str,
        reopened_by: UserId,
        reopened_at: DateTime<Utc>,
    ) -> Result<PeriodClosure, StoreError>;

    // ========== Carry-forwards ==========

    /// Claims the carry-forward of a source exercise; `Duplicate` if
    /// already claimed.
    async fn claim_carry_forward(&self, record: &CarryForward) -> Result<(), StoreError>;

    /// Completes a claim with its entry and balances.
    async fn complete_carry_forward(
        &self,
        id: CarryForwardId,
        entry_id: JournalEntryId,
        balances: &[ReportedBalance],
    ) -> Result<CarryForward, StoreError>;

    /// Drops an in-progress claim after a failure.
    async fn abandon_carry_forward(&self, id: CarryForwardId) -> Result<(), StoreError>;

    /// Carry-forward claimed from a source exercise, if any.
    async fn carry_forward(
        &self,
        source_exercise_id: ExerciseId,
    ) -> Result<Option<CarryForward>, StoreError>;
}
