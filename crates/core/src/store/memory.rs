//! In-memory `LedgerStore`.
//!
//! One mutex guards the whole state, so every method is trivially atomic:
//! changes are staged on copies and committed only once every check passed.

use std::collections::{BTreeMap, HashMap, btree_map};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use comptable_shared::types::{
    CarryForwardId, ClosureId, ExerciseId, JournalEntryId, UserId,
};
use tokio::sync::Mutex;

use super::{EntryFilter, LedgerStore, StoreError};
use crate::chart::Account;
use crate::closing::{
    CarryForward, CarryForwardStatus, ClosureStatus, PeriodClosure, ReportedBalance,
};
use crate::exercise::{Exercise, ExerciseStatus};
use crate::journal::{EntryAction, EntryStatus, JournalEntry, NewJournalEntry};
use crate::ledger::PostedLine;
use crate::validation::Anomaly;

#[derive(Debug, Default)]
struct MemoryState {
    exercises: HashMap<ExerciseId, Exercise>,
    accounts: BTreeMap<(ExerciseId, String), Account>,
    entries: HashMap<JournalEntryId, JournalEntry>,
    sequences: HashMap<(ExerciseId, String), u64>,
    anomalies: Vec<Anomaly>,
    closures: Vec<PeriodClosure>,
    carry_forwards: Vec<CarryForward>,
}

impl MemoryState {
    fn exercise_mut(&mut self, id: ExerciseId) -> Result<&mut Exercise, StoreError> {
        self.exercises
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("exercise {id}")))
    }

    fn swap_exercise_status(
        &mut self,
        id: ExerciseId,
        expected: ExerciseStatus,
        next: ExerciseStatus,
    ) -> Result<&mut Exercise, StoreError> {
        let exercise = self.exercise_mut(id)?;
        if exercise.status != expected {
            return Err(StoreError::StatusMismatch {
                entity: format!("exercise {}", exercise.code),
                expected: expected.to_string(),
                actual: exercise.status.to_string(),
            });
        }
        exercise.status = next;
        Ok(exercise)
    }

    fn entry_mut(&mut self, id: JournalEntryId) -> Result<&mut JournalEntry, StoreError> {
        self.entries
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("entry {id}")))
    }

    fn carry_forward_mut(&mut self, id: CarryForwardId) -> Result<&mut CarryForward, StoreError> {
        self.carry_forwards
            .iter_mut()
            .find(|cf| cf.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("carry-forward {id}")))
    }
}

fn status_mismatch(entry: &JournalEntry, action: &EntryAction) -> StoreError {
    StoreError::StatusMismatch {
        entity: format!("entry {}", entry.id),
        expected: action.from_status().to_string(),
        actual: entry.status.to_string(),
    }
}

/// Thread-safe in-memory store, for tests and embedding.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl LedgerStore for InMemoryStore {
    async fn insert_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state
            .exercises
            .values()
            .any(|e| e.id == exercise.id || e.code == exercise.code)
        {
            return Err(StoreError::Duplicate(format!("exercise {}", exercise.code)));
        }
        state.exercises.insert(exercise.id, exercise.clone());
        Ok(())
    }

    async fn exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StoreError> {
        Ok(self.state.lock().await.exercises.get(&id).cloned())
    }

    async fn claim_exercise_closing(&self, id: ExerciseId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.swap_exercise_status(id, ExerciseStatus::Open, ExerciseStatus::Closing)?;
        Ok(())
    }

    async fn release_exercise_closing(&self, id: ExerciseId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.swap_exercise_status(id, ExerciseStatus::Closing, ExerciseStatus::Open)?;
        Ok(())
    }

    async fn finish_exercise_closing(
        &self,
        id: ExerciseId,
        closed_by: UserId,
        closed_at: DateTime<Utc>,
    ) -> Result<Exercise, StoreError> {
        let mut state = self.state.lock().await;
        let exercise =
            state.swap_exercise_status(id, ExerciseStatus::Closing, ExerciseStatus::Closed)?;
        exercise.closed_by = Some(closed_by);
        exercise.closed_at = Some(closed_at);
        Ok(exercise.clone())
    }

    async fn mark_opening_balances_validated(&self, id: ExerciseId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.exercise_mut(id)?.opening_balances_validated = true;
        Ok(())
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        let key = (account.exercise_id, account.number.clone());
        if state.accounts.contains_key(&key) {
            return Err(StoreError::Duplicate(format!("account {}", account.number)));
        }
        state.accounts.insert(key, account.clone());
        Ok(())
    }

    async fn account(
        &self,
        exercise_id: ExerciseId,
        number: &str,
    ) -> Result<Option<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .get(&(exercise_id, number.to_string()))
            .cloned())
    }

    async fn accounts(&self, exercise_id: ExerciseId) -> Result<Vec<Account>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .accounts
            .values()
            .filter(|a| a.exercise_id == exercise_id)
            .cloned()
            .collect())
    }

    async fn set_account_active(
        &self,
        exercise_id: ExerciseId,
        number: &str,
        active: bool,
    ) -> Result<Account, StoreError> {
        let mut state = self.state.lock().await;
        let account = state
            .accounts
            .get_mut(&(exercise_id, number.to_string()))
            .ok_or_else(|| StoreError::NotFound(format!("account {number}")))?;
        account.active = active;
        Ok(account.clone())
    }

    async fn insert_entry(&self, entry: NewJournalEntry) -> Result<JournalEntry, StoreError> {
        let mut state = self.state.lock().await;
        if state.entries.contains_key(&entry.id) {
            return Err(StoreError::Duplicate(format!("entry {}", entry.id)));
        }

        let key = (entry.exercise_id, entry.journal_code.clone());
        let sequence = state.sequences.get(&key).copied().unwrap_or(0) + 1;
        let stored = JournalEntry::from_new(entry, sequence);

        state.sequences.insert(key, sequence);
        state.entries.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        Ok(self.state.lock().await.entries.get(&id).cloned())
    }

    async fn entries(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>, StoreError> {
        let state = self.state.lock().await;
        let mut entries: Vec<JournalEntry> = state
            .entries
            .values()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        entries.sort_by(|a, b| {
            (a.entry_date, a.journal_code.as_str(), a.sequence).cmp(&(
                b.entry_date,
                b.journal_code.as_str(),
                b.sequence,
            ))
        });
        Ok(entries)
    }

    async fn transition_entry(
        &self,
        id: JournalEntryId,
        action: &EntryAction,
    ) -> Result<JournalEntry, StoreError> {
        if matches!(action, EntryAction::Post { .. }) {
            return Err(StoreError::Backend(
                "posting must go through post_entry".to_string(),
            ));
        }

        let mut state = self.state.lock().await;
        let entry = state.entry_mut(id)?;
        let mut staged = entry.clone();
        action
            .apply(&mut staged)
            .map_err(|_| status_mismatch(entry, action))?;
        *entry = staged.clone();
        Ok(staged)
    }

    async fn post_entry(
        &self,
        id: JournalEntryId,
        action: &EntryAction,
    ) -> Result<JournalEntry, StoreError> {
        let mut state = self.state.lock().await;

        let entry = state
            .entries
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("entry {id}")))?;
        if entry.status != EntryStatus::Validated || !matches!(action, EntryAction::Post { .. }) {
            return Err(status_mismatch(entry, action));
        }

        let mut staged_entry = entry.clone();
        action
            .apply(&mut staged_entry)
            .map_err(|_| status_mismatch(entry, action))?;

        let mut staged_accounts: BTreeMap<String, Account> = BTreeMap::new();
        for line in &entry.lines {
            let account = match staged_accounts.entry(line.account_number.clone()) {
                btree_map::Entry::Occupied(staged) => staged.into_mut(),
                btree_map::Entry::Vacant(slot) => {
                    let current = state
                        .accounts
                        .get(&(entry.exercise_id, line.account_number.clone()))
                        .filter(|a| a.active)
                        .ok_or_else(|| StoreError::AccountUnavailable(line.account_number.clone()))?;
                    slot.insert(current.clone())
                }
            };
            account.balance = account.balance.with_movement(line.side, line.base_amount);
        }

        for (number, account) in staged_accounts {
            state.accounts.insert((staged_entry.exercise_id, number), account);
        }
        state.entries.insert(id, staged_entry.clone());
        Ok(staged_entry)
    }

    async fn posted_lines(
        &self,
        exercise_id: ExerciseId,
        account: Option<&str>,
        until: Option<NaiveDate>,
    ) -> Result<Vec<PostedLine>, StoreError> {
        let state = self.state.lock().await;
        let mut lines: Vec<PostedLine> = state
            .entries
            .values()
            .filter(|e| e.exercise_id == exercise_id && e.status == EntryStatus::Posted)
            .filter(|e| until.is_none_or(|until| e.entry_date <= until))
            .flat_map(|e| {
                let reference = e
                    .document_reference
                    .clone()
                    .unwrap_or_else(|| e.reference_label());
                e.lines
                    .iter()
                    .filter(move |l| account.is_none_or(|number| l.account_number == number))
                    .map(move |l| PostedLine {
                        entry_id: e.id,
                        sequence: e.sequence,
                        journal_code: e.journal_code.clone(),
                        entry_date: e.entry_date,
                        entry_label: e.label.clone(),
                        reference: reference.clone(),
                        line_number: l.line_number,
                        account_number: l.account_number.clone(),
                        label: l.label.clone(),
                        debit: l.debit(),
                        credit: l.credit(),
                        lettering: l.lettering.clone(),
                    })
            })
            .collect();
        lines.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        Ok(lines)
    }

    async fn insert_anomalies(&self, anomalies: &[Anomaly]) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state.anomalies.extend_from_slice(anomalies);
        Ok(())
    }

    async fn anomalies(
        &self,
        exercise_id: ExerciseId,
        entry_id: Option<JournalEntryId>,
    ) -> Result<Vec<Anomaly>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .anomalies
            .iter()
            .filter(|a| a.exercise_id == exercise_id)
            .filter(|a| entry_id.is_none_or(|id| a.entry_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn insert_period_closure(&self, closure: &PeriodClosure) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state.closures.iter().any(|c| {
            c.exercise_id == closure.exercise_id && c.period == closure.period && c.is_closed()
        }) {
            return Err(StoreError::Duplicate(format!("closure of {}", closure.period)));
        }
        state.closures.push(closure.clone());
        Ok(())
    }

    async fn period_closure(&self, id: ClosureId) -> Result<Option<PeriodClosure>, StoreError> {
        let state = self.state.lock().await;
        Ok(state.closures.iter().find(|c| c.id == id).cloned())
    }

    async fn period_closures(
        &self,
        exercise_id: ExerciseId,
    ) -> Result<Vec<PeriodClosure>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .closures
            .iter()
            .filter(|c| c.exercise_id == exercise_id)
            .cloned()
            .collect())
    }

    async fn reopen_period_closure(
        &self,
        id: ClosureId,
        reason: &str,
        reopened_by: UserId,
        reopened_at: DateTime<Utc>,
    ) -> Result<PeriodClosure, StoreError> {
        let mut state = self.state.lock().await;
        let closure = state
            .closures
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("closure {id}")))?;
        if !closure.is_closed() {
            return Err(StoreError::StatusMismatch {
                entity: format!("closure {id}"),
                expected: ClosureStatus::Closed.as_str().to_string(),
                actual: closure.status.as_str().to_string(),
            });
        }
        closure.status = ClosureStatus::Reopened;
        closure.reopen_reason = Some(reason.to_string());
        closure.reopened_by = Some(reopened_by);
        closure.reopened_at = Some(reopened_at);
        Ok(closure.clone())
    }

    async fn claim_carry_forward(&self, record: &CarryForward) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        if state
            .carry_forwards
            .iter()
            .any(|cf| cf.source_exercise_id == record.source_exercise_id)
        {
            return Err(StoreError::Duplicate(format!(
                "carry-forward from {}",
                record.source_exercise_id
            )));
        }
        state.carry_forwards.push(record.clone());
        Ok(())
    }

    async fn complete_carry_forward(
        &self,
        id: CarryForwardId,
        entry_id: JournalEntryId,
        balances: &[ReportedBalance],
    ) -> Result<CarryForward, StoreError> {
        let mut state = self.state.lock().await;
        let record = state.carry_forward_mut(id)?;
        if record.status != CarryForwardStatus::InProgress {
            return Err(StoreError::StatusMismatch {
                entity: format!("carry-forward {id}"),
                expected: CarryForwardStatus::InProgress.as_str().to_string(),
                actual: record.status.as_str().to_string(),
            });
        }
        record.entry_id = Some(entry_id);
        record.balances = balances.to_vec();
        record.status = CarryForwardStatus::Completed;
        Ok(record.clone())
    }

    async fn abandon_carry_forward(&self, id: CarryForwardId) -> Result<(), StoreError> {
        let mut state = self.state.lock().await;
        state
            .carry_forwards
            .retain(|cf| cf.id != id || cf.status != CarryForwardStatus::InProgress);
        Ok(())
    }

    async fn carry_forward(
        &self,
        source_exercise_id: ExerciseId,
    ) -> Result<Option<CarryForward>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .carry_forwards
            .iter()
            .find(|cf| cf.source_exercise_id == source_exercise_id)
            .cloned())
    }
}
