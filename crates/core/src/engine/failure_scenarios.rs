//! Closing operations when the store fails halfway through.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use comptable_shared::types::{CarryForwardId, ClosureId, ExerciseId, JournalEntryId, UserId};
use rust_decimal_macros::dec;

use super::{LedgerEngine, LedgerSettings};
use crate::chart::{Account, standard_chart};
use crate::closing::{CarryForward, CarryForwardStatus, ClosureType, PeriodClosure, ReportedBalance};
use crate::exercise::{Exercise, ExerciseStatus};
use crate::journal::{EntryAction, EntryInput, EntryStatus, EntryType, JournalEntry, LineInput, NewJournalEntry};
use crate::ledger::PostedLine;
use crate::store::{EntryFilter, InMemoryStore, LedgerStore, StoreError};
use crate::validation::Anomaly;

/// In-memory store whose completion steps can be made to fail.
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryStore,
    fail_complete_carry_forward: AtomicBool,
    fail_finish_exercise_closing: AtomicBool,
}

fn unavailable() -> StoreError {
    StoreError::Backend("connection reset".into())
}

#[async_trait]
impl LedgerStore for FlakyStore {
    async fn insert_exercise(&self, exercise: &Exercise) -> Result<(), StoreError> {
        self.inner.insert_exercise(exercise).await
    }

    async fn exercise(&self, id: ExerciseId) -> Result<Option<Exercise>, StoreError> {
        self.inner.exercise(id).await
    }

    async fn claim_exercise_closing(&self, id: ExerciseId) -> Result<(), StoreError> {
        self.inner.claim_exercise_closing(id).await
    }

    async fn release_exercise_closing(&self, id: ExerciseId) -> Result<(), StoreError> {
        self.inner.release_exercise_closing(id).await
    }

    async fn finish_exercise_closing(
        &self,
        id: ExerciseId,
        closed_by: UserId,
        closed_at: DateTime<Utc>,
    ) -> Result<Exercise, StoreError> {
        if self.fail_finish_exercise_closing.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.finish_exercise_closing(id, closed_by, closed_at).await
    }

    async fn mark_opening_balances_validated(&self, id: ExerciseId) -> Result<(), StoreError> {
        self.inner.mark_opening_balances_validated(id).await
    }

    async fn insert_account(&self, account: &Account) -> Result<(), StoreError> {
        self.inner.insert_account(account).await
    }

    async fn account(
        &self,
        exercise_id: ExerciseId,
        number: &str,
    ) -> Result<Option<Account>, StoreError> {
        self.inner.account(exercise_id, number).await
    }

    async fn accounts(&self, exercise_id: ExerciseId) -> Result<Vec<Account>, StoreError> {
        self.inner.accounts(exercise_id).await
    }

    async fn set_account_active(
        &self,
        exercise_id: ExerciseId,
        number: &str,
        active: bool,
    ) -> Result<Account, StoreError> {
        self.inner.set_account_active(exercise_id, number, active).await
    }

    async fn insert_entry(&self, entry: NewJournalEntry) -> Result<JournalEntry, StoreError> {
        self.inner.insert_entry(entry).await
    }

    async fn entry(&self, id: JournalEntryId) -> Result<Option<JournalEntry>, StoreError> {
        self.inner.entry(id).await
    }

    async fn entries(&self, filter: &EntryFilter) -> Result<Vec<JournalEntry>, StoreError> {
        self.inner.entries(filter).await
    }

    async fn transition_entry(
        &self,
        id: JournalEntryId,
        action: &EntryAction,
    ) -> Result<JournalEntry, StoreError> {
        self.inner.transition_entry(id, action).await
    }

    async fn post_entry(
        &self,
        id: JournalEntryId,
        action: &EntryAction,
    ) -> Result<JournalEntry, StoreError> {
        self.inner.post_entry(id, action).await
    }

    async fn posted_lines(
        &self,
        exercise_id: ExerciseId,
        account: Option<&str>,
        until: Option<NaiveDate>,
    ) -> Result<Vec<PostedLine>, StoreError> {
        self.inner.posted_lines(exercise_id, account, until).await
    }

    async fn insert_anomalies(&self, anomalies: &[Anomaly]) -> Result<(), StoreError> {
        self.inner.insert_anomalies(anomalies).await
    }

    async fn anomalies(
        &self,
        exercise_id: ExerciseId,
        entry_id: Option<JournalEntryId>,
    ) -> Result<Vec<Anomaly>, StoreError> {
        self.inner.anomalies(exercise_id, entry_id).await
    }

    async fn insert_period_closure(&self, closure: &PeriodClosure) -> Result<(), StoreError> {
        self.inner.insert_period_closure(closure).await
    }

    async fn period_closure(&self, id: ClosureId) -> Result<Option<PeriodClosure>, StoreError> {
        self.inner.period_closure(id).await
    }

    async fn period_closures(
        &self,
        exercise_id: ExerciseId,
    ) -> Result<Vec<PeriodClosure>, StoreError> {
        self.inner.period_closures(exercise_id).await
    }

    async fn reopen_period_closure(
        &self,
        id: ClosureId,
        reason: &str,
        reopened_by: UserId,
        reopened_at: DateTime<Utc>,
    ) -> Result<PeriodClosure, StoreError> {
        self.inner
            .reopen_period_closure(id, reason, reopened_by, reopened_at)
            .await
    }

    async fn claim_carry_forward(&self, record: &CarryForward) -> Result<(), StoreError> {
        self.inner.claim_carry_forward(record).await
    }

    async fn complete_carry_forward(
        &self,
        id: CarryForwardId,
        entry_id: JournalEntryId,
        balances: &[ReportedBalance],
    ) -> Result<CarryForward, StoreError> {
        if self.fail_complete_carry_forward.load(Ordering::SeqCst) {
            return Err(unavailable());
        }
        self.inner.complete_carry_forward(id, entry_id, balances).await
    }

    async fn abandon_carry_forward(&self, id: CarryForwardId) -> Result<(), StoreError> {
        self.inner.abandon_carry_forward(id).await
    }

    async fn carry_forward(
        &self,
        source_exercise_id: ExerciseId,
    ) -> Result<Option<CarryForward>, StoreError> {
        self.inner.carry_forward(source_exercise_id).await
    }
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

async fn setup() -> (Arc<FlakyStore>, LedgerEngine<FlakyStore>, Exercise, UserId) {
    let store = Arc::new(FlakyStore::default());
    let engine = LedgerEngine::new(Arc::clone(&store), LedgerSettings::default());
    let exercise = engine
        .open_exercise("2024", date(2024, 1, 1), date(2024, 12, 31))
        .await
        .unwrap();
    engine
        .initialize_chart(exercise.id, standard_chart())
        .await
        .unwrap();
    (store, engine, exercise, UserId::new())
}

async fn post(
    engine: &LedgerEngine<FlakyStore>,
    exercise: &Exercise,
    on: NaiveDate,
    debit: &str,
    credit: &str,
    actor: UserId,
) {
    let amount = dec!(125000000);
    let input = EntryInput::new(exercise.id, "BQ", on, "Opération", actor)
        .with_line(LineInput::debit(debit, amount).with_label("débit"))
        .with_line(LineInput::credit(credit, amount).with_label("crédit"));
    let entry = engine.create_entry(input).await.unwrap();
    assert!(engine.validate_entry(entry.id, actor).await.unwrap().passed);
    engine.post_entry(entry.id, actor).await.unwrap();
}

async fn close_all_periods(engine: &LedgerEngine<FlakyStore>, exercise: &Exercise, actor: UserId) {
    for label in exercise.periods() {
        engine
            .close_period(exercise.id, label, ClosureType::Monthly, actor)
            .await
            .unwrap();
    }
}

async fn posted_of_type(
    engine: &LedgerEngine<FlakyStore>,
    exercise_id: ExerciseId,
    entry_type: EntryType,
) -> Vec<JournalEntry> {
    engine
        .entries(
            &EntryFilter::for_exercise(exercise_id)
                .with_type(entry_type)
                .with_status(EntryStatus::Posted),
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn test_carry_forward_not_reposted_after_failed_completion() {
    let (store, engine, exercise, actor) = setup().await;
    post(&engine, &exercise, date(2024, 1, 2), "521", "101", actor).await;
    close_all_periods(&engine, &exercise, actor).await;
    engine.close_exercise(exercise.id, actor).await.unwrap();
    let next = engine
        .open_exercise("2025", date(2025, 1, 1), date(2025, 12, 31))
        .await
        .unwrap();

    store.fail_complete_carry_forward.store(true, Ordering::SeqCst);
    let err = engine.carry_forward(exercise.id, next.id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "PERSISTENCE_FAILURE");

    let claim = engine.carry_forward_of(exercise.id).await.unwrap().unwrap();
    assert_eq!(claim.status, CarryForwardStatus::InProgress);
    assert_eq!(posted_of_type(&engine, next.id, EntryType::CarryForward).await.len(), 1);

    store.fail_complete_carry_forward.store(false, Ordering::SeqCst);
    let err = engine.carry_forward(exercise.id, next.id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "CARRY_FORWARD_ALREADY_DONE");

    assert_eq!(posted_of_type(&engine, next.id, EntryType::CarryForward).await.len(), 1);
    let bank = engine.account(next.id, "521").await.unwrap();
    assert_eq!(bank.balance.debit, dec!(125000000));
}

#[tokio::test]
async fn test_annual_close_recovers_after_failed_finish() {
    let (store, engine, exercise, actor) = setup().await;
    post(&engine, &exercise, date(2024, 2, 10), "521", "701", actor).await;
    close_all_periods(&engine, &exercise, actor).await;

    store.fail_finish_exercise_closing.store(true, Ordering::SeqCst);
    let err = engine.close_exercise(exercise.id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "PERSISTENCE_FAILURE");
    assert_eq!(engine.exercise(exercise.id).await.unwrap().status, ExerciseStatus::Open);
    assert_eq!(posted_of_type(&engine, exercise.id, EntryType::Closing).await.len(), 1);
    assert!(engine.account(exercise.id, "701").await.unwrap().balance.net().is_zero());

    store.fail_finish_exercise_closing.store(false, Ordering::SeqCst);
    let outcome = engine.close_exercise(exercise.id, actor).await.unwrap();
    assert_eq!(outcome.record.status, ExerciseStatus::Closed);
    assert!(outcome.message.contains("nothing to zero"));
    assert_eq!(posted_of_type(&engine, exercise.id, EntryType::Closing).await.len(), 1);
    assert_eq!(
        engine.account(exercise.id, "131").await.unwrap().balance.net(),
        dec!(-125000000)
    );
}
