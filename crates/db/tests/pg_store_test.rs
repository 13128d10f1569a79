//! `PgLedgerStore` against a live PostgreSQL.
//!
//! Uses the database named by `DATABASE_URL` and migrates it on first use.
//! Every test works in its own exercise. Skipped when the variable is unset.

// Allow common test patterns that trigger clippy warnings
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::too_many_lines)]

use std::env;
use std::sync::Arc;

use chrono::NaiveDate;
use comptable_core::chart::standard_chart;
use comptable_core::closing::{CarryForward, ClosureType};
use comptable_core::exercise::{Exercise, ExerciseStatus, PeriodLabel};
use comptable_core::journal::{EntryInput, EntryStatus, LineInput};
use comptable_core::store::{EntryFilter, LedgerStore, StoreError};
use comptable_core::{LedgerEngine, LedgerSettings};
use comptable_db::{Migrator, PgLedgerStore};
use comptable_shared::types::UserId;
use futures::future::join_all;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use sea_orm_migration::MigratorTrait;
use tokio::sync::Mutex;
use uuid::Uuid;

static MIGRATED: Mutex<bool> = Mutex::const_new(false);

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn unique_code() -> String {
    format!("T{}", &Uuid::new_v4().simple().to_string()[..12])
}

async fn store() -> Option<Arc<PgLedgerStore>> {
    let Ok(url) = env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping");
        return None;
    };
    let db = comptable_db::connect(&url).await.unwrap();

    let mut migrated = MIGRATED.lock().await;
    if !*migrated {
        Migrator::up(&db, None).await.unwrap();
        *migrated = true;
    }
    Some(Arc::new(PgLedgerStore::new(db)))
}

async fn setup() -> Option<(LedgerEngine<PgLedgerStore>, Exercise, UserId)> {
    let engine = LedgerEngine::new(store().await?, LedgerSettings::default());
    let exercise = engine
        .open_exercise(&unique_code(), date(2024, 1, 1), date(2024, 12, 31))
        .await
        .unwrap();
    engine
        .initialize_chart(exercise.id, standard_chart())
        .await
        .unwrap();
    Some((engine, exercise, UserId::new()))
}

fn purchase(exercise: &Exercise, amount: Decimal, actor: UserId) -> EntryInput {
    EntryInput::new(exercise.id, "ACH", date(2024, 3, 15), "Achats de marchandises", actor)
        .with_line(LineInput::debit("601", amount).with_label("Marchandises"))
        .with_line(LineInput::credit("401", amount).with_label("Fournisseur"))
}

#[tokio::test]
async fn test_posting_updates_balances_and_ledger() {
    let Some((engine, exercise, actor)) = setup().await else {
        return;
    };

    let entry = engine
        .create_entry(purchase(&exercise, dec!(45000000), actor))
        .await
        .unwrap();
    assert_eq!(entry.sequence, 1);
    assert_eq!(entry.status, EntryStatus::Draft);

    let outcome = engine.validate_entry(entry.id, actor).await.unwrap();
    assert!(outcome.passed);
    let posted = engine.post_entry(entry.id, actor).await.unwrap();
    assert_eq!(posted.status, EntryStatus::Posted);
    assert_eq!(posted.audit.posted_by, Some(actor));

    let reloaded = engine.entry(entry.id).await.unwrap();
    assert_eq!(reloaded.status, EntryStatus::Posted);
    assert_eq!(reloaded.lines.len(), 2);
    assert_eq!(reloaded.lines[0].account_number, "601");

    let purchases = engine.account(exercise.id, "601").await.unwrap();
    assert_eq!(purchases.balance.debit, dec!(45000000));
    assert_eq!(purchases.balance.credit, Decimal::ZERO);
    let supplier = engine.account(exercise.id, "401").await.unwrap();
    assert_eq!(supplier.balance.credit, dec!(45000000));

    let ledger = engine
        .account_ledger(exercise.id, "601", date(2024, 1, 1), date(2024, 12, 31))
        .await
        .unwrap();
    assert_eq!(ledger.rows.len(), 1);
    assert_eq!(ledger.rows[0].reference, "ACH-000001");
    assert_eq!(ledger.closing, dec!(45000000));

    let trial_balance = engine
        .trial_balance(exercise.id, date(2024, 1, 1), date(2024, 12, 31))
        .await
        .unwrap();
    assert!(trial_balance.is_balanced());
}

#[tokio::test]
async fn test_concurrent_inserts_get_gap_free_sequences() {
    let Some((engine, exercise, actor)) = setup().await else {
        return;
    };

    let creations = (1..=12).map(|i| {
        engine.create_entry(purchase(&exercise, Decimal::from(i * 1000), actor))
    });
    let mut sequences: Vec<u64> = join_all(creations)
        .await
        .into_iter()
        .map(|result| result.unwrap().sequence)
        .collect();
    sequences.sort_unstable();
    assert_eq!(sequences, (1..=12).collect::<Vec<u64>>());

    let listed = engine
        .entries(&EntryFilter::for_exercise(exercise.id).with_journal("ACH"))
        .await
        .unwrap();
    assert_eq!(listed.len(), 12);
    assert!(listed.iter().all(|e| e.lines.len() == 2));
}

#[tokio::test]
async fn test_posting_is_atomic_when_an_account_is_inactive() {
    let Some((engine, exercise, actor)) = setup().await else {
        return;
    };

    let entry = engine
        .create_entry(purchase(&exercise, dec!(500000), actor))
        .await
        .unwrap();
    assert!(engine.validate_entry(entry.id, actor).await.unwrap().passed);
    engine.deactivate_account(exercise.id, "401").await.unwrap();

    let err = engine.post_entry(entry.id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "ACCOUNT_INACTIVE");

    let entry = engine.entry(entry.id).await.unwrap();
    assert_eq!(entry.status, EntryStatus::Validated);
    let purchases = engine.account(exercise.id, "601").await.unwrap();
    assert_eq!(purchases.balance.debit, Decimal::ZERO);
}

#[tokio::test]
async fn test_transition_is_compare_and_swap() {
    let Some((engine, exercise, actor)) = setup().await else {
        return;
    };

    let entry = engine
        .create_entry(purchase(&exercise, dec!(1000), actor))
        .await
        .unwrap();
    engine
        .reject_entry(entry.id, "pièce manquante", actor)
        .await
        .unwrap();

    let err = engine.validate_entry(entry.id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_TRANSITION");

    let stored = engine.entry(entry.id).await.unwrap();
    assert_eq!(stored.status, EntryStatus::Rejected);
    assert_eq!(stored.audit.rejection_reason.as_deref(), Some("pièce manquante"));
}

#[tokio::test]
async fn test_exercise_closing_claim_is_exclusive() {
    let Some(store) = store().await else {
        return;
    };
    let exercise = Exercise::new(unique_code(), date(2024, 1, 1), date(2024, 12, 31)).unwrap();
    store.insert_exercise(&exercise).await.unwrap();

    let duplicate = Exercise::new(exercise.code.clone(), date(2025, 1, 1), date(2025, 12, 31)).unwrap();
    assert!(matches!(
        store.insert_exercise(&duplicate).await,
        Err(StoreError::Duplicate(_))
    ));

    store.claim_exercise_closing(exercise.id).await.unwrap();
    let err = store.claim_exercise_closing(exercise.id).await.unwrap_err();
    assert!(matches!(err, StoreError::StatusMismatch { ref actual, .. } if actual == "CLOSING"));

    store.release_exercise_closing(exercise.id).await.unwrap();
    store.claim_exercise_closing(exercise.id).await.unwrap();
    let closed = store
        .finish_exercise_closing(exercise.id, UserId::new(), chrono::Utc::now())
        .await
        .unwrap();
    assert_eq!(closed.status, ExerciseStatus::Closed);
    assert!(closed.closed_at.is_some());
}

#[tokio::test]
async fn test_period_closure_unique_while_in_force() {
    let Some((engine, exercise, actor)) = setup().await else {
        return;
    };
    let may = PeriodLabel::new(2024, 5).unwrap();

    let closed = engine
        .close_period(exercise.id, may, ClosureType::Monthly, actor)
        .await
        .unwrap();
    let err = engine
        .close_period(exercise.id, may, ClosureType::Monthly, actor)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "PERIOD_ALREADY_CLOSED");

    engine
        .reopen_period(closed.record.id, "correction d'une facture", actor)
        .await
        .unwrap();
    engine
        .close_period(exercise.id, may, ClosureType::Monthly, actor)
        .await
        .unwrap();

    let closures = engine.period_closures(exercise.id).await.unwrap();
    assert_eq!(closures.len(), 2);
    assert_eq!(closures.iter().filter(|c| c.is_closed()).count(), 1);
}

#[tokio::test]
async fn test_carry_forward_claim_is_unique() {
    let Some(store) = store().await else {
        return;
    };
    let source = Exercise::new(unique_code(), date(2024, 1, 1), date(2024, 12, 31)).unwrap();
    let destination = Exercise::new(unique_code(), date(2025, 1, 1), date(2025, 12, 31)).unwrap();
    store.insert_exercise(&source).await.unwrap();
    store.insert_exercise(&destination).await.unwrap();
    let actor = UserId::new();

    let claim = CarryForward::claim(source.id, destination.id, actor);
    store.claim_carry_forward(&claim).await.unwrap();
    let again = CarryForward::claim(source.id, destination.id, actor);
    assert!(matches!(
        store.claim_carry_forward(&again).await,
        Err(StoreError::Duplicate(_))
    ));

    store.abandon_carry_forward(claim.id).await.unwrap();
    assert!(store.carry_forward(source.id).await.unwrap().is_none());
    store.claim_carry_forward(&again).await.unwrap();
    assert_eq!(
        store.carry_forward(source.id).await.unwrap().map(|cf| cf.id),
        Some(again.id)
    );
}
