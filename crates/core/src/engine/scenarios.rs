//! End-to-end engine scenarios against the in-memory store.

use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use comptable_shared::types::{JournalEntryId, UserId};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use super::{EngineError, LedgerEngine, LedgerSettings};
use crate::budget::MockBudgetOracle;
use crate::chart::{AccountClass, AccountNature, NewAccount, standard_chart};
use crate::closing::{ClosingError, ClosureType};
use crate::exercise::{Exercise, ExerciseStatus, PeriodLabel};
use crate::journal::{
    EntryInput, EntryLine, EntrySide, EntryStatus, EntryType, JournalError, LineInput,
    NewJournalEntry,
};
use crate::store::{EntryFilter, InMemoryStore, LedgerStore, StoreError};

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn period(label: &str) -> PeriodLabel {
    label.parse().unwrap()
}

async fn setup() -> (LedgerEngine<InMemoryStore>, Exercise, UserId) {
    let engine = LedgerEngine::new(Arc::new(InMemoryStore::new()), LedgerSettings::default());
    let exercise = engine
        .open_exercise("2024", date(2024, 1, 1), date(2024, 12, 31))
        .await
        .unwrap();
    engine
        .initialize_chart(exercise.id, standard_chart())
        .await
        .unwrap();
    (engine, exercise, UserId::new())
}

fn two_lines(
    exercise: &Exercise,
    journal: &str,
    on: NaiveDate,
    debit: (&str, Decimal),
    credit: (&str, Decimal),
    actor: UserId,
) -> EntryInput {
    EntryInput::new(exercise.id, journal, on, "Opération courante", actor)
        .with_line(LineInput::debit(debit.0, debit.1).with_label("débit"))
        .with_line(LineInput::credit(credit.0, credit.1).with_label("crédit"))
}

async fn post(
    engine: &LedgerEngine<InMemoryStore>,
    input: EntryInput,
    actor: UserId,
) -> JournalEntryId {
    let entry = engine.create_entry(input).await.unwrap();
    let outcome = engine.validate_entry(entry.id, actor).await.unwrap();
    assert!(outcome.passed);
    engine.post_entry(entry.id, actor).await.unwrap();
    entry.id
}

async fn close_all_periods(engine: &LedgerEngine<InMemoryStore>, exercise: &Exercise, actor: UserId) {
    for label in exercise.periods() {
        engine
            .close_period(exercise.id, label, ClosureType::Monthly, actor)
            .await
            .unwrap();
    }
}

#[tokio::test]
async fn test_balanced_purchase_is_created_in_draft() {
    let (engine, exercise, actor) = setup().await;
    let input = two_lines(
        &exercise,
        "ACH",
        date(2024, 1, 15),
        ("601", dec!(45000000)),
        ("401", dec!(45000000)),
        actor,
    );

    let entry = engine.create_entry(input).await.unwrap();
    assert_eq!(entry.status, EntryStatus::Draft);
    assert!(entry.balanced);
    assert_eq!(entry.sequence, 1);
    assert_eq!(entry.total_amount, dec!(45000000));
    assert_eq!(entry.period, period("2024-01"));
    assert_eq!(entry.lines[0].account_label, "Achats de marchandises");
}

#[tokio::test]
async fn test_unbalanced_purchase_is_refused_with_discrepancy() {
    let (engine, exercise, actor) = setup().await;
    let input = two_lines(
        &exercise,
        "ACH",
        date(2024, 1, 15),
        ("601", dec!(45000000)),
        ("401", dec!(44000000)),
        actor,
    );

    let err = engine.create_entry(input).await.unwrap_err();
    assert_eq!(err.error_code(), "UNBALANCED");
    assert_eq!(err.to_string(), "entry not balanced, discrepancy = 1000000");
    assert!(
        engine
            .entries(&EntryFilter::for_exercise(exercise.id))
            .await
            .unwrap()
            .is_empty()
    );
}

#[tokio::test]
async fn test_one_cent_gap_is_refused_and_period_stays_closable() {
    let (engine, exercise, actor) = setup().await;
    let err = engine
        .create_entry(two_lines(
            &exercise,
            "ACH",
            date(2024, 1, 10),
            ("601", dec!(100.00)),
            ("401", dec!(99.99)),
            actor,
        ))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "UNBALANCED");
    assert_eq!(err.to_string(), "entry not balanced, discrepancy = 0.01");

    post(
        &engine,
        two_lines(&exercise, "ACH", date(2024, 1, 10), ("601", dec!(100.00)), ("401", dec!(100.00)), actor),
        actor,
    )
    .await;
    engine
        .close_period(exercise.id, period("2024-01"), ClosureType::Monthly, actor)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_unknown_accounts_are_all_listed() {
    let (engine, exercise, actor) = setup().await;
    let input = EntryInput::new(exercise.id, "OD", date(2024, 2, 1), "Écriture", actor)
        .with_line(LineInput::debit("699", dec!(10)))
        .with_line(LineInput::credit("499", dec!(10)));

    let err = engine.create_entry(input).await.unwrap_err();
    assert!(matches!(
        err,
        EngineError::Journal(JournalError::UnknownAccounts(ref numbers)) if numbers == &["699", "499"]
    ));
}

#[tokio::test]
async fn test_sequence_stays_gap_free_across_failures() {
    let (engine, exercise, actor) = setup().await;
    let on = date(2024, 3, 4);

    let first = engine
        .create_entry(two_lines(&exercise, "ACH", on, ("601", dec!(100)), ("401", dec!(100)), actor))
        .await
        .unwrap();
    assert!(
        engine
            .create_entry(two_lines(&exercise, "ACH", on, ("601", dec!(100)), ("401", dec!(90)), actor))
            .await
            .is_err()
    );
    assert!(
        engine
            .create_entry(two_lines(&exercise, "ACH", on, ("609", dec!(100)), ("401", dec!(100)), actor))
            .await
            .is_err()
    );
    let second = engine
        .create_entry(two_lines(&exercise, "ACH", on, ("601", dec!(50)), ("401", dec!(50)), actor))
        .await
        .unwrap();
    let other_journal = engine
        .create_entry(two_lines(&exercise, "VTE", on, ("411", dec!(50)), ("701", dec!(50)), actor))
        .await
        .unwrap();

    assert_eq!(first.sequence, 1);
    assert_eq!(second.sequence, 2);
    assert_eq!(other_journal.sequence, 1);
}

#[tokio::test]
async fn test_foreign_currency_line_needs_rate() {
    let (engine, exercise, actor) = setup().await;
    let mut input = two_lines(
        &exercise,
        "ACH",
        date(2024, 4, 2),
        ("601", dec!(100)),
        ("401", dec!(65595.70)),
        actor,
    );
    input.lines[0].currency = Some("EUR".into());

    let err = engine.create_entry(input.clone()).await.unwrap_err();
    assert_eq!(err.error_code(), "MISSING_EXCHANGE_RATE");

    input.lines[0] = LineInput::debit("601", dec!(100)).in_currency("EUR", dec!(655.957));
    let entry = engine.create_entry(input).await.unwrap();
    assert_eq!(entry.lines[0].base_amount, dec!(65595.70));
    assert_eq!(entry.lines[0].exchange_rate, dec!(655.957));
}

#[tokio::test]
async fn test_entry_outside_exercise_is_refused() {
    let (engine, exercise, actor) = setup().await;
    let err = engine
        .create_entry(two_lines(
            &exercise,
            "ACH",
            date(2025, 1, 2),
            ("601", dec!(1)),
            ("401", dec!(1)),
            actor,
        ))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "DATE_OUTSIDE_EXERCISE");
}

#[tokio::test]
async fn test_full_lifecycle_updates_balances_and_audit() {
    let (engine, exercise, actor) = setup().await;
    let id = post(
        &engine,
        two_lines(&exercise, "ACH", date(2024, 1, 15), ("601", dec!(45000000)), ("401", dec!(45000000)), actor),
        actor,
    )
    .await;

    let entry = engine.entry(id).await.unwrap();
    assert_eq!(entry.status, EntryStatus::Posted);
    assert_eq!(entry.audit.validated_by, Some(actor));
    assert_eq!(entry.audit.posted_by, Some(actor));

    let purchases = engine.account(exercise.id, "601").await.unwrap();
    let suppliers = engine.account(exercise.id, "401").await.unwrap();
    assert_eq!(purchases.balance.debit, dec!(45000000));
    assert_eq!(suppliers.balance.credit, dec!(45000000));
    assert_eq!(purchases.balance.net() + suppliers.balance.net(), Decimal::ZERO);

    let err = engine.post_entry(id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "INVALID_TRANSITION");
}

#[tokio::test]
async fn test_validation_persists_warnings_and_passes() {
    let (engine, exercise, actor) = setup().await;
    let input = EntryInput::new(exercise.id, "OD", date(2024, 5, 10), "Régularisation", actor)
        .with_line(LineInput::debit("601", dec!(20)))
        .with_line(LineInput::credit("401", dec!(20)))
        .with_document("FAC-17", date(2024, 5, 20));
    let entry = engine.create_entry(input).await.unwrap();

    let outcome = engine.validate_entry(entry.id, actor).await.unwrap();
    assert!(outcome.passed);
    assert_eq!(outcome.entry.status, EntryStatus::Validated);
    assert!(!outcome.report.is_empty());

    let stored = engine.anomalies(exercise.id, Some(entry.id)).await.unwrap();
    assert_eq!(stored.len(), outcome.report.len());
}

#[tokio::test]
async fn test_reject_and_cancel_require_reason() {
    let (engine, exercise, actor) = setup().await;
    let on = date(2024, 6, 3);
    let draft = engine
        .create_entry(two_lines(&exercise, "OD", on, ("601", dec!(5)), ("401", dec!(5)), actor))
        .await
        .unwrap();

    let err = engine.reject_entry(draft.id, "  ", actor).await.unwrap_err();
    assert_eq!(err.error_code(), "MISSING_REASON");
    let rejected = engine.reject_entry(draft.id, "doublon", actor).await.unwrap();
    assert_eq!(rejected.status, EntryStatus::Rejected);
    assert_eq!(rejected.audit.rejection_reason.as_deref(), Some("doublon"));
    assert!(engine.validate_entry(draft.id, actor).await.is_err());

    let other = engine
        .create_entry(two_lines(&exercise, "OD", on, ("601", dec!(5)), ("401", dec!(5)), actor))
        .await
        .unwrap();
    engine.validate_entry(other.id, actor).await.unwrap();
    let cancelled = engine.cancel_entry(other.id, "erreur de saisie", actor).await.unwrap();
    assert_eq!(cancelled.status, EntryStatus::Cancelled);
    assert!(engine.post_entry(other.id, actor).await.is_err());
}

#[tokio::test]
async fn test_posting_is_atomic_after_deactivation() {
    let (engine, exercise, actor) = setup().await;
    let entry = engine
        .create_entry(two_lines(&exercise, "ACH", date(2024, 2, 9), ("601", dec!(300)), ("401", dec!(300)), actor))
        .await
        .unwrap();
    engine.validate_entry(entry.id, actor).await.unwrap();
    engine.deactivate_account(exercise.id, "401").await.unwrap();

    let err = engine.post_entry(entry.id, actor).await.unwrap_err();
    assert!(matches!(err, EngineError::Store(StoreError::AccountUnavailable(ref n)) if n == "401"));
    assert_eq!(err.error_code(), "ACCOUNT_INACTIVE");

    assert_eq!(engine.account(exercise.id, "601").await.unwrap().balance.debit, Decimal::ZERO);
    assert_eq!(engine.entry(entry.id).await.unwrap().status, EntryStatus::Validated);

    let err = engine
        .create_entry(two_lines(&exercise, "ACH", date(2024, 2, 9), ("601", dec!(1)), ("401", dec!(1)), actor))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn test_budget_gate_refuses_without_consuming_sequence() {
    let (engine, exercise, actor) = setup().await;
    let mut oracle = MockBudgetOracle::new();
    oracle
        .expect_has_sufficient_funds()
        .withf(|line, amount| line == "BUD-60" && *amount == dec!(1000))
        .times(1)
        .returning(|_, _| false);
    let engine = LedgerEngine {
        budget: Some(Arc::new(oracle)),
        ..engine
    };

    let input = two_lines(&exercise, "ACH", date(2024, 7, 1), ("601", dec!(1000)), ("401", dec!(1000)), actor)
        .with_budget_line("BUD-60");
    let err = engine.create_entry(input).await.unwrap_err();
    assert_eq!(err.error_code(), "BUDGET_INSUFFICIENT");

    let entry = engine
        .create_entry(two_lines(&exercise, "ACH", date(2024, 7, 1), ("601", dec!(1)), ("401", dec!(1)), actor))
        .await
        .unwrap();
    assert_eq!(entry.sequence, 1);
}

#[tokio::test]
async fn test_close_refused_lists_unbalanced_entry() {
    let (engine, exercise, actor) = setup().await;
    let on = date(2024, 1, 20);
    let line = |n: u32, account: &str, side: EntrySide, amount: Decimal| EntryLine {
        id: comptable_shared::types::EntryLineId::new(),
        line_number: n,
        account_number: account.into(),
        account_label: account.into(),
        label: None,
        side,
        amount,
        currency: "XOF".into(),
        exchange_rate: Decimal::ONE,
        base_amount: amount,
        lettering: None,
        cost_center: None,
        project: None,
    };
    let imported = engine
        .store()
        .insert_entry(NewJournalEntry {
            id: JournalEntryId::new(),
            exercise_id: exercise.id,
            journal_code: "ACH".into(),
            journal_label: None,
            entry_type: EntryType::Operation,
            entry_date: on,
            document_date: None,
            period: period("2024-01"),
            label: "Import".into(),
            document_reference: None,
            budget_line: None,
            total_amount: dec!(45000000),
            balanced: false,
            lines: vec![
                line(1, "601", EntrySide::Debit, dec!(45000000)),
                line(2, "401", EntrySide::Credit, dec!(44000000)),
            ],
            created_by: actor,
            created_at: Utc::now(),
        })
        .await
        .unwrap();

    let err = engine
        .close_period(exercise.id, period("2024-01"), ClosureType::Monthly, actor)
        .await
        .unwrap_err();
    match err {
        EngineError::Closing(ClosingError::ControlsFailed { period, problems }) => {
            assert_eq!(period, "2024-01");
            assert_eq!(problems, vec![format!("entry {} is not balanced", imported.reference_label())]);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(engine.period_closures(exercise.id).await.unwrap().is_empty());
    assert!(!engine.anomalies(exercise.id, Some(imported.id)).await.unwrap().is_empty());

    engine.reject_entry(imported.id, "import erroné", actor).await.unwrap();
    engine
        .close_period(exercise.id, period("2024-01"), ClosureType::Monthly, actor)
        .await
        .unwrap();
}

#[tokio::test]
async fn test_closed_period_blocks_entries_until_reopened() {
    let (engine, exercise, actor) = setup().await;
    let closed = engine
        .close_period(exercise.id, period("2024-01"), ClosureType::Monthly, actor)
        .await
        .unwrap();
    assert_eq!(closed.message, "period 2024-01 of exercise 2024 closed");

    let input = two_lines(&exercise, "ACH", date(2024, 1, 31), ("601", dec!(10)), ("401", dec!(10)), actor);
    let err = engine.create_entry(input.clone()).await.unwrap_err();
    assert_eq!(err.error_code(), "PERIOD_CLOSED");

    let err = engine
        .close_period(exercise.id, period("2024-01"), ClosureType::Monthly, actor)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "period 2024-01 of exercise 2024 is already closed");

    assert_eq!(
        engine.reopen_period(closed.record.id, " ", actor).await.unwrap_err().error_code(),
        "MISSING_REASON"
    );
    let reopened = engine
        .reopen_period(closed.record.id, "facture oubliée", actor)
        .await
        .unwrap();
    assert_eq!(reopened.record.reopen_reason.as_deref(), Some("facture oubliée"));
    assert!(engine.reopen_period(closed.record.id, "encore", actor).await.is_err());

    engine.create_entry(input).await.unwrap();
    engine
        .close_period(exercise.id, period("2024-01"), ClosureType::Monthly, actor)
        .await
        .unwrap();
    assert_eq!(engine.period_closures(exercise.id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_concurrent_period_close_succeeds_once() {
    let (engine, exercise, actor) = setup().await;
    let target = period("2024-02");
    let (a, b) = tokio::join!(
        engine.close_period(exercise.id, target, ClosureType::Monthly, actor),
        engine.close_period(exercise.id, target, ClosureType::Monthly, actor),
    );
    let failures: Vec<EngineError> = [a, b].into_iter().filter_map(Result::err).collect();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].error_code(), "PERIOD_ALREADY_CLOSED");
}

#[tokio::test]
async fn test_period_close_records_advisory_findings() {
    let (engine, exercise, actor) = setup().await;
    post(
        &engine,
        two_lines(&exercise, "BQ", date(2024, 3, 5), ("521", dec!(800)), ("411", dec!(800)), actor),
        actor,
    )
    .await;

    let outcome = engine
        .close_period(exercise.id, period("2024-03"), ClosureType::Monthly, actor)
        .await
        .unwrap();
    assert_eq!(outcome.record.controls.unlettered_lines, 1);
    assert_eq!(outcome.record.controls.unreconciled_bank_lines, 1);
    assert!(outcome.record.anomaly_count >= 2);
}

#[tokio::test]
async fn test_annual_close_refused_with_open_periods() {
    let (engine, exercise, actor) = setup().await;
    for label in ["2024-01", "2024-02"] {
        engine
            .close_period(exercise.id, period(label), ClosureType::Monthly, actor)
            .await
            .unwrap();
    }

    let err = engine.close_exercise(exercise.id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "PERIODS_NOT_CLOSED");
    assert!(err.to_string().starts_with("periods not closed: 2024-03, 2024-04"));
    assert_eq!(engine.exercise(exercise.id).await.unwrap().status, ExerciseStatus::Open);
}

#[tokio::test]
async fn test_annual_close_zeroes_income_statement() {
    let (engine, exercise, actor) = setup().await;
    post(
        &engine,
        two_lines(&exercise, "VTE", date(2024, 2, 10), ("521", dec!(1000000)), ("701", dec!(1000000)), actor),
        actor,
    )
    .await;
    post(
        &engine,
        two_lines(&exercise, "ACH", date(2024, 3, 12), ("601", dec!(400000)), ("521", dec!(400000)), actor),
        actor,
    )
    .await;
    close_all_periods(&engine, &exercise, actor).await;

    let outcome = engine.close_exercise(exercise.id, actor).await.unwrap();
    assert_eq!(outcome.record.status, ExerciseStatus::Closed);
    assert_eq!(outcome.record.closed_by, Some(actor));
    assert!(outcome.message.contains("CLO-000001"));

    let closing = engine
        .entries(&EntryFilter::for_exercise(exercise.id).with_type(EntryType::Closing))
        .await
        .unwrap();
    assert_eq!(closing.len(), 1);
    assert_eq!(closing[0].status, EntryStatus::Posted);
    assert_eq!(closing[0].entry_date, date(2024, 12, 31));

    for number in ["601", "701"] {
        assert!(engine.account(exercise.id, number).await.unwrap().balance.net().is_zero());
    }
    assert_eq!(
        engine.account(exercise.id, "131").await.unwrap().balance.net(),
        dec!(-600000)
    );

    let err = engine.close_exercise(exercise.id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "EXERCISE_ALREADY_CLOSED");
    let err = engine
        .create_entry(two_lines(&exercise, "OD", date(2024, 6, 1), ("601", dec!(1)), ("401", dec!(1)), actor))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "EXERCISE_NOT_OPEN");
}

#[tokio::test]
async fn test_carry_forward_reopens_balance_sheet() {
    let (engine, exercise, actor) = setup().await;
    post(
        &engine,
        two_lines(&exercise, "BQ", date(2024, 1, 2), ("521", dec!(125000000)), ("101", dec!(125000000)), actor),
        actor,
    )
    .await;

    let next = engine
        .open_exercise("2025", date(2025, 1, 1), date(2025, 12, 31))
        .await
        .unwrap();
    let err = engine.carry_forward(exercise.id, next.id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "SOURCE_NOT_CLOSED");

    close_all_periods(&engine, &exercise, actor).await;
    let closed = engine.close_exercise(exercise.id, actor).await.unwrap();
    assert!(closed.message.contains("nothing to zero"));

    let outcome = engine.carry_forward(exercise.id, next.id, actor).await.unwrap();
    let record = outcome.record;
    assert_eq!(record.balances.len(), 2);
    let bank = record
        .balances
        .iter()
        .find(|b| b.account_number == "521")
        .unwrap();
    assert_eq!((bank.debit, bank.credit), (dec!(125000000), Decimal::ZERO));

    let entry = engine.entry(record.entry_id.unwrap()).await.unwrap();
    assert_eq!(entry.entry_type, EntryType::CarryForward);
    assert_eq!(entry.status, EntryStatus::Posted);
    assert_eq!(entry.entry_date, date(2025, 1, 1));
    let debits: Vec<&EntryLine> = entry.lines.iter().filter(|l| l.side == EntrySide::Debit).collect();
    assert_eq!(debits.len(), 1);
    assert_eq!(debits[0].account_number, "521");
    assert_eq!(debits[0].amount, dec!(125000000));

    let copied = engine.account(next.id, "521").await.unwrap();
    assert_eq!(copied.parent.as_deref(), Some("52"));
    assert_eq!(copied.balance.debit, dec!(125000000));
    assert!(engine.exercise(next.id).await.unwrap().opening_balances_validated);

    let ledger = engine
        .account_ledger(next.id, "521", date(2025, 1, 1), date(2025, 12, 31))
        .await
        .unwrap();
    assert_eq!(ledger.opening, Decimal::ZERO);
    assert_eq!(ledger.closing, dec!(125000000));

    let err = engine.carry_forward(exercise.id, next.id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "CARRY_FORWARD_ALREADY_DONE");
}

#[tokio::test]
async fn test_carry_forward_needs_later_open_destination() {
    let (engine, exercise, actor) = setup().await;
    close_all_periods(&engine, &exercise, actor).await;
    engine.close_exercise(exercise.id, actor).await.unwrap();

    let overlapping = engine
        .open_exercise("2024B", date(2024, 7, 1), date(2025, 6, 30))
        .await
        .unwrap();
    let err = engine
        .carry_forward(exercise.id, overlapping.id, actor)
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "DESTINATION_NOT_AFTER_SOURCE");

    let next = engine
        .open_exercise("2025", date(2025, 1, 1), date(2025, 12, 31))
        .await
        .unwrap();
    let err = engine.carry_forward(exercise.id, next.id, actor).await.unwrap_err();
    assert_eq!(err.error_code(), "NOTHING_TO_CARRY_FORWARD");
    assert!(engine.carry_forward_of(exercise.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_reports_follow_posted_lines_only() {
    let (engine, exercise, actor) = setup().await;
    post(
        &engine,
        two_lines(&exercise, "ACH", date(2024, 1, 15), ("601", dec!(700)), ("401", dec!(700)), actor),
        actor,
    )
    .await;
    post(
        &engine,
        two_lines(&exercise, "ACH", date(2024, 2, 15), ("601", dec!(300)), ("401", dec!(300)), actor),
        actor,
    )
    .await;
    engine
        .create_entry(two_lines(&exercise, "ACH", date(2024, 2, 20), ("601", dec!(999)), ("401", dec!(999)), actor))
        .await
        .unwrap();

    let ledger = engine
        .account_ledger(exercise.id, "601", date(2024, 2, 1), date(2024, 2, 29))
        .await
        .unwrap();
    assert_eq!(ledger.opening, dec!(700));
    assert_eq!(ledger.rows.len(), 1);
    assert_eq!(ledger.closing, dec!(1000));

    let first = engine
        .trial_balance(exercise.id, exercise.start_date, exercise.end_date)
        .await
        .unwrap();
    let second = engine
        .trial_balance(exercise.id, exercise.start_date, exercise.end_date)
        .await
        .unwrap();
    assert_eq!(first, second);
    assert!(first.is_balanced());
    assert_eq!(first.rows.len(), 2);

    let err = engine
        .trial_balance(exercise.id, date(2024, 3, 1), date(2024, 2, 1))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_DATE_RANGE");

    let report = engine.audit_exercise(exercise.id).await.unwrap();
    assert!(report.is_valid());
}

#[tokio::test]
async fn test_chart_queries_and_errors() {
    let (engine, exercise, _) = setup().await;

    let expenses = engine
        .accounts_by_nature(exercise.id, AccountNature::Expense)
        .await
        .unwrap();
    assert!(expenses.iter().all(|a| a.class.digit() == 6));
    assert!(expenses.iter().any(|a| a.number == "601"));

    let class4 = engine
        .accounts_by_class(exercise.id, AccountClass::try_from(4).unwrap())
        .await
        .unwrap();
    assert!(class4.iter().all(|a| a.lettrable));

    let err = engine
        .create_account(exercise.id, NewAccount::new("601", "Doublon"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "DUPLICATE_ACCOUNT");

    let err = engine
        .create_account(exercise.id, NewAccount::new("6011", "Sous-compte").with_parent("6019"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_PARENT_ACCOUNT");

    let err = engine
        .create_account(exercise.id, NewAccount::new("6051", "Eau").with_parent("605"))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "PARENT_ACCOUNT_NOT_FOUND");

    let created = engine
        .create_account(exercise.id, NewAccount::new("6011", "Marchandises A").with_parent("601"))
        .await
        .unwrap();
    assert_eq!(created.nature, AccountNature::Expense);

    let again = engine
        .initialize_chart(exercise.id, standard_chart())
        .await
        .unwrap();
    assert!(again.is_empty());

    let err = engine.account(exercise.id, "999").await.unwrap_err();
    assert_eq!(err.error_code(), "UNKNOWN_ACCOUNT");
}

#[tokio::test]
async fn test_duplicate_exercise_code_is_refused() {
    let (engine, _, _) = setup().await;
    let err = engine
        .open_exercise("2024", date(2024, 1, 1), date(2024, 12, 31))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "DUPLICATE_EXERCISE");

    let err = engine
        .open_exercise("2026", date(2026, 12, 31), date(2026, 1, 1))
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "INVALID_EXERCISE_DATES");
}
