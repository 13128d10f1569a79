//! Property-based tests for the ledger aggregator.
//!
//! - closing = opening + Σ debit − Σ credit
//! - the last running balance equals closing
//! - aggregation is idempotent

use chrono::NaiveDate;
use comptable_shared::types::JournalEntryId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::aggregator::LedgerAggregator;
use super::types::PostedLine;

fn amount() -> impl Strategy<Value = Decimal> {
    (0i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn line_strategy() -> impl Strategy<Value = PostedLine> {
    (1u32..=366, amount(), amount(), 1u64..500).prop_map(|(day, debit, credit, sequence)| {
        let entry_date = NaiveDate::from_yo_opt(2024, day).unwrap();
        PostedLine {
            entry_id: JournalEntryId::new(),
            sequence,
            journal_code: "OD".into(),
            entry_date,
            entry_label: "op".into(),
            reference: format!("OD-{sequence:06}"),
            line_number: 1,
            account_number: "521".into(),
            label: None,
            debit,
            credit,
            lettering: None,
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_closing_identity(
        lines in prop::collection::vec(line_strategy(), 0..40),
        from_day in 1u32..=180,
        span in 0u32..=186,
    ) {
        let from = NaiveDate::from_yo_opt(2024, from_day).unwrap();
        let to = NaiveDate::from_yo_opt(2024, from_day + span).unwrap();
        let ledger = LedgerAggregator::account_ledger("521", "Banque", &lines, from, to).unwrap();

        prop_assert_eq!(ledger.closing, ledger.opening + ledger.total_debit - ledger.total_credit);
        let last = ledger.rows.last().map_or(ledger.opening, |r| r.running_balance);
        prop_assert_eq!(last, ledger.closing);

        let expected_opening: Decimal = lines
            .iter()
            .filter(|l| l.entry_date < from)
            .map(PostedLine::net)
            .sum();
        prop_assert_eq!(ledger.opening, expected_opening);
    }

    #[test]
    fn prop_idempotent(lines in prop::collection::vec(line_strategy(), 0..40)) {
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let first = LedgerAggregator::account_ledger("521", "Banque", &lines, from, to).unwrap();
        let second = LedgerAggregator::account_ledger("521", "Banque", &lines, from, to).unwrap();
        prop_assert_eq!(first, second);
    }
}
