//! Property-based tests for the trial balance.
//!
//! - Balanced postings always yield balanced column pairs
//! - Building twice over the same lines is identical

use chrono::NaiveDate;
use comptable_shared::types::{ExerciseId, JournalEntryId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::types::TrialBalance;
use crate::ledger::{LedgerAggregator, PostedLine};

const ACCOUNTS: [&str; 6] = ["101", "401", "411", "521", "601", "701"];

fn amount() -> impl Strategy<Value = Decimal> {
    (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// A balanced two-line posting between two distinct accounts.
fn posting() -> impl Strategy<Value = Vec<PostedLine>> {
    (0usize..6, 1usize..6, amount(), 1u32..=366, 1u64..1000).prop_map(
        |(debit_idx, offset, value, day, sequence)| {
            let credit_idx = (debit_idx + offset) % ACCOUNTS.len();
            let entry_id = JournalEntryId::new();
            let entry_date = NaiveDate::from_yo_opt(2024, day).unwrap();
            let make = |account: &str, line_number, debit, credit| PostedLine {
                entry_id,
                sequence,
                journal_code: "OD".into(),
                entry_date,
                entry_label: "op".into(),
                reference: format!("OD-{sequence:06}"),
                line_number,
                account_number: account.into(),
                label: None,
                debit,
                credit,
                lettering: None,
            };
            vec![
                make(ACCOUNTS[debit_idx], 1, value, Decimal::ZERO),
                make(ACCOUNTS[credit_idx], 2, Decimal::ZERO, value),
            ]
        },
    )
}

fn accounts() -> Vec<(String, String)> {
    ACCOUNTS
        .iter()
        .map(|n| ((*n).to_string(), format!("Compte {n}")))
        .collect()
}

fn build(lines: &[PostedLine], from: NaiveDate, to: NaiveDate) -> TrialBalance {
    let ledgers = LedgerAggregator::general_ledger(&accounts(), lines, from, to).unwrap();
    TrialBalance::build(ExerciseId::new(), from, to, &ledgers, Decimal::new(1, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn prop_balanced_postings_balance(
        postings in prop::collection::vec(posting(), 1..30),
        from_day in 1u32..=200,
    ) {
        let lines: Vec<PostedLine> = postings.into_iter().flatten().collect();
        let from = NaiveDate::from_yo_opt(2024, from_day).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let tb = build(&lines, from, to);
        prop_assert!(tb.is_balanced(), "diagnostics: {:?}", tb.diagnostics());
        prop_assert!(tb.rollup(1).is_balanced());
    }

    #[test]
    fn prop_build_is_idempotent(postings in prop::collection::vec(posting(), 0..20)) {
        let lines: Vec<PostedLine> = postings.into_iter().flatten().collect();
        let from = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let to = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let first = build(&lines, from, to);
        let second = build(&lines, from, to);
        prop_assert_eq!(first.rows, second.rows);
        prop_assert_eq!(first.totals, second.totals);
    }
}
