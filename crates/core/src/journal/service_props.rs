//! Property-based tests for entry preparation.
//!
//! - Prepared entries always balance within tolerance
//! - Unbalanced inputs are refused with the exact discrepancy

use chrono::NaiveDate;
use comptable_shared::types::{ExerciseId, UserId};
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::error::JournalError;
use super::service::{AccountRef, JournalService};
use super::types::{EntryInput, LineInput};
use crate::exercise::PeriodLabel;

/// Strategy to generate positive decimal amounts (0.01 to 10,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn lookup(_: &str) -> Option<AccountRef> {
    Some(AccountRef {
        label: "Compte".into(),
        active: true,
    })
}

fn make_input(debits: &[Decimal], credits: &[Decimal]) -> EntryInput {
    let mut input = EntryInput::new(
        ExerciseId::new(),
        "OD",
        NaiveDate::from_ymd_opt(2024, 3, 10).unwrap(),
        "Opération diverse",
        UserId::new(),
    );
    for amount in debits {
        input.lines.push(LineInput::debit("601", *amount));
    }
    for amount in credits {
        input.lines.push(LineInput::credit("401", *amount));
    }
    input
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Splitting one debit into several credits always balances.
    #[test]
    fn prop_split_credits_balance(parts in prop::collection::vec(positive_amount(), 1..8)) {
        let total: Decimal = parts.iter().copied().sum();
        let input = make_input(&[total], &parts);
        let entry = JournalService::prepare(
            &input,
            PeriodLabel::new(2024, 3).unwrap(),
            "XOF",
            Decimal::new(1, 2),
            lookup,
        );
        prop_assert!(entry.is_ok());
        let entry = entry.unwrap();
        prop_assert!(entry.balanced);
        prop_assert_eq!(entry.total_amount, total);
    }

    /// A gap of one cent or more is refused with that gap as discrepancy.
    #[test]
    fn prop_gap_refused(amount in positive_amount(), gap_cents in 1i64..1_000_000i64) {
        let gap = Decimal::new(gap_cents, 2);
        let input = make_input(&[amount + gap], &[amount]);
        let result = JournalService::prepare(
            &input,
            PeriodLabel::new(2024, 3).unwrap(),
            "XOF",
            Decimal::new(1, 2),
            lookup,
        );
        match result {
            Err(JournalError::Unbalanced { discrepancy, .. }) => prop_assert_eq!(discrepancy, gap),
            other => prop_assert!(false, "expected Unbalanced, got {:?}", other),
        }
    }
}
