//! Trial balance builder.

use chrono::NaiveDate;
use comptable_shared::types::ExerciseId;
use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use super::types::{
    BalanceColumn, ColumnTotals, EquilibriumCheck, TrialBalance, TrialBalanceRow,
    TrialBalanceTotals, split_balance,
};
use crate::chart::AccountClass;
use crate::ledger::AccountLedger;

impl TrialBalance {
    /// Folds account ledgers into a trial balance.
    ///
    /// Ledgers without activity and without opening balance produce no row.
    #[must_use]
    pub fn build(
        exercise_id: ExerciseId,
        from: NaiveDate,
        to: NaiveDate,
        ledgers: &[AccountLedger],
        tolerance: Decimal,
    ) -> Self {
        let mut rows: Vec<TrialBalanceRow> = ledgers
            .iter()
            .filter(|ledger| ledger.has_activity())
            .filter_map(|ledger| {
                let class = AccountClass::from_number(&ledger.account_number).ok()?;
                let (opening_debit, opening_credit) = split_balance(ledger.opening);
                let (closing_debit, closing_credit) = split_balance(ledger.closing);
                Some(TrialBalanceRow {
                    account_number: ledger.account_number.clone(),
                    account_label: ledger.account_label.clone(),
                    class,
                    opening_debit,
                    opening_credit,
                    movement_debit: ledger.total_debit,
                    movement_credit: ledger.total_credit,
                    closing_debit,
                    closing_credit,
                })
            })
            .collect();
        rows.sort_by(|a, b| a.account_number.cmp(&b.account_number));

        debug!(rows = rows.len(), %from, %to, "trial balance built");
        Self::from_rows(exercise_id, from, to, rows, tolerance)
    }

    /// Derives totals and verdicts from precomputed rows.
    #[must_use]
    pub fn from_rows(
        exercise_id: ExerciseId,
        from: NaiveDate,
        to: NaiveDate,
        rows: Vec<TrialBalanceRow>,
        tolerance: Decimal,
    ) -> Self {
        let mut totals = TrialBalanceTotals::default();
        for row in &rows {
            totals.opening.debit += row.opening_debit;
            totals.opening.credit += row.opening_credit;
            totals.movement.debit += row.movement_debit;
            totals.movement.credit += row.movement_credit;
            totals.closing.debit += row.closing_debit;
            totals.closing.credit += row.closing_credit;
        }

        let check = |column, pair: ColumnTotals| EquilibriumCheck {
            column,
            debit: pair.debit,
            credit: pair.credit,
            difference: pair.difference(),
            balanced: pair.difference().abs() <= tolerance,
        };
        let checks = vec![
            check(BalanceColumn::Opening, totals.opening),
            check(BalanceColumn::Movement, totals.movement),
            check(BalanceColumn::Closing, totals.closing),
        ];

        Self {
            exercise_id,
            from,
            to,
            rows,
            totals,
            checks,
            tolerance,
        }
    }

    /// Returns true if every column pair balances.
    #[must_use]
    pub fn is_balanced(&self) -> bool {
        self.checks.iter().all(|check| check.balanced)
    }

    /// Human-readable messages for failing column pairs.
    #[must_use]
    pub fn diagnostics(&self) -> Vec<String> {
        self.checks
            .iter()
            .filter(|check| !check.balanced)
            .map(|check| {
                format!(
                    "{} columns not balanced: debit {} vs credit {} (difference {})",
                    check.column, check.debit, check.credit, check.difference
                )
            })
            .collect()
    }

    /// Restricts to one class, totals re-derived from the existing rows.
    #[must_use]
    pub fn for_class(&self, class: AccountClass) -> Self {
        let rows = self
            .rows
            .iter()
            .filter(|row| row.class == class)
            .cloned()
            .collect();
        Self::from_rows(self.exercise_id, self.from, self.to, rows, self.tolerance)
    }

    /// Aggregates rows by the first `prefix_len` digits of their number.
    ///
    /// Balances are netted per group then split again; movements add up.
    /// The group label is the label of the account whose number equals the
    /// prefix, if present among the rows.
    #[must_use]
    pub fn rollup(&self, prefix_len: usize) -> Self {
        let prefix_len = prefix_len.max(1);
        let mut groups: BTreeMap<String, (String, AccountClass, Decimal, Decimal, Decimal, Decimal)> =
            BTreeMap::new();

        for row in &self.rows {
            let prefix: String = row.account_number.chars().take(prefix_len).collect();
            let group = groups.entry(prefix.clone()).or_insert_with(|| {
                (prefix.clone(), row.class, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO, Decimal::ZERO)
            });
            if row.account_number == prefix {
                group.0.clone_from(&row.account_label);
            }
            group.2 += row.opening_net();
            group.3 += row.movement_debit;
            group.4 += row.movement_credit;
            group.5 += row.closing_net();
        }

        let rows = groups
            .into_iter()
            .map(|(number, (label, class, opening, debit, credit, closing))| {
                let (opening_debit, opening_credit) = split_balance(opening);
                let (closing_debit, closing_credit) = split_balance(closing);
                TrialBalanceRow {
                    account_number: number,
                    account_label: label,
                    class,
                    opening_debit,
                    opening_credit,
                    movement_debit: debit,
                    movement_credit: credit,
                    closing_debit,
                    closing_credit,
                }
            })
            .collect();
        Self::from_rows(self.exercise_id, self.from, self.to, rows, self.tolerance)
    }
}
