//! Trial balance types.

use chrono::NaiveDate;
use comptable_shared::types::ExerciseId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::chart::AccountClass;

/// One account row: opening, movement and closing pairs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceRow {
    /// Account number (or prefix, once rolled up).
    pub account_number: String,
    /// Account label.
    pub account_label: String,
    /// Class of the account.
    pub class: AccountClass,
    /// Opening balance when debit.
    pub opening_debit: Decimal,
    /// Opening balance when credit.
    pub opening_credit: Decimal,
    /// Σ debit in the window.
    pub movement_debit: Decimal,
    /// Σ credit in the window.
    pub movement_credit: Decimal,
    /// Closing balance when debit.
    pub closing_debit: Decimal,
    /// Closing balance when credit.
    pub closing_credit: Decimal,
}

impl TrialBalanceRow {
    /// Signed opening balance.
    #[must_use]
    pub fn opening_net(&self) -> Decimal {
        self.opening_debit - self.opening_credit
    }

    /// Signed closing balance.
    #[must_use]
    pub fn closing_net(&self) -> Decimal {
        self.closing_debit - self.closing_credit
    }
}

/// Splits a signed balance onto the side of its sign.
#[must_use]
pub fn split_balance(net: Decimal) -> (Decimal, Decimal) {
    if net >= Decimal::ZERO {
        (net, Decimal::ZERO)
    } else {
        (Decimal::ZERO, -net)
    }
}

/// A debit/credit column pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnTotals {
    /// Σ debit column.
    pub debit: Decimal,
    /// Σ credit column.
    pub credit: Decimal,
}

impl ColumnTotals {
    /// Debit minus credit.
    #[must_use]
    pub fn difference(&self) -> Decimal {
        self.debit - self.credit
    }
}

/// Totals row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalanceTotals {
    /// Opening pair.
    pub opening: ColumnTotals,
    /// Movement pair.
    pub movement: ColumnTotals,
    /// Closing pair.
    pub closing: ColumnTotals,
}

/// Column pair of the trial balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BalanceColumn {
    /// Opening balances.
    Opening,
    /// Movements.
    Movement,
    /// Closing balances.
    Closing,
}

impl BalanceColumn {
    /// Returns the string representation of the column.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Opening => "OPENING",
            Self::Movement => "MOVEMENT",
            Self::Closing => "CLOSING",
        }
    }
}

impl fmt::Display for BalanceColumn {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Equilibrium verdict for one column pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EquilibriumCheck {
    /// Column pair.
    pub column: BalanceColumn,
    /// Σ debit.
    pub debit: Decimal,
    /// Σ credit.
    pub credit: Decimal,
    /// debit − credit.
    pub difference: Decimal,
    /// |difference| within tolerance.
    pub balanced: bool,
}

/// Trial balance (balance générale) over a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialBalance {
    /// Exercise.
    pub exercise_id: ExerciseId,
    /// Window start.
    pub from: NaiveDate,
    /// Window end.
    pub to: NaiveDate,
    /// Rows ordered by account number.
    pub rows: Vec<TrialBalanceRow>,
    /// Totals row.
    pub totals: TrialBalanceTotals,
    /// One verdict per column pair.
    pub checks: Vec<EquilibriumCheck>,
    /// Tolerance the verdicts were computed with.
    pub tolerance: Decimal,
}
