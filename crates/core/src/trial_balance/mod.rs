//! Trial balance (balance générale).

pub mod builder;
pub mod types;

#[cfg(test)]
mod builder_props;

pub use types::{
    BalanceColumn, ColumnTotals, EquilibriumCheck, TrialBalance, TrialBalanceRow,
    TrialBalanceTotals, split_balance,
};
