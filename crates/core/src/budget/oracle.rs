//! Budget availability oracle.

use rust_decimal::Decimal;

/// Answers whether a budget line can absorb an amount.
///
/// The budget itself is managed outside the ledger; the engine only asks
/// yes or no when an entry carries a budget line.
#[cfg_attr(test, mockall::automock)]
pub trait BudgetOracle: Send + Sync {
    /// Returns true if `budget_line` has at least `amount` available.
    fn has_sufficient_funds(&self, budget_line: &str, amount: Decimal) -> bool;
}

/// Oracle with a fixed answer.
#[derive(Debug, Clone, Copy)]
pub struct FixedBudget(pub bool);

impl BudgetOracle for FixedBudget {
    fn has_sufficient_funds(&self, _budget_line: &str, _amount: Decimal) -> bool {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_mock_oracle() {
        let mut oracle = MockBudgetOracle::new();
        oracle
            .expect_has_sufficient_funds()
            .returning(|line, amount| line == "B-100" && amount <= dec!(1000));

        assert!(oracle.has_sufficient_funds("B-100", dec!(500)));
        assert!(!oracle.has_sufficient_funds("B-100", dec!(5000)));
        assert!(!oracle.has_sufficient_funds("B-200", dec!(1)));
    }

    #[test]
    fn test_fixed_budget() {
        assert!(FixedBudget(true).has_sufficient_funds("any", dec!(1)));
        assert!(!FixedBudget(false).has_sufficient_funds("any", dec!(1)));
    }
}
