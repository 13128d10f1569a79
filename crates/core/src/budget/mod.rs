//! Budget gate consulted on entry creation.

pub mod oracle;

#[cfg(test)]
pub use oracle::MockBudgetOracle;
pub use oracle::{BudgetOracle, FixedBudget};
