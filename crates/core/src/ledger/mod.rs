//! Ledger aggregation (grand livre).
//!
//! Only POSTED lines ever reach the aggregator.

pub mod aggregator;
pub mod error;
pub mod types;

#[cfg(test)]
mod aggregator_props;

pub use aggregator::LedgerAggregator;
pub use error::LedgerError;
pub use types::{AccountLedger, LedgerRow, PostedLine};
