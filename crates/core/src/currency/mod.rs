//! Base-currency conversion.
//!
//! Every line carries its own amount, currency and rate; sums and
//! balances are always taken on the base amount.

pub mod service;

#[cfg(test)]
mod props;

pub use service::{BASE_DECIMALS, CurrencyIssue, CurrencyService, ResolvedAmount};
