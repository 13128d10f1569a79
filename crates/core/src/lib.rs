//! Core of Comptable: a SYSCOHADA double-entry ledger engine.
//!
//! Domain rules are pure and store-agnostic. `engine::LedgerEngine`
//! orchestrates them against any `store::LedgerStore`.
//!
//! # Modules
//!
//! - `chart` - Chart of accounts, numbering and class/nature rules
//! - `currency` - Base-currency conversion
//! - `exercise` - Exercises and monthly periods
//! - `journal` - Entries, resolution and the forward-only workflow
//! - `validation` - Anomaly battery
//! - `ledger` - Per-account ledger aggregation
//! - `trial_balance` - Trial balance builder
//! - `closing` - Period controls, annual closing and carry-forward
//! - `budget` - Budget availability oracle
//! - `store` - Persistence boundary and in-memory store
//! - `engine` - Operations over a store

pub mod budget;
pub mod chart;
pub mod closing;
pub mod currency;
pub mod engine;
pub mod exercise;
pub mod journal;
pub mod ledger;
pub mod store;
pub mod trial_balance;
pub mod validation;

pub use engine::{
    ClosingOutcome, EngineError, EngineResult, LedgerEngine, LedgerSettings, ValidationOutcome,
};
pub use store::{InMemoryStore, LedgerStore};
