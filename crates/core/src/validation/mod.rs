//! Anomaly engine.
//!
//! Entry rules run on a single entry; balance rules run on a trial
//! balance. Both aggregate into a `ValidationReport`.

pub mod balance;
pub mod entry;
pub mod types;

pub use balance::BalanceValidator;
pub use entry::EntryValidator;
pub use types::{
    Anomaly, AnomalyCategory, AnomalyRule, ResolutionStatus, Severity, ValidationReport,
};
