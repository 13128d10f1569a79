//! Closing engine: period controls, annual closing and carry-forward.

pub mod controls;
pub mod error;
pub mod generator;
pub mod types;

pub use controls::{ControlOutcome, PeriodControls};
pub use error::ClosingError;
pub use generator::ClosingGenerator;
pub use types::{
    CarryForward, CarryForwardStatus, ClosureStatus, ClosureType, ControlSnapshot, PeriodClosure,
    ReportedBalance,
};
