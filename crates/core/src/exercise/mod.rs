//! Exercises (fiscal years) and their monthly periods.

pub mod error;
pub mod period;
pub mod types;

pub use error::ExerciseError;
pub use period::PeriodLabel;
pub use types::{Exercise, ExerciseStatus};
