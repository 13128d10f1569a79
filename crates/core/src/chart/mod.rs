//! Chart of accounts.
//!
//! Account numbering follows SYSCOHADA: the leading digit is the class,
//! and the class alone determines the account's nature.

pub mod account;
pub mod error;
pub mod template;

pub use account::{
    Account, AccountBalance, AccountClass, AccountNature, NewAccount, validate_account_number,
};
pub use error::ChartError;
pub use template::standard_chart;
