//! Account definitions, numbering rules, and class/nature derivation.

use chrono::{DateTime, Utc};
use comptable_shared::types::{AccountId, ExerciseId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use super::error::ChartError;
use crate::journal::EntrySide;

/// Validates an account number against `^[1-9]\d*$`.
///
/// # Errors
///
/// Returns `ChartError::InvalidAccountNumber` if the number is empty,
/// starts with `0`, or contains anything but ASCII digits.
pub fn validate_account_number(number: &str) -> Result<(), ChartError> {
    let mut chars = number.chars();
    let valid = match chars.next() {
        Some(first) => matches!(first, '1'..='9') && chars.all(|c| c.is_ascii_digit()),
        None => false,
    };

    if valid {
        Ok(())
    } else {
        Err(ChartError::InvalidAccountNumber(number.to_string()))
    }
}

/// SYSCOHADA account class: the leading digit of the account number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AccountClass(u8);

impl AccountClass {
    /// Derives the class from an account number's leading digit.
    ///
    /// # Errors
    ///
    /// Returns an error if the number is malformed.
    pub fn from_number(number: &str) -> Result<Self, ChartError> {
        validate_account_number(number)?;
        let digit = number.as_bytes()[0] - b'0';
        Ok(Self(digit))
    }

    /// Returns the class digit (1-9).
    #[must_use]
    pub const fn digit(self) -> u8 {
        self.0
    }

    /// Returns the nature associated with this class.
    #[must_use]
    pub const fn nature(self) -> AccountNature {
        AccountNature::from_class(self)
    }

    /// Third-party accounts (class 4) are lettrable.
    #[must_use]
    pub const fn is_lettrable(self) -> bool {
        self.0 == 4
    }

    /// Balance-sheet classes (1-5) are carried forward between exercises.
    #[must_use]
    pub const fn is_balance_sheet(self) -> bool {
        matches!(self.0, 1..=5)
    }
}

impl TryFrom<u8> for AccountClass {
    type Error = ChartError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (1..=9).contains(&value) {
            Ok(Self(value))
        } else {
            Err(ChartError::InvalidAccountNumber(value.to_string()))
        }
    }
}

impl From<AccountClass> for u8 {
    fn from(class: AccountClass) -> Self {
        class.0
    }
}

impl fmt::Display for AccountClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Account nature, a pure function of the class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccountNature {
    /// Class 2, 3, 4, 5.
    Asset,
    /// Class 1 (capital, reserves, long-term debt).
    Liability,
    /// Class 6.
    Expense,
    /// Class 7.
    Revenue,
    /// Class 8 and 9.
    Special,
}

impl AccountNature {
    /// Maps a class to its nature.
    #[must_use]
    pub const fn from_class(class: AccountClass) -> Self {
        match class.digit() {
            1 => Self::Liability,
            2..=5 => Self::Asset,
            6 => Self::Expense,
            7 => Self::Revenue,
            _ => Self::Special,
        }
    }

    /// Returns the string representation of the nature.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Asset => "ASSET",
            Self::Liability => "LIABILITY",
            Self::Expense => "EXPENSE",
            Self::Revenue => "REVENUE",
            Self::Special => "SPECIAL",
        }
    }

    /// Parses a nature from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "ASSET" => Some(Self::Asset),
            "LIABILITY" => Some(Self::Liability),
            "EXPENSE" => Some(Self::Expense),
            "REVENUE" => Some(Self::Revenue),
            "SPECIAL" => Some(Self::Special),
            _ => None,
        }
    }
}

impl fmt::Display for AccountNature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Running debit/credit counters of an account.
///
/// The counters are never netted at rest.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountBalance {
    /// Cumulative posted debits.
    pub debit: Decimal,
    /// Cumulative posted credits.
    pub credit: Decimal,
}

impl AccountBalance {
    /// Creates a balance from explicit counters.
    #[must_use]
    pub const fn new(debit: Decimal, credit: Decimal) -> Self {
        Self { debit, credit }
    }

    /// Net balance: debit minus credit.
    #[must_use]
    pub fn net(&self) -> Decimal {
        self.debit - self.credit
    }

    /// Returns the balance after adding `amount` on `side`.
    #[must_use]
    pub fn with_movement(self, side: EntrySide, amount: Decimal) -> Self {
        match side {
            EntrySide::Debit => Self::new(self.debit + amount, self.credit),
            EntrySide::Credit => Self::new(self.debit, self.credit + amount),
        }
    }
}

/// Input for defining an account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewAccount {
    /// Account number.
    pub number: String,
    /// Account label.
    pub label: String,
    /// Optional parent account number (must prefix `number`).
    pub parent: Option<String>,
}

impl NewAccount {
    /// Creates an account definition without parent.
    pub fn new(number: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            label: label.into(),
            parent: None,
        }
    }

    /// Sets the parent account number.
    #[must_use]
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent = Some(parent.into());
        self
    }
}

/// An account of the chart, scoped to one exercise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Unique identifier.
    pub id: AccountId,
    /// Owning exercise.
    pub exercise_id: ExerciseId,
    /// Account number.
    pub number: String,
    /// Account label.
    pub label: String,
    /// Class (leading digit).
    pub class: AccountClass,
    /// Nature derived from class.
    pub nature: AccountNature,
    /// Parent account number.
    pub parent: Option<String>,
    /// Whether lines on this account can be lettered.
    pub lettrable: bool,
    /// Soft-deactivation flag.
    pub active: bool,
    /// Running counters, mutated only by posting.
    pub balance: AccountBalance,
    /// Creation time.
    pub created_at: DateTime<Utc>,
}

impl Account {
    /// Builds an active account with zeroed counters.
    ///
    /// # Errors
    ///
    /// Returns an error if the number is malformed, the label is empty,
    /// or the parent is not a strict prefix of the number.
    pub fn open(exercise_id: ExerciseId, input: NewAccount) -> Result<Self, ChartError> {
        let class = AccountClass::from_number(&input.number)?;

        if input.label.trim().is_empty() {
            return Err(ChartError::MissingLabel(input.number));
        }

        if let Some(parent) = &input.parent {
            validate_account_number(parent)?;
            if parent.len() >= input.number.len() || !input.number.starts_with(parent.as_str()) {
                return Err(ChartError::InvalidParent {
                    number: input.number,
                    parent: parent.clone(),
                });
            }
        }

        Ok(Self {
            id: AccountId::new(),
            exercise_id,
            number: input.number,
            label: input.label,
            class,
            nature: class.nature(),
            parent: input.parent,
            lettrable: class.is_lettrable(),
            active: true,
            balance: AccountBalance::default(),
            created_at: Utc::now(),
        })
    }

    /// Copies this account's definition into another exercise.
    #[must_use]
    pub fn definition(&self) -> NewAccount {
        NewAccount {
            number: self.number.clone(),
            label: self.label.clone(),
            parent: self.parent.clone(),
        }
    }

    /// Returns true if the number starts with `prefix`.
    #[must_use]
    pub fn has_prefix(&self, prefix: &str) -> bool {
        self.number.starts_with(prefix)
    }
}
