//! Monthly period labels (`YYYY-MM`).

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::ExerciseError;

/// A calendar month, displayed as `YYYY-MM`.
///
/// Ordering follows the calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PeriodLabel {
    first: NaiveDate,
    last: NaiveDate,
}

impl PeriodLabel {
    /// Builds the label for `year`/`month`.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPeriodLabel` if the month is not 1-12 or the year
    /// is out of the calendar's range.
    pub fn new(year: i32, month: u32) -> Result<Self, ExerciseError> {
        let invalid = || ExerciseError::InvalidPeriodLabel(format!("{year:04}-{month:02}"));
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid)?;
        Ok(Self { first, last })
    }

    /// Returns the period containing `date`.
    ///
    /// # Errors
    ///
    /// Fails only at the edge of the calendar's range.
    pub fn from_date(date: NaiveDate) -> Result<Self, ExerciseError> {
        Self::new(date.year(), date.month())
    }

    /// Calendar year.
    #[must_use]
    pub fn year(&self) -> i32 {
        self.first.year()
    }

    /// Calendar month (1-12).
    #[must_use]
    pub fn month(&self) -> u32 {
        self.first.month()
    }

    /// First day of the month.
    #[must_use]
    pub const fn first_day(&self) -> NaiveDate {
        self.first
    }

    /// Last day of the month.
    #[must_use]
    pub const fn last_day(&self) -> NaiveDate {
        self.last
    }

    /// The following month, if representable.
    #[must_use]
    pub fn next(&self) -> Option<Self> {
        self.last.succ_opt().and_then(|d| Self::from_date(d).ok())
    }

    /// Returns true if `date` falls in this month.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first && date <= self.last
    }
}

impl fmt::Display for PeriodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

impl FromStr for PeriodLabel {
    type Err = ExerciseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ExerciseError::InvalidPeriodLabel(s.to_string());
        let (year, month) = s.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || month.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;
        Self::new(year, month).map_err(|_| invalid())
    }
}

impl TryFrom<String> for PeriodLabel {
    type Error = ExerciseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PeriodLabel> for String {
    fn from(label: PeriodLabel) -> Self {
        label.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_display_and_parse() {
        let label: PeriodLabel = "2024-01".parse().unwrap();
        assert_eq!(label.year(), 2024);
        assert_eq!(label.month(), 1);
        assert_eq!(label.to_string(), "2024-01");
    }

    #[rstest]
    #[case("2024-13")]
    #[case("2024-00")]
    #[case("2024-1")]
    #[case("24-01")]
    #[case("2024/01")]
    #[case("")]
    fn test_invalid_labels(#[case] raw: &str) {
        assert!(matches!(
            raw.parse::<PeriodLabel>(),
            Err(ExerciseError::InvalidPeriodLabel(_))
        ));
    }

    #[rstest]
    #[case(2024, 2, 29)]
    #[case(2023, 2, 28)]
    #[case(2024, 4, 30)]
    #[case(2024, 12, 31)]
    fn test_last_day(#[case] year: i32, #[case] month: u32, #[case] day: u32) {
        let label = PeriodLabel::new(year, month).unwrap();
        assert_eq!(label.last_day(), NaiveDate::from_ymd_opt(year, month, day).unwrap());
    }

    #[test]
    fn test_next_crosses_year() {
        let dec = PeriodLabel::new(2024, 12).unwrap();
        assert_eq!(dec.next().unwrap().to_string(), "2025-01");
    }

    #[test]
    fn test_ordering_follows_calendar() {
        let a = PeriodLabel::new(2024, 11).unwrap();
        let b = PeriodLabel::new(2025, 2).unwrap();
        assert!(a < b);
    }
}
