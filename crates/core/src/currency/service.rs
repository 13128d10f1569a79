//! Currency service for base-amount resolution.
//!
//! Rates are supplied by the caller on each line and never fetched.

use rust_decimal::Decimal;
use rust_decimal::prelude::*;

/// Decimal places of base amounts.
pub const BASE_DECIMALS: u32 = 2;

/// A line amount resolved into the base currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedAmount {
    /// Rate applied (1 for the base currency).
    pub rate: Decimal,
    /// Amount in base currency, 2 dp.
    pub base_amount: Decimal,
}

/// Why a line's currency data cannot be resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurrencyIssue {
    /// Foreign-currency line without a rate > 0.
    MissingRate,
    /// Caller-supplied base amount differs from amount × rate.
    InconsistentBaseAmount {
        /// amount × rate, rounded.
        expected: Decimal,
        /// The amount the caller supplied.
        supplied: Decimal,
    },
}

/// Currency service for conversion operations.
///
/// Uses Banker's Rounding (`MidpointNearestEven`) everywhere.
pub struct CurrencyService;

impl CurrencyService {
    /// Converts an amount into the base currency, rounded to 2 dp.
    ///
    /// ```
    /// use rust_decimal_macros::dec;
    /// use comptable_core::currency::CurrencyService;
    ///
    /// assert_eq!(CurrencyService::to_base(dec!(100), dec!(655.957)), dec!(65595.70));
    /// ```
    #[must_use]
    pub fn to_base(amount: Decimal, rate: Decimal) -> Decimal {
        Self::round(amount * rate, BASE_DECIMALS)
    }

    /// Round a decimal value using Banker's Rounding.
    #[must_use]
    pub fn round(value: Decimal, decimal_places: u32) -> Decimal {
        value.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointNearestEven)
    }

    /// Resolves a line's rate and base amount.
    ///
    /// Base-currency lines always use a rate of 1. Foreign lines need a
    /// rate > 0; a caller-supplied base amount must match amount × rate
    /// within `tolerance`.
    ///
    /// # Errors
    ///
    /// Returns the `CurrencyIssue` found on the line.
    pub fn resolve(
        currency: &str,
        base_currency: &str,
        amount: Decimal,
        rate: Option<Decimal>,
        supplied_base: Option<Decimal>,
        tolerance: Decimal,
    ) -> Result<ResolvedAmount, CurrencyIssue> {
        let rate = if currency.eq_ignore_ascii_case(base_currency) {
            Decimal::ONE
        } else {
            match rate {
                Some(rate) if rate > Decimal::ZERO => rate,
                _ => return Err(CurrencyIssue::MissingRate),
            }
        };

        let expected = Self::to_base(amount, rate);
        if let Some(supplied) = supplied_base
            && (supplied - expected).abs() > tolerance
        {
            return Err(CurrencyIssue::InconsistentBaseAmount { expected, supplied });
        }

        Ok(ResolvedAmount {
            rate,
            base_amount: expected,
        })
    }
}
