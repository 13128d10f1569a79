//! Property-based tests for base-amount conversion.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::service::{CurrencyService, BASE_DECIMALS};

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 10000.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Base amounts never carry more than two decimals.
    #[test]
    fn prop_to_base_has_two_decimals(amount in positive_amount(), rate in positive_rate()) {
        let result = CurrencyService::to_base(amount, rate);
        prop_assert!(result.scale() <= BASE_DECIMALS);
    }

    /// Rounding moves the value by at most half a cent.
    #[test]
    fn prop_to_base_within_half_cent(amount in positive_amount(), rate in positive_rate()) {
        let exact = amount * rate;
        let result = CurrencyService::to_base(amount, rate);
        prop_assert!((exact - result).abs() <= Decimal::new(5, 3));
    }

    /// A base amount computed by the service is always accepted back.
    #[test]
    fn prop_resolve_accepts_own_base_amount(amount in positive_amount(), rate in positive_rate()) {
        let base = CurrencyService::to_base(amount, rate);
        let resolved = CurrencyService::resolve(
            "EUR",
            "XOF",
            amount,
            Some(rate),
            Some(base),
            Decimal::new(1, 2),
        );
        prop_assert!(resolved.is_ok());
    }
}
