//! Property-based tests for currency conversion.

use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::converter::CurrencyConverter;
use super::money::{convert_at, round_money, MONEY_SCALE, RATE_SCALE};
use super::static_rates::StaticRateSource;
use crate::testing;

/// Strategy to generate positive decimal amounts (0.01 to 1,000,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Strategy to generate positive exchange rates (0.0001 to 100.0000).
fn positive_rate() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|v| Decimal::new(v, 4))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Conversion results never carry more than four decimal places and
    /// booked amounts never more than two.
    #[test]
    fn prop_rounding_scale(amount in positive_amount(), rate in positive_rate()) {
        let converted = convert_at(amount, rate);
        prop_assert!(converted.scale() <= RATE_SCALE);
        prop_assert!(round_money(converted).scale() <= MONEY_SCALE);
        prop_assert!((converted - amount * rate).abs() <= Decimal::new(5, 5));
    }

    /// FX markup equals the amount converted at the merchant rate minus the
    /// amount converted at the common rate.
    #[test]
    fn prop_markup_is_rate_spread(
        amount in positive_amount(),
        common in positive_rate(),
        spread in positive_rate(),
    ) {
        let merchant_id = testing::merchant().id;
        let merchant_rate = common + spread;
        let (by_common, by_merchant) = tokio::runtime::Builder::new_current_thread()
            .build()
            .unwrap()
            .block_on(async {
                let source = StaticRateSource::new();
                source.set_common("RUB", "USD", common).await;
                source.set_merchant(merchant_id, "RUB", "USD", merchant_rate).await;
                let converter = CurrencyConverter::new(Arc::new(source));
                (
                    converter.convert_common(amount, "RUB", "USD").await.unwrap(),
                    converter.convert_for_merchant(merchant_id, amount, "RUB", "USD").await.unwrap(),
                )
            });

        prop_assert!(by_merchant >= by_common);
        prop_assert_eq!(by_merchant - by_common, convert_at(amount, merchant_rate) - convert_at(amount, common));
    }
}
