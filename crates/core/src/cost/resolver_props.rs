//! Property-based tests for cost rule resolution.

use proptest::prelude::*;
use rust_decimal::Decimal;

use super::resolver::pick_by_bound;
use super::types::UndoReason;
use crate::testing;

/// Strategy to generate a percent between 0.01 and 10.00.
fn percent() -> impl Strategy<Value = Decimal> {
    (1i64..1_000i64).prop_map(|bp| Decimal::new(bp, 2))
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// When both a country row and a region-wide row exist, the country row
    /// is returned for every table.
    #[test]
    fn prop_country_specific_row_wins(
        country_percent in percent(),
        region_percent in percent(),
        chargeback in any::<bool>(),
    ) {
        let undo = UndoReason::for_refund(chargeback);
        let (system, merchant, mb_system, mb_merchant) = runtime().block_on(async {
            let fx = testing::Fixture::empty().await;

            let mut row = testing::pc_system_rule("RU");
            row.percent = country_percent;
            fx.rules.add_payment_channel_system(row).await;
            let mut row = testing::pc_system_rule("");
            row.percent = region_percent;
            fx.rules.add_payment_channel_system(row).await;

            let mut row = testing::pc_merchant_rule("");
            row.method_percent = region_percent;
            fx.rules.add_payment_channel_merchant(row).await;
            let mut row = testing::pc_merchant_rule("RU");
            row.method_percent = country_percent;
            fx.rules.add_payment_channel_merchant(row).await;

            let mut row = testing::mb_system_rule("", undo);
            row.percent = region_percent;
            fx.rules.add_money_back_system(row).await;
            let mut row = testing::mb_system_rule("RU", undo);
            row.percent = country_percent;
            fx.rules.add_money_back_system(row).await;

            let mut row = testing::mb_merchant_rule("RU", undo);
            row.percent = country_percent;
            fx.rules.add_money_back_merchant(row).await;
            let mut row = testing::mb_merchant_rule("", undo);
            row.percent = region_percent;
            fx.rules.add_money_back_merchant(row).await;

            let key = fx.cost_key().await;
            (
                fx.resolver.payment_channel_system(&key).await.unwrap(),
                fx.resolver.payment_channel_merchant(&key).await.unwrap(),
                fx.resolver.money_back_system(&key, undo).await.unwrap(),
                fx.resolver.money_back_merchant(&key, undo).await.unwrap(),
            )
        });

        prop_assert_eq!(system.country.as_str(), "RU");
        prop_assert_eq!(system.percent, country_percent);
        prop_assert_eq!(merchant.country.as_str(), "RU");
        prop_assert_eq!(merchant.method_percent, country_percent);
        prop_assert_eq!(mb_system.country.as_str(), "RU");
        prop_assert_eq!(mb_system.percent, country_percent);
        prop_assert_eq!(mb_merchant.country.as_str(), "RU");
        prop_assert_eq!(mb_merchant.percent, country_percent);
    }

    /// The picked bound never exceeds the limit and is the largest such bound.
    #[test]
    fn prop_pick_by_bound_is_greatest_applicable(
        bounds in prop::collection::vec(0i64..365, 0..12),
        limit in 0i64..365,
    ) {
        let picked = pick_by_bound(bounds.iter().copied(), |b| Decimal::from(*b), Decimal::from(limit));
        let expected = bounds.iter().copied().filter(|b| *b <= limit).max();
        prop_assert_eq!(picked, expected);
    }
}
