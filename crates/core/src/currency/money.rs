//! Rounding rules for money amounts.
//!
//! All rounding uses Banker's Rounding (`MidpointNearestEven`).

use rust_decimal::prelude::*;
use rust_decimal::Decimal;

/// Decimal places of a booked entry amount.
pub const MONEY_SCALE: u32 = 2;

/// Decimal places of a raw conversion result.
pub const RATE_SCALE: u32 = 4;

/// Converts `amount` at `rate`, rounded to [`RATE_SCALE`] places.
///
/// ```
/// use rust_decimal_macros::dec;
/// use paysettle_core::currency::convert_at;
///
/// assert_eq!(convert_at(dec!(100), dec!(0.0125)), dec!(1.2500));
/// ```
#[must_use]
pub fn convert_at(amount: Decimal, rate: Decimal) -> Decimal {
    (amount * rate).round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointNearestEven)
}

/// Rounds an amount to [`MONEY_SCALE`] places.
#[must_use]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointNearestEven)
}
