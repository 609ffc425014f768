//! Exchange rates and currency conversion.
//!
//! Two rate families exist for every currency pair: the platform's common
//! rate and a merchant-specific rate. FX markup entries book the difference
//! between the two.

pub mod converter;
pub mod error;
pub mod exchange;
pub mod money;
pub mod static_rates;

#[cfg(test)]
mod converter_props;

pub use converter::{CurrencyConverter, RateSource};
pub use error::ConversionError;
pub use exchange::{ExchangeRate, RateKind};
pub use money::{convert_at, round_money, MONEY_SCALE, RATE_SCALE};
pub use static_rates::StaticRateSource;
