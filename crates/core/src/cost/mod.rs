//! Fee and tax rule resolution.
//!
//! Four cost tables share one key family (brand name, tariff region, country,
//! MCC code, operating company). A table may hold a country-specific row and a
//! region-wide row with an empty country; the resolver always prefers the
//! country-specific one.

pub mod error;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod resolver_props;

pub use error::CostError;
pub use resolver::CostRateResolver;
pub use types::{
    CostKey, CostQuery, CostRule, CostTable, MoneyBackCostMerchant, MoneyBackCostSystem,
    PaymentChannelCostMerchant, PaymentChannelCostSystem, UndoReason,
};
