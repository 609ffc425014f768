//! Exchange rate records.

use chrono::{DateTime, Utc};
use paysettle_shared::types::MerchantId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Which rate family a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "merchant_id", rename_all = "snake_case")]
pub enum RateKind {
    /// Platform-wide rate.
    Common,
    /// Rate negotiated for one merchant.
    Merchant(MerchantId),
}

/// Exchange rate between two currencies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// Rate family.
    pub kind: RateKind,
    /// Source currency code.
    pub from_currency: String,
    /// Target currency code.
    pub to_currency: String,
    /// 1 `from_currency` = `rate` `to_currency`.
    pub rate: Decimal,
    /// Time the rate was published.
    pub effective_at: DateTime<Utc>,
}

impl ExchangeRate {
    /// Creates a rate effective now.
    #[must_use]
    pub fn new(kind: RateKind, from_currency: &str, to_currency: &str, rate: Decimal) -> Self {
        Self {
            kind,
            from_currency: from_currency.to_uppercase(),
            to_currency: to_currency.to_uppercase(),
            rate,
            effective_at: Utc::now(),
        }
    }

    /// Returns true if the record converts `from` into `to`.
    #[must_use]
    pub fn is_pair(&self, from: &str, to: &str) -> bool {
        self.from_currency.eq_ignore_ascii_case(from) && self.to_currency.eq_ignore_ascii_case(to)
    }

    /// Returns the inverse rate, or `None` for a zero rate.
    #[must_use]
    pub fn inverse(&self) -> Option<Self> {
        if self.rate.is_zero() {
            return None;
        }
        Some(Self {
            kind: self.kind,
            from_currency: self.to_currency.clone(),
            to_currency: self.from_currency.clone(),
            rate: Decimal::ONE / self.rate,
            effective_at: self.effective_at,
        })
    }
}
