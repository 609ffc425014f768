//! In-process rate source.

use std::sync::Arc;

use async_trait::async_trait;
use paysettle_shared::types::MerchantId;
use rust_decimal::Decimal;
use tokio::sync::RwLock;

use super::converter::RateSource;
use super::error::ConversionError;
use super::exchange::{ExchangeRate, RateKind};

/// Rate source backed by a list of [`ExchangeRate`] records.
///
/// A pair is looked up directly first, then through the inverse of the
/// opposite pair.
#[derive(Debug, Default, Clone)]
pub struct StaticRateSource {
    rates: Arc<RwLock<Vec<ExchangeRate>>>,
}

impl StaticRateSource {
    /// Creates an empty source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a source preloaded with `rates`.
    #[must_use]
    pub fn with_rates(rates: Vec<ExchangeRate>) -> Self {
        Self {
            rates: Arc::new(RwLock::new(rates)),
        }
    }

    /// Adds or replaces a rate record.
    pub async fn put(&self, rate: ExchangeRate) {
        let mut rates = self.rates.write().await;
        rates.retain(|r| !(r.kind == rate.kind && r.is_pair(&rate.from_currency, &rate.to_currency)));
        rates.push(rate);
    }

    /// Sets the common rate for a pair.
    pub async fn set_common(&self, from: &str, to: &str, rate: Decimal) {
        self.put(ExchangeRate::new(RateKind::Common, from, to, rate)).await;
    }

    /// Sets a merchant rate for a pair.
    pub async fn set_merchant(&self, merchant_id: MerchantId, from: &str, to: &str, rate: Decimal) {
        self.put(ExchangeRate::new(RateKind::Merchant(merchant_id), from, to, rate))
            .await;
    }

    async fn lookup(&self, kind: RateKind, from: &str, to: &str) -> Result<Decimal, ConversionError> {
        let rates = self.rates.read().await;

        if let Some(direct) = rates.iter().find(|r| r.kind == kind && r.is_pair(from, to)) {
            return Ok(direct.rate);
        }

        rates
            .iter()
            .find(|r| r.kind == kind && r.is_pair(to, from))
            .and_then(ExchangeRate::inverse)
            .map(|r| r.rate)
            .ok_or_else(|| ConversionError::rate_failed(from, to, "rate not found"))
    }
}

#[async_trait]
impl RateSource for StaticRateSource {
    async fn rate_current_common(&self, from: &str, to: &str) -> Result<Decimal, ConversionError> {
        self.lookup(RateKind::Common, from, to).await
    }

    async fn rate_current_for_merchant(
        &self,
        merchant_id: MerchantId,
        from: &str,
        to: &str,
    ) -> Result<Decimal, ConversionError> {
        self.lookup(RateKind::Merchant(merchant_id), from, to).await
    }
}
