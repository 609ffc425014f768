//! Currency converter with a TTL rate cache.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;
use paysettle_shared::types::MerchantId;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use super::error::ConversionError;
use super::exchange::RateKind;
use super::money::convert_at;

/// Default cache capacity (number of currency pairs).
const DEFAULT_CACHE_CAPACITY: u64 = 1_000;

/// Default time-to-live for cached rates (10 minutes).
const DEFAULT_TTL_SECS: u64 = 600;

/// External rate service.
#[async_trait]
pub trait RateSource: Send + Sync {
    /// Current platform-wide rate: 1 `from` = rate `to`.
    async fn rate_current_common(&self, from: &str, to: &str) -> Result<Decimal, ConversionError>;

    /// Current rate negotiated for `merchant_id`.
    async fn rate_current_for_merchant(
        &self,
        merchant_id: MerchantId,
        from: &str,
        to: &str,
    ) -> Result<Decimal, ConversionError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RateCacheKey {
    kind: RateKind,
    from: String,
    to: String,
}

/// Converts amounts with the common or the merchant rate.
///
/// Successful lookups are cached per (kind, merchant, from, to); failures
/// are never cached.
#[derive(Clone)]
pub struct CurrencyConverter {
    source: Arc<dyn RateSource>,
    cache: Cache<RateCacheKey, Decimal>,
}

impl CurrencyConverter {
    /// Creates a converter with default cache settings.
    pub fn new(source: Arc<dyn RateSource>) -> Self {
        Self::with_cache(source, DEFAULT_CACHE_CAPACITY, DEFAULT_TTL_SECS)
    }

    /// Creates a converter with a custom cache.
    pub fn with_cache(source: Arc<dyn RateSource>, max_capacity: u64, ttl_secs: u64) -> Self {
        let cache = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { source, cache }
    }

    /// Returns the common rate for the pair; 1 for equal currencies.
    ///
    /// # Errors
    ///
    /// Returns `GetExchangeRateFailed` if the source has no usable rate.
    pub async fn rate_common(&self, from: &str, to: &str) -> Result<Decimal, ConversionError> {
        self.rate(RateKind::Common, from, to).await
    }

    /// Returns the merchant rate for the pair; 1 for equal currencies.
    ///
    /// # Errors
    ///
    /// Returns `GetExchangeRateFailed` if the source has no usable rate.
    pub async fn rate_for_merchant(
        &self,
        merchant_id: MerchantId,
        from: &str,
        to: &str,
    ) -> Result<Decimal, ConversionError> {
        self.rate(RateKind::Merchant(merchant_id), from, to).await
    }

    /// Converts `amount` at the common rate.
    ///
    /// # Errors
    ///
    /// Returns `GetExchangeRateFailed` if no rate is available.
    pub async fn convert_common(
        &self,
        amount: Decimal,
        from: &str,
        to: &str,
    ) -> Result<Decimal, ConversionError> {
        let rate = self.rate_common(from, to).await?;
        Ok(convert_at(amount, rate))
    }

    /// Converts `amount` at the merchant rate.
    ///
    /// # Errors
    ///
    /// Returns `GetExchangeRateFailed` if no rate is available.
    pub async fn convert_for_merchant(
        &self,
        merchant_id: MerchantId,
        amount: Decimal,
        from: &str,
        to: &str,
    ) -> Result<Decimal, ConversionError> {
        let rate = self.rate_for_merchant(merchant_id, from, to).await?;
        Ok(convert_at(amount, rate))
    }

    /// Drops every cached rate.
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    async fn rate(&self, kind: RateKind, from: &str, to: &str) -> Result<Decimal, ConversionError> {
        if from.eq_ignore_ascii_case(to) {
            return Ok(Decimal::ONE);
        }

        let key = RateCacheKey {
            kind,
            from: from.to_uppercase(),
            to: to.to_uppercase(),
        };

        if let Some(rate) = self.cache.get(&key).await {
            return Ok(rate);
        }

        let rate = match kind {
            RateKind::Common => self.source.rate_current_common(&key.from, &key.to).await,
            RateKind::Merchant(merchant_id) => {
                self.source
                    .rate_current_for_merchant(merchant_id, &key.from, &key.to)
                    .await
            }
        }
        .inspect_err(|err| warn!(from = %key.from, to = %key.to, error = %err, "Rate lookup failed"))?;

        if rate <= Decimal::ZERO {
            return Err(ConversionError::rate_failed(
                &key.from,
                &key.to,
                format!("non-positive rate {rate}"),
            ));
        }

        debug!(from = %key.from, to = %key.to, %rate, "Rate cached");
        self.cache.insert(key, rate).await;
        Ok(rate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::currency::StaticRateSource;
    use crate::testing;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_same_currency_rate_is_one() {
        let converter = CurrencyConverter::new(Arc::new(StaticRateSource::new()));
        assert_eq!(converter.rate_common("usd", "USD").await.unwrap(), Decimal::ONE);
        assert_eq!(
            converter
                .convert_for_merchant(testing::merchant().id, dec!(10), "EUR", "EUR")
                .await
                .unwrap(),
            dec!(10)
        );
    }

    #[tokio::test]
    async fn test_common_and_merchant_rates_differ() {
        let converter = CurrencyConverter::new(Arc::new(testing::rates()));
        let merchant_id = testing::merchant().id;

        let common = converter.convert_common(dec!(100), "RUB", "USD").await.unwrap();
        let merchant = converter
            .convert_for_merchant(merchant_id, dec!(100), "RUB", "USD")
            .await
            .unwrap();
        assert_eq!(common, dec!(1.25));
        assert_eq!(merchant, dec!(2));
    }

    #[tokio::test]
    async fn test_missing_rate_fails() {
        let converter = CurrencyConverter::new(Arc::new(testing::rates()));
        let err = converter.rate_common("RUB", "JPY").await.unwrap_err();
        assert!(matches!(err, ConversionError::GetExchangeRateFailed { .. }));
        assert_eq!(err.error_code(), "GET_EXCHANGE_RATE_FAILED");
    }

    #[tokio::test]
    async fn test_rates_are_cached() {
        let source = Arc::new(testing::rates());
        let converter = CurrencyConverter::new(source.clone());

        assert_eq!(converter.rate_common("RUB", "USD").await.unwrap(), dec!(0.0125));
        source.set_common("RUB", "USD", dec!(0.5)).await;
        assert_eq!(converter.rate_common("RUB", "USD").await.unwrap(), dec!(0.0125));

        converter.invalidate_all();
        assert_eq!(converter.rate_common("RUB", "USD").await.unwrap(), dec!(0.5));
    }

    #[tokio::test]
    async fn test_zero_rate_rejected() {
        let source = StaticRateSource::new();
        source.set_common("RUB", "USD", Decimal::ZERO).await;
        let converter = CurrencyConverter::new(Arc::new(source));
        assert!(converter.rate_common("RUB", "USD").await.is_err());
    }
}
