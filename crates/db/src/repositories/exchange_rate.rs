//! Exchange rate repository and the database-backed rate source.

use async_trait::async_trait;
use paysettle_core::currency::{ConversionError, ExchangeRate, RateKind, RateSource};
use paysettle_shared::types::MerchantId;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::warn;
use uuid::Uuid;

use super::error::RepositoryError;
use crate::entities::exchange_rates;

const KIND_COMMON: &str = "common";
const KIND_MERCHANT: &str = "merchant";

/// Repository for exchange rates.
///
/// As a [`RateSource`] it returns the latest rate for the pair, falling back
/// to the inverse of the latest opposite rate.
#[derive(Debug, Clone)]
pub struct ExchangeRateRepository {
    db: DatabaseConnection,
}

impl ExchangeRateRepository {
    /// Creates a new exchange rate repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Stores a rate record.
    ///
    /// # Errors
    ///
    /// Returns an error if the insert fails.
    pub async fn create(&self, rate: &ExchangeRate) -> Result<(), RepositoryError> {
        let (kind, merchant_id) = match rate.kind {
            RateKind::Common => (KIND_COMMON, None),
            RateKind::Merchant(id) => (KIND_MERCHANT, Some(id.into_inner())),
        };

        let id = Uuid::now_v7();
        exchange_rates::ActiveModel {
            id: Set(id),
            rate_kind: Set(kind.to_string()),
            merchant_id: Set(merchant_id),
            from_currency: Set(rate.from_currency.to_uppercase()),
            to_currency: Set(rate.to_currency.to_uppercase()),
            rate: Set(rate.rate),
            effective_at: Set(rate.effective_at.into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| RepositoryError::on_insert(e, "exchange_rate", id))?;
        Ok(())
    }

    /// Latest stored rate for the exact pair.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn latest(
        &self,
        kind: RateKind,
        from: &str,
        to: &str,
    ) -> Result<Option<Decimal>, RepositoryError> {
        let mut query = exchange_rates::Entity::find()
            .filter(exchange_rates::Column::FromCurrency.eq(from.to_uppercase()))
            .filter(exchange_rates::Column::ToCurrency.eq(to.to_uppercase()));

        query = match kind {
            RateKind::Common => query
                .filter(exchange_rates::Column::RateKind.eq(KIND_COMMON))
                .filter(exchange_rates::Column::MerchantId.is_null()),
            RateKind::Merchant(id) => query
                .filter(exchange_rates::Column::RateKind.eq(KIND_MERCHANT))
                .filter(exchange_rates::Column::MerchantId.eq(id.into_inner())),
        };

        let model = query
            .order_by_desc(exchange_rates::Column::EffectiveAt)
            .one(&self.db)
            .await?;
        Ok(model.map(|m| m.rate))
    }

    async fn lookup(&self, kind: RateKind, from: &str, to: &str) -> Result<Decimal, ConversionError> {
        let failed = |e: RepositoryError| {
            warn!(error = %e, from, to, "Exchange rate query failed");
            ConversionError::rate_failed(from, to, e.to_string())
        };

        if let Some(rate) = self.latest(kind, from, to).await.map_err(failed)? {
            return Ok(rate);
        }

        match self.latest(kind, to, from).await.map_err(failed)? {
            Some(rate) if !rate.is_zero() => Ok(Decimal::ONE / rate),
            _ => Err(ConversionError::rate_failed(from, to, "rate not found")),
        }
    }
}

#[async_trait]
impl RateSource for ExchangeRateRepository {
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
