//! Accounting entry engine.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use super::batch::EntryBatch;
use super::entry::{AccountingEntry, EntryType};
use super::error::EntryError;
use crate::cost::CostRateResolver;
use crate::currency::CurrencyConverter;
use crate::order::Order;
use crate::refund::Refund;
use crate::store::MerchantStore;

/// Inbound data for entries that copy the caller's numbers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryRequest {
    /// Amount for request-copying entries.
    #[serde(default)]
    pub amount: Decimal,
    /// Currency for request-copying entries.
    #[serde(default)]
    pub currency: String,
    /// Status override; `available` when absent.
    #[serde(default)]
    pub status: Option<String>,
    /// Booking date override.
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Free-text reason stored on every entry.
    #[serde(default)]
    pub reason: String,
}

/// Builds accounting entries for an order and/or refund.
#[derive(Clone)]
pub struct AccountingEntryEngine {
    resolver: CostRateResolver,
    converter: CurrencyConverter,
    merchants: Arc<dyn MerchantStore>,
}

impl AccountingEntryEngine {
    /// Creates an engine over its collaborators.
    pub fn new(
        resolver: CostRateResolver,
        converter: CurrencyConverter,
        merchants: Arc<dyn MerchantStore>,
    ) -> Self {
        Self {
            resolver,
            converter,
            merchants,
        }
    }

    /// Opens a batch bound to `order` and/or `refund`.
    pub fn batch<'a>(
        &'a self,
        order: Option<&'a Order>,
        refund: Option<&'a Refund>,
        request: &'a EntryRequest,
    ) -> EntryBatch<'a> {
        EntryBatch::new(
            &self.resolver,
            &self.converter,
            self.merchants.as_ref(),
            order,
            refund,
            request,
        )
    }

    /// Parses entry names, failing on the first unknown one.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntry` with the offending name.
    pub fn parse_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<EntryType>, EntryError> {
        names
            .iter()
            .map(|name| {
                let name = name.as_ref();
                EntryType::parse(name).ok_or_else(|| EntryError::UnknownEntry(name.to_string()))
            })
            .collect()
    }

    /// Runs the named handlers in the supplied order.
    ///
    /// All names are validated before any handler runs, and a failing
    /// handler discards the whole batch.
    ///
    /// # Errors
    ///
    /// Returns `UnknownEntry` for a name outside the catalogue, or the first
    /// handler error.
    pub async fn process_event<S: AsRef<str>>(
        &self,
        order: Option<&Order>,
        refund: Option<&Refund>,
        request: &EntryRequest,
        names: &[S],
    ) -> Result<Vec<AccountingEntry>, EntryError> {
        let types = Self::parse_names(names)?;
        self.process(order, refund, request, &types).await
    }

    /// Runs the handlers of `types` in order.
    ///
    /// # Errors
    ///
    /// Returns the first handler error.
    #[instrument(
        skip_all,
        fields(
            order_id = ?order.map(|o| o.id),
            refund_id = ?refund.map(|r| r.id),
            types = types.len()
        )
    )]
    pub async fn process(
        &self,
        order: Option<&Order>,
        refund: Option<&Refund>,
        request: &EntryRequest,
        types: &[EntryType],
    ) -> Result<Vec<AccountingEntry>, EntryError> {
        let entries = self
            .batch(order, refund, request)
            .process(types)
            .await
            .inspect_err(|err| warn!(error = %err, "Accounting batch discarded"))?;

        info!(produced = entries.len(), "Accounting batch built");
        Ok(entries)
    }
}
