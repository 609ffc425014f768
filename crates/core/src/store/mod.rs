//! Persistence ports consumed by the settlement core.
//!
//! Every collection the core reads or writes is reached through one of the
//! narrow traits below. `memory` ships in-process implementations; the
//! PostgreSQL adapters live in `paysettle-db`.

pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use paysettle_shared::types::{MerchantId, OrderId, RefundId};
use thiserror::Error;
use uuid::Uuid;

use crate::accounting::{AccountingEntry, EntrySource};
use crate::cost::{
    CostQuery, MoneyBackCostMerchant, MoneyBackCostSystem, PaymentChannelCostMerchant,
    PaymentChannelCostSystem,
};
use crate::error::ErrorKind;
use crate::merchant::{Country, Merchant};
use crate::order::Order;
use crate::refund::Refund;

pub use memory::{
    InMemoryAccountingEntryStore, InMemoryCostRuleStore, InMemoryCountryStore,
    InMemoryMerchantStore, InMemoryOrderStore, InMemoryRefundStore, InMemoryStores,
};

/// Errors raised by store adapters.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document changed since it was read.
    #[error("{entity} {id} was modified concurrently (expected version {expected}, found {actual})")]
    VersionConflict {
        /// Collection name.
        entity: &'static str,
        /// Document ID.
        id: Uuid,
        /// Version the caller read.
        expected: i64,
        /// Version currently stored.
        actual: i64,
    },

    /// Update of a document that does not exist.
    #[error("{entity} {id} does not exist")]
    Missing {
        /// Collection name.
        entity: &'static str,
        /// Document ID.
        id: Uuid,
    },

    /// Insert of a document whose id is taken.
    #[error("{entity} {id} already exists")]
    Duplicate {
        /// Collection name.
        entity: &'static str,
        /// Document ID.
        id: Uuid,
    },

    /// Database driver error.
    #[error("Database error: {0}")]
    Database(String),

    /// Document could not be encoded or decoded.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    /// Returns true for optimistic concurrency failures.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::VersionConflict { .. })
    }

    /// Returns the coarse error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::System
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// Order documents.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Loads an order by ID.
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError>;

    /// Inserts a new order.
    async fn insert(&self, order: &Order) -> Result<(), StoreError>;

    /// Replaces an order if its stored version equals `order.version`.
    ///
    /// Returns the stored document with the bumped version.
    async fn update(&self, order: &Order) -> Result<Order, StoreError>;
}

/// Refund documents.
#[async_trait]
pub trait RefundStore: Send + Sync {
    /// Loads a refund by ID.
    async fn get(&self, id: RefundId) -> Result<Option<Refund>, StoreError>;

    /// Inserts a new refund.
    async fn insert(&self, refund: &Refund) -> Result<(), StoreError>;

    /// Replaces a refund.
    async fn update(&self, refund: &Refund) -> Result<(), StoreError>;

    /// Returns one page of refunds for an order, newest first, and the total count.
    async fn list_by_order(
        &self,
        order_id: OrderId,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Refund>, u64), StoreError>;

    /// Returns every refund of an order.
    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Refund>, StoreError>;
}

/// Append-only accounting entries.
#[async_trait]
pub trait AccountingEntryStore: Send + Sync {
    /// Inserts all entries or none.
    async fn insert_many(&self, entries: &[AccountingEntry]) -> Result<(), StoreError>;

    /// Returns the entries referencing `source` in creation order.
    async fn list_by_source(&self, source: &EntrySource)
        -> Result<Vec<AccountingEntry>, StoreError>;
}

/// The four cost tables.
///
/// Finders return active rows whose key fields equal the query exactly.
#[async_trait]
pub trait CostRuleStore: Send + Sync {
    /// Rows of `payment_channel_cost_system`.
    async fn find_payment_channel_system(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<PaymentChannelCostSystem>, StoreError>;

    /// Rows of `payment_channel_cost_merchant`.
    async fn find_payment_channel_merchant(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<PaymentChannelCostMerchant>, StoreError>;

    /// Rows of `money_back_cost_system`.
    async fn find_money_back_system(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<MoneyBackCostSystem>, StoreError>;

    /// Rows of `money_back_cost_merchant`.
    async fn find_money_back_merchant(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<MoneyBackCostMerchant>, StoreError>;
}

/// Merchant reference data.
#[async_trait]
pub trait MerchantStore: Send + Sync {
    /// Loads a merchant by ID.
    async fn get(&self, id: MerchantId) -> Result<Option<Merchant>, StoreError>;
}

/// Country reference data.
#[async_trait]
pub trait CountryStore: Send + Sync {
    /// Loads a country by ISO 3166-1 alpha-2 code, case insensitive.
    async fn get(&self, iso_code_a2: &str) -> Result<Option<Country>, StoreError>;
}

/// Every store the settlement core needs, bundled for wiring.
#[derive(Clone)]
pub struct Stores {
    /// Orders.
    pub orders: Arc<dyn OrderStore>,
    /// Refunds.
    pub refunds: Arc<dyn RefundStore>,
    /// Accounting entries.
    pub entries: Arc<dyn AccountingEntryStore>,
    /// Cost tables.
    pub cost_rules: Arc<dyn CostRuleStore>,
    /// Merchants.
    pub merchants: Arc<dyn MerchantStore>,
    /// Countries.
    pub countries: Arc<dyn CountryStore>,
}
