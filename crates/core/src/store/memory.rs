//! In-memory store adapters.
//!
//! `Arc<RwLock<..>>` collections behind the store ports; used by tests and
//! local runs without PostgreSQL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use paysettle_shared::types::{MerchantId, OrderId, RefundId};
use tokio::sync::RwLock;

use super::{
    AccountingEntryStore, CostRuleStore, CountryStore, MerchantStore, OrderStore, RefundStore,
    StoreError, Stores,
};
use crate::accounting::{AccountingEntry, EntrySource};
use crate::cost::{
    CostQuery, MoneyBackCostMerchant, MoneyBackCostSystem, PaymentChannelCostMerchant,
    PaymentChannelCostSystem,
};
use crate::merchant::{Country, Merchant};
use crate::order::Order;
use crate::refund::Refund;

/// Thread-safe in-memory order store with version checks.
#[derive(Default, Clone)]
pub struct InMemoryOrderStore {
    orders: Arc<RwLock<HashMap<OrderId, Order>>>,
}

impl InMemoryOrderStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored order, in no particular order.
    pub async fn all(&self) -> Vec<Order> {
        self.orders.read().await.values().cloned().collect()
    }
}

#[async_trait]
impl OrderStore for InMemoryOrderStore {
    async fn get(&self, id: OrderId) -> Result<Option<Order>, StoreError> {
        let orders = self.orders.read().await;
        Ok(orders.get(&id).cloned())
    }

    async fn insert(&self, order: &Order) -> Result<(), StoreError> {
        let mut orders = self.orders.write().await;
        if orders.contains_key(&order.id) {
            return Err(StoreError::Duplicate {
                entity: "order",
                id: order.id.into_inner(),
            });
        }
        orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn update(&self, order: &Order) -> Result<Order, StoreError> {
        let mut orders = self.orders.write().await;
        let stored = orders.get_mut(&order.id).ok_or(StoreError::Missing {
            entity: "order",
            id: order.id.into_inner(),
        })?;

        if stored.version != order.version {
            return Err(StoreError::VersionConflict {
                entity: "order",
                id: order.id.into_inner(),
                expected: order.version,
                actual: stored.version,
            });
        }

        let mut next = order.clone();
        next.version += 1;
        next.updated_at = Utc::now();
        *stored = next.clone();
        Ok(next)
    }
}

/// Thread-safe in-memory refund store.
#[derive(Default, Clone)]
pub struct InMemoryRefundStore {
    refunds: Arc<RwLock<HashMap<RefundId, Refund>>>,
}

impl InMemoryRefundStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    async fn of_order(&self, order_id: OrderId) -> Vec<Refund> {
        let refunds = self.refunds.read().await;
        let mut found: Vec<Refund> = refunds
            .values()
            .filter(|r| r.original_order.id == order_id)
            .cloned()
            .collect();
        found.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.into_inner().cmp(&a.id.into_inner()))
        });
        found
    }
}

#[async_trait]
impl RefundStore for InMemoryRefundStore {
    async fn get(&self, id: RefundId) -> Result<Option<Refund>, StoreError> {
        let refunds = self.refunds.read().await;
        Ok(refunds.get(&id).cloned())
    }

    async fn insert(&self, refund: &Refund) -> Result<(), StoreError> {
        let mut refunds = self.refunds.write().await;
        if refunds.contains_key(&refund.id) {
            return Err(StoreError::Duplicate {
                entity: "refund",
                id: refund.id.into_inner(),
            });
        }
        refunds.insert(refund.id, refund.clone());
        Ok(())
    }

    async fn update(&self, refund: &Refund) -> Result<(), StoreError> {
        let mut refunds = self.refunds.write().await;
        let stored = refunds.get_mut(&refund.id).ok_or(StoreError::Missing {
            entity: "refund",
            id: refund.id.into_inner(),
        })?;
        *stored = refund.clone();
        Ok(())
    }

    async fn list_by_order(
        &self,
        order_id: OrderId,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<Refund>, u64), StoreError> {
        let all = self.of_order(order_id).await;
        let total = all.len() as u64;
        let page = all
            .into_iter()
            .skip(usize::try_from(offset).unwrap_or(usize::MAX))
            .take(usize::try_from(limit).unwrap_or(usize::MAX))
            .collect();
        Ok((page, total))
    }

    async fn find_by_order(&self, order_id: OrderId) -> Result<Vec<Refund>, StoreError> {
        Ok(self.of_order(order_id).await)
    }
}

/// Thread-safe append-only entry store.
#[derive(Default, Clone)]
pub struct InMemoryAccountingEntryStore {
    entries: Arc<RwLock<Vec<AccountingEntry>>>,
}

impl InMemoryAccountingEntryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored entry in insertion order.
    pub async fn all(&self) -> Vec<AccountingEntry> {
        self.entries.read().await.clone()
    }
}

#[async_trait]
impl AccountingEntryStore for InMemoryAccountingEntryStore {
    async fn insert_many(&self, entries: &[AccountingEntry]) -> Result<(), StoreError> {
        let mut stored = self.entries.write().await;
        if let Some(dup) = entries.iter().find(|e| stored.iter().any(|s| s.id == e.id)) {
            return Err(StoreError::Duplicate {
                entity: "accounting_entry",
                id: dup.id.into_inner(),
            });
        }
        stored.extend_from_slice(entries);
        Ok(())
    }

    async fn list_by_source(
        &self,
        source: &EntrySource,
    ) -> Result<Vec<AccountingEntry>, StoreError> {
        let entries = self.entries.read().await;
        Ok(entries.iter().filter(|e| e.source == *source).cloned().collect())
    }
}

#[derive(Default)]
struct CostTables {
    payment_channel_system: Vec<PaymentChannelCostSystem>,
    payment_channel_merchant: Vec<PaymentChannelCostMerchant>,
    money_back_system: Vec<MoneyBackCostSystem>,
    money_back_merchant: Vec<MoneyBackCostMerchant>,
}

/// Thread-safe in-memory cost tables.
#[derive(Default, Clone)]
pub struct InMemoryCostRuleStore {
    tables: Arc<RwLock<CostTables>>,
}

impl InMemoryCostRuleStore {
    /// Creates empty tables.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a system payment-channel row.
    pub async fn add_payment_channel_system(&self, row: PaymentChannelCostSystem) {
        self.tables.write().await.payment_channel_system.push(row);
    }

    /// Adds a merchant payment-channel row.
    pub async fn add_payment_channel_merchant(&self, row: PaymentChannelCostMerchant) {
        self.tables.write().await.payment_channel_merchant.push(row);
    }

    /// Adds a system money-back row.
    pub async fn add_money_back_system(&self, row: MoneyBackCostSystem) {
        self.tables.write().await.money_back_system.push(row);
    }

    /// Adds a merchant money-back row.
    pub async fn add_money_back_merchant(&self, row: MoneyBackCostMerchant) {
        self.tables.write().await.money_back_merchant.push(row);
    }

    /// Marks every row of every table inactive.
    pub async fn deactivate_all(&self) {
        let mut tables = self.tables.write().await;
        tables
            .payment_channel_system
            .iter_mut()
            .for_each(|r| r.is_active = false);
        tables
            .payment_channel_merchant
            .iter_mut()
            .for_each(|r| r.is_active = false);
        tables
            .money_back_system
            .iter_mut()
            .for_each(|r| r.is_active = false);
        tables
            .money_back_merchant
            .iter_mut()
            .for_each(|r| r.is_active = false);
    }
}

#[async_trait]
impl CostRuleStore for InMemoryCostRuleStore {
    async fn find_payment_channel_system(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<PaymentChannelCostSystem>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .payment_channel_system
            .iter()
            .filter(|r| r.is_active && query.matches_payment_channel_system(r))
            .cloned()
            .collect())
    }

    async fn find_payment_channel_merchant(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<PaymentChannelCostMerchant>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .payment_channel_merchant
            .iter()
            .filter(|r| r.is_active && query.matches_payment_channel_merchant(r))
            .cloned()
            .collect())
    }

    async fn find_money_back_system(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<MoneyBackCostSystem>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .money_back_system
            .iter()
            .filter(|r| r.is_active && query.matches_money_back_system(r))
            .cloned()
            .collect())
    }

    async fn find_money_back_merchant(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<MoneyBackCostMerchant>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .money_back_merchant
            .iter()
            .filter(|r| r.is_active && query.matches_money_back_merchant(r))
            .cloned()
            .collect())
    }
}

/// Thread-safe in-memory merchant store.
#[derive(Default, Clone)]
pub struct InMemoryMerchantStore {
    merchants: Arc<RwLock<HashMap<MerchantId, Merchant>>>,
}

impl InMemoryMerchantStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a merchant.
    pub async fn put(&self, merchant: Merchant) {
        self.merchants.write().await.insert(merchant.id, merchant);
    }
}

#[async_trait]
impl MerchantStore for InMemoryMerchantStore {
    async fn get(&self, id: MerchantId) -> Result<Option<Merchant>, StoreError> {
        let merchants = self.merchants.read().await;
        Ok(merchants.get(&id).cloned())
    }
}

/// Thread-safe in-memory country store.
#[derive(Default, Clone)]
pub struct InMemoryCountryStore {
    countries: Arc<RwLock<HashMap<String, Country>>>,
}

impl InMemoryCountryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces a country.
    pub async fn put(&self, country: Country) {
        self.countries
            .write()
            .await
            .insert(country.iso_code_a2.to_uppercase(), country);
    }
}

#[async_trait]
impl CountryStore for InMemoryCountryStore {
    async fn get(&self, iso_code_a2: &str) -> Result<Option<Country>, StoreError> {
        let countries = self.countries.read().await;
        Ok(countries.get(&iso_code_a2.to_uppercase()).cloned())
    }
}

/// Concrete in-memory stores, kept typed for seeding and inspection.
#[derive(Default, Clone)]
pub struct InMemoryStores {
    /// Orders.
    pub orders: InMemoryOrderStore,
    /// Refunds.
    pub refunds: InMemoryRefundStore,
    /// Accounting entries.
    pub entries: InMemoryAccountingEntryStore,
    /// Cost tables.
    pub cost_rules: InMemoryCostRuleStore,
    /// Merchants.
    pub merchants: InMemoryMerchantStore,
    /// Countries.
    pub countries: InMemoryCountryStore,
}

impl InMemoryStores {
    /// Creates empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the stores behind their ports.
    #[must_use]
    pub fn stores(&self) -> Stores {
        Stores {
            orders: Arc::new(self.orders.clone()),
            refunds: Arc::new(self.refunds.clone()),
            entries: Arc::new(self.entries.clone()),
            cost_rules: Arc::new(self.cost_rules.clone()),
            merchants: Arc::new(self.merchants.clone()),
            countries: Arc::new(self.countries.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_order_update_checks_version() {
        let store = InMemoryOrderStore::new();
        let order = testing::order();
        store.insert(&order).await.unwrap();
        assert!(store.insert(&order).await.is_err());

        let stored = store.update(&order).await.unwrap();
        assert_eq!(stored.version, order.version + 1);

        let err = store.update(&order).await.unwrap_err();
        assert!(err.is_conflict());

        let mut fresh = store.get(order.id).await.unwrap().unwrap();
        fresh.refunded_amount = dec!(10);
        let stored = store.update(&fresh).await.unwrap();
        assert_eq!(stored.refunded_amount, dec!(10));
    }

    #[tokio::test]
    async fn test_update_missing_order() {
        let store = InMemoryOrderStore::new();
        let err = store.update(&testing::order()).await.unwrap_err();
        assert!(matches!(err, StoreError::Missing { .. }));
    }

    #[tokio::test]
    async fn test_refund_pagination() {
        let store = InMemoryRefundStore::new();
        let order = testing::order();
        for _ in 0..5 {
            store
                .insert(&testing::refund(&order, dec!(10), false))
                .await
                .unwrap();
        }
        store
            .insert(&testing::refund(&testing::order(), dec!(10), false))
            .await
            .unwrap();

        let (page, total) = store.list_by_order(order.id, 2, 1).await.unwrap();
        assert_eq!(total, 5);
        assert_eq!(page.len(), 2);

        let (page, _) = store.list_by_order(order.id, 10, 4).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(store.find_by_order(order.id).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_entry_source_lookup() {
        let store = InMemoryAccountingEntryStore::new();
        let entry = testing::entry();
        assert!(store.list_by_source(&entry.source).await.unwrap().is_empty());

        store.insert_many(std::slice::from_ref(&entry)).await.unwrap();
        assert_eq!(store.list_by_source(&entry.source).await.unwrap(), vec![entry.clone()]);

        assert!(store.insert_many(&[entry]).await.is_err());
        assert_eq!(store.all().await.len(), 1);
    }

    #[tokio::test]
    async fn test_country_lookup_is_case_insensitive() {
        let store = InMemoryCountryStore::new();
        store.put(testing::country("RU")).await;
        assert!(store.get("ru").await.unwrap().is_some());
        assert!(store.get("KZ").await.unwrap().is_none());
    }
}
