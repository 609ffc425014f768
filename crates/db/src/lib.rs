//! PostgreSQL adapters for the settlement core.
//!
//! This crate provides:
//! - `SeaORM` entity definitions for orders, refunds, entries and reference data
//! - Repositories implementing the `paysettle_core::store` ports
//! - A rate source reading the `exchange_rates` table
//! - Database migrations

pub mod entities;
pub mod migration;
pub mod repositories;

pub use repositories::{
    AccountingEntryRepository, CostRuleRepository, CountryRepository, ExchangeRateRepository,
    MerchantRepository, OrderRepository, RefundRepository, RepositoryError,
};

use paysettle_core::store::Stores;
use sea_orm::{Database, DatabaseConnection, DbErr};
use std::sync::Arc;

/// Establishes a connection to the database.
///
/// # Errors
///
/// Returns an error if the connection cannot be established.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    Database::connect(database_url).await
}

/// Wires every PostgreSQL repository behind its store port.
#[must_use]
pub fn stores(db: &DatabaseConnection) -> Stores {
    Stores {
        orders: Arc::new(OrderRepository::new(db.clone())),
        refunds: Arc::new(RefundRepository::new(db.clone())),
        entries: Arc::new(AccountingEntryRepository::new(db.clone())),
        cost_rules: Arc::new(CostRuleRepository::new(db.clone())),
        merchants: Arc::new(MerchantRepository::new(db.clone())),
        countries: Arc::new(CountryRepository::new(db.clone())),
    }
}
