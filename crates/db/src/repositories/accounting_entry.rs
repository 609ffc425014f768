//! Append-only accounting entry repository.

use async_trait::async_trait;
use paysettle_core::accounting::{AccountingEntry, EntrySource, EntryType, SourceType};
use paysettle_core::store::{AccountingEntryStore, StoreError};
use paysettle_shared::types::{AccountingEntryId, MerchantId};
use sea_orm::{
    ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use tracing::debug;

use super::error::RepositoryError;
use crate::entities::accounting_entries;

const ENTITY: &str = "accounting_entry";

/// Repository for accounting entries.
///
/// Rows are never updated or deleted; a trigger rejects both.
#[derive(Debug, Clone)]
pub struct AccountingEntryRepository {
    db: DatabaseConnection,
}

impl AccountingEntryRepository {
    /// Creates a new accounting entry repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Inserts a batch of entries in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if any entry ID is taken; nothing is stored then.
    pub async fn create_batch(&self, entries: &[AccountingEntry]) -> Result<(), RepositoryError> {
        let Some(first) = entries.first() else {
            return Ok(());
        };

        let models = entries.iter().map(|entry| accounting_entries::ActiveModel {
            id: Set(entry.id.into_inner()),
            seq: NotSet,
            entry_type: Set(entry.entry_type.as_str().to_string()),
            source_id: Set(entry.source.id),
            source_type: Set(entry.source.source_type.as_str().to_string()),
            merchant_id: Set(entry.merchant_id.into_inner()),
            amount: Set(entry.amount),
            currency: Set(entry.currency.clone()),
            reason: Set(entry.reason.clone()),
            status: Set(entry.status.clone()),
            country: Set(entry.country.clone()),
            created_at: Set(entry.created_at.into()),
        });

        let txn = self.db.begin().await?;
        accounting_entries::Entity::insert_many(models)
            .exec(&txn)
            .await
            .map_err(|e| RepositoryError::on_insert(e, ENTITY, first.id.into_inner()))?;
        txn.commit().await?;

        debug!(
            count = entries.len(),
            source_id = %first.source.id,
            "Accounting entries stored"
        );
        Ok(())
    }

    /// Returns the entries referencing `source` in insertion order.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row holds an unknown type.
    pub async fn find_by_source(
        &self,
        source: &EntrySource,
    ) -> Result<Vec<AccountingEntry>, RepositoryError> {
        accounting_entries::Entity::find()
            .filter(accounting_entries::Column::SourceId.eq(source.id))
            .filter(accounting_entries::Column::SourceType.eq(source.source_type.as_str()))
            .order_by_asc(accounting_entries::Column::Seq)
            .all(&self.db)
            .await?
            .into_iter()
            .map(Self::to_entry)
            .collect()
    }

    fn to_entry(model: accounting_entries::Model) -> Result<AccountingEntry, RepositoryError> {
        let entry_type = EntryType::parse(&model.entry_type)
            .ok_or_else(|| RepositoryError::invalid("entry_type", model.entry_type.clone()))?;
        let source_type = SourceType::parse(&model.source_type)
            .ok_or_else(|| RepositoryError::invalid("source_type", model.source_type.clone()))?;

        Ok(AccountingEntry {
            id: AccountingEntryId::from_uuid(model.id),
            entry_type,
            source: EntrySource {
                id: model.source_id,
                source_type,
            },
            merchant_id: MerchantId::from_uuid(model.merchant_id),
            amount: model.amount,
            currency: model.currency,
            reason: model.reason,
            status: model.status,
            country: model.country,
            created_at: model.created_at.to_utc(),
        })
    }
}

#[async_trait]
impl AccountingEntryStore for AccountingEntryRepository {
    async fn insert_many(&self, entries: &[AccountingEntry]) -> Result<(), StoreError> {
        Ok(self.create_batch(entries).await?)
    }

    async fn list_by_source(
        &self,
        source: &EntrySource,
    ) -> Result<Vec<AccountingEntry>, StoreError> {
        Ok(self.find_by_source(source).await?)
    }
}
