//! Merchant repository.

use async_trait::async_trait;
use chrono::Utc;
use paysettle_core::merchant::Merchant;
use paysettle_core::store::{MerchantStore, StoreError};
use paysettle_shared::types::MerchantId;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};

use super::error::RepositoryError;
use crate::entities::merchants;

/// Repository for merchant reference data.
#[derive(Debug, Clone)]
pub struct MerchantRepository {
    db: DatabaseConnection,
}

impl MerchantRepository {
    /// Creates a new merchant repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a merchant by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn find_by_id(&self, id: MerchantId) -> Result<Option<Merchant>, RepositoryError> {
        let model = merchants::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?;

        Ok(model.map(|m| Merchant {
            id: MerchantId::from_uuid(m.id),
            name: m.name,
            payout_currency: m.payout_currency,
            mcc_code: m.mcc_code,
            operating_company_id: m.operating_company_id,
            vat_report_cutoff: m.vat_report_cutoff.map(|t| t.to_utc()),
        }))
    }

    /// Inserts a merchant.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the ID is taken.
    pub async fn create(&self, merchant: &Merchant) -> Result<(), RepositoryError> {
        merchants::ActiveModel {
            id: Set(merchant.id.into_inner()),
            name: Set(merchant.name.clone()),
            payout_currency: Set(merchant.payout_currency.clone()),
            mcc_code: Set(merchant.mcc_code.clone()),
            operating_company_id: Set(merchant.operating_company_id.clone()),
            vat_report_cutoff: Set(merchant.vat_report_cutoff.map(Into::into)),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| RepositoryError::on_insert(e, "merchant", merchant.id.into_inner()))?;
        Ok(())
    }
}

#[async_trait]
impl MerchantStore for MerchantRepository {
    async fn get(&self, id: MerchantId) -> Result<Option<Merchant>, StoreError> {
        Ok(self.find_by_id(id).await?)
    }
}
