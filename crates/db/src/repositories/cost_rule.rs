//! Repository over the four cost tables.

use async_trait::async_trait;
use chrono::Utc;
use paysettle_core::cost::{
    CostQuery, MoneyBackCostMerchant, MoneyBackCostSystem, PaymentChannelCostMerchant,
    PaymentChannelCostSystem, UndoReason,
};
use paysettle_core::store::{CostRuleStore, StoreError};
use paysettle_shared::types::MerchantId;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoSimpleExpr, QueryFilter,
    Set,
};

use super::error::RepositoryError;
use crate::entities::{
    money_back_cost_merchant, money_back_cost_system, payment_channel_cost_merchant,
    payment_channel_cost_system,
};

/// Case-insensitive match on a `name` column.
fn name_eq(column: impl IntoSimpleExpr, name: &str) -> SimpleExpr {
    Expr::expr(Func::upper(column.into_simple_expr())).eq(name.to_uppercase())
}

fn undo_reason(value: &str) -> Result<UndoReason, RepositoryError> {
    UndoReason::parse(value).ok_or_else(|| RepositoryError::invalid("undo_reason", value))
}

/// Repository for payment-channel and money-back cost rows.
///
/// Finders return active rows whose key columns equal the query; range keys
/// are left to the resolver.
#[derive(Debug, Clone)]
pub struct CostRuleRepository {
    db: DatabaseConnection,
}

impl CostRuleRepository {
    /// Creates a new cost rule repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Rows of `payment_channel_cost_system` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn payment_channel_system(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<PaymentChannelCostSystem>, RepositoryError> {
        use payment_channel_cost_system::{Column, Entity};

        let rows = Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(name_eq(Column::Name, &query.name))
            .filter(Column::Region.eq(query.region.as_str()))
            .filter(Column::Country.eq(query.country.as_str()))
            .filter(Column::MccCode.eq(query.mcc_code.as_str()))
            .filter(Column::OperatingCompanyId.eq(query.operating_company_id.as_str()))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|m| PaymentChannelCostSystem {
                id: m.id,
                name: m.name,
                region: m.region,
                country: m.country,
                mcc_code: m.mcc_code,
                operating_company_id: m.operating_company_id,
                percent: m.percent,
                fix_amount: m.fix_amount,
                fix_amount_currency: m.fix_amount_currency,
                is_active: m.is_active,
            })
            .collect())
    }

    /// Rows of `payment_channel_cost_merchant` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails.
    pub async fn payment_channel_merchant(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<PaymentChannelCostMerchant>, RepositoryError> {
        use payment_channel_cost_merchant::{Column, Entity};

        let rows = Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::MerchantId.eq(query.merchant_id.into_inner()))
            .filter(name_eq(Column::Name, &query.name))
            .filter(Column::PayoutCurrency.eq(query.payout_currency.as_str()))
            .filter(Column::Region.eq(query.region.as_str()))
            .filter(Column::Country.eq(query.country.as_str()))
            .filter(Column::MccCode.eq(query.mcc_code.as_str()))
            .filter(Column::OperatingCompanyId.eq(query.operating_company_id.as_str()))
            .all(&self.db)
            .await?;

        Ok(rows
            .into_iter()
            .map(|m| PaymentChannelCostMerchant {
                id: m.id,
                merchant_id: MerchantId::from_uuid(m.merchant_id),
                name: m.name,
                payout_currency: m.payout_currency,
                min_amount: m.min_amount,
                region: m.region,
                country: m.country,
                mcc_code: m.mcc_code,
                operating_company_id: m.operating_company_id,
                method_percent: m.method_percent,
                method_fix_amount: m.method_fix_amount,
                method_fix_amount_currency: m.method_fix_amount_currency,
                ps_percent: m.ps_percent,
                ps_fixed_fee: m.ps_fixed_fee,
                ps_fixed_fee_currency: m.ps_fixed_fee_currency,
                is_active: m.is_active,
            })
            .collect())
    }

    /// Rows of `money_back_cost_system` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row holds an unknown undo reason.
    pub async fn money_back_system(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<MoneyBackCostSystem>, RepositoryError> {
        use money_back_cost_system::{Column, Entity};

        let Some(reason) = query.undo_reason else {
            return Ok(Vec::new());
        };

        let rows = Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::UndoReason.eq(reason.as_str()))
            .filter(name_eq(Column::Name, &query.name))
            .filter(Column::PayoutCurrency.eq(query.payout_currency.as_str()))
            .filter(Column::Region.eq(query.region.as_str()))
            .filter(Column::Country.eq(query.country.as_str()))
            .filter(Column::PaymentStage.eq(query.payment_stage))
            .filter(Column::MccCode.eq(query.mcc_code.as_str()))
            .filter(Column::OperatingCompanyId.eq(query.operating_company_id.as_str()))
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|m| {
                Ok(MoneyBackCostSystem {
                    id: m.id,
                    name: m.name,
                    payout_currency: m.payout_currency,
                    undo_reason: undo_reason(&m.undo_reason)?,
                    region: m.region,
                    country: m.country,
                    days_from: m.days_from,
                    payment_stage: m.payment_stage,
                    mcc_code: m.mcc_code,
                    operating_company_id: m.operating_company_id,
                    percent: m.percent,
                    fix_amount: m.fix_amount,
                    fix_amount_currency: m.fix_amount_currency,
                    is_active: m.is_active,
                })
            })
            .collect()
    }

    /// Rows of `money_back_cost_merchant` matching `query`.
    ///
    /// # Errors
    ///
    /// Returns an error if the query fails or a row holds an unknown undo reason.
    pub async fn money_back_merchant(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<MoneyBackCostMerchant>, RepositoryError> {
        use money_back_cost_merchant::{Column, Entity};

        let Some(reason) = query.undo_reason else {
            return Ok(Vec::new());
        };

        let rows = Entity::find()
            .filter(Column::IsActive.eq(true))
            .filter(Column::UndoReason.eq(reason.as_str()))
            .filter(Column::MerchantId.eq(query.merchant_id.into_inner()))
            .filter(name_eq(Column::Name, &query.name))
            .filter(Column::PayoutCurrency.eq(query.payout_currency.as_str()))
            .filter(Column::Region.eq(query.region.as_str()))
            .filter(Column::Country.eq(query.country.as_str()))
            .filter(Column::PaymentStage.eq(query.payment_stage))
            .filter(Column::MccCode.eq(query.mcc_code.as_str()))
            .all(&self.db)
            .await?;

        rows.into_iter()
            .map(|m| {
                Ok(MoneyBackCostMerchant {
                    id: m.id,
                    merchant_id: MerchantId::from_uuid(m.merchant_id),
                    name: m.name,
                    payout_currency: m.payout_currency,
                    undo_reason: undo_reason(&m.undo_reason)?,
                    region: m.region,
                    country: m.country,
                    days_from: m.days_from,
                    payment_stage: m.payment_stage,
                    mcc_code: m.mcc_code,
                    percent: m.percent,
                    fix_amount: m.fix_amount,
                    fix_amount_currency: m.fix_amount_currency,
                    is_active: m.is_active,
                })
            })
            .collect()
    }

    /// Inserts a `payment_channel_cost_system` row.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the row ID is taken.
    pub async fn add_payment_channel_system(
        &self,
        row: &PaymentChannelCostSystem,
    ) -> Result<(), RepositoryError> {
        payment_channel_cost_system::ActiveModel {
            id: Set(row.id),
            name: Set(row.name.clone()),
            region: Set(row.region.clone()),
            country: Set(row.country.clone()),
            mcc_code: Set(row.mcc_code.clone()),
            operating_company_id: Set(row.operating_company_id.clone()),
            percent: Set(row.percent),
            fix_amount: Set(row.fix_amount),
            fix_amount_currency: Set(row.fix_amount_currency.clone()),
            is_active: Set(row.is_active),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| RepositoryError::on_insert(e, "payment_channel_cost_system", row.id))?;
        Ok(())
    }

    /// Inserts a `payment_channel_cost_merchant` row.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the row ID is taken.
    pub async fn add_payment_channel_merchant(
        &self,
        row: &PaymentChannelCostMerchant,
    ) -> Result<(), RepositoryError> {
        payment_channel_cost_merchant::ActiveModel {
            id: Set(row.id),
            merchant_id: Set(row.merchant_id.into_inner()),
            name: Set(row.name.clone()),
            payout_currency: Set(row.payout_currency.clone()),
            min_amount: Set(row.min_amount),
            region: Set(row.region.clone()),
            country: Set(row.country.clone()),
            mcc_code: Set(row.mcc_code.clone()),
            operating_company_id: Set(row.operating_company_id.clone()),
            method_percent: Set(row.method_percent),
            method_fix_amount: Set(row.method_fix_amount),
            method_fix_amount_currency: Set(row.method_fix_amount_currency.clone()),
            ps_percent: Set(row.ps_percent),
            ps_fixed_fee: Set(row.ps_fixed_fee),
            ps_fixed_fee_currency: Set(row.ps_fixed_fee_currency.clone()),
            is_active: Set(row.is_active),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| RepositoryError::on_insert(e, "payment_channel_cost_merchant", row.id))?;
        Ok(())
    }

    /// Inserts a `money_back_cost_system` row.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the row ID is taken.
    pub async fn add_money_back_system(
        &self,
        row: &MoneyBackCostSystem,
    ) -> Result<(), RepositoryError> {
        money_back_cost_system::ActiveModel {
            id: Set(row.id),
            name: Set(row.name.clone()),
            payout_currency: Set(row.payout_currency.clone()),
            undo_reason: Set(row.undo_reason.as_str().to_string()),
            region: Set(row.region.clone()),
            country: Set(row.country.clone()),
            days_from: Set(row.days_from),
            payment_stage: Set(row.payment_stage),
            mcc_code: Set(row.mcc_code.clone()),
            operating_company_id: Set(row.operating_company_id.clone()),
            percent: Set(row.percent),
            fix_amount: Set(row.fix_amount),
            fix_amount_currency: Set(row.fix_amount_currency.clone()),
            is_active: Set(row.is_active),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| RepositoryError::on_insert(e, "money_back_cost_system", row.id))?;
        Ok(())
    }

    /// Inserts a `money_back_cost_merchant` row.
    ///
    /// # Errors
    ///
    /// Returns `Duplicate` if the row ID is taken.
    pub async fn add_money_back_merchant(
        &self,
        row: &MoneyBackCostMerchant,
    ) -> Result<(), RepositoryError> {
        money_back_cost_merchant::ActiveModel {
            id: Set(row.id),
            merchant_id: Set(row.merchant_id.into_inner()),
            name: Set(row.name.clone()),
            payout_currency: Set(row.payout_currency.clone()),
            undo_reason: Set(row.undo_reason.as_str().to_string()),
            region: Set(row.region.clone()),
            country: Set(row.country.clone()),
            days_from: Set(row.days_from),
            payment_stage: Set(row.payment_stage),
            mcc_code: Set(row.mcc_code.clone()),
            percent: Set(row.percent),
            fix_amount: Set(row.fix_amount),
            fix_amount_currency: Set(row.fix_amount_currency.clone()),
            is_active: Set(row.is_active),
            created_at: Set(Utc::now().into()),
        }
        .insert(&self.db)
        .await
        .map_err(|e| RepositoryError::on_insert(e, "money_back_cost_merchant", row.id))?;
        Ok(())
    }
}

#[async_trait]
impl CostRuleStore for CostRuleRepository {
    async fn find_payment_channel_system(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<PaymentChannelCostSystem>, StoreError> {
        Ok(self.payment_channel_system(query).await?)
    }

    async fn find_payment_channel_merchant(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<PaymentChannelCostMerchant>, StoreError> {
        Ok(self.payment_channel_merchant(query).await?)
    }

    async fn find_money_back_system(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<MoneyBackCostSystem>, StoreError> {
        Ok(self.money_back_system(query).await?)
    }

    async fn find_money_back_merchant(
        &self,
        query: &CostQuery,
    ) -> Result<Vec<MoneyBackCostMerchant>, StoreError> {
        Ok(self.money_back_merchant(query).await?)
    }
}
