//! Cost rule resolver.
//!
//! Resolution order for every table:
//! 1. payer country (billing address, then IP address) -> `CountryNotFound`
//! 2. tariff region of that country -> `CountryNotFound`
//! 3. brand name from payment requisites -> `BrandNotFound`
//! 4. exact country tier, then the `country = ""` tier
//! 5. otherwise `CommissionNotFound`
//!
//! Inside a tier, range keys pick the row with the greatest
//! `min_amount <= amount` (merchant payment channel) or
//! `days_from <= days` (money back).

use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::error::CostError;
use super::types::{
    CostKey, CostRule, CostTable, MoneyBackCostMerchant, MoneyBackCostSystem,
    PaymentChannelCostMerchant, PaymentChannelCostSystem, UndoReason,
};
use crate::merchant::Merchant;
use crate::order::Order;
use crate::store::{CostRuleStore, CountryStore};

/// Resolves the single best-matching row of a cost table.
#[derive(Clone)]
pub struct CostRateResolver {
    rules: Arc<dyn CostRuleStore>,
    countries: Arc<dyn CountryStore>,
    payment_stage: i32,
}

impl CostRateResolver {
    /// Creates a resolver over the given stores.
    pub fn new(
        rules: Arc<dyn CostRuleStore>,
        countries: Arc<dyn CountryStore>,
        payment_stage: i32,
    ) -> Self {
        Self {
            rules,
            countries,
            payment_stage,
        }
    }

    /// Builds the lookup key for an order paid to `merchant`.
    ///
    /// # Errors
    ///
    /// Returns `CountryNotFound` or `BrandNotFound` when the order lacks the
    /// data rules are keyed by.
    pub async fn key_for(
        &self,
        order: &Order,
        merchant: &Merchant,
        now: DateTime<Utc>,
    ) -> Result<CostKey, CostError> {
        let country_code = order
            .payer_country()
            .ok_or(CostError::CountryNotFound)?
            .to_uppercase();

        let country = self
            .countries
            .get(&country_code)
            .await?
            .ok_or(CostError::CountryNotFound)?;

        let name = order.brand_name().ok_or(CostError::BrandNotFound)?;

        Ok(CostKey {
            name,
            region: country.region,
            country: country.iso_code_a2,
            mcc_code: order.mcc_code.clone(),
            operating_company_id: order.operating_company_id.clone(),
            merchant_id: merchant.id,
            payout_currency: merchant.payout_currency.clone(),
            amount: order.royalty_data.amount_in_royalty_currency,
            days: order.days_since_payment(now),
            payment_stage: self.payment_stage,
            undo_reason: None,
        })
    }

    /// Resolves a row of any table.
    ///
    /// # Errors
    ///
    /// Returns `CommissionNotFound` when neither tier matches, and
    /// `UndoReasonRequired` for money-back tables without an undo reason.
    #[instrument(skip(self, key), fields(name = %key.name, country = %key.country))]
    pub async fn resolve(&self, table: CostTable, key: &CostKey) -> Result<CostRule, CostError> {
        let rule = match table {
            CostTable::PaymentChannelSystem => {
                CostRule::PaymentChannelSystem(self.payment_channel_system(key).await?)
            }
            CostTable::PaymentChannelMerchant => {
                CostRule::PaymentChannelMerchant(self.payment_channel_merchant(key).await?)
            }
            CostTable::MoneyBackSystem => {
                let undo = key.undo_reason.ok_or(CostError::UndoReasonRequired(table))?;
                CostRule::MoneyBackSystem(self.money_back_system(key, undo).await?)
            }
            CostTable::MoneyBackMerchant => {
                let undo = key.undo_reason.ok_or(CostError::UndoReasonRequired(table))?;
                CostRule::MoneyBackMerchant(self.money_back_merchant(key, undo).await?)
            }
        };

        debug!(table = %table, rule_country = %rule.country(), "Cost rule resolved");
        Ok(rule)
    }

    /// Resolves the acquirer's payment-channel cost.
    ///
    /// # Errors
    ///
    /// Returns `CommissionNotFound` when neither tier matches.
    pub async fn payment_channel_system(
        &self,
        key: &CostKey,
    ) -> Result<PaymentChannelCostSystem, CostError> {
        for query in key.country_tiers() {
            let rows = self.rules.find_payment_channel_system(&query).await?;
            let found = rows
                .into_iter()
                .find(|r| r.is_active && query.matches_payment_channel_system(r));
            if let Some(row) = found {
                return Ok(row);
            }
        }
        Err(not_found(CostTable::PaymentChannelSystem, key))
    }

    /// Resolves the merchant's payment-channel tariff.
    ///
    /// # Errors
    ///
    /// Returns `CommissionNotFound` when neither tier matches.
    pub async fn payment_channel_merchant(
        &self,
        key: &CostKey,
    ) -> Result<PaymentChannelCostMerchant, CostError> {
        for query in key.country_tiers() {
            let rows = self.rules.find_payment_channel_merchant(&query).await?;
            let found = pick_by_bound(
                rows.into_iter()
                    .filter(|r| r.is_active && query.matches_payment_channel_merchant(r)),
                |r| r.min_amount,
                key.amount,
            );
            if let Some(row) = found {
                return Ok(row);
            }
        }
        Err(not_found(CostTable::PaymentChannelMerchant, key))
    }

    /// Resolves the acquirer's money-back cost for `undo`.
    ///
    /// # Errors
    ///
    /// Returns `CommissionNotFound` when neither tier matches.
    pub async fn money_back_system(
        &self,
        key: &CostKey,
        undo: UndoReason,
    ) -> Result<MoneyBackCostSystem, CostError> {
        let key = key.with_undo_reason(undo);
        for query in key.country_tiers() {
            let rows = self.rules.find_money_back_system(&query).await?;
            let found = pick_by_bound(
                rows.into_iter()
                    .filter(|r| r.is_active && query.matches_money_back_system(r)),
                |r| Decimal::from(r.days_from),
                Decimal::from(key.days),
            );
            if let Some(row) = found {
                return Ok(row);
            }
        }
        Err(not_found(CostTable::MoneyBackSystem, &key))
    }

    /// Resolves the merchant's money-back tariff for `undo`.
    ///
    /// # Errors
    ///
    /// Returns `CommissionNotFound` when neither tier matches.
    pub async fn money_back_merchant(
        &self,
        key: &CostKey,
        undo: UndoReason,
    ) -> Result<MoneyBackCostMerchant, CostError> {
        let key = key.with_undo_reason(undo);
        for query in key.country_tiers() {
            let rows = self.rules.find_money_back_merchant(&query).await?;
            let found = pick_by_bound(
                rows.into_iter()
                    .filter(|r| r.is_active && query.matches_money_back_merchant(r)),
                |r| Decimal::from(r.days_from),
                Decimal::from(key.days),
            );
            if let Some(row) = found {
                return Ok(row);
            }
        }
        Err(not_found(CostTable::MoneyBackMerchant, &key))
    }

    /// Returns true if rows of both tables in `tables` resolve for `key`.
    ///
    /// Not-found errors count as `false`; store failures propagate.
    ///
    /// # Errors
    ///
    /// Returns the store error if a lookup fails for a reason other than a
    /// missing rule.
    pub async fn has_rules(&self, tables: &[CostTable], key: &CostKey) -> Result<bool, CostError> {
        for table in tables {
            match self.resolve(*table, key).await {
                Ok(_) => {}
                Err(err) if err.is_not_found() => {
                    debug!(table = %table, error = %err, "Cost rule missing");
                    return Ok(false);
                }
                Err(err) => return Err(err),
            }
        }
        Ok(true)
    }
}

/// Picks the row with the greatest bound not exceeding `limit`.
pub(crate) fn pick_by_bound<R>(
    rows: impl Iterator<Item = R>,
    bound: impl Fn(&R) -> Decimal,
    limit: Decimal,
) -> Option<R> {
    rows.filter(|r| bound(r) <= limit)
        .max_by(|a, b| bound(a).cmp(&bound(b)))
}

fn not_found(table: CostTable, key: &CostKey) -> CostError {
    CostError::CommissionNotFound {
        table,
        name: key.name.clone(),
        region: key.region.clone(),
        country: key.country.clone(),
    }
}
