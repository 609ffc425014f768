//! Cost rule rows and lookup keys.

use std::fmt;

use paysettle_shared::types::MerchantId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Why money moves back to the payer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UndoReason {
    /// Forced reversal initiated by the card network or issuer.
    Chargeback,
    /// Merchant-initiated refund.
    Reversal,
}

impl UndoReason {
    /// Returns the string representation stored in the cost tables.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Chargeback => "chargeback",
            Self::Reversal => "reversal",
        }
    }

    /// Parses an undo reason from a string.
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "chargeback" => Some(Self::Chargeback),
            "reversal" => Some(Self::Reversal),
            _ => None,
        }
    }

    /// Returns the undo reason for a refund or chargeback.
    #[must_use]
    pub const fn for_refund(is_chargeback: bool) -> Self {
        if is_chargeback {
            Self::Chargeback
        } else {
            Self::Reversal
        }
    }
}

impl fmt::Display for UndoReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The four cost tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CostTable {
    /// What the acquirer charges the platform per payment.
    PaymentChannelSystem,
    /// What the platform charges a merchant per payment.
    PaymentChannelMerchant,
    /// What the acquirer charges the platform per refund/chargeback.
    MoneyBackSystem,
    /// What the platform charges a merchant per refund/chargeback.
    MoneyBackMerchant,
}

impl CostTable {
    /// Returns the collection name of the table.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PaymentChannelSystem => "payment_channel_cost_system",
            Self::PaymentChannelMerchant => "payment_channel_cost_merchant",
            Self::MoneyBackSystem => "money_back_cost_system",
            Self::MoneyBackMerchant => "money_back_cost_merchant",
        }
    }
}

impl fmt::Display for CostTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment-channel cost the acquirer charges the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentChannelCostSystem {
    /// Row ID.
    pub id: Uuid,
    /// Card brand or payment method name.
    pub name: String,
    /// Tariff region.
    pub region: String,
    /// Country code; empty for the region-wide default.
    pub country: String,
    /// Merchant category code.
    pub mcc_code: String,
    /// Operating company id.
    pub operating_company_id: String,
    /// Percent fee (2.5 = 2.5%).
    pub percent: Decimal,
    /// Fixed fee.
    pub fix_amount: Decimal,
    /// Currency of the fixed fee.
    pub fix_amount_currency: String,
    /// Inactive rows never match.
    pub is_active: bool,
}

/// Payment-channel tariff the platform charges a merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentChannelCostMerchant {
    /// Row ID.
    pub id: Uuid,
    /// Merchant the tariff belongs to.
    pub merchant_id: MerchantId,
    /// Card brand or payment method name.
    pub name: String,
    /// Merchant payout currency the tariff applies to.
    pub payout_currency: String,
    /// Smallest royalty amount the row applies to.
    pub min_amount: Decimal,
    /// Tariff region.
    pub region: String,
    /// Country code; empty for the region-wide default.
    pub country: String,
    /// Merchant category code.
    pub mcc_code: String,
    /// Operating company id.
    pub operating_company_id: String,
    /// Payment method percent fee.
    pub method_percent: Decimal,
    /// Payment method fixed fee.
    pub method_fix_amount: Decimal,
    /// Currency of the payment method fixed fee.
    pub method_fix_amount_currency: String,
    /// Platform percent fee.
    pub ps_percent: Decimal,
    /// Platform fixed fee.
    pub ps_fixed_fee: Decimal,
    /// Currency of the platform fixed fee.
    pub ps_fixed_fee_currency: String,
    /// Inactive rows never match.
    pub is_active: bool,
}

/// Money-back cost the acquirer charges the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyBackCostSystem {
    /// Row ID.
    pub id: Uuid,
    /// Card brand or payment method name.
    pub name: String,
    /// Payout currency the cost applies to.
    pub payout_currency: String,
    /// Refund or chargeback.
    pub undo_reason: UndoReason,
    /// Tariff region.
    pub region: String,
    /// Country code; empty for the region-wide default.
    pub country: String,
    /// Row applies from this many days after payment.
    pub days_from: i32,
    /// Payment stage.
    pub payment_stage: i32,
    /// Merchant category code.
    pub mcc_code: String,
    /// Operating company id.
    pub operating_company_id: String,
    /// Percent fee.
    pub percent: Decimal,
    /// Fixed fee.
    pub fix_amount: Decimal,
    /// Currency of the fixed fee.
    pub fix_amount_currency: String,
    /// Inactive rows never match.
    pub is_active: bool,
}

/// Money-back tariff the platform charges a merchant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyBackCostMerchant {
    /// Row ID.
    pub id: Uuid,
    /// Merchant the tariff belongs to.
    pub merchant_id: MerchantId,
    /// Card brand or payment method name.
    pub name: String,
    /// Merchant payout currency the tariff applies to.
    pub payout_currency: String,
    /// Refund or chargeback.
    pub undo_reason: UndoReason,
    /// Tariff region.
    pub region: String,
    /// Country code; empty for the region-wide default.
    pub country: String,
    /// Row applies from this many days after payment.
    pub days_from: i32,
    /// Payment stage.
    pub payment_stage: i32,
    /// Merchant category code.
    pub mcc_code: String,
    /// Percent fee.
    pub percent: Decimal,
    /// Fixed fee.
    pub fix_amount: Decimal,
    /// Currency of the fixed fee.
    pub fix_amount_currency: String,
    /// Inactive rows never match.
    pub is_active: bool,
}

/// A resolved row from any of the four tables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CostRule {
    /// Row of `payment_channel_cost_system`.
    PaymentChannelSystem(PaymentChannelCostSystem),
    /// Row of `payment_channel_cost_merchant`.
    PaymentChannelMerchant(PaymentChannelCostMerchant),
    /// Row of `money_back_cost_system`.
    MoneyBackSystem(MoneyBackCostSystem),
    /// Row of `money_back_cost_merchant`.
    MoneyBackMerchant(MoneyBackCostMerchant),
}

impl CostRule {
    /// Returns the table the row came from.
    #[must_use]
    pub const fn table(&self) -> CostTable {
        match self {
            Self::PaymentChannelSystem(_) => CostTable::PaymentChannelSystem,
            Self::PaymentChannelMerchant(_) => CostTable::PaymentChannelMerchant,
            Self::MoneyBackSystem(_) => CostTable::MoneyBackSystem,
            Self::MoneyBackMerchant(_) => CostTable::MoneyBackMerchant,
        }
    }

    /// Returns the country of the row; empty for a region-wide default.
    #[must_use]
    pub fn country(&self) -> &str {
        match self {
            Self::PaymentChannelSystem(r) => &r.country,
            Self::PaymentChannelMerchant(r) => &r.country,
            Self::MoneyBackSystem(r) => &r.country,
            Self::MoneyBackMerchant(r) => &r.country,
        }
    }
}

/// Full transaction context a rule is resolved for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostKey {
    /// Upper-cased brand or method name.
    pub name: String,
    /// Payer's tariff region.
    pub region: String,
    /// Payer's country.
    pub country: String,
    /// Merchant category code.
    pub mcc_code: String,
    /// Operating company id.
    pub operating_company_id: String,
    /// Merchant the transaction belongs to.
    pub merchant_id: MerchantId,
    /// Merchant payout currency.
    pub payout_currency: String,
    /// Royalty amount, matched against `min_amount`.
    pub amount: Decimal,
    /// Days since payment, matched against `days_from`.
    pub days: i64,
    /// Payment stage for money-back tables.
    pub payment_stage: i32,
    /// Undo reason for money-back tables.
    pub undo_reason: Option<UndoReason>,
}

impl CostKey {
    /// Returns a copy of the key for a money-back lookup.
    #[must_use]
    pub fn with_undo_reason(&self, undo_reason: UndoReason) -> Self {
        Self {
            undo_reason: Some(undo_reason),
            ..self.clone()
        }
    }

    /// Returns the exact-match store query for one country tier.
    #[must_use]
    pub fn query(&self, country: &str) -> CostQuery {
        CostQuery {
            name: self.name.clone(),
            region: self.region.clone(),
            country: country.to_string(),
            mcc_code: self.mcc_code.clone(),
            operating_company_id: self.operating_company_id.clone(),
            merchant_id: self.merchant_id,
            payout_currency: self.payout_currency.clone(),
            payment_stage: self.payment_stage,
            undo_reason: self.undo_reason,
        }
    }

    /// Returns the country tiers to try, most specific first.
    #[must_use]
    pub fn country_tiers(&self) -> Vec<CostQuery> {
        if self.country.is_empty() {
            vec![self.query("")]
        } else {
            vec![self.query(&self.country), self.query("")]
        }
    }
}

/// Exact-match filter sent to a [`crate::store::CostRuleStore`].
///
/// Each table matches on the subset of fields it carries; `min_amount` and
/// `days_from` are range keys applied by the resolver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuery {
    /// Upper-cased brand or method name.
    pub name: String,
    /// Tariff region.
    pub region: String,
    /// Country tier, possibly empty.
    pub country: String,
    /// Merchant category code.
    pub mcc_code: String,
    /// Operating company id (system tables).
    pub operating_company_id: String,
    /// Merchant id (merchant tables).
    pub merchant_id: MerchantId,
    /// Payout currency (merchant and money-back tables).
    pub payout_currency: String,
    /// Payment stage (money-back tables).
    pub payment_stage: i32,
    /// Undo reason (money-back tables).
    pub undo_reason: Option<UndoReason>,
}

impl CostQuery {
    /// Returns true if a system payment-channel row matches.
    #[must_use]
    pub fn matches_payment_channel_system(&self, row: &PaymentChannelCostSystem) -> bool {
        row.name.eq_ignore_ascii_case(&self.name)
            && row.region == self.region
            && row.country == self.country
            && row.mcc_code == self.mcc_code
            && row.operating_company_id == self.operating_company_id
    }

    /// Returns true if a merchant payment-channel row matches.
    #[must_use]
    pub fn matches_payment_channel_merchant(&self, row: &PaymentChannelCostMerchant) -> bool {
        row.merchant_id == self.merchant_id
            && row.name.eq_ignore_ascii_case(&self.name)
            && row.payout_currency == self.payout_currency
            && row.region == self.region
            && row.country == self.country
            && row.mcc_code == self.mcc_code
            && row.operating_company_id == self.operating_company_id
    }

    /// Returns true if a system money-back row matches.
    #[must_use]
    pub fn matches_money_back_system(&self, row: &MoneyBackCostSystem) -> bool {
        Some(row.undo_reason) == self.undo_reason
            && row.name.eq_ignore_ascii_case(&self.name)
            && row.payout_currency == self.payout_currency
            && row.region == self.region
            && row.country == self.country
            && row.payment_stage == self.payment_stage
            && row.mcc_code == self.mcc_code
            && row.operating_company_id == self.operating_company_id
    }

    /// Returns true if a merchant money-back row matches.
    #[must_use]
    pub fn matches_money_back_merchant(&self, row: &MoneyBackCostMerchant) -> bool {
        Some(row.undo_reason) == self.undo_reason
            && row.merchant_id == self.merchant_id
            && row.name.eq_ignore_ascii_case(&self.name)
            && row.payout_currency == self.payout_currency
            && row.region == self.region
            && row.country == self.country
            && row.payment_stage == self.payment_stage
            && row.mcc_code == self.mcc_code
    }
}
