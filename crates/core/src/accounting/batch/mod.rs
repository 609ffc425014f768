//! Per-call batch context.
//!
//! A batch is bound to an order and/or a refund, resolves the merchant on
//! first use and accumulates entries in the order the types were supplied.
//! Nothing is persisted here.

mod payment;
mod refund;

use chrono::{DateTime, Utc};
use paysettle_shared::types::{AccountingEntryId, MerchantId};
use rust_decimal::Decimal;
use tracing::debug;

use super::engine::EntryRequest;
use super::entry::{AccountingEntry, EntrySource, EntryType, STATUS_AVAILABLE};
use super::error::EntryError;
use crate::cost::{CostKey, CostRateResolver};
use crate::currency::{round_money, CurrencyConverter};
use crate::merchant::Merchant;
use crate::order::Order;
use crate::refund::Refund;
use crate::store::MerchantStore;

/// Entries being built for one order and/or refund.
pub struct EntryBatch<'a> {
    resolver: &'a CostRateResolver,
    converter: &'a CurrencyConverter,
    merchants: &'a dyn MerchantStore,
    order: Option<&'a Order>,
    refund: Option<&'a Refund>,
    request: &'a EntryRequest,
    now: DateTime<Utc>,
    merchant: Option<Merchant>,
    cost_key: Option<CostKey>,
    entries: Vec<AccountingEntry>,
}

impl<'a> EntryBatch<'a> {
    pub(super) fn new(
        resolver: &'a CostRateResolver,
        converter: &'a CurrencyConverter,
        merchants: &'a dyn MerchantStore,
        order: Option<&'a Order>,
        refund: Option<&'a Refund>,
        request: &'a EntryRequest,
    ) -> Self {
        Self {
            resolver,
            converter,
            merchants,
            order,
            refund,
            request,
            now: Utc::now(),
            merchant: None,
            cost_key: None,
            entries: Vec::new(),
        }
    }

    /// Runs every type in order and returns the produced entries.
    ///
    /// # Errors
    ///
    /// Returns the first handler error; the partial batch is dropped.
    pub async fn process(mut self, types: &[EntryType]) -> Result<Vec<AccountingEntry>, EntryError> {
        for entry_type in types {
            self.apply(*entry_type).await?;
        }
        Ok(self.entries)
    }

    /// Runs the handler of one entry type.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound`/`RefundNotFound` for an unbound document,
    /// `MerchantNotFound`, a cost rule error or a conversion error.
    pub async fn apply(&mut self, entry_type: EntryType) -> Result<(), EntryError> {
        match entry_type {
            EntryType::Payment => self.payment().await,
            EntryType::PsMarkupPaymentFx => self.ps_markup_payment_fx().await,
            EntryType::MethodFee => self.method_fee().await,
            EntryType::PsMarkupMethodFee => self.ps_markup_method_fee().await,
            EntryType::MethodFixedFee => self.method_fixed_fee().await,
            EntryType::PsMarkupMethodFixedFee => self.ps_markup_method_fixed_fee().await,
            EntryType::PsFee => self.ps_fee().await,
            EntryType::PsFixedFee => self.ps_fixed_fee().await,
            EntryType::PsMarkupFixedFeeFx => self.ps_markup_fixed_fee_fx().await,
            EntryType::TaxFee => self.tax_fee().await,
            EntryType::PsTaxFxFee => self.ps_tax_fx_fee().await,
            EntryType::Refund => self.refund_entry().await,
            EntryType::RefundFee => self.refund_fee().await,
            EntryType::RefundFixedFee => self.refund_fixed_fee().await,
            EntryType::PsMarkupRefundFx => self.ps_markup_refund_fx().await,
            EntryType::RefundBody => self.refund_body().await,
            EntryType::ReverseTaxFee => self.reverse_tax_fee().await,
            EntryType::PsMarkupReverseTaxFee => self.ps_markup_reverse_tax_fee().await,
            EntryType::ReverseTaxFeeDelta => self.reverse_tax_fee_delta().await,
            EntryType::PsReverseTaxFeeDelta => self.ps_reverse_tax_fee_delta().await,
            EntryType::RefundFailure => self.refund_failure().await,
            EntryType::ChargebackFailure => self.chargeback_failure().await,
            EntryType::Chargeback => self.chargeback().await,
            EntryType::PsMarkupChargebackFx => self.ps_markup_chargeback_fx().await,
            EntryType::ChargebackFee => self.chargeback_fee().await,
            EntryType::PsMarkupChargebackFee => self.ps_markup_chargeback_fee().await,
            EntryType::ChargebackFixedFee => self.chargeback_fixed_fee().await,
            EntryType::PsMarkupChargebackFixedFee => self.ps_markup_chargeback_fixed_fee().await,
        }
    }

    /// Entries produced so far.
    #[must_use]
    pub fn entries(&self) -> &[AccountingEntry] {
        &self.entries
    }

    fn require_order(&self, entry_type: EntryType) -> Result<&'a Order, EntryError> {
        self.order.ok_or(EntryError::OrderNotFound(entry_type))
    }

    /// Refund-side handlers need the refund and the order it is priced on.
    fn require_refund(&self, entry_type: EntryType) -> Result<(&'a Refund, &'a Order), EntryError> {
        let refund = self.refund.ok_or(EntryError::RefundNotFound(entry_type))?;
        let order = self.require_order(entry_type)?;
        Ok((refund, order))
    }

    fn merchant_id(&self) -> Option<MerchantId> {
        self.order
            .map(|o| o.merchant_id)
            .or_else(|| self.refund.map(|r| r.merchant_id))
    }

    async fn merchant(&mut self) -> Result<Merchant, EntryError> {
        if let Some(merchant) = &self.merchant {
            return Ok(merchant.clone());
        }

        let merchant_id = self.merchant_id().ok_or(EntryError::MerchantNotFound)?;
        let merchant = self
            .merchants
            .get(merchant_id)
            .await?
            .ok_or(EntryError::MerchantNotFound)?;

        self.merchant = Some(merchant.clone());
        Ok(merchant)
    }

    async fn cost_key(&mut self, order: &Order) -> Result<CostKey, EntryError> {
        if let Some(key) = &self.cost_key {
            return Ok(key.clone());
        }

        let merchant = self.merchant().await?;
        let key = self.resolver.key_for(order, &merchant, self.now).await?;
        self.cost_key = Some(key.clone());
        Ok(key)
    }

    /// Converts into the order's royalty currency at the merchant rate.
    async fn merchant_amount(
        &self,
        order: &Order,
        amount: Decimal,
        currency: &str,
    ) -> Result<Decimal, EntryError> {
        Ok(self
            .converter
            .convert_for_merchant(order.merchant_id, amount, currency, order.royalty_currency())
            .await?)
    }

    /// Converts into the order's royalty currency at the common rate.
    async fn common_amount(
        &self,
        order: &Order,
        amount: Decimal,
        currency: &str,
    ) -> Result<Decimal, EntryError> {
        Ok(self
            .converter
            .convert_common(amount, currency, order.royalty_currency())
            .await?)
    }

    /// Converts a rule's fixed amount at the merchant rate.
    ///
    /// Fixed amounts are stored in the rule's own currency, so any failure
    /// here is an `ExchangeFailed`.
    async fn merchant_fixed_amount(
        &self,
        order: &Order,
        amount: Decimal,
        currency: &str,
    ) -> Result<Decimal, EntryError> {
        self.converter
            .convert_for_merchant(order.merchant_id, amount, currency, order.royalty_currency())
            .await
            .map_err(|e| e.into_exchange_failed().into())
    }

    /// Converts a rule's fixed amount at the common rate.
    async fn common_fixed_amount(
        &self,
        order: &Order,
        amount: Decimal,
        currency: &str,
    ) -> Result<Decimal, EntryError> {
        self.converter
            .convert_common(amount, currency, order.royalty_currency())
            .await
            .map_err(|e| e.into_exchange_failed().into())
    }

    /// Books an entry in the order's royalty currency against `source`.
    async fn book(
        &mut self,
        entry_type: EntryType,
        source: EntrySource,
        order: &Order,
        amount: Decimal,
    ) -> Result<(), EntryError> {
        let currency = order.royalty_currency().to_string();
        let now = self.now;
        self.create_entry(entry_type, source, amount, currency, STATUS_AVAILABLE.to_string(), now)
            .await
    }

    /// Books an entry whose amount, currency and status come from the request.
    async fn record_request(
        &mut self,
        entry_type: EntryType,
        source: EntrySource,
    ) -> Result<(), EntryError> {
        let request = self.request;
        let status = request
            .status
            .clone()
            .unwrap_or_else(|| STATUS_AVAILABLE.to_string());
        let created_at = request.date.unwrap_or(self.now);
        self.create_entry(
            entry_type,
            source,
            request.amount,
            request.currency.clone(),
            status,
            created_at,
        )
        .await
    }

    async fn create_entry(
        &mut self,
        entry_type: EntryType,
        source: EntrySource,
        amount: Decimal,
        currency: String,
        status: String,
        created_at: DateTime<Utc>,
    ) -> Result<(), EntryError> {
        let merchant = self.merchant().await?;
        let country = self
            .order
            .and_then(Order::payer_country)
            .map(str::to_uppercase)
            .unwrap_or_default();

        let entry = AccountingEntry {
            id: AccountingEntryId::new(),
            entry_type,
            source,
            merchant_id: merchant.id,
            amount: round_money(amount),
            currency,
            reason: self.request.reason.clone(),
            status,
            country,
            created_at,
        };

        debug!(
            entry_type = %entry_type,
            source_id = %source.id,
            amount = %entry.amount,
            currency = %entry.currency,
            "Accounting entry appended"
        );

        self.entries.push(entry);
        Ok(())
    }
}
