//! Payment-side handlers.
//!
//! Amounts are expressed in the order's royalty currency. The payment base
//! is the charge converted at the merchant rate.

use rust_decimal::Decimal;

use super::EntryBatch;
use crate::accounting::entry::{EntrySource, EntryType};
use crate::accounting::error::EntryError;
use crate::order::Order;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn order_source(order: &Order) -> EntrySource {
    EntrySource::order(order.id.into_inner())
}

impl EntryBatch<'_> {
    async fn payment_base(&self, order: &Order) -> Result<Decimal, EntryError> {
        self.merchant_amount(order, order.charge_amount, &order.charge_currency)
            .await
    }

    pub(super) async fn payment(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::Payment)?;
        let amount = self.payment_base(order).await?;
        self.book(EntryType::Payment, order_source(order), order, amount)
            .await
    }

    pub(super) async fn ps_markup_payment_fx(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::PsMarkupPaymentFx)?;
        let by_merchant = self.payment_base(order).await?;
        let by_common = self
            .common_amount(order, order.charge_amount, &order.charge_currency)
            .await?;
        self.book(
            EntryType::PsMarkupPaymentFx,
            order_source(order),
            order,
            by_merchant - by_common,
        )
        .await
    }

    pub(super) async fn method_fee(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::MethodFee)?;
        let key = self.cost_key(order).await?;
        let rule = self.resolver.payment_channel_merchant(&key).await?;
        let base = self.payment_base(order).await?;
        self.book(
            EntryType::MethodFee,
            order_source(order),
            order,
            base * rule.method_percent / HUNDRED,
        )
        .await
    }

    pub(super) async fn ps_markup_method_fee(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::PsMarkupMethodFee)?;
        let key = self.cost_key(order).await?;
        let merchant_rule = self.resolver.payment_channel_merchant(&key).await?;
        let system_rule = self.resolver.payment_channel_system(&key).await?;
        let base = self.payment_base(order).await?;
        let amount = base * (merchant_rule.method_percent - system_rule.percent) / HUNDRED;
        self.book(EntryType::PsMarkupMethodFee, order_source(order), order, amount)
            .await
    }

    pub(super) async fn method_fixed_fee(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::MethodFixedFee)?;
        let key = self.cost_key(order).await?;
        let rule = self.resolver.payment_channel_merchant(&key).await?;
        let amount = self
            .merchant_fixed_amount(order, rule.method_fix_amount, &rule.method_fix_amount_currency)
            .await?;
        self.book(EntryType::MethodFixedFee, order_source(order), order, amount)
            .await
    }

    pub(super) async fn ps_markup_method_fixed_fee(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::PsMarkupMethodFixedFee)?;
        let key = self.cost_key(order).await?;
        let merchant_rule = self.resolver.payment_channel_merchant(&key).await?;
        let system_rule = self.resolver.payment_channel_system(&key).await?;
        let charged = self
            .merchant_fixed_amount(
                order,
                merchant_rule.method_fix_amount,
                &merchant_rule.method_fix_amount_currency,
            )
            .await?;
        let cost = self
            .common_fixed_amount(order, system_rule.fix_amount, &system_rule.fix_amount_currency)
            .await?;
        self.book(
            EntryType::PsMarkupMethodFixedFee,
            order_source(order),
            order,
            charged - cost,
        )
        .await
    }

    pub(super) async fn ps_fee(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::PsFee)?;
        let key = self.cost_key(order).await?;
        let rule = self.resolver.payment_channel_merchant(&key).await?;
        let base = self.payment_base(order).await?;
        self.book(
            EntryType::PsFee,
            order_source(order),
            order,
            base * rule.ps_percent / HUNDRED,
        )
        .await
    }

    pub(super) async fn ps_fixed_fee(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::PsFixedFee)?;
        let key = self.cost_key(order).await?;
        let rule = self.resolver.payment_channel_merchant(&key).await?;
        let amount = self
            .merchant_fixed_amount(order, rule.ps_fixed_fee, &rule.ps_fixed_fee_currency)
            .await?;
        self.book(EntryType::PsFixedFee, order_source(order), order, amount)
            .await
    }

    pub(super) async fn ps_markup_fixed_fee_fx(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::PsMarkupFixedFeeFx)?;
        let key = self.cost_key(order).await?;
        let rule = self.resolver.payment_channel_merchant(&key).await?;
        let by_merchant = self
            .merchant_amount(order, rule.ps_fixed_fee, &rule.ps_fixed_fee_currency)
            .await?;
        let by_common = self
            .common_amount(order, rule.ps_fixed_fee, &rule.ps_fixed_fee_currency)
            .await?;
        self.book(
            EntryType::PsMarkupFixedFeeFx,
            order_source(order),
            order,
            by_merchant - by_common,
        )
        .await
    }

    pub(super) async fn tax_fee(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::TaxFee)?;
        let amount = self
            .merchant_amount(order, order.tax.amount, &order.tax.currency)
            .await?;
        self.book(EntryType::TaxFee, order_source(order), order, amount)
            .await
    }

    pub(super) async fn ps_tax_fx_fee(&mut self) -> Result<(), EntryError> {
        let order = self.require_order(EntryType::PsTaxFxFee)?;
        self.record_request(EntryType::PsTaxFxFee, order_source(order))
            .await
    }
}
