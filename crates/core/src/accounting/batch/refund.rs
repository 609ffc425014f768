//! Refund and chargeback side handlers.
//!
//! The bound order is the mirror refund-order when one exists, otherwise
//! the original order; tax is scaled to the refunded share either way.

use rust_decimal::Decimal;

use super::EntryBatch;
use crate::accounting::entry::{EntrySource, EntryType};
use crate::accounting::error::EntryError;
use crate::cost::{MoneyBackCostMerchant, MoneyBackCostSystem, UndoReason};
use crate::order::{proportional_amount, Order};
use crate::refund::Refund;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

fn refund_source(refund: &Refund) -> EntrySource {
    EntrySource::refund(refund.id.into_inner())
}

fn refund_tax(order: &Order, refund: &Refund) -> Decimal {
    proportional_amount(order.tax.amount, refund.amount, order.charge_amount)
}

/// Payment tax minus refund tax, both in royalty currency.
fn tax_delta(order: &Order) -> Decimal {
    order.royalty_data.payment_tax_amount_in_royalty_currency
        - order.royalty_data.refund_tax_amount_in_royalty_currency
}

impl EntryBatch<'_> {
    async fn money_back_merchant(
        &mut self,
        order: &Order,
        undo: UndoReason,
    ) -> Result<MoneyBackCostMerchant, EntryError> {
        let key = self.cost_key(order).await?;
        Ok(self.resolver.money_back_merchant(&key, undo).await?)
    }

    async fn money_back_system(
        &mut self,
        order: &Order,
        undo: UndoReason,
    ) -> Result<MoneyBackCostSystem, EntryError> {
        let key = self.cost_key(order).await?;
        Ok(self.resolver.money_back_system(&key, undo).await?)
    }

    async fn refund_base(&self, order: &Order, refund: &Refund) -> Result<Decimal, EntryError> {
        self.merchant_amount(order, refund.amount, &refund.currency)
            .await
    }

    /// Refunded amount at the merchant rate minus at the common rate.
    async fn refund_fx(&self, order: &Order, refund: &Refund) -> Result<Decimal, EntryError> {
        let by_merchant = self.refund_base(order, refund).await?;
        let by_common = self
            .common_amount(order, refund.amount, &refund.currency)
            .await?;
        Ok(by_merchant - by_common)
    }

    async fn undo_body(&mut self, entry_type: EntryType) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(entry_type)?;
        let amount = self.refund_base(order, refund).await?;
        self.book(entry_type, refund_source(refund), order, amount)
            .await
    }

    async fn undo_fx(&mut self, entry_type: EntryType) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(entry_type)?;
        let amount = self.refund_fx(order, refund).await?;
        self.book(entry_type, refund_source(refund), order, amount)
            .await
    }

    async fn undo_fee(&mut self, entry_type: EntryType, undo: UndoReason) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(entry_type)?;
        let rule = self.money_back_merchant(order, undo).await?;
        let base = self.refund_base(order, refund).await?;
        self.book(
            entry_type,
            refund_source(refund),
            order,
            base * rule.percent / HUNDRED,
        )
        .await
    }

    async fn undo_fixed_fee(
        &mut self,
        entry_type: EntryType,
        undo: UndoReason,
    ) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(entry_type)?;
        let rule = self.money_back_merchant(order, undo).await?;
        let amount = self
            .merchant_fixed_amount(order, rule.fix_amount, &rule.fix_amount_currency)
            .await?;
        self.book(entry_type, refund_source(refund), order, amount)
            .await
    }

    pub(super) async fn refund_entry(&mut self) -> Result<(), EntryError> {
        self.undo_body(EntryType::Refund).await
    }

    pub(super) async fn refund_fee(&mut self) -> Result<(), EntryError> {
        self.undo_fee(EntryType::RefundFee, UndoReason::Reversal)
            .await
    }

    pub(super) async fn refund_fixed_fee(&mut self) -> Result<(), EntryError> {
        self.undo_fixed_fee(EntryType::RefundFixedFee, UndoReason::Reversal)
            .await
    }

    pub(super) async fn ps_markup_refund_fx(&mut self) -> Result<(), EntryError> {
        self.undo_fx(EntryType::PsMarkupRefundFx).await
    }

    pub(super) async fn refund_body(&mut self) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(EntryType::RefundBody)?;
        let amount = self
            .common_amount(order, refund.amount, &refund.currency)
            .await?;
        self.book(EntryType::RefundBody, refund_source(refund), order, amount)
            .await
    }

    pub(super) async fn reverse_tax_fee(&mut self) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(EntryType::ReverseTaxFee)?;
        let amount = self
            .merchant_amount(order, refund_tax(order, refund), &order.tax.currency)
            .await?;
        self.book(EntryType::ReverseTaxFee, refund_source(refund), order, amount)
            .await
    }

    pub(super) async fn ps_markup_reverse_tax_fee(&mut self) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(EntryType::PsMarkupReverseTaxFee)?;
        let tax = refund_tax(order, refund);
        let by_merchant = self.merchant_amount(order, tax, &order.tax.currency).await?;
        let by_common = self.common_amount(order, tax, &order.tax.currency).await?;
        self.book(
            EntryType::PsMarkupReverseTaxFee,
            refund_source(refund),
            order,
            by_merchant - by_common,
        )
        .await
    }

    pub(super) async fn reverse_tax_fee_delta(&mut self) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(EntryType::ReverseTaxFeeDelta)?;
        let delta = tax_delta(order);
        if delta <= Decimal::ZERO {
            return Ok(());
        }
        self.book(EntryType::ReverseTaxFeeDelta, refund_source(refund), order, delta)
            .await
    }

    pub(super) async fn ps_reverse_tax_fee_delta(&mut self) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(EntryType::PsReverseTaxFeeDelta)?;
        let delta = tax_delta(order);
        if delta >= Decimal::ZERO {
            return Ok(());
        }
        self.book(EntryType::PsReverseTaxFeeDelta, refund_source(refund), order, -delta)
            .await
    }

    pub(super) async fn refund_failure(&mut self) -> Result<(), EntryError> {
        let refund = self
            .refund
            .ok_or(EntryError::RefundNotFound(EntryType::RefundFailure))?;
        self.record_request(EntryType::RefundFailure, refund_source(refund))
            .await
    }

    pub(super) async fn chargeback_failure(&mut self) -> Result<(), EntryError> {
        let refund = self
            .refund
            .ok_or(EntryError::RefundNotFound(EntryType::ChargebackFailure))?;
        self.record_request(EntryType::ChargebackFailure, refund_source(refund))
            .await
    }

    pub(super) async fn chargeback(&mut self) -> Result<(), EntryError> {
        self.undo_body(EntryType::Chargeback).await
    }

    pub(super) async fn ps_markup_chargeback_fx(&mut self) -> Result<(), EntryError> {
        self.undo_fx(EntryType::PsMarkupChargebackFx).await
    }

    pub(super) async fn chargeback_fee(&mut self) -> Result<(), EntryError> {
        self.undo_fee(EntryType::ChargebackFee, UndoReason::Chargeback)
            .await
    }

    pub(super) async fn ps_markup_chargeback_fee(&mut self) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(EntryType::PsMarkupChargebackFee)?;
        let merchant_rule = self.money_back_merchant(order, UndoReason::Chargeback).await?;
        let system_rule = self.money_back_system(order, UndoReason::Chargeback).await?;
        let base = self.refund_base(order, refund).await?;
        let amount = base * (merchant_rule.percent - system_rule.percent) / HUNDRED;
        self.book(
            EntryType::PsMarkupChargebackFee,
            refund_source(refund),
            order,
            amount,
        )
        .await
    }

    pub(super) async fn chargeback_fixed_fee(&mut self) -> Result<(), EntryError> {
        self.undo_fixed_fee(EntryType::ChargebackFixedFee, UndoReason::Chargeback)
            .await
    }

    pub(super) async fn ps_markup_chargeback_fixed_fee(&mut self) -> Result<(), EntryError> {
        let (refund, order) = self.require_refund(EntryType::PsMarkupChargebackFixedFee)?;
        let merchant_rule = self.money_back_merchant(order, UndoReason::Chargeback).await?;
        let system_rule = self.money_back_system(order, UndoReason::Chargeback).await?;
        let charged = self
            .merchant_fixed_amount(order, merchant_rule.fix_amount, &merchant_rule.fix_amount_currency)
            .await?;
        let cost = self
            .common_fixed_amount(order, system_rule.fix_amount, &system_rule.fix_amount_currency)
            .await?;
        self.book(
            EntryType::PsMarkupChargebackFixedFee,
            refund_source(refund),
            order,
            charged - cost,
        )
        .await
    }
}
