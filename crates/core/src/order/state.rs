//! Order ledger state: cost guards, refund eligibility and refund
//! transitions.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tracing::info;

use super::types::{Order, OrderRefund, OrderType, PrivateStatus};
use crate::cost::{CostError, CostRateResolver, CostTable, UndoReason};
use crate::merchant::Merchant;
use crate::refund::Refund;

/// Guards consulted before any money-moving action.
#[derive(Clone)]
pub struct OrderLedgerState {
    resolver: CostRateResolver,
}

impl OrderLedgerState {
    /// Creates the state guards over a resolver.
    #[must_use]
    pub const fn new(resolver: CostRateResolver) -> Self {
        Self { resolver }
    }

    /// True iff both payment-channel tables resolve for the order.
    ///
    /// # Errors
    ///
    /// Returns store failures; missing data or rules yield `Ok(false)`.
    pub async fn has_payment_costs(
        &self,
        order: &Order,
        merchant: &Merchant,
    ) -> Result<bool, CostError> {
        self.has_costs(
            order,
            merchant,
            None,
            &[
                CostTable::PaymentChannelSystem,
                CostTable::PaymentChannelMerchant,
            ],
        )
        .await
    }

    /// True iff both money-back tables resolve for the order and `undo`.
    ///
    /// # Errors
    ///
    /// Returns store failures; missing data or rules yield `Ok(false)`.
    pub async fn has_money_back_costs(
        &self,
        order: &Order,
        merchant: &Merchant,
        undo: UndoReason,
    ) -> Result<bool, CostError> {
        self.has_costs(
            order,
            merchant,
            Some(undo),
            &[CostTable::MoneyBackSystem, CostTable::MoneyBackMerchant],
        )
        .await
    }

    async fn has_costs(
        &self,
        order: &Order,
        merchant: &Merchant,
        undo: Option<UndoReason>,
        tables: &[CostTable],
    ) -> Result<bool, CostError> {
        let key = match self.resolver.key_for(order, merchant, Utc::now()).await {
            Ok(key) => key,
            Err(err) if err.is_not_found() => return Ok(false),
            Err(err) => return Err(err),
        };
        let key = match undo {
            Some(undo) => key.with_undo_reason(undo),
            None => key,
        };
        self.resolver.has_rules(tables, &key).await
    }

    /// True only for settled payment orders that have not been reversed.
    #[must_use]
    pub fn refund_allowed(order: &Order) -> bool {
        order.order_type == OrderType::Simple && order.private_status.is_settled()
    }

    /// Records the cumulative refunded amount on the original order.
    ///
    /// When the total reaches the charge amount the order moves to its
    /// terminal Refund or Chargeback status. Returns true only for that
    /// transition; an order that is already terminal is left as is.
    pub fn apply_refunded_total(
        order: &mut Order,
        total: Decimal,
        refund: &Refund,
        now: DateTime<Utc>,
    ) -> bool {
        order.refunded_amount = total;
        order.updated_at = now;

        if total < order.charge_amount || order.private_status.is_reversed() {
            return false;
        }

        let status = if refund.is_chargeback {
            PrivateStatus::Chargeback
        } else {
            PrivateStatus::Refund
        };
        order.set_private_status(status);
        order.refunded_at = Some(now);
        order.refund = Some(OrderRefund {
            amount: total,
            currency: refund.currency.clone(),
            reason: refund.reason.clone(),
            receipt_number: refund.id.to_string(),
        });

        info!(order_id = %order.id, status = %status, "Order fully reversed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;
    use crate::testing;
    use rust_decimal_macros::dec;

    #[tokio::test]
    async fn test_has_payment_costs() {
        let fx = testing::Fixture::new().await;
        let merchant = testing::merchant();
        let order = testing::order();
        assert!(fx.state.has_payment_costs(&order, &merchant).await.unwrap());

        let mut order = testing::order();
        order.payment_requisites.insert(
            crate::order::CARD_BRAND_REQUISITE.to_string(),
            "mir".to_string(),
        );
        assert!(!fx.state.has_payment_costs(&order, &merchant).await.unwrap());
    }

    #[tokio::test]
    async fn test_has_money_back_costs() {
        let fx = testing::Fixture::new().await;
        let order = testing::order();
        let mut merchant = testing::merchant();
        assert!(fx
            .state
            .has_money_back_costs(&order, &merchant, UndoReason::Reversal)
            .await
            .unwrap());

        merchant.payout_currency = "EUR".to_string();
        assert!(!fx
            .state
            .has_money_back_costs(&order, &merchant, UndoReason::Chargeback)
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_missing_country_is_false() {
        let fx = testing::Fixture::new().await;
        let mut order = testing::order();
        order.user = None;
        assert!(!fx
            .state
            .has_payment_costs(&order, &testing::merchant())
            .await
            .unwrap());
    }

    #[test]
    fn test_refund_allowed() {
        let mut order = testing::order();
        assert!(OrderLedgerState::refund_allowed(&order));

        order.set_private_status(PrivateStatus::New);
        assert!(!OrderLedgerState::refund_allowed(&order));

        order.set_private_status(PrivateStatus::Refund);
        assert!(!OrderLedgerState::refund_allowed(&order));

        let mut mirror = testing::order();
        mirror.order_type = OrderType::Refund;
        assert!(!OrderLedgerState::refund_allowed(&mirror));
    }

    #[test]
    fn test_partial_total_keeps_status() {
        let mut order = testing::order();
        let refund = testing::refund(&order, dec!(40), false);
        assert!(!OrderLedgerState::apply_refunded_total(
            &mut order,
            dec!(40),
            &refund,
            Utc::now()
        ));
        assert_eq!(order.refunded_amount, dec!(40));
        assert_eq!(order.private_status, PrivateStatus::PaymentSystemComplete);
        assert!(order.refund.is_none());
    }

    #[test]
    fn test_full_total_transitions_once() {
        let mut order = testing::order();
        let refund = testing::refund(&order, dec!(100), true);

        assert!(OrderLedgerState::apply_refunded_total(
            &mut order,
            dec!(100),
            &refund,
            Utc::now()
        ));
        assert_eq!(order.private_status, PrivateStatus::Chargeback);
        assert_eq!(order.status, OrderStatus::Chargeback);
        assert!(order.refunded_at.is_some());
        assert_eq!(order.refund.as_ref().unwrap().amount, dec!(100));

        assert!(!OrderLedgerState::apply_refunded_total(
            &mut order,
            dec!(100),
            &refund,
            Utc::now()
        ));
    }
}
