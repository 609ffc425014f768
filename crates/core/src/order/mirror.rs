//! Mirror refund-orders.
//!
//! A completed refund is booked against a copy of the original order whose
//! amounts are scaled to the refunded share.

use chrono::{DateTime, Utc};
use paysettle_shared::types::OrderId;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::types::{Order, OrderRefund, OrderType, ParentOrder, PrivateStatus};
use crate::currency::round_money;
use crate::merchant::Merchant;
use crate::refund::Refund;

/// Scales `value` by `part / whole`, rounded to two places.
///
/// Returns `value` unchanged when `part` covers `whole` or `whole` is zero.
#[must_use]
pub fn proportional_amount(value: Decimal, part: Decimal, whole: Decimal) -> Decimal {
    if whole.is_zero() || part >= whole {
        return value;
    }
    round_money(value * part / whole)
}

/// True when the payment predates the merchant's last VAT report cut-off.
#[must_use]
pub fn is_vat_deduction(original: &Order, merchant: &Merchant) -> bool {
    match (original.paid_at, merchant.vat_report_cutoff) {
        (Some(paid_at), Some(cutoff)) => paid_at < cutoff,
        _ => false,
    }
}

/// Builds the mirror refund-order of `original` for `refund`.
///
/// `refund_tax_in_royalty` is the refunded tax converted at the merchant
/// rate.
#[must_use]
pub fn build_refund_order(
    original: &Order,
    refund: &Refund,
    merchant: &Merchant,
    refund_tax_in_royalty: Decimal,
    now: DateTime<Utc>,
) -> Order {
    let part = refund.amount;
    let whole = original.charge_amount;
    let status = if refund.is_chargeback {
        PrivateStatus::Chargeback
    } else {
        PrivateStatus::Refund
    };

    let mut mirror = original.clone();
    mirror.id = OrderId::new();
    mirror.uuid = Uuid::now_v7();
    mirror.order_type = OrderType::Refund;
    mirror.set_private_status(status);

    mirror.charge_amount = part;
    mirror.total_payment_amount = proportional_amount(original.total_payment_amount, part, whole);
    mirror.tax.amount = proportional_amount(original.tax.amount, part, whole);

    let royalty = &mut mirror.royalty_data;
    royalty.amount_in_royalty_currency =
        proportional_amount(original.royalty_data.amount_in_royalty_currency, part, whole);
    royalty.payment_tax_amount_in_royalty_currency = proportional_amount(
        original.royalty_data.payment_tax_amount_in_royalty_currency,
        part,
        whole,
    );
    royalty.refund_tax_amount_in_royalty_currency = round_money(refund_tax_in_royalty);

    mirror.parent_order = Some(ParentOrder {
        id: original.id,
        uuid: original.uuid,
    });
    mirror.refunded_amount = Decimal::ZERO;
    mirror.refund = Some(OrderRefund {
        amount: refund.amount,
        currency: refund.currency.clone(),
        reason: refund.reason.clone(),
        receipt_number: refund.id.to_string(),
    });
    mirror.refunded_at = Some(now);
    mirror.is_vat_deduction = is_vat_deduction(original, merchant);
    mirror.created_at = now;
    mirror.updated_at = now;
    mirror.version = 0;

    mirror
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order::OrderStatus;
    use crate::testing;
    use chrono::Duration;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(20), dec!(100), dec!(100), dec!(20))]
    #[case(dec!(20), dec!(50), dec!(100), dec!(10))]
    #[case(dec!(20), dec!(33), dec!(100), dec!(6.6))]
    #[case(dec!(1), dec!(1), dec!(3), dec!(0.33))]
    #[case(dec!(20), dec!(10), dec!(0), dec!(20))]
    fn test_proportional_amount(
        #[case] value: Decimal,
        #[case] part: Decimal,
        #[case] whole: Decimal,
        #[case] expected: Decimal,
    ) {
        assert_eq!(proportional_amount(value, part, whole), expected);
    }

    #[test]
    fn test_full_refund_mirror() {
        let original = testing::order();
        let refund = testing::refund(&original, dec!(100), false);
        let now = Utc::now();

        let mirror = build_refund_order(&original, &refund, &testing::merchant(), dec!(0.40), now);

        assert_ne!(mirror.id, original.id);
        assert_ne!(mirror.uuid, original.uuid);
        assert_eq!(mirror.order_type, OrderType::Refund);
        assert_eq!(mirror.private_status, PrivateStatus::Refund);
        assert_eq!(mirror.status, OrderStatus::Refunded);
        assert_eq!(mirror.parent_order.unwrap().id, original.id);
        assert_eq!(mirror.charge_amount, dec!(100));
        assert_eq!(mirror.tax.amount, original.tax.amount);
        assert_eq!(mirror.royalty_data.refund_tax_amount_in_royalty_currency, dec!(0.40));
        assert_eq!(mirror.paid_at, original.paid_at);
        assert_eq!(mirror.refunded_at, Some(now));
        assert_eq!(mirror.version, 0);
    }

    #[test]
    fn test_partial_chargeback_mirror_scales_amounts() {
        let original = testing::order();
        let refund = testing::refund(&original, dec!(25), true);

        let mirror =
            build_refund_order(&original, &refund, &testing::merchant(), dec!(0.10), Utc::now());

        assert_eq!(mirror.private_status, PrivateStatus::Chargeback);
        assert_eq!(mirror.charge_amount, dec!(25));
        assert_eq!(mirror.tax.amount, dec!(5));
        assert_eq!(mirror.royalty_data.amount_in_royalty_currency, dec!(0.5));
        assert_eq!(
            mirror.royalty_data.payment_tax_amount_in_royalty_currency,
            dec!(0.1)
        );
    }

    #[test]
    fn test_vat_deduction_flag() {
        let original = testing::order();
        let refund = testing::refund(&original, dec!(100), false);
        let mut merchant = testing::merchant();

        merchant.vat_report_cutoff = None;
        let mirror = build_refund_order(&original, &refund, &merchant, dec!(0), Utc::now());
        assert!(!mirror.is_vat_deduction);

        merchant.vat_report_cutoff = Some(Utc::now());
        let mirror = build_refund_order(&original, &refund, &merchant, dec!(0), Utc::now());
        assert!(mirror.is_vat_deduction);

        merchant.vat_report_cutoff = original.paid_at.map(|p| p - Duration::days(1));
        let mirror = build_refund_order(&original, &refund, &merchant, dec!(0), Utc::now());
        assert!(!mirror.is_vat_deduction);
    }
}
