//! Refund documents.

use std::fmt;

use chrono::{DateTime, Utc};
use paysettle_shared::types::{MerchantId, OrderId, RefundId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Refund lifecycle.
///
/// `Created -> InProgress -> {Completed, PaymentSystemDeclined,
/// PaymentSystemCanceled, Rejected}`; `Rejected` is also reachable from
/// `Created` when the gateway refuses the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundStatus {
    /// Persisted, gateway not called yet.
    Created,
    /// Accepted by the gateway, waiting for the callback.
    InProgress,
    /// Money returned to the payer.
    Completed,
    /// Declined by the payment system.
    PaymentSystemDeclined,
    /// Canceled by the payment system.
    PaymentSystemCanceled,
    /// Refused by the gateway or failed validation.
    Rejected,
}

impl RefundStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
            Self::PaymentSystemDeclined => "payment_system_declined",
            Self::PaymentSystemCanceled => "payment_system_canceled",
            Self::Rejected => "rejected",
        }
    }

    /// Parses a status string.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(Self::Created),
            "in_progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "payment_system_declined" => Some(Self::PaymentSystemDeclined),
            "payment_system_canceled" => Some(Self::PaymentSystemCanceled),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns true once no further transition is possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Created | Self::InProgress)
    }

    /// Returns true for refunds that did not and will not move money.
    #[must_use]
    pub const fn is_failed(self) -> bool {
        matches!(
            self,
            Self::PaymentSystemDeclined | Self::PaymentSystemCanceled | Self::Rejected
        )
    }
}

impl fmt::Display for RefundStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to the refunded order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalOrder {
    /// Order ID.
    pub id: OrderId,
    /// Public order UUID.
    pub uuid: Uuid,
}

/// Payer data reported by the gateway.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundPayerData {
    /// Payer country.
    #[serde(default)]
    pub country: String,
    /// Payer zip code.
    #[serde(default)]
    pub zip: String,
    /// Payer state.
    #[serde(default)]
    pub state: String,
}

/// A refund or chargeback of one order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Refund {
    /// Refund ID.
    pub id: RefundId,
    /// Refunded order.
    pub original_order: OriginalOrder,
    /// Merchant the order belongs to.
    pub merchant_id: MerchantId,
    /// Gateway-side refund id.
    #[serde(default)]
    pub external_id: String,
    /// Refunded amount in `currency`.
    pub amount: Decimal,
    /// Currency of the charge.
    pub currency: String,
    /// Free-text reason.
    #[serde(default)]
    pub reason: String,
    /// Lifecycle status.
    pub status: RefundStatus,
    /// True for chargebacks.
    #[serde(default)]
    pub is_chargeback: bool,
    /// Mirror refund-order; set exactly once.
    #[serde(default)]
    pub created_order_id: Option<OrderId>,
    /// Who requested the refund.
    pub creator_id: String,
    /// Payer data reported by the gateway.
    #[serde(default)]
    pub payer_data: RefundPayerData,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl Refund {
    /// Sets the status and touches `updated_at`.
    pub fn set_status(&mut self, status: RefundStatus) {
        self.status = status;
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_parse() {
        for status in [
            RefundStatus::Created,
            RefundStatus::InProgress,
            RefundStatus::Completed,
            RefundStatus::PaymentSystemDeclined,
            RefundStatus::PaymentSystemCanceled,
            RefundStatus::Rejected,
        ] {
            assert_eq!(RefundStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(RefundStatus::parse("done"), None);
    }

    #[test]
    fn test_terminal_and_failed() {
        assert!(!RefundStatus::Created.is_terminal());
        assert!(!RefundStatus::InProgress.is_terminal());
        assert!(RefundStatus::Completed.is_terminal());
        assert!(!RefundStatus::Completed.is_failed());
        assert!(RefundStatus::Rejected.is_failed());
        assert!(RefundStatus::PaymentSystemDeclined.is_failed());
    }
}
