//! Order document types.
//!
//! Orders are owned by the order-processing subsystem. The ledger reads them
//! and only ever transitions the status fields, the refunded amount and the
//! refund stamp.

use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use paysettle_shared::types::{MerchantId, OrderId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payment method group whose brand comes from the card requisites.
pub const BANK_CARD_GROUP: &str = "BANKCARD";

/// Requisite key holding the card brand of a bank card payment.
pub const CARD_BRAND_REQUISITE: &str = "card_brand";

/// Internal order state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrivateStatus {
    /// Order created, payment not started.
    New,
    /// Payment form opened in the payment system.
    PaymentSystemCreate,
    /// Payment system refused to create the payment.
    PaymentSystemRejectOnCreate,
    /// Payment system rejected the payment.
    PaymentSystemReject,
    /// Payment captured by the payment system.
    PaymentSystemComplete,
    /// Payment declined by the issuer.
    PaymentSystemDeclined,
    /// Payment canceled by the payer.
    PaymentSystemCanceled,
    /// Merchant project confirmed delivery.
    ProjectComplete,
    /// Merchant project notification pending.
    ProjectPending,
    /// Merchant project rejected the notification.
    ProjectReject,
    /// Order fully refunded.
    Refund,
    /// Order fully charged back.
    Chargeback,
}

impl PrivateStatus {
    /// Returns the string representation of the status.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::New => "new",
            Self::PaymentSystemCreate => "payment_system_create",
            Self::PaymentSystemRejectOnCreate => "payment_system_reject_on_create",
            Self::PaymentSystemReject => "payment_system_reject",
            Self::PaymentSystemComplete => "payment_system_complete",
            Self::PaymentSystemDeclined => "payment_system_declined",
            Self::PaymentSystemCanceled => "payment_system_canceled",
            Self::ProjectComplete => "project_complete",
            Self::ProjectPending => "project_pending",
            Self::ProjectReject => "project_reject",
            Self::Refund => "refund",
            Self::Chargeback => "chargeback",
        }
    }

    /// Returns the public status a merchant sees for this internal state.
    #[must_use]
    pub const fn public_status(self) -> OrderStatus {
        match self {
            Self::New | Self::PaymentSystemCreate => OrderStatus::Created,
            Self::PaymentSystemRejectOnCreate | Self::PaymentSystemReject => OrderStatus::Rejected,
            Self::PaymentSystemDeclined => OrderStatus::Declined,
            Self::PaymentSystemCanceled => OrderStatus::Canceled,
            Self::PaymentSystemComplete
            | Self::ProjectComplete
            | Self::ProjectPending
            | Self::ProjectReject => OrderStatus::Processed,
            Self::Refund => OrderStatus::Refunded,
            Self::Chargeback => OrderStatus::Chargeback,
        }
    }

    /// Returns true once the payment has been captured and not reversed.
    #[must_use]
    pub const fn is_settled(self) -> bool {
        matches!(
            self,
            Self::PaymentSystemComplete
                | Self::ProjectComplete
                | Self::ProjectPending
                | Self::ProjectReject
        )
    }

    /// Returns true for the terminal refund and chargeback states.
    #[must_use]
    pub const fn is_reversed(self) -> bool {
        matches!(self, Self::Refund | Self::Chargeback)
    }
}

impl fmt::Display for PrivateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Public order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Awaiting payment.
    Created,
    /// Paid.
    Processed,
    /// Rejected by the payment system.
    Rejected,
    /// Canceled by the payer.
    Canceled,
    /// Declined by the issuer.
    Declined,
    /// Refunded in full.
    Refunded,
    /// Charged back in full.
    Chargeback,
}

/// Order kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderType {
    /// Regular payment order.
    Simple,
    /// Mirror order created for a completed refund or chargeback.
    Refund,
}

impl OrderType {
    /// Returns the string representation of the order type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Refund => "refund",
        }
    }
}

/// Postal address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// ISO 3166-1 alpha-2 country code.
    pub country: String,
    /// City name.
    pub city: Option<String>,
    /// Postal code.
    pub postal_code: Option<String>,
    /// State or province.
    pub state: Option<String>,
}

/// Payer details captured at checkout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderUser {
    /// External payer id.
    pub external_id: Option<String>,
    /// Payer email.
    pub email: Option<String>,
    /// Payer IP address.
    pub ip: Option<String>,
    /// Address derived from the payer's IP.
    pub address: Option<Address>,
}

/// Tax charged on the order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderTax {
    /// Tax type, e.g. `vat`.
    pub tax_type: String,
    /// Tax rate as a fraction (0.2 = 20%).
    pub rate: Decimal,
    /// Tax amount.
    pub amount: Decimal,
    /// Tax currency.
    pub currency: String,
}

/// Merchant-currency equivalents used for fee and markup math.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoyaltyData {
    /// Royalty (payout) currency.
    pub currency: String,
    /// Order amount in royalty currency.
    pub amount_in_royalty_currency: Decimal,
    /// Tax booked at payment time, in royalty currency.
    pub payment_tax_amount_in_royalty_currency: Decimal,
    /// Tax reversed at refund time, in royalty currency.
    pub refund_tax_amount_in_royalty_currency: Decimal,
}

/// Gateway parameters of the payment method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentMethodParams {
    /// Currency the acquirer settles in.
    pub settlement_currency: String,
    /// Terminal id at the acquirer.
    pub terminal_id: Option<String>,
    /// Shared secret used to sign gateway callbacks.
    pub secret_callback: String,
}

/// Payment method the order was paid with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaymentMethod {
    /// Payment method id.
    pub id: String,
    /// Payment method name, e.g. `Bank card`.
    pub name: String,
    /// Payment method group, e.g. `BANKCARD`.
    pub group: String,
    /// Id of the method at the acquirer.
    pub external_id: String,
    /// Gateway handler name used for refunds and callbacks.
    pub handler: String,
    /// Gateway parameters.
    pub params: PaymentMethodParams,
}

/// Back-reference from a mirror refund-order to its original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParentOrder {
    /// Original order id.
    pub id: OrderId,
    /// Original order public uuid.
    pub uuid: Uuid,
}

/// Refund stamp written onto a fully refunded order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderRefund {
    /// Refunded amount.
    pub amount: Decimal,
    /// Refund currency.
    pub currency: String,
    /// Refund reason.
    pub reason: String,
    /// Receipt number issued for the refund.
    pub receipt_number: String,
}

/// Order document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Order ID.
    pub id: OrderId,
    /// Public order uuid.
    pub uuid: Uuid,
    /// Regular or mirror refund order.
    pub order_type: OrderType,
    /// Owning merchant.
    pub merchant_id: MerchantId,
    /// Internal state.
    pub private_status: PrivateStatus,
    /// Public state.
    pub status: OrderStatus,
    /// Amount actually captured from the payer.
    pub charge_amount: Decimal,
    /// Currency of the captured amount.
    pub charge_currency: String,
    /// Total amount including tax.
    pub total_payment_amount: Decimal,
    /// Order currency.
    pub currency: String,
    /// Tax data.
    pub tax: OrderTax,
    /// Royalty currency equivalents.
    pub royalty_data: RoyaltyData,
    /// Payment method used, absent until the payer picks one.
    pub payment_method: Option<OrderPaymentMethod>,
    /// Payment requisites reported by the gateway (masked pan, card brand, ...).
    #[serde(default)]
    pub payment_requisites: HashMap<String, String>,
    /// Billing address entered by the payer.
    pub billing_address: Option<Address>,
    /// Payer data.
    pub user: Option<OrderUser>,
    /// Merchant category code.
    pub mcc_code: String,
    /// Operating company id.
    pub operating_company_id: String,
    /// Sum of completed refunds.
    #[serde(default)]
    pub refunded_amount: Decimal,
    /// Refund stamp, set once the order is fully refunded.
    pub refund: Option<OrderRefund>,
    /// When the order was fully refunded.
    pub refunded_at: Option<DateTime<Utc>>,
    /// Original order, for mirror refund-orders.
    pub parent_order: Option<ParentOrder>,
    /// Whether the refund reduces an already reported VAT amount.
    #[serde(default)]
    pub is_vat_deduction: bool,
    /// When the payment system captured the payment.
    pub paid_at: Option<DateTime<Utc>>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// Optimistic concurrency token, bumped by every store update.
    #[serde(default)]
    pub version: i64,
}

impl Order {
    /// Returns the payer's country: billing address first, then the
    /// IP-derived address.
    #[must_use]
    pub fn payer_country(&self) -> Option<&str> {
        self.billing_address
            .as_ref()
            .map(|a| a.country.as_str())
            .filter(|c| !c.is_empty())
            .or_else(|| {
                self.user
                    .as_ref()
                    .and_then(|u| u.address.as_ref())
                    .map(|a| a.country.as_str())
                    .filter(|c| !c.is_empty())
            })
    }

    /// Returns the brand or method name cost rules are keyed by.
    ///
    /// Bank cards use the `card_brand` requisite; other methods use the
    /// method name. Names are upper-cased.
    #[must_use]
    pub fn brand_name(&self) -> Option<String> {
        let method = self.payment_method.as_ref()?;

        let name = if method.group == BANK_CARD_GROUP {
            self.payment_requisites.get(CARD_BRAND_REQUISITE)?.as_str()
        } else {
            method.name.as_str()
        };

        let name = name.trim();
        (!name.is_empty()).then(|| name.to_uppercase())
    }

    /// Returns the royalty currency all entries for this order are booked in.
    #[must_use]
    pub fn royalty_currency(&self) -> &str {
        &self.royalty_data.currency
    }

    /// Returns the gateway handler of the payment method.
    #[must_use]
    pub fn handler(&self) -> Option<&str> {
        self.payment_method.as_ref().map(|m| m.handler.as_str())
    }

    /// Whole days elapsed between payment and `now`; zero when unpaid.
    #[must_use]
    pub fn days_since_payment(&self, now: DateTime<Utc>) -> i64 {
        self.paid_at
            .map_or(0, |paid| (now - paid).num_days().max(0))
    }

    /// Sets the internal status and keeps the public status in sync.
    pub fn set_private_status(&mut self, status: PrivateStatus) {
        self.private_status = status;
        self.status = status.public_status();
    }
}
