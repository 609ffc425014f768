//! Accounting entry records and the entry-type catalogue.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use paysettle_shared::types::{AccountingEntryId, MerchantId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Status given to freshly booked entries.
pub const STATUS_AVAILABLE: &str = "available";

/// Which side of the money movement an entry type books.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySide {
    /// Needs a bound order.
    Payment,
    /// Needs a bound refund.
    Refund,
}

macro_rules! entry_types {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal, $side:ident; )+) => {
        /// Kind of an accounting entry.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum EntryType {
            $( $(#[$meta])* $variant, )+
        }

        impl EntryType {
            /// Every entry type in catalogue order.
            pub const ALL: &'static [EntryType] = &[ $( EntryType::$variant, )+ ];

            /// Returns the wire name of the entry type.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $( Self::$variant => $name, )+
                }
            }

            /// Returns the side the entry type books.
            #[must_use]
            pub const fn side(self) -> EntrySide {
                match self {
                    $( Self::$variant => EntrySide::$side, )+
                }
            }

            /// Parses a wire name.
            #[must_use]
            pub fn parse(name: &str) -> Option<Self> {
                match name {
                    $( $name => Some(Self::$variant), )+
                    _ => None,
                }
            }
        }
    };
}

entry_types! {
    /// Charge amount in royalty currency at the merchant rate.
    Payment => "payment", Payment;
    /// Spread between merchant and common rate on the charge.
    PsMarkupPaymentFx => "ps_markup_payment_fx", Payment;
    /// Payment method percent fee.
    MethodFee => "method_fee", Payment;
    /// Method fee above what the acquirer charges.
    PsMarkupMethodFee => "ps_markup_method_fee", Payment;
    /// Payment method fixed fee.
    MethodFixedFee => "method_fixed_fee", Payment;
    /// Method fixed fee above what the acquirer charges.
    PsMarkupMethodFixedFee => "ps_markup_method_fixed_fee", Payment;
    /// Platform percent fee.
    PsFee => "ps_fee", Payment;
    /// Platform fixed fee.
    PsFixedFee => "ps_fixed_fee", Payment;
    /// Spread between merchant and common rate on the platform fixed fee.
    PsMarkupFixedFeeFx => "ps_markup_fixed_fee_fx", Payment;
    /// Tax collected with the payment.
    TaxFee => "tax_fee", Payment;
    /// FX difference on tax, copied from the request.
    PsTaxFxFee => "ps_tax_fx_fee", Payment;
    /// Refunded amount at the merchant rate.
    Refund => "refund", Refund;
    /// Merchant refund percent fee.
    RefundFee => "refund_fee", Refund;
    /// Merchant refund fixed fee.
    RefundFixedFee => "refund_fixed_fee", Refund;
    /// Spread between merchant and common rate on the refund.
    PsMarkupRefundFx => "ps_markup_refund_fx", Refund;
    /// Refunded amount at the common rate.
    RefundBody => "refund_body", Refund;
    /// Tax returned to the payer.
    ReverseTaxFee => "reverse_tax_fee", Refund;
    /// Spread between merchant and common rate on the returned tax.
    PsMarkupReverseTaxFee => "ps_markup_reverse_tax_fee", Refund;
    /// Tax collected above the tax returned.
    ReverseTaxFeeDelta => "reverse_tax_fee_delta", Refund;
    /// Tax returned above the tax collected.
    PsReverseTaxFeeDelta => "ps_reverse_tax_fee_delta", Refund;
    /// Failed refund, copied from the request.
    RefundFailure => "refund_failure", Refund;
    /// Failed chargeback, copied from the request.
    ChargebackFailure => "chargeback_failure", Refund;
    /// Charged back amount at the merchant rate.
    Chargeback => "chargeback", Refund;
    /// Spread between merchant and common rate on the chargeback.
    PsMarkupChargebackFx => "ps_markup_chargeback_fx", Refund;
    /// Merchant chargeback percent fee.
    ChargebackFee => "chargeback_fee", Refund;
    /// Chargeback fee above what the acquirer charges.
    PsMarkupChargebackFee => "ps_markup_chargeback_fee", Refund;
    /// Merchant chargeback fixed fee.
    ChargebackFixedFee => "chargeback_fixed_fee", Refund;
    /// Chargeback fixed fee above what the acquirer charges.
    PsMarkupChargebackFixedFee => "ps_markup_chargeback_fixed_fee", Refund;
}

impl EntryType {
    /// Entries booked for a captured payment.
    pub const PAYMENT_EVENT: &'static [EntryType] = &[
        Self::Payment,
        Self::PsMarkupPaymentFx,
        Self::MethodFee,
        Self::PsMarkupMethodFee,
        Self::MethodFixedFee,
        Self::PsMarkupMethodFixedFee,
        Self::PsFee,
        Self::PsFixedFee,
        Self::PsMarkupFixedFeeFx,
        Self::TaxFee,
    ];

    /// Entries booked for a completed merchant refund.
    pub const REFUND_EVENT: &'static [EntryType] = &[
        Self::Refund,
        Self::RefundFee,
        Self::RefundFixedFee,
        Self::PsMarkupRefundFx,
        Self::RefundBody,
        Self::ReverseTaxFee,
        Self::PsMarkupReverseTaxFee,
        Self::ReverseTaxFeeDelta,
        Self::PsReverseTaxFeeDelta,
    ];

    /// Entries booked for a completed chargeback.
    pub const CHARGEBACK_EVENT: &'static [EntryType] = &[
        Self::Chargeback,
        Self::PsMarkupChargebackFx,
        Self::ChargebackFee,
        Self::PsMarkupChargebackFee,
        Self::ChargebackFixedFee,
        Self::PsMarkupChargebackFixedFee,
        Self::RefundBody,
        Self::ReverseTaxFee,
        Self::PsMarkupReverseTaxFee,
        Self::ReverseTaxFeeDelta,
        Self::PsReverseTaxFeeDelta,
    ];

    /// Returns the types of `event` that have no entry in `booked`.
    ///
    /// Entries booked one by one before the event ran count as booked, so
    /// re-running an event never duplicates a line.
    #[must_use]
    pub fn unbooked(event: &[EntryType], booked: &[AccountingEntry]) -> Vec<EntryType> {
        event
            .iter()
            .copied()
            .filter(|t| booked.iter().all(|e| e.entry_type != *t))
            .collect()
    }

    /// Returns the event list for a completed refund or chargeback.
    #[must_use]
    pub const fn refund_event(is_chargeback: bool) -> &'static [EntryType] {
        if is_chargeback {
            Self::CHARGEBACK_EVENT
        } else {
            Self::REFUND_EVENT
        }
    }
}

impl fmt::Display for EntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EntryType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| s.to_string())
    }
}

/// Kind of document an entry is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    /// An order (payment side).
    Order,
    /// A refund (refund and chargeback side).
    Refund,
    /// A merchant (manual adjustments).
    Merchant,
}

impl SourceType {
    /// Returns the string representation of the source type.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Order => "order",
            Self::Refund => "refund",
            Self::Merchant => "merchant",
        }
    }

    /// Parses a source type.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "order" => Some(Self::Order),
            "refund" => Some(Self::Refund),
            "merchant" => Some(Self::Merchant),
            _ => None,
        }
    }
}

/// Document an entry is booked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntrySource {
    /// Document ID.
    pub id: Uuid,
    /// Document kind.
    #[serde(rename = "type")]
    pub source_type: SourceType,
}

impl EntrySource {
    /// Source pointing at an order.
    #[must_use]
    pub const fn order(id: Uuid) -> Self {
        Self {
            id,
            source_type: SourceType::Order,
        }
    }

    /// Source pointing at a refund.
    #[must_use]
    pub const fn refund(id: Uuid) -> Self {
        Self {
            id,
            source_type: SourceType::Refund,
        }
    }
}

/// One immutable ledger line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountingEntry {
    /// Entry ID.
    pub id: AccountingEntryId,
    /// Entry kind.
    #[serde(rename = "type")]
    pub entry_type: EntryType,
    /// Order or refund the entry belongs to.
    pub source: EntrySource,
    /// Merchant whose balance the entry affects.
    pub merchant_id: MerchantId,
    /// Amount, rounded to two decimal places.
    pub amount: Decimal,
    /// ISO 4217 currency code.
    pub currency: String,
    /// Free-text reason.
    pub reason: String,
    /// Entry status, `available` unless copied from a request.
    pub status: String,
    /// Payer country.
    pub country: String,
    /// Booking time.
    pub created_at: DateTime<Utc>,
}
