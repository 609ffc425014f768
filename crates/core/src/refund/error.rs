//! Refund workflow errors.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::accounting::EntryError;
use crate::cost::CostError;
use crate::currency::ConversionError;
use crate::error::ErrorKind;
use crate::gateway::GatewayError;
use crate::store::StoreError;

/// Errors that can occur while creating refunds or processing callbacks.
#[derive(Debug, Error)]
pub enum RefundError {
    /// Order absent or owned by another merchant.
    #[error("Order not found")]
    OrderNotFound,

    /// Refund absent or not belonging to the order.
    #[error("Refund not found")]
    RefundNotFound,

    /// Merchant absent.
    #[error("Merchant not found")]
    MerchantNotFound,

    /// Order already reached Refund or Chargeback.
    #[error("Order already refunded")]
    OrderAlreadyRefunded,

    /// Order is not in a refundable state.
    #[error("Refund is not allowed for order in status {0}")]
    RefundNotAllowed(String),

    /// Another refund of the order is outstanding or completed.
    #[error("Refund already exists for order")]
    RefundAlreadyExists,

    /// Requested amount is zero, negative or above the charge.
    #[error("Refund amount {requested} is invalid for charge amount {charge}")]
    AmountInvalid {
        /// Requested amount.
        requested: Decimal,
        /// Captured amount.
        charge: Decimal,
    },

    /// No money-back cost rules apply to the order.
    #[error("Costs rates for refund not found")]
    CostsRatesNotFound,

    /// Order has no payment method to refund through.
    #[error("Payment method not found")]
    PaymentMethodNotFound,

    /// No adapter for the handler in the webhook URL.
    #[error("Callback handler incorrect: {0}")]
    CallbackHandlerIncorrect(String),

    /// Body is not a valid callback.
    #[error("Callback request incorrect: {0}")]
    CallbackRequestIncorrect(String),

    /// Signature mismatch.
    #[error("Callback signature incorrect")]
    SignatureIncorrect,

    /// The gateway reports a non-final status.
    #[error("Refund status is not final")]
    Temporary,

    /// Concurrent updates exhausted the retry budget.
    #[error("Order {0} kept changing while recording the refund")]
    ConcurrentModification(String),

    /// Gateway adapter failure.
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    /// Entry engine failure.
    #[error(transparent)]
    Entry(#[from] EntryError),

    /// Cost rule lookup failure.
    #[error(transparent)]
    Cost(#[from] CostError),

    /// Rate lookup failure.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl RefundError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::OrderNotFound => "ORDER_NOT_FOUND",
            Self::RefundNotFound => "REFUND_NOT_FOUND",
            Self::MerchantNotFound => "MERCHANT_NOT_FOUND",
            Self::OrderAlreadyRefunded => "ORDER_ALREADY_REFUNDED",
            Self::RefundNotAllowed(_) => "REFUND_NOT_ALLOWED",
            Self::RefundAlreadyExists => "REFUND_ALREADY_EXISTS",
            Self::AmountInvalid { .. } => "REFUND_AMOUNT_INVALID",
            Self::CostsRatesNotFound => "COSTS_RATES_NOT_FOUND",
            Self::PaymentMethodNotFound => "PAYMENT_METHOD_NOT_FOUND",
            Self::CallbackHandlerIncorrect(_) => "CALLBACK_HANDLER_INCORRECT",
            Self::CallbackRequestIncorrect(_) => "CALLBACK_REQUEST_INCORRECT",
            Self::SignatureIncorrect => "SIGNATURE_INCORRECT",
            Self::Temporary => "TEMPORARY",
            Self::ConcurrentModification(_) => "CONCURRENT_MODIFICATION",
            Self::Gateway(e) => e.error_code(),
            Self::Entry(e) => e.error_code(),
            Self::Cost(e) => e.error_code(),
            Self::Conversion(e) => e.error_code(),
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the coarse error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OrderNotFound
            | Self::RefundNotFound
            | Self::MerchantNotFound
            | Self::CostsRatesNotFound
            | Self::PaymentMethodNotFound => ErrorKind::NotFound,
            Self::OrderAlreadyRefunded
            | Self::RefundNotAllowed(_)
            | Self::RefundAlreadyExists
            | Self::AmountInvalid { .. }
            | Self::CallbackHandlerIncorrect(_)
            | Self::CallbackRequestIncorrect(_)
            | Self::SignatureIncorrect => ErrorKind::Validation,
            Self::Temporary => ErrorKind::Temporary,
            Self::ConcurrentModification(_) => ErrorKind::System,
            Self::Gateway(e) => e.kind(),
            Self::Entry(e) => e.kind(),
            Self::Cost(e) => e.kind(),
            Self::Conversion(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }

    /// Returns true if retrying the same request may succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Temporary | Self::ConcurrentModification(_) | Self::Store(_)
        )
    }
}
