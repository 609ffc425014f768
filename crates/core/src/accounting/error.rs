//! Accounting entry errors.

use thiserror::Error;

use super::entry::EntryType;
use crate::cost::CostError;
use crate::currency::ConversionError;
use crate::error::ErrorKind;
use crate::store::StoreError;

/// Errors that can occur while building accounting entries.
#[derive(Debug, Error)]
pub enum EntryError {
    /// A payment-side entry was requested without an order.
    #[error("Order not found for entry {0}")]
    OrderNotFound(EntryType),

    /// A refund-side entry was requested without a refund.
    #[error("Refund not found for entry {0}")]
    RefundNotFound(EntryType),

    /// The merchant the entry belongs to does not exist.
    #[error("Merchant not found")]
    MerchantNotFound,

    /// The entry name is not in the catalogue.
    #[error("Unknown accounting entry: {0}")]
    UnknownEntry(String),

    /// No cost rule applies.
    #[error(transparent)]
    Cost(#[from] CostError),

    /// Rate lookup or conversion failed.
    #[error(transparent)]
    Conversion(#[from] ConversionError),

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl EntryError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::OrderNotFound(_) => "ORDER_NOT_FOUND",
            Self::RefundNotFound(_) => "REFUND_NOT_FOUND",
            Self::MerchantNotFound => "MERCHANT_NOT_FOUND",
            Self::UnknownEntry(_) => "UNKNOWN_ENTRY",
            Self::Cost(e) => e.error_code(),
            Self::Conversion(e) => e.error_code(),
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the coarse error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::OrderNotFound(_) | Self::RefundNotFound(_) | Self::MerchantNotFound => {
                ErrorKind::NotFound
            }
            Self::UnknownEntry(_) => ErrorKind::Validation,
            Self::Cost(e) => e.kind(),
            Self::Conversion(e) => e.kind(),
            Self::Store(e) => e.kind(),
        }
    }
}
