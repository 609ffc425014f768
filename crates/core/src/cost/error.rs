//! Cost rule resolution errors.

use thiserror::Error;

use super::types::CostTable;
use crate::error::ErrorKind;
use crate::store::StoreError;

/// Errors that can occur while resolving a cost rule.
#[derive(Debug, Error)]
pub enum CostError {
    /// The payer's country is unknown or absent from the country table.
    #[error("Payer country not found")]
    CountryNotFound,

    /// The card brand or payment method name cannot be determined.
    #[error("Payment brand not found")]
    BrandNotFound,

    /// No row in the table matches the key.
    #[error("Commission not found in {table} for {name}/{region}/{country}")]
    CommissionNotFound {
        /// Table that was searched.
        table: CostTable,
        /// Brand or method name.
        name: String,
        /// Tariff region.
        region: String,
        /// Payer country.
        country: String,
    },

    /// Money-back lookup without an undo reason.
    #[error("Undo reason is required for {0}")]
    UndoReasonRequired(CostTable),

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CostError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::CountryNotFound => "COUNTRY_NOT_FOUND",
            Self::BrandNotFound => "BRAND_NOT_FOUND",
            Self::CommissionNotFound { .. } => "COMMISSION_NOT_FOUND",
            Self::UndoReasonRequired(_) => "UNDO_REASON_REQUIRED",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns the coarse error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::CountryNotFound | Self::BrandNotFound | Self::CommissionNotFound { .. } => {
                ErrorKind::NotFound
            }
            Self::UndoReasonRequired(_) => ErrorKind::Validation,
            Self::Store(_) => ErrorKind::System,
        }
    }

    /// Returns true when the error means "no applicable cost rule".
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self.kind(), ErrorKind::NotFound)
    }
}
