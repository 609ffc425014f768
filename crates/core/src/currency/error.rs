//! Currency conversion errors.

use thiserror::Error;

use crate::error::ErrorKind;

/// Errors that can occur during rate lookup or conversion.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConversionError {
    /// No rate could be obtained for the pair.
    #[error("Failed to get exchange rate {from} -> {to}: {reason}")]
    GetExchangeRateFailed {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
        /// Underlying cause.
        reason: String,
    },

    /// A rate was obtained but the amount could not be converted.
    #[error("Failed to exchange {from} -> {to}: {reason}")]
    ExchangeFailed {
        /// Source currency code.
        from: String,
        /// Target currency code.
        to: String,
        /// Underlying cause.
        reason: String,
    },
}

impl ConversionError {
    /// Creates a rate lookup failure.
    pub fn rate_failed(from: &str, to: &str, reason: impl Into<String>) -> Self {
        Self::GetExchangeRateFailed {
            from: from.to_string(),
            to: to.to_string(),
            reason: reason.into(),
        }
    }

    /// Reports a failed lookup as a failed conversion of a stored amount.
    #[must_use]
    pub fn into_exchange_failed(self) -> Self {
        match self {
            Self::GetExchangeRateFailed { from, to, reason } => {
                Self::ExchangeFailed { from, to, reason }
            }
            other => other,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::GetExchangeRateFailed { .. } => "GET_EXCHANGE_RATE_FAILED",
            Self::ExchangeFailed { .. } => "EXCHANGE_FAILED",
        }
    }

    /// Returns the coarse error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        ErrorKind::ExchangeFailure
    }
}
