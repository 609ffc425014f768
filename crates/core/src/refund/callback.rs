//! Refund callback payload and webhook responses.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::RefundError;
use super::types::RefundPayerData;
use crate::error::ErrorKind;

/// Order reference inside a callback; `id` is the refund id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackMerchantOrder {
    /// Refund id as sent to the gateway.
    pub id: String,
}

/// Decline details.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackDecline {
    /// Gateway decline code.
    #[serde(default)]
    pub code: String,
    /// Human readable reason.
    #[serde(default)]
    pub reason: String,
}

/// Refund state reported by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackRefundData {
    /// Gateway-side refund id.
    #[serde(default)]
    pub id: String,
    /// Refunded amount.
    pub amount: Decimal,
    /// Currency of the amount.
    pub currency: String,
    /// Gateway status string.
    pub status: String,
    /// Decline details.
    #[serde(default)]
    pub decline: Option<CallbackDecline>,
    /// Payer data.
    #[serde(default)]
    pub payer: Option<RefundPayerData>,
}

/// Refund callback as delivered to the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundCallback {
    /// Refund reference.
    pub merchant_order: CallbackMerchantOrder,
    /// Reported refund state.
    pub refund_data: CallbackRefundData,
    /// Payment method the gateway used.
    #[serde(default)]
    pub payment_method: Option<String>,
    /// Gateway timestamp.
    #[serde(default)]
    pub callback_time: Option<DateTime<Utc>>,
}

/// Narrow status returned to the gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallbackStatus {
    /// Processed.
    Ok,
    /// Rejected; redelivery will not help.
    BadData,
    /// Refund or order unknown.
    NotFound,
    /// Not final yet; redeliver later.
    Temporary,
    /// Internal failure; redeliver later.
    SystemError,
}

impl CallbackStatus {
    /// Returns the HTTP status code for the webhook response.
    #[must_use]
    pub const fn http_status_code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::BadData => 400,
            Self::NotFound => 404,
            Self::Temporary => 410,
            Self::SystemError => 500,
        }
    }
}

impl fmt::Display for CallbackStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Ok => "ok",
            Self::BadData => "bad_data",
            Self::NotFound => "not_found",
            Self::Temporary => "temporary",
            Self::SystemError => "system_error",
        };
        f.write_str(s)
    }
}

/// Fixed webhook messages; internal error text never leaves the service.
pub mod messages {
    /// Callback processed.
    pub const OK: &str = "ok";
    /// Unknown handler in the URL.
    pub const HANDLER_INCORRECT: &str = "callback handler incorrect";
    /// Body is not a valid callback.
    pub const REQUEST_INCORRECT: &str = "callback request incorrect";
    /// Signature mismatch.
    pub const SIGNATURE_INCORRECT: &str = "signature incorrect";
    /// Callback data contradicts the refund.
    pub const DATA_INCORRECT: &str = "callback data incorrect";
    /// Refund unknown.
    pub const REFUND_NOT_FOUND: &str = "refund not found";
    /// Order unknown.
    pub const ORDER_NOT_FOUND: &str = "order not found";
    /// Refund not final yet.
    pub const TEMPORARY: &str = "refund status is not final";
    /// Anything else.
    pub const UNKNOWN: &str = "unknown error";
}

/// Webhook response body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CallbackResponse {
    /// Narrow status.
    pub status: CallbackStatus,
    /// Message from [`messages`].
    pub message: &'static str,
}

impl CallbackResponse {
    /// Successful processing.
    #[must_use]
    pub const fn ok() -> Self {
        Self {
            status: CallbackStatus::Ok,
            message: messages::OK,
        }
    }

    /// A response with an arbitrary status.
    #[must_use]
    pub const fn new(status: CallbackStatus, message: &'static str) -> Self {
        Self { status, message }
    }

    /// Maps a processing error onto the fixed message catalogue.
    #[must_use]
    pub const fn from_error(err: &RefundError) -> Self {
        match err {
            RefundError::CallbackHandlerIncorrect(_) => {
                Self::new(CallbackStatus::BadData, messages::HANDLER_INCORRECT)
            }
            RefundError::CallbackRequestIncorrect(_) => {
                Self::new(CallbackStatus::BadData, messages::REQUEST_INCORRECT)
            }
            RefundError::SignatureIncorrect => {
                Self::new(CallbackStatus::BadData, messages::SIGNATURE_INCORRECT)
            }
            RefundError::RefundNotFound => {
                Self::new(CallbackStatus::NotFound, messages::REFUND_NOT_FOUND)
            }
            RefundError::OrderNotFound => {
                Self::new(CallbackStatus::NotFound, messages::ORDER_NOT_FOUND)
            }
            RefundError::Temporary => Self::new(CallbackStatus::Temporary, messages::TEMPORARY),
            other => match other.kind() {
                ErrorKind::Validation => Self::new(CallbackStatus::BadData, messages::DATA_INCORRECT),
                _ => Self::new(CallbackStatus::SystemError, messages::UNKNOWN),
            },
        }
    }
}
