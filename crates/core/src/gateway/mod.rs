//! Acquiring gateway port.
//!
//! The core never speaks a gateway's wire protocol. It asks an adapter,
//! selected by the payment method's handler name, to start a refund and to
//! interpret refund callbacks.

pub mod status;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ErrorKind;
use crate::order::Order;
use crate::refund::{Refund, RefundCallback};

pub use status::interpret_callback;

/// Synchronous answer to a refund request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GatewayRefundStatus {
    /// Accepted; the outcome arrives by callback.
    InProgress,
    /// Refused outright.
    Rejected,
}

/// Gateway response to a refund request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayRefundResponse {
    /// Accepted or refused.
    pub status: GatewayRefundStatus,
    /// Gateway-side refund id.
    #[serde(default)]
    pub external_id: String,
    /// Gateway message for refusals.
    #[serde(default)]
    pub message: String,
}

/// Interpretation of a refund callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundOutcome {
    /// Money returned to the payer.
    Completed,
    /// Declined by the payment system.
    Declined,
    /// Canceled by the payment system.
    Canceled,
    /// Not final yet; do not mutate state.
    Temporary,
}

/// Gateway adapter errors.
#[derive(Debug, Error)]
pub enum GatewayError {
    /// No adapter is registered for the handler.
    #[error("Unknown gateway handler: {0}")]
    UnknownHandler(String),

    /// The callback contradicts the refund it refers to.
    #[error("Callback validation failed: {0}")]
    Validation(String),

    /// The callback status is not part of the protocol.
    #[error("Unknown callback status: {0}")]
    UnknownStatus(String),

    /// Transport or gateway-side failure.
    #[error("Gateway request failed: {0}")]
    Request(String),
}

impl GatewayError {
    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::UnknownHandler(_) => "CALLBACK_HANDLER_INCORRECT",
            Self::Validation(_) => "CALLBACK_VALIDATION_FAILED",
            Self::UnknownStatus(_) => "CALLBACK_STATUS_INCORRECT",
            Self::Request(_) => "GATEWAY_REQUEST_FAILED",
        }
    }

    /// Returns the coarse error kind.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownHandler(_) | Self::Validation(_) | Self::UnknownStatus(_) => {
                ErrorKind::Validation
            }
            Self::Request(_) => ErrorKind::System,
        }
    }
}

/// One acquiring gateway.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Starts a refund.
    async fn create_refund(
        &self,
        order: &Order,
        refund: &Refund,
    ) -> Result<GatewayRefundResponse, GatewayError>;

    /// Interprets a refund callback for `refund`.
    ///
    /// The default implementation applies [`interpret_callback`].
    async fn refund_outcome(
        &self,
        refund: &Refund,
        callback: &RefundCallback,
    ) -> Result<RefundOutcome, GatewayError> {
        interpret_callback(refund, callback)
    }
}

/// Gateways keyed by payment-method handler name.
#[derive(Clone, Default)]
pub struct GatewayRegistry {
    gateways: HashMap<String, Arc<dyn PaymentGateway>>,
}

impl GatewayRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a gateway under `handler`.
    #[must_use]
    pub fn with(mut self, handler: impl Into<String>, gateway: Arc<dyn PaymentGateway>) -> Self {
        self.register(handler, gateway);
        self
    }

    /// Registers a gateway under `handler`, replacing any previous one.
    pub fn register(&mut self, handler: impl Into<String>, gateway: Arc<dyn PaymentGateway>) {
        self.gateways.insert(handler.into(), gateway);
    }

    /// Returns the gateway of `handler`.
    ///
    /// # Errors
    ///
    /// Returns `UnknownHandler` if none is registered.
    pub fn get(&self, handler: &str) -> Result<Arc<dyn PaymentGateway>, GatewayError> {
        self.gateways
            .get(handler)
            .cloned()
            .ok_or_else(|| GatewayError::UnknownHandler(handler.to_string()))
    }

    /// Returns true if `handler` is registered.
    #[must_use]
    pub fn contains(&self, handler: &str) -> bool {
        self.gateways.contains_key(handler)
    }

    /// Registered handler names.
    pub fn handlers(&self) -> impl Iterator<Item = &str> {
        self.gateways.keys().map(String::as_str)
    }
}
