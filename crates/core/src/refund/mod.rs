//! Refunds and chargebacks.
//!
//! - `types` - Refund document and lifecycle
//! - `callback` - Gateway callback payload and webhook responses
//! - `signature` - Callback signature check
//! - `orchestrator` - Refund creation and callback processing

pub mod callback;
pub mod error;
pub mod orchestrator;
pub mod signature;
pub mod types;

#[cfg(test)]
mod signature_props;

pub use callback::{
    CallbackDecline, CallbackMerchantOrder, CallbackRefundData, CallbackResponse, CallbackStatus,
    RefundCallback,
};
pub use error::RefundError;
pub use orchestrator::{CreateRefundRequest, RefundOrchestrator};
pub use types::{OriginalOrder, Refund, RefundPayerData, RefundStatus};
