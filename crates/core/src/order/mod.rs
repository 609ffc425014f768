//! Orders as the ledger sees them.
//!
//! - `types` - Order document and its status enums
//! - `state` - Cost guards, refund eligibility and refund transitions
//! - `mirror` - Construction of the mirror refund-order

pub mod mirror;
pub mod state;
pub mod types;

pub use mirror::{build_refund_order, proportional_amount};
pub use state::OrderLedgerState;
pub use types::{
    Address, Order, OrderPaymentMethod, OrderRefund, OrderStatus, OrderTax, OrderType,
    OrderUser, ParentOrder, PaymentMethodParams, PrivateStatus, RoyaltyData,
    BANK_CARD_GROUP, CARD_BRAND_REQUISITE,
};
