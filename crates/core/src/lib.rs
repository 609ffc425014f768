//! Settlement core for Paysettle.
//!
//! This crate contains the ledger logic of the payment platform with ZERO web
//! or database dependencies. Storage, exchange rates and the acquiring gateway
//! are reached through the narrow ports in [`store`], [`currency`] and
//! [`gateway`].
//!
//! # Modules
//!
//! - `cost` - Fee/tax rule resolution across the four cost tables
//! - `currency` - Common and merchant exchange rates, conversion, rate cache
//! - `accounting` - Accounting entry types and the entry engine
//! - `order` - Order ledger state, guards and mirror refund-orders
//! - `refund` - Refund creation and gateway callback processing
//! - `service` - RPC facade over the components above

pub mod accounting;
pub mod cost;
pub mod currency;
pub mod error;
pub mod gateway;
pub mod merchant;
pub mod order;
pub mod refund;
pub mod service;
pub mod store;

#[cfg(test)]
mod testing;

pub use error::ErrorKind;
pub use service::{ResponseStatus, ServiceError, SettlementService};
