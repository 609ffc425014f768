//! `SeaORM` entities.
//!
//! Orders and refunds keep their full document in a `jsonb` column next to
//! the key columns the store ports filter on.

pub mod accounting_entries;
pub mod countries;
pub mod exchange_rates;
pub mod merchants;
pub mod money_back_cost_merchant;
pub mod money_back_cost_system;
pub mod orders;
pub mod payment_channel_cost_merchant;
pub mod payment_channel_cost_system;
pub mod refunds;
