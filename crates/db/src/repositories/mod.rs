//! Repository implementations of the settlement store ports.

pub mod accounting_entry;
pub mod cost_rule;
pub mod country;
pub mod error;
pub mod exchange_rate;
pub mod merchant;
pub mod order;
pub mod refund;

pub use accounting_entry::AccountingEntryRepository;
pub use cost_rule::CostRuleRepository;
pub use country::CountryRepository;
pub use error::RepositoryError;
pub use exchange_rate::ExchangeRateRepository;
pub use merchant::MerchantRepository;
pub use order::OrderRepository;
pub use refund::RefundRepository;
