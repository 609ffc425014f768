//! Request middleware.

pub mod auth;

pub use auth::internal_key_middleware;
