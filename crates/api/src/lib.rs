//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST routes for accounting entries and refunds
//! - The refund callback webhook
//! - Internal API key middleware
//! - Error responses mapped from the settlement core

pub mod error;
pub mod middleware;
pub mod routes;

use axum::Router;
use paysettle_core::SettlementService;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Settlement facade.
    pub service: Arc<SettlementService>,
    /// Bearer key the internal RPC routes require.
    pub internal_key: Arc<str>,
}

impl AppState {
    /// Creates the state from a wired service and the configured key.
    #[must_use]
    pub fn new(service: SettlementService, internal_key: &str) -> Self {
        Self {
            service: Arc::new(service),
            internal_key: Arc::from(internal_key),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
