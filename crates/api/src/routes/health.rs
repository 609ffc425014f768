//! Liveness endpoint.

use axum::{Json, Router, extract::State, routing::get};
use serde::Serialize;

use crate::AppState;

/// Liveness payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// Always `ok` while the process serves requests.
    pub status: &'static str,
    /// Service name.
    pub service: &'static str,
    /// Crate version.
    pub version: &'static str,
    /// Gateway handlers refunds can be routed to.
    pub gateways: Vec<String>,
}

async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        service: "paysettle",
        version: env!("CARGO_PKG_VERSION"),
        gateways: state.service.gateway_handlers(),
    })
}

/// Mounts `GET /health`; it sits outside the internal key check.
pub fn routes() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
