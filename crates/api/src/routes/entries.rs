//! Accounting entry routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use paysettle_core::service::CreateEntryRequest;
use paysettle_shared::types::{MerchantId, OrderId};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the accounting entry routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/accounting-entries", post(create_accounting_entry))
        .route("/orders/{order_id}/payment-entries", post(record_payment_entries))
}

/// Request body for booking the payment event of an order.
#[derive(Debug, Deserialize)]
pub struct PaymentEntriesRequest {
    /// Merchant the order must belong to.
    pub merchant_id: MerchantId,
}

/// POST `/accounting-entries` - Book a single entry.
async fn create_accounting_entry(
    State(state): State<AppState>,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entry = state.service.create_accounting_entry(payload).await?;

    if let Some(entry) = &entry {
        info!(
            entry_id = %entry.id,
            entry_type = %entry.entry_type,
            amount = %entry.amount,
            "Accounting entry created"
        );
    }

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "ok", "item": entry })),
    ))
}

/// POST `/orders/{order_id}/payment-entries` - Book the payment event once.
async fn record_payment_entries(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(payload): Json<PaymentEntriesRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let entries = state
        .service
        .record_payment_entries(order_id, payload.merchant_id)
        .await?;

    Ok(Json(json!({ "status": "ok", "items": entries })))
}
