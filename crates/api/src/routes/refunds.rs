//! Refund routes.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use paysettle_core::refund::CreateRefundRequest;
use paysettle_shared::types::{MerchantId, OrderId, PageRequest, RefundId};
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::{AppState, error::ApiError};

/// Creates the refund routes (requires auth middleware to be applied externally).
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/refunds", post(create_refund))
        .route("/orders/{order_id}/refunds", get(list_refunds))
        .route("/orders/{order_id}/refunds/{refund_id}", get(get_refund))
}

/// Query parameters identifying the calling merchant.
#[derive(Debug, Deserialize)]
pub struct MerchantQuery {
    /// Merchant the order must belong to.
    pub merchant_id: MerchantId,
}

/// Query parameters for listing refunds.
#[derive(Debug, Deserialize)]
pub struct ListRefundsQuery {
    /// Merchant the order must belong to.
    pub merchant_id: MerchantId,
    /// Page size.
    pub limit: Option<u64>,
    /// Items to skip.
    pub offset: Option<u64>,
}

/// POST `/refunds` - Start a refund.
async fn create_refund(
    State(state): State<AppState>,
    Json(payload): Json<CreateRefundRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let refund = state.service.create_refund(payload).await?;

    info!(
        refund_id = %refund.id,
        order_id = %refund.original_order.id,
        status = %refund.status,
        "Refund created"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "status": "ok", "item": refund })),
    ))
}

/// GET `/orders/{order_id}/refunds` - List refunds of an order.
async fn list_refunds(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Query(query): Query<ListRefundsQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let defaults = PageRequest::default();
    let page = PageRequest::new(
        query.limit.unwrap_or(defaults.limit),
        query.offset.unwrap_or(defaults.offset),
    );

    let refunds = state
        .service
        .list_refunds(order_id, query.merchant_id, page)
        .await?;

    Ok(Json(json!({
        "status": "ok",
        "items": refunds.items,
        "count": refunds.count
    })))
}

/// GET `/orders/{order_id}/refunds/{refund_id}` - Get one refund.
async fn get_refund(
    State(state): State<AppState>,
    Path((order_id, refund_id)): Path<(OrderId, RefundId)>,
    Query(query): Query<MerchantQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let refund = state
        .service
        .get_refund(order_id, refund_id, query.merchant_id)
        .await?;

    Ok(Json(json!({ "status": "ok", "item": refund })))
}
