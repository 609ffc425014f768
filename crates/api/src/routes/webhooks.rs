//! Gateway webhooks.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::post,
};

use crate::AppState;

/// Header carrying the callback signature.
pub const SIGNATURE_HEADER: &str = "x-signature";

/// Creates the webhook routes; the signature replaces the internal key.
pub fn routes() -> Router<AppState> {
    Router::new().route("/webhooks/refunds/{handler}", post(refund_callback))
}

/// POST `/webhooks/refunds/{handler}` - Refund status callback from a gateway.
async fn refund_callback(
    State(state): State<AppState>,
    Path(handler): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    let response = state
        .service
        .process_refund_callback(&handler, &body, signature)
        .await;

    let code = StatusCode::from_u16(response.status.http_status_code())
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (code, Json(response))
}
