//! API route definitions.

use axum::{Router, middleware};

use crate::{AppState, middleware::internal_key_middleware};

pub mod entries;
pub mod health;
pub mod refunds;
pub mod webhooks;

/// Creates the API router; RPC routes sit behind the internal key check.
#[allow(clippy::needless_pass_by_value)]
pub fn api_routes_with_state(state: AppState) -> Router<AppState> {
    let protected_routes = Router::new()
        .merge(entries::routes())
        .merge(refunds::routes())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            internal_key_middleware,
        ));

    Router::new()
        .merge(health::routes())
        .merge(webhooks::routes())
        .merge(protected_routes)
}
