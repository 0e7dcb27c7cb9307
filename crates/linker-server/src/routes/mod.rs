//! HTTP routes served by the relay daemon.

pub mod relay;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the daemon router.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(relay::routes())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
