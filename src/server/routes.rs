//! Router configuration for the web server.

use axum::extract::DefaultBodyLimit;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;

use super::handlers;
use super::AppState;

/// Create the main router with all routes.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.settings.max_request_bytes;
    Router::new()
        .route("/api/process", post(handlers::process_batch))
        .route("/api/reports/:report_id", get(handlers::download_report))
        .route("/api/status", get(handlers::api_status))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
