//! Service status endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use super::super::AppState;

/// Health plus external tool availability.
pub async fn api_status(State(state): State<AppState>) -> impl IntoResponse {
    let tool = state.pipeline.extractor().tool();
    let reports_held = state.reports.read().await.len();

    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "identifier_pattern": state.settings.identifier_pattern,
        "external_tool": {
            "enabled": tool.is_some(),
            "name": tool.map(|t| t.name().to_string()),
            "available": tool.map(|t| t.is_available()).unwrap_or(false),
        },
        "reports_held": reports_held,
    }))
}
