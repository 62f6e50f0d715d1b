//! HTTP handlers.

mod process;
mod reports;
mod status;

pub use process::process_batch;
pub use reports::download_report;
pub use status::api_status;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

/// Uniform failure body: `{"success": false, "error": "..."}`.
pub(crate) fn fail(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(serde_json::json!({ "success": false, "error": message.into() })),
    )
        .into_response()
}
