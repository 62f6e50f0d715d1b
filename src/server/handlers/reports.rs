//! Report download endpoint.

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::report;

use super::super::AppState;
use super::fail;

/// Report download format options.
#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Csv,
    Json,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    #[serde(default)]
    pub format: ReportFormat,
}

/// Serve a stored report as a download.
pub async fn download_report(
    State(state): State<AppState>,
    Path(report_id): Path<String>,
    Query(params): Query<ReportQuery>,
) -> Response {
    let reports = state.reports.read().await;
    let Some(stored) = reports.get(&report_id) else {
        return fail(StatusCode::NOT_FOUND, "report not found");
    };

    let (bytes, content_type, filename) = match params.format {
        ReportFormat::Csv => (
            report::render_csv(&stored.report),
            "text/csv",
            "reconciliation-report.csv",
        ),
        ReportFormat::Json => (
            report::render_json(&stored.report),
            "application/json",
            "reconciliation-report.json",
        ),
    };

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", filename),
        )
        .body(Body::from(bytes))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}
