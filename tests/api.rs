//! End-to-end API tests: multipart intake, reconciliation, report download.

use std::io::{Cursor, Write};
use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use tower::ServiceExt;

use invoice_recon::config::Settings;
use invoice_recon::extract::{DocumentExtractor, InvoicePattern, TextTool, ToolError};
use invoice_recon::pipeline::Pipeline;
use invoice_recon::server::{create_router, AppState};

const BOUNDARY: &str = "x-test-boundary";
const SHEET_CSV: &str = "Numer.Pelny,NumerDokumentu\nST/1,FV/1/PL/2501\nST/2,FV/2/PL/2501\n";

fn test_state(mutate: impl FnOnce(&mut Settings)) -> AppState {
    let mut settings = Settings {
        tool_enabled: false,
        ..Settings::default()
    };
    mutate(&mut settings);
    AppState::new(Arc::new(settings)).unwrap()
}

/// Hand-built multipart/form-data body.
fn multipart_body(parts: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();
    for (field, filename, bytes) in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        body.extend_from_slice(
            format!(
                "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n",
                field, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(b"Content-Type: application/octet-stream\r\n\r\n");
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

fn process_request(parts: &[(&str, &str, &[u8])]) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/api/process")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={}", BOUNDARY),
        )
        .body(Body::from(multipart_body(parts)))
        .unwrap()
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn process_reconciles_and_serves_the_report() {
    let app = create_router(test_state(|_| {}));

    let response = app
        .clone()
        .oneshot(process_request(&[
            ("sheet", "ledger.csv", SHEET_CSV.as_bytes()),
            ("documents", "a.pdf", b"junk FV/1/PL/2501 junk".as_slice()),
            ("documents", "b.pdf", b"junk FV/9/PL/2501 junk".as_slice()),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    let data = &body["data"];
    assert_eq!(data["summary"]["matched_pairs"], 1);
    assert_eq!(data["summary"]["total_source_keys"], 2);
    // ST/2 missing + FV/9 orphan
    assert_eq!(data["errors_count"], 2);
    assert_eq!(data["warnings_count"], 0);

    let report_id = data["report_id"].as_str().unwrap();

    // CSV download
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/reports/{}", report_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers()[header::CONTENT_TYPE].to_str().unwrap(),
        "text/csv"
    );
    let csv = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(csv.to_vec()).unwrap();
    assert!(csv.contains("ST/1,FV/1/PL/2501"));
    assert!(csv.contains("orphan_document"));

    // JSON download
    let response = app
        .clone()
        .oneshot(
            Request::builder()
                .uri(format!("/api/reports/{}?format=json", report_id))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["summary"]["matched_pairs"], 1);
}

#[tokio::test]
async fn missing_sheet_is_rejected() {
    let app = create_router(test_state(|_| {}));
    let response = app
        .oneshot(process_request(&[(
            "documents",
            "a.pdf",
            b"FV/1/PL/2501".as_slice(),
        )]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn missing_documents_are_rejected() {
    let app = create_router(test_state(|_| {}));
    let response = app
        .oneshot(process_request(&[(
            "sheet",
            "ledger.csv",
            SHEET_CSV.as_bytes(),
        )]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_document_is_rejected() {
    let app = create_router(test_state(|s| s.max_document_bytes = 8));
    let response = app
        .oneshot(process_request(&[
            ("sheet", "ledger.csv", SHEET_CSV.as_bytes()),
            ("documents", "big.pdf", b"way more than eight bytes".as_slice()),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn preview_truncation_keeps_full_counts() {
    let app = create_router(test_state(|s| s.preview_limit = 1));
    let response = app
        .oneshot(process_request(&[
            ("sheet", "ledger.csv", SHEET_CSV.as_bytes()),
            ("documents", "a.pdf", b"nothing to extract here".as_slice()),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let data = &body["data"];
    // Both ledger rows are missing, but only one is previewed
    assert_eq!(data["errors_count"], 2);
    assert_eq!(data["errors_preview"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn zip_bundle_round_trip() {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("export/ledger.csv", options).unwrap();
        writer.write_all(SHEET_CSV.as_bytes()).unwrap();
        writer.start_file("export/a.pdf", options).unwrap();
        writer.write_all(b"junk FV/1/PL/2501").unwrap();
        writer.start_file("export/readme.txt", options).unwrap();
        writer.write_all(b"ignored").unwrap();
        writer.finish().unwrap();
    }
    let bundle = cursor.into_inner();

    let app = create_router(test_state(|_| {}));
    let response = app
        .oneshot(process_request(&[("bundle", "export.zip", &bundle)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["summary"]["matched_pairs"], 1);
    assert_eq!(body["data"]["errors_count"], 1); // ST/2 missing
}

#[tokio::test]
async fn bundle_without_pdfs_is_rejected() {
    let mut cursor = Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut cursor);
        let options = zip::write::SimpleFileOptions::default();
        writer.start_file("ledger.csv", options).unwrap();
        writer.write_all(SHEET_CSV.as_bytes()).unwrap();
        writer.finish().unwrap();
    }
    let bundle = cursor.into_inner();

    let app = create_router(test_state(|_| {}));
    let response = app
        .oneshot(process_request(&[("bundle", "export.zip", &bundle)]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Tool double that outlasts any run deadline.
struct StalledTool;

#[async_trait::async_trait]
impl TextTool for StalledTool {
    fn name(&self) -> &str {
        "stalled"
    }

    fn is_available(&self) -> bool {
        true
    }

    async fn extract_text(&self, _bytes: &[u8]) -> Result<String, ToolError> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(String::new())
    }
}

#[tokio::test(start_paused = true)]
async fn blown_deadline_maps_to_gateway_timeout() {
    let settings = Arc::new(Settings {
        deadline_secs: 1,
        ..Settings::default()
    });
    let pattern = InvoicePattern::new(&settings.identifier_pattern).unwrap();
    let extractor = Arc::new(DocumentExtractor::new(pattern).with_tool(Arc::new(StalledTool)));
    let pipeline = Arc::new(Pipeline::with_extractor(Arc::clone(&settings), extractor));
    let app = create_router(AppState::with_pipeline(settings, pipeline));

    let response = app
        .oneshot(process_request(&[
            ("sheet", "ledger.csv", SHEET_CSV.as_bytes()),
            ("documents", "a.pdf", b"no text layer here".as_slice()),
        ]))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn unknown_report_id_is_404() {
    let app = create_router(test_state(|_| {}));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/reports/does-not-exist")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn status_reports_tool_state() {
    let app = create_router(test_state(|_| {}));
    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/status")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["external_tool"]["enabled"], false);
}
