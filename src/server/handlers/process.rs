//! The reconciliation endpoint.

use std::io::{Cursor, Read};

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::error::ReconError;
use crate::extract::DocumentInput;

use super::super::AppState;
use super::fail;

struct UploadedSheet {
    name: String,
    bytes: Vec<u8>,
}

/// Run a reconciliation over an uploaded sheet plus PDF batch.
///
/// Accepts either a `sheet` field with repeated `documents` fields, or a
/// single `bundle` field holding a ZIP with one sheet and the PDFs. The
/// response carries full counts and bounded previews; truncation never
/// alters the counts.
pub async fn process_batch(State(state): State<AppState>, mut multipart: Multipart) -> Response {
    let settings = &state.settings;

    let mut sheet: Option<UploadedSheet> = None;
    let mut documents: Vec<DocumentInput> = Vec::new();

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => return fail(StatusCode::BAD_REQUEST, format!("malformed upload: {}", e)),
        };

        let field_name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().unwrap_or("").to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => return fail(StatusCode::BAD_REQUEST, format!("upload read failed: {}", e)),
        };

        match field_name.as_str() {
            "sheet" | "xlsx" => {
                if bytes.len() > settings.max_sheet_bytes {
                    return fail(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        format!(
                            "sheet exceeds the {}MB limit",
                            settings.max_sheet_bytes / (1024 * 1024)
                        ),
                    );
                }
                sheet = Some(UploadedSheet {
                    name: if file_name.is_empty() {
                        "upload.xlsx".to_string()
                    } else {
                        file_name
                    },
                    bytes: bytes.to_vec(),
                });
            }
            "documents" | "pdfs" => {
                if bytes.len() > settings.max_document_bytes {
                    return fail(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        format!(
                            "document \"{}\" exceeds the {}MB limit",
                            file_name,
                            settings.max_document_bytes / (1024 * 1024)
                        ),
                    );
                }
                let name = if file_name.is_empty() {
                    format!("document-{}.pdf", documents.len() + 1)
                } else {
                    file_name
                };
                documents.push(DocumentInput::new(name, bytes.to_vec()));
            }
            "bundle" => {
                if bytes.len() > settings.max_bundle_bytes {
                    return fail(
                        StatusCode::PAYLOAD_TOO_LARGE,
                        format!(
                            "bundle exceeds the {}MB limit",
                            settings.max_bundle_bytes / (1024 * 1024)
                        ),
                    );
                }
                match unpack_bundle(&bytes, &state) {
                    Ok((bundle_sheet, bundle_docs)) => {
                        sheet = Some(bundle_sheet);
                        documents.extend(bundle_docs);
                    }
                    Err(response) => return response,
                }
            }
            other => {
                tracing::debug!(field = other, "ignoring unknown multipart field");
            }
        }
    }

    let Some(sheet) = sheet else {
        return fail(StatusCode::BAD_REQUEST, "no ledger sheet supplied");
    };
    if documents.is_empty() {
        return fail(StatusCode::BAD_REQUEST, "no PDF documents supplied");
    }

    let output = match state
        .pipeline
        .run(&sheet.name, &sheet.bytes, documents)
        .await
    {
        Ok(output) => output,
        Err(e) => return run_failure(e),
    };

    let report = output.report;
    let limit = settings.preview_limit;
    let report_id = state.store_report(report.clone()).await;

    let data = serde_json::json!({
        "summary": report.summary,
        "matched_count": report.matched.len(),
        "matched_preview": preview(&report.matched, limit),
        "errors_count": report.errors.len(),
        "errors_preview": preview(&report.errors, limit),
        "warnings_count": report.warnings.len(),
        "warnings_preview": preview(&report.warnings, limit),
        "report_id": report_id,
    });

    (
        StatusCode::OK,
        Json(serde_json::json!({ "success": true, "data": data })),
    )
        .into_response()
}

fn preview<T: serde::Serialize>(items: &[T], limit: usize) -> serde_json::Value {
    let end = items.len().min(limit);
    serde_json::to_value(&items[..end]).unwrap_or_default()
}

fn run_failure(err: ReconError) -> Response {
    let status = match &err {
        ReconError::DeadlineExceeded(_) => StatusCode::GATEWAY_TIMEOUT,
        ReconError::SheetUnreadable(_) => StatusCode::UNPROCESSABLE_ENTITY,
        ReconError::EmptyBatch => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(error = %err, "reconciliation run failed");
    fail(status, err.to_string())
}

/// Pull the sheet and PDF entries out of a ZIP bundle.
fn unpack_bundle(
    bytes: &[u8],
    state: &AppState,
) -> Result<(UploadedSheet, Vec<DocumentInput>), Response> {
    let settings = &state.settings;
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes)).map_err(|e| {
        fail(
            StatusCode::BAD_REQUEST,
            format!("bundle is not a readable ZIP: {}", e),
        )
    })?;

    let mut sheet: Option<UploadedSheet> = None;
    let mut documents = Vec::new();

    for i in 0..archive.len() {
        let mut entry = archive
            .by_index(i)
            .map_err(|e| fail(StatusCode::BAD_REQUEST, format!("bad bundle entry: {}", e)))?;
        if entry.is_dir() {
            continue;
        }

        let name = entry.name().to_string();
        let base = name.rsplit('/').next().unwrap_or(&name).to_string();
        let lower = base.to_lowercase();

        if sheet.is_none()
            && (lower.ends_with(".xlsx") || lower.ends_with(".xls") || lower.ends_with(".csv"))
        {
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| fail(StatusCode::BAD_REQUEST, format!("bundle read: {}", e)))?;
            if bytes.len() > settings.max_sheet_bytes {
                return Err(fail(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("bundled sheet \"{}\" is too large", base),
                ));
            }
            sheet = Some(UploadedSheet { name: base, bytes });
        } else if lower.ends_with(".pdf") {
            let mut bytes = Vec::new();
            entry
                .read_to_end(&mut bytes)
                .map_err(|e| fail(StatusCode::BAD_REQUEST, format!("bundle read: {}", e)))?;
            if bytes.len() > settings.max_document_bytes {
                return Err(fail(
                    StatusCode::PAYLOAD_TOO_LARGE,
                    format!("bundled document \"{}\" is too large", base),
                ));
            }
            documents.push(DocumentInput::new(base, bytes));
        }
    }

    let Some(sheet) = sheet else {
        return Err(fail(
            StatusCode::BAD_REQUEST,
            "bundle contains no spreadsheet",
        ));
    };
    if documents.is_empty() {
        return Err(fail(StatusCode::BAD_REQUEST, "bundle contains no PDFs"));
    }

    Ok((sheet, documents))
}
