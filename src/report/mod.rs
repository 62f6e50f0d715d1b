//! Report rendering.
//!
//! Serializes a [`ReconReport`] into a downloadable artifact: a sectioned
//! CSV (summary, matched pairs, errors, warnings) or pretty-printed JSON.

use std::io::Write;

use crate::recon::ReconReport;

/// Render the sectioned CSV report.
pub fn render_csv(report: &ReconReport) -> Vec<u8> {
    let mut out = Vec::new();

    writeln!(out, "RECONCILIATION REPORT").ok();
    writeln!(out).ok();

    writeln!(out, "SUMMARY").ok();
    writeln!(out, "metric,value").ok();
    writeln!(out, "total ledger rows,{}", report.summary.total_source_keys).ok();
    writeln!(
        out,
        "unique invoices in documents,{}",
        report.summary.total_unique_identifiers
    )
    .ok();
    writeln!(out, "matched pairs,{}", report.summary.matched_pairs).ok();
    writeln!(out, "errors,{}", report.summary.error_count).ok();
    writeln!(out, "warnings,{}", report.summary.warning_count).ok();
    writeln!(out).ok();

    writeln!(out, "MATCHED PAIRS").ok();
    writeln!(out, "source_key,identifier").ok();
    for pair in &report.matched {
        writeln!(
            out,
            "{},{}",
            escape_csv(&pair.source_key),
            escape_csv(&pair.identifier)
        )
        .ok();
    }
    writeln!(out).ok();

    writeln!(out, "ERRORS").ok();
    writeln!(out, "kind,message,source_key,identifier").ok();
    for finding in &report.errors {
        writeln!(
            out,
            "{},{},{},{}",
            finding.kind.as_str(),
            escape_csv(&finding.message),
            escape_csv(finding.source_key.as_deref().unwrap_or("-")),
            escape_csv(finding.identifier.as_deref().unwrap_or("-")),
        )
        .ok();
    }
    writeln!(out).ok();

    writeln!(out, "WARNINGS").ok();
    writeln!(out, "kind,message,identifier,count").ok();
    for finding in &report.warnings {
        writeln!(
            out,
            "{},{},{},{}",
            finding.kind.as_str(),
            escape_csv(&finding.message),
            escape_csv(finding.identifier.as_deref().unwrap_or("-")),
            finding
                .count
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string()),
        )
        .ok();
    }

    out
}

/// Render the JSON report.
pub fn render_json(report: &ReconReport) -> Vec<u8> {
    serde_json::to_vec_pretty(report).unwrap_or_default()
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}
