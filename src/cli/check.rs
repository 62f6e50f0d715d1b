//! One-shot reconciliation from the filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::Settings;
use crate::extract::DocumentInput;
use crate::pipeline::Pipeline;
use crate::report;

use super::ReportFormatArg;

/// Reconcile a ledger sheet against PDFs and print the outcome.
pub async fn cmd_check(
    settings: Arc<Settings>,
    sheet_path: &Path,
    document_paths: &[PathBuf],
    report_path: Option<&Path>,
    format: ReportFormatArg,
) -> anyhow::Result<()> {
    let sheet_name = sheet_path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| "ledger.xlsx".to_string());
    let sheet_bytes = fs::read(sheet_path)
        .map_err(|e| anyhow::anyhow!("cannot read sheet {}: {}", sheet_path.display(), e))?;

    let documents = collect_documents(document_paths)?;
    if documents.is_empty() {
        anyhow::bail!("no PDF documents found under the given paths");
    }

    println!(
        "{} Reconciling {} documents against {}",
        style("→").cyan(),
        documents.len(),
        sheet_path.display()
    );

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::with_template("{spinner} {msg}").unwrap());
    spinner.set_message("extracting and matching...");
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));

    let pipeline = Pipeline::new(settings)?;
    let output = pipeline.run(&sheet_name, &sheet_bytes, documents).await;
    spinner.finish_and_clear();

    let output = match output {
        Ok(output) => output,
        Err(e) => {
            eprintln!("  {} {}", style("✗").red(), e);
            return Err(e.into());
        }
    };

    let summary = &output.report.summary;
    println!(
        "  {} {} matched pairs",
        style("✓").green(),
        summary.matched_pairs
    );
    if summary.error_count > 0 {
        println!("  {} {} errors", style("✗").red(), summary.error_count);
        for finding in &output.report.errors {
            println!("    {}", finding.message);
        }
    }
    if summary.warning_count > 0 {
        println!("  {} {} warnings", style("!").yellow(), summary.warning_count);
        for finding in &output.report.warnings {
            println!("    {}", finding.message);
        }
    }

    if let Some(path) = report_path {
        let bytes = match format {
            ReportFormatArg::Csv => report::render_csv(&output.report),
            ReportFormatArg::Json => report::render_json(&output.report),
        };
        fs::write(path, bytes)?;
        println!("  {} report written to {}", style("✓").green(), path.display());
    }

    Ok(())
}

/// Expand files and directories into a flat, name-sorted PDF list.
fn collect_documents(paths: &[PathBuf]) -> anyhow::Result<Vec<DocumentInput>> {
    let mut files: Vec<PathBuf> = Vec::new();

    for path in paths {
        if path.is_dir() {
            let mut entries: Vec<PathBuf> = fs::read_dir(path)?
                .filter_map(|e| e.ok())
                .map(|e| e.path())
                .filter(|p| {
                    p.extension()
                        .map(|ext| ext.eq_ignore_ascii_case("pdf"))
                        .unwrap_or(false)
                })
                .collect();
            entries.sort();
            files.extend(entries);
        } else {
            files.push(path.clone());
        }
    }

    let mut documents = Vec::with_capacity(files.len());
    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "document.pdf".to_string());
        let bytes =
            fs::read(&file).map_err(|e| anyhow::anyhow!("cannot read {}: {}", file.display(), e))?;
        documents.push(DocumentInput::new(name, bytes));
    }
    Ok(documents)
}
