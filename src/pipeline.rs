//! End-to-end run orchestration shared by the HTTP and CLI boundaries.

use std::sync::Arc;
use std::time::Duration;

use crate::config::Settings;
use crate::error::ReconError;
use crate::extract::{BatchProcessor, DocumentExtractor, DocumentInput, ExtractionRecord};
use crate::recon::{self, ReconReport};
use crate::sheet;

/// Everything a run produces.
#[derive(Debug)]
pub struct RunOutput {
    pub report: ReconReport,
    /// Per-document extraction records, input order.
    pub records: Vec<ExtractionRecord>,
}

/// Load sheet → extract batch → reconcile, under a wall-clock deadline.
pub struct Pipeline {
    settings: Arc<Settings>,
    extractor: Arc<DocumentExtractor>,
}

impl Pipeline {
    pub fn new(settings: Arc<Settings>) -> Result<Self, ReconError> {
        let extractor = Arc::new(DocumentExtractor::from_settings(&settings)?);
        Ok(Self::with_extractor(settings, extractor))
    }

    /// Build a pipeline around an already-configured extractor.
    pub fn with_extractor(settings: Arc<Settings>, extractor: Arc<DocumentExtractor>) -> Self {
        Self {
            settings,
            extractor,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn extractor(&self) -> &DocumentExtractor {
        &self.extractor
    }

    /// Run one reconciliation.
    ///
    /// Hard failures only: an empty batch, an unreadable sheet, or the
    /// deadline expiring. A completed run full of business findings is a
    /// success; the counts speak for themselves.
    pub async fn run(
        &self,
        sheet_name: &str,
        sheet_bytes: &[u8],
        documents: Vec<DocumentInput>,
    ) -> Result<RunOutput, ReconError> {
        if documents.is_empty() {
            return Err(ReconError::EmptyBatch);
        }

        let deadline = Duration::from_secs(self.settings.deadline_secs);
        match tokio::time::timeout(deadline, self.run_inner(sheet_name, sheet_bytes, documents))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(ReconError::DeadlineExceeded(self.settings.deadline_secs)),
        }
    }

    async fn run_inner(
        &self,
        sheet_name: &str,
        sheet_bytes: &[u8],
        documents: Vec<DocumentInput>,
    ) -> Result<RunOutput, ReconError> {
        let mapping = sheet::load_mapping(sheet_name, sheet_bytes)?;

        let processor =
            BatchProcessor::new(Arc::clone(&self.extractor), self.settings.extract_workers);
        let (records, index) = processor.process(documents).await;

        let report = recon::reconcile(&mapping, &index);
        tracing::info!(
            matched = report.summary.matched_pairs,
            errors = report.summary.error_count,
            warnings = report.summary.warning_count,
            "reconciliation complete"
        );

        Ok(RunOutput { report, records })
    }
}
