//! Run-level error taxonomy.
//!
//! Only whole-run preconditions surface as errors: an unreadable ledger
//! sheet, an empty document batch, or a blown processing deadline. Missing,
//! orphan, and duplicate classifications are report data, never errors, and
//! per-document extraction failures are absorbed inside the extractor.

use thiserror::Error;

/// Errors that abort a reconciliation run.
#[derive(Debug, Error)]
pub enum ReconError {
    #[error("spreadsheet could not be read: {0}")]
    SheetUnreadable(String),

    #[error("no documents supplied")]
    EmptyBatch,

    #[error("processing deadline of {0}s exceeded")]
    DeadlineExceeded(u64),

    #[error("invalid identifier pattern: {0}")]
    InvalidPattern(#[from] regex::Error),
}
