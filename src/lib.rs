//! Invoice reconciliation service.
//!
//! Cross-references invoice numbers extracted from PDF documents against the
//! numbers declared in a bookkeeping ledger export, reporting matched pairs,
//! missing documents, orphan documents, and duplicate declarations.

pub mod cli;
pub mod config;
pub mod error;
pub mod extract;
pub mod pipeline;
pub mod recon;
pub mod report;
pub mod server;
pub mod sheet;
