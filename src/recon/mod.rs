//! Reconciliation of ledger declarations against extracted identifiers.

mod engine;
mod model;

pub use engine::reconcile;
pub use model::{Finding, FindingKind, MatchedPair, ReconReport, Summary};
