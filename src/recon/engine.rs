//! The reconciliation algorithm.

use crate::extract::BatchIndex;
use crate::sheet::LedgerMapping;

use super::model::{Finding, MatchedPair, ReconReport, Summary};

/// Classify every ledger row and every extracted identifier.
///
/// Pure function of its two inputs, no I/O. Ordering: matched pairs and
/// missing errors follow ledger row order; orphans follow first-seen
/// extraction order; duplicate warnings follow the first-seen order of the
/// respective count maps.
pub fn reconcile(mapping: &LedgerMapping, index: &BatchIndex) -> ReconReport {
    let mut matched = Vec::new();
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    // Every ledger row lands in exactly one of matched / missing
    for source_key in mapping.source_keys() {
        let Some(target) = mapping.target_for(source_key) else {
            continue;
        };
        if index.contains(target) {
            matched.push(MatchedPair {
                source_key: source_key.clone(),
                identifier: target.to_string(),
            });
        } else {
            errors.push(Finding::missing(source_key, target));
        }
    }

    // Every extracted identifier is either a matched target or an orphan
    for identifier in index.unique_identifiers() {
        if !mapping.declares(identifier) {
            errors.push(Finding::orphan(identifier));
        }
    }

    for (identifier, count) in index.duplicates() {
        warnings.push(Finding::duplicate_in_documents(identifier, count));
    }

    for (identifier, count) in mapping.declared_duplicates() {
        warnings.push(Finding::duplicate_in_ledger(identifier, count));
    }

    let summary = Summary {
        total_source_keys: mapping.source_keys().len(),
        total_unique_identifiers: index.len(),
        matched_pairs: matched.len(),
        error_count: errors.len(),
        warning_count: warnings.len(),
    };

    ReconReport {
        matched,
        errors,
        warnings,
        summary,
    }
}
