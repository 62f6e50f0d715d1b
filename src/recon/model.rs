//! Reconciliation result model.
//!
//! Findings carry a kind tag plus the structured payload (source key,
//! identifier, count) so renderers never re-derive anything from messages.

use serde::{Deserialize, Serialize};

/// A ledger row whose declared invoice was found in the document batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchedPair {
    pub source_key: String,
    pub identifier: String,
}

/// Classification categories for errors and warnings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// Declared invoice with no supporting document.
    MissingDocument,
    /// Extracted invoice with no ledger declaration.
    OrphanDocument,
    /// Invoice found in more than one document.
    DuplicateInDocuments,
    /// Invoice declared by more than one ledger row.
    DuplicateInLedger,
}

impl FindingKind {
    pub fn is_error(&self) -> bool {
        matches!(self, Self::MissingDocument | Self::OrphanDocument)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingDocument => "missing_document",
            Self::OrphanDocument => "orphan_document",
            Self::DuplicateInDocuments => "duplicate_in_documents",
            Self::DuplicateInLedger => "duplicate_in_ledger",
        }
    }
}

/// One error or warning from a reconciliation run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
}

impl Finding {
    pub fn missing(source_key: &str, identifier: &str) -> Self {
        Self {
            kind: FindingKind::MissingDocument,
            message: format!(
                "no document found for {} (invoice {})",
                source_key, identifier
            ),
            source_key: Some(source_key.to_string()),
            identifier: Some(identifier.to_string()),
            count: None,
        }
    }

    pub fn orphan(identifier: &str) -> Self {
        Self {
            kind: FindingKind::OrphanDocument,
            message: format!("invoice {} has no ledger entry", identifier),
            source_key: None,
            identifier: Some(identifier.to_string()),
            count: None,
        }
    }

    pub fn duplicate_in_documents(identifier: &str, count: usize) -> Self {
        Self {
            kind: FindingKind::DuplicateInDocuments,
            message: format!("invoice {} appears in {} documents", identifier, count),
            source_key: None,
            identifier: Some(identifier.to_string()),
            count: Some(count),
        }
    }

    pub fn duplicate_in_ledger(identifier: &str, count: usize) -> Self {
        Self {
            kind: FindingKind::DuplicateInLedger,
            message: format!("invoice {} is declared by {} ledger rows", identifier, count),
            source_key: None,
            identifier: Some(identifier.to_string()),
            count: Some(count),
        }
    }
}

/// Counts derived from the result lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total_source_keys: usize,
    pub total_unique_identifiers: usize,
    pub matched_pairs: usize,
    pub error_count: usize,
    pub warning_count: usize,
}

/// Complete output of one reconciliation run. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconReport {
    pub matched: Vec<MatchedPair>,
    pub errors: Vec<Finding>,
    pub warnings: Vec<Finding>,
    pub summary: Summary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finding_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FindingKind::MissingDocument).unwrap();
        assert_eq!(json, "\"missing_document\"");
    }

    #[test]
    fn empty_payload_fields_are_omitted() {
        let json = serde_json::to_value(Finding::orphan("FV/1/PL/2501")).unwrap();
        assert!(json.get("source_key").is_none());
        assert_eq!(json["identifier"], "FV/1/PL/2501");
    }
}
