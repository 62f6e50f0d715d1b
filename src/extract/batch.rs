//! Batch extraction across documents plus the aggregate identifier index.

use std::collections::HashMap;
use std::sync::Arc;

use futures::stream::{self, StreamExt};

use super::extractor::{DocumentExtractor, ExtractionRecord};

/// A named document queued for extraction.
#[derive(Debug, Clone)]
pub struct DocumentInput {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl DocumentInput {
    pub fn new(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            bytes,
        }
    }
}

/// Aggregate over all extraction records of a run.
///
/// Tracks the global unique identifier list (first-seen order across the
/// batch) and, per identifier, the number of distinct documents it appeared
/// in. Built once, read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct BatchIndex {
    order: Vec<String>,
    counts: HashMap<String, usize>,
}

impl BatchIndex {
    pub fn from_records(records: &[ExtractionRecord]) -> Self {
        let mut index = Self::default();
        for record in records {
            // Identifiers are already unique within a record, so each
            // occurrence here is a distinct document.
            for id in &record.identifiers {
                match index.counts.get_mut(id) {
                    Some(count) => *count += 1,
                    None => {
                        index.order.push(id.clone());
                        index.counts.insert(id.clone(), 1);
                    }
                }
            }
        }
        index
    }

    pub fn contains(&self, id: &str) -> bool {
        self.counts.contains_key(id)
    }

    /// Unique identifiers in first-seen order.
    pub fn unique_identifiers(&self) -> &[String] {
        &self.order
    }

    /// Number of distinct documents `id` appeared in.
    pub fn occurrence_count(&self, id: &str) -> usize {
        self.counts.get(id).copied().unwrap_or(0)
    }

    /// Identifiers seen in more than one document, first-seen order.
    pub fn duplicates(&self) -> impl Iterator<Item = (&str, usize)> {
        self.order.iter().filter_map(|id| {
            let count = self.counts[id];
            (count > 1).then_some((id.as_str(), count))
        })
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

/// Runs the extractor over a whole batch with bounded parallelism.
pub struct BatchProcessor {
    extractor: Arc<DocumentExtractor>,
    workers: usize,
}

impl BatchProcessor {
    pub fn new(extractor: Arc<DocumentExtractor>, workers: usize) -> Self {
        Self {
            extractor,
            workers: workers.max(1),
        }
    }

    /// Extract every document and build the aggregate index.
    ///
    /// Documents are processed concurrently but records are merged in input
    /// order, so the index's first-seen ordering is reproducible. An empty
    /// batch is a valid input here; the calling boundary decides whether to
    /// reject it up front.
    pub async fn process(&self, documents: Vec<DocumentInput>) -> (Vec<ExtractionRecord>, BatchIndex) {
        let records: Vec<ExtractionRecord> = stream::iter(documents)
            .map(|doc| {
                let extractor = Arc::clone(&self.extractor);
                async move { extractor.extract(&doc.name, &doc.bytes).await }
            })
            .buffered(self.workers)
            .collect()
            .await;

        let index = BatchIndex::from_records(&records);
        (records, index)
    }
}
