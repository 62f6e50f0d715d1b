//! Tiered identifier extraction from document bytes.

use std::sync::Arc;

use serde::Serialize;

use crate::config::Settings;
use crate::error::ReconError;

use super::pattern::InvoicePattern;
use super::tool::{Pdftotext, TextTool};

/// Which tier produced a record's identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Decoded PDF text layer.
    TextLayer,
    /// Out-of-process extraction tool.
    ExternalTool,
    /// Pattern scan over the raw document bytes. Low confidence: compressed
    /// streams can produce coincidental matches, and there is no
    /// corroboration step.
    RawScan,
    /// Every tier came up empty.
    Empty,
}

/// Identifiers found in a single document.
#[derive(Debug, Clone, Serialize)]
pub struct ExtractionRecord {
    pub file_name: String,
    /// Unique within the document, first-seen order.
    pub identifiers: Vec<String>,
    pub method: ExtractionMethod,
}

/// Extracts invoice identifiers from document bytes.
///
/// Tiers are strictly sequential: a later tier runs only when the earlier
/// ones produced no usable text. Extraction never fails the caller; a
/// document nothing can read yields an empty record and a warning log.
pub struct DocumentExtractor {
    pattern: InvoicePattern,
    tool: Option<Arc<dyn TextTool>>,
}

impl DocumentExtractor {
    pub fn new(pattern: InvoicePattern) -> Self {
        Self {
            pattern,
            tool: None,
        }
    }

    pub fn with_tool(mut self, tool: Arc<dyn TextTool>) -> Self {
        self.tool = Some(tool);
        self
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, ReconError> {
        let pattern = InvoicePattern::new(&settings.identifier_pattern)?;
        let mut extractor = Self::new(pattern);
        if settings.tool_enabled {
            extractor = extractor.with_tool(Arc::new(Pdftotext::new(settings.tool_timeout_secs)));
        }
        Ok(extractor)
    }

    pub fn pattern(&self) -> &InvoicePattern {
        &self.pattern
    }

    pub fn tool(&self) -> Option<&dyn TextTool> {
        self.tool.as_deref()
    }

    /// Extract the set of invoice identifiers from one document.
    pub async fn extract(&self, file_name: &str, bytes: &[u8]) -> ExtractionRecord {
        // Tier 1: structured text layer
        if let Some(text) = self.text_layer(bytes).await {
            let identifiers = self.pattern.find_unique(&text);
            tracing::info!(
                file = file_name,
                found = identifiers.len(),
                "text layer decoded"
            );
            return ExtractionRecord {
                file_name: file_name.to_string(),
                identifiers,
                method: ExtractionMethod::TextLayer,
            };
        }

        // Tier 2: external tool
        if let Some(tool) = &self.tool {
            if tool.is_available() {
                match tool.extract_text(bytes).await {
                    Ok(text) if !text.trim().is_empty() => {
                        let identifiers = self.pattern.find_unique(&text);
                        tracing::info!(
                            file = file_name,
                            tool = tool.name(),
                            found = identifiers.len(),
                            "external tool extraction"
                        );
                        return ExtractionRecord {
                            file_name: file_name.to_string(),
                            identifiers,
                            method: ExtractionMethod::ExternalTool,
                        };
                    }
                    Ok(_) => {
                        tracing::debug!(file = file_name, tool = tool.name(), "tool output empty");
                    }
                    Err(e) => {
                        tracing::debug!(file = file_name, tool = tool.name(), error = %e, "tool unavailable");
                    }
                }
            }
        }

        // Tier 3: raw byte scan
        let identifiers = self.pattern.find_unique(&decode_raw(bytes));
        if identifiers.is_empty() {
            tracing::warn!(file = file_name, "no identifiers found in document");
            ExtractionRecord {
                file_name: file_name.to_string(),
                identifiers,
                method: ExtractionMethod::Empty,
            }
        } else {
            tracing::info!(
                file = file_name,
                found = identifiers.len(),
                "raw byte scan extraction"
            );
            ExtractionRecord {
                file_name: file_name.to_string(),
                identifiers,
                method: ExtractionMethod::RawScan,
            }
        }
    }

    /// Decode the PDF text layer, or `None` when the document is not a PDF,
    /// cannot be parsed, or has an empty text layer.
    ///
    /// Decoding is CPU-bound and runs on the blocking pool so a pathological
    /// document cannot stall a runtime worker past the run deadline. A panic
    /// inside the decoder surfaces as a join error and is absorbed here.
    async fn text_layer(&self, bytes: &[u8]) -> Option<String> {
        let is_pdf = infer::get(bytes)
            .map(|kind| kind.mime_type() == "application/pdf")
            .unwrap_or(false);
        if !is_pdf {
            return None;
        }

        let bytes = bytes.to_vec();
        let decoded =
            tokio::task::spawn_blocking(move || pdf_extract::extract_text_from_mem(&bytes)).await;
        match decoded {
            Ok(Ok(text)) if !text.trim().is_empty() => Some(text),
            Ok(Ok(_)) => None,
            Ok(Err(e)) => {
                tracing::debug!(error = %e, "text layer decode failed");
                None
            }
            Err(e) => {
                tracing::debug!(error = %e, "text layer decoder panicked");
                None
            }
        }
    }
}

/// One byte per character, latin-1 style. Lossy, but ASCII substrings
/// embedded in compressed or encoded streams survive intact.
fn decode_raw(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

#[cfg(test)]
mod tests {
    use super::super::tool::ToolError;
    use super::*;
    use crate::config::DEFAULT_IDENTIFIER_PATTERN;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn extractor() -> DocumentExtractor {
        DocumentExtractor::new(InvoicePattern::new(DEFAULT_IDENTIFIER_PATTERN).unwrap())
    }

    /// Tool double that counts invocations.
    struct FakeTool {
        calls: AtomicUsize,
        response: Result<String, ()>,
    }

    impl FakeTool {
        fn returning(text: &str) -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: Ok(text.to_string()),
            })
        }

        fn failing() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
                response: Err(()),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextTool for FakeTool {
        fn name(&self) -> &str {
            "fake"
        }

        fn is_available(&self) -> bool {
            true
        }

        async fn extract_text(&self, _bytes: &[u8]) -> Result<String, ToolError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.response {
                Ok(text) => Ok(text.clone()),
                Err(()) => Err(ToolError::Failed("fake failure".to_string())),
            }
        }
    }

    /// Build a minimal single-page PDF with an uncompressed text stream.
    fn minimal_pdf(text: &str) -> Vec<u8> {
        let stream = format!("BT /F1 12 Tf 72 720 Td ({}) Tj ET", text);
        let objects = [
            "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
            "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
            "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
             /Contents 4 0 R /Resources << /Font << /F1 5 0 R >> >> >>"
                .to_string(),
            format!(
                "<< /Length {} >>\nstream\n{}\nendstream",
                stream.len(),
                stream
            ),
            "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        ];

        let mut out = String::from("%PDF-1.4\n");
        let mut offsets = Vec::new();
        for (i, obj) in objects.iter().enumerate() {
            offsets.push(out.len());
            out.push_str(&format!("{} 0 obj\n{}\nendobj\n", i + 1, obj));
        }
        let xref_pos = out.len();
        out.push_str(&format!("xref\n0 {}\n", objects.len() + 1));
        out.push_str("0000000000 65535 f \n");
        for off in offsets {
            out.push_str(&format!("{:010} 00000 n \n", off));
        }
        out.push_str(&format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref_pos
        ));
        out.into_bytes()
    }

    #[tokio::test]
    async fn raw_scan_recovers_identifiers_from_binary_junk() {
        let mut bytes = vec![0x00, 0xff, 0x13, 0x37];
        bytes.extend_from_slice(b"garbage FV/7/PL/2501 more");
        bytes.extend_from_slice(&[0x80, 0x81]);

        let record = extractor().extract("junk.pdf", &bytes).await;
        assert_eq!(record.identifiers, vec!["FV/7/PL/2501"]);
        assert_eq!(record.method, ExtractionMethod::RawScan);
    }

    #[tokio::test]
    async fn broken_pdf_falls_back_to_raw_scan() {
        // PDF magic so tier 1 engages, then garbage the decoder rejects
        let mut bytes = b"%PDF-1.7\n".to_vec();
        bytes.extend_from_slice(&[0x00, 0xde, 0xad]);
        bytes.extend_from_slice(b" FV/4/PL/2501 ");

        let record = extractor().extract("broken.pdf", &bytes).await;
        assert_eq!(record.method, ExtractionMethod::RawScan);
        assert_eq!(record.identifiers, vec!["FV/4/PL/2501"]);
    }

    #[tokio::test]
    async fn unreadable_document_yields_empty_record() {
        let record = extractor().extract("empty.pdf", &[0u8; 64]).await;
        assert!(record.identifiers.is_empty());
        assert_eq!(record.method, ExtractionMethod::Empty);
    }

    #[tokio::test]
    async fn text_layer_success_skips_the_tool() {
        let tool = FakeTool::returning("FV/99/PL/2501");
        let ex = extractor().with_tool(tool.clone());

        let pdf = minimal_pdf("Faktura FV/3/PL/2501");
        let record = ex.extract("a.pdf", &pdf).await;

        assert_eq!(record.method, ExtractionMethod::TextLayer);
        assert_eq!(record.identifiers, vec!["FV/3/PL/2501"]);
        assert_eq!(tool.calls(), 0, "tool must not run after tier 1 success");
    }

    #[tokio::test]
    async fn tool_runs_once_when_text_layer_fails() {
        let tool = FakeTool::returning("found FV/5/PL/2501 via tool");
        let ex = extractor().with_tool(tool.clone());

        let record = ex.extract("scan.pdf", b"not a pdf at all").await;
        assert_eq!(record.method, ExtractionMethod::ExternalTool);
        assert_eq!(record.identifiers, vec!["FV/5/PL/2501"]);
        assert_eq!(tool.calls(), 1);
    }

    #[tokio::test]
    async fn tool_failure_falls_through_to_raw_scan() {
        let tool = FakeTool::failing();
        let ex = extractor().with_tool(tool.clone());

        let record = ex.extract("x.pdf", b"junk FV/8/PL/2501 junk").await;
        assert_eq!(record.method, ExtractionMethod::RawScan);
        assert_eq!(record.identifiers, vec!["FV/8/PL/2501"]);
        assert_eq!(tool.calls(), 1);
    }
}
