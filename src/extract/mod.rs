//! Identifier extraction from document content.
//!
//! Extracts invoice numbers from PDFs using a layered fallback strategy:
//!
//! - text layer decoding via the pdf-extract crate
//! - `pdftotext` (Poppler) as an out-of-process fallback (default tool)
//! - a raw byte scan that recovers ASCII identifiers from documents whose
//!   text layer is absent or unreadable
//!
//! One unreadable document never aborts a batch; it degrades to an empty
//! identifier set.

mod batch;
mod extractor;
mod pattern;
mod tool;

pub use batch::{BatchIndex, BatchProcessor, DocumentInput};
pub use extractor::{DocumentExtractor, ExtractionMethod, ExtractionRecord};
pub use pattern::InvoicePattern;
pub use tool::{Pdftotext, TextTool, ToolError};
