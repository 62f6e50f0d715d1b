//! External text extraction tools.
//!
//! The extractor depends on a [`TextTool`] capability rather than a concrete
//! subprocess call, so deployments can disable the tier or swap the tool.

use std::io::Write;
use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors from an external tool invocation. All of them are treated as
/// "tier unavailable" by the extractor and fall through to the next tier.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("external tool not found: {0}")]
    NotFound(String),

    #[error("external tool failed: {0}")]
    Failed(String),

    #[error("external tool timed out after {0}s")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// An out-of-process text extraction capability.
#[async_trait]
pub trait TextTool: Send + Sync {
    fn name(&self) -> &str;

    /// Cheap availability probe; a tool that is not available is skipped
    /// without being invoked.
    fn is_available(&self) -> bool;

    async fn extract_text(&self, bytes: &[u8]) -> Result<String, ToolError>;
}

/// `pdftotext` from poppler-utils, invoked with a bounded timeout.
pub struct Pdftotext {
    timeout: Duration,
}

impl Pdftotext {
    pub fn new(timeout_secs: u64) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
        }
    }

    async fn run(&self, path: &Path) -> Result<String, ToolError> {
        let child = tokio::process::Command::new("pdftotext")
            .args(["-layout", "-enc", "UTF-8"])
            .arg(path)
            .arg("-") // Output to stdout
            .kill_on_drop(true)
            .output();

        let output = match tokio::time::timeout(self.timeout, child).await {
            Ok(result) => result,
            Err(_) => return Err(ToolError::Timeout(self.timeout.as_secs())),
        };

        match output {
            Ok(output) => {
                if output.status.success() {
                    Ok(String::from_utf8_lossy(&output.stdout).to_string())
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr);
                    Err(ToolError::Failed(format!("pdftotext: {}", stderr.trim())))
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(ToolError::NotFound(
                "pdftotext (install poppler-utils)".to_string(),
            )),
            Err(e) => Err(ToolError::Io(e)),
        }
    }
}

#[async_trait]
impl TextTool for Pdftotext {
    fn name(&self) -> &str {
        "pdftotext"
    }

    fn is_available(&self) -> bool {
        which::which("pdftotext").is_ok()
    }

    async fn extract_text(&self, bytes: &[u8]) -> Result<String, ToolError> {
        // pdftotext reads from a file, not stdin
        let mut tmp = tempfile::NamedTempFile::new()?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        self.run(tmp.path()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdftotext_reports_its_name() {
        let tool = Pdftotext::new(10);
        assert_eq!(tool.name(), "pdftotext");
    }
}
