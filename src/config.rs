//! Configuration management.
//!
//! Settings come from an optional TOML file merged over built-in defaults.
//! The file is located through `--config`, the `INVREC_CONFIG` environment
//! variable, or `invrec.toml` in the working directory, in that order.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default invoice number shape: `FV/<digits>/PL/<4-digit year>`.
///
/// This pattern is part of the external contract: it decides what counts as
/// an invoice identifier in both document content and report output. Change
/// it via `identifier_pattern` when the document format changes.
pub const DEFAULT_IDENTIFIER_PATTERN: &str = r"FV/\d{1,4}/PL/\d{4}";

/// Runtime settings for the reconciliation service.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Default bind address for `invrec serve`.
    pub bind: String,

    /// Regex describing an invoice identifier.
    pub identifier_pattern: String,

    /// Whether the external `pdftotext` fallback tier may be used.
    pub tool_enabled: bool,

    /// Per-invocation timeout for the external tool, in seconds.
    pub tool_timeout_secs: u64,

    /// Wall-clock budget for a whole reconciliation run, in seconds.
    pub deadline_secs: u64,

    /// Number of documents extracted concurrently.
    pub extract_workers: usize,

    /// Maximum entries per list in API preview payloads.
    pub preview_limit: usize,

    /// Maximum accepted ledger sheet size in bytes.
    pub max_sheet_bytes: usize,

    /// Maximum accepted size per PDF document in bytes.
    pub max_document_bytes: usize,

    /// Maximum accepted ZIP bundle size in bytes.
    pub max_bundle_bytes: usize,

    /// Upper bound on a whole multipart request body in bytes.
    pub max_request_bytes: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3030".to_string(),
            identifier_pattern: DEFAULT_IDENTIFIER_PATTERN.to_string(),
            tool_enabled: true,
            tool_timeout_secs: 10,
            deadline_secs: 50,
            extract_workers: 4,
            preview_limit: 50,
            max_sheet_bytes: 10 * 1024 * 1024,
            max_document_bytes: 15 * 1024 * 1024,
            max_bundle_bytes: 20 * 1024 * 1024,
            max_request_bytes: 64 * 1024 * 1024,
        }
    }
}

/// Load settings from an optional TOML file.
pub fn load_settings(path: Option<&Path>) -> anyhow::Result<Settings> {
    let path = match path {
        Some(p) => Some(p.to_path_buf()),
        None => default_config_path(),
    };

    match path {
        Some(p) if p.exists() => {
            let raw = fs::read_to_string(&p)?;
            let settings: Settings = toml::from_str(&raw)
                .map_err(|e| anyhow::anyhow!("invalid config {}: {}", p.display(), e))?;
            tracing::info!("loaded settings from {}", p.display());
            Ok(settings)
        }
        Some(p) => Err(anyhow::anyhow!("config file not found: {}", p.display())),
        None => Ok(Settings::default()),
    }
}

fn default_config_path() -> Option<PathBuf> {
    if let Ok(env_path) = std::env::var("INVREC_CONFIG") {
        return Some(PathBuf::from(env_path));
    }
    let local = PathBuf::from("invrec.toml");
    if local.exists() {
        return Some(local);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let s = Settings::default();
        assert_eq!(s.identifier_pattern, DEFAULT_IDENTIFIER_PATTERN);
        assert!(s.tool_enabled);
        assert_eq!(s.tool_timeout_secs, 10);
        assert!(s.max_sheet_bytes < s.max_bundle_bytes);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let s: Settings = toml::from_str("tool_enabled = false\ndeadline_secs = 5\n").unwrap();
        assert!(!s.tool_enabled);
        assert_eq!(s.deadline_secs, 5);
        assert_eq!(s.extract_workers, Settings::default().extract_workers);
        assert_eq!(s.identifier_pattern, DEFAULT_IDENTIFIER_PATTERN);
    }
}
