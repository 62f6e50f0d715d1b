//! External tool availability check.

use console::style;

use crate::config::Settings;
use crate::extract::{Pdftotext, TextTool};

/// Report availability of the optional external extraction tool.
pub fn cmd_tools(settings: &Settings) -> anyhow::Result<()> {
    let tool = Pdftotext::new(settings.tool_timeout_secs);

    let mark = if tool.is_available() {
        style("✓").green()
    } else {
        style("✗").red()
    };
    println!(
        "  {} {} {}",
        mark,
        tool.name(),
        if tool.is_available() {
            "found"
        } else {
            "missing (install poppler-utils)"
        }
    );

    if !settings.tool_enabled {
        println!(
            "  {} external tool tier disabled in settings; extraction will fall back to raw byte scans",
            style("!").yellow()
        );
    }

    Ok(())
}
