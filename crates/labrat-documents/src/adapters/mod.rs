//! Extraction adapter implementations.

pub mod office_convert;
pub mod pdf_text;
pub mod text_native;

pub use office_convert::OfficeConvertAdapter;
pub use pdf_text::PdfTextAdapter;
pub use text_native::TextNativeAdapter;

use std::io::Write;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::process::Command;

use labrat_core::{Error, Result};

/// Run an external converter with a timeout, returning stdout.
pub(crate) async fn run_cmd_with_timeout(cmd: &mut Command, timeout_secs: u64) -> Result<String> {
    let output = tokio::time::timeout(Duration::from_secs(timeout_secs), cmd.output())
        .await
        .map_err(|_| {
            Error::UnreadableDocument(format!(
                "External command timed out after {}s",
                timeout_secs
            ))
        })?
        .map_err(|e| Error::UnreadableDocument(format!("Failed to execute command: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(Error::UnreadableDocument(format!(
            "Command failed ({}): {}",
            output.status,
            stderr.trim()
        )));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Copy `data` into a temp file carrying `suffix`, for tools that read paths.
pub(crate) fn write_temp_file(data: &[u8], suffix: &str) -> Result<NamedTempFile> {
    let mut tmpfile = tempfile::Builder::new()
        .prefix("labrat-")
        .suffix(suffix)
        .tempfile()
        .map_err(|e| Error::UnreadableDocument(format!("Failed to create temp file: {}", e)))?;
    tmpfile
        .write_all(data)
        .map_err(|e| Error::UnreadableDocument(format!("Failed to write temp file: {}", e)))?;
    Ok(tmpfile)
}

/// Character and line counts shared by every adapter's metadata.
pub(crate) fn text_stats(text: &str) -> serde_json::Value {
    serde_json::json!({
        "char_count": text.chars().count(),
        "line_count": text.lines().count(),
    })
}
