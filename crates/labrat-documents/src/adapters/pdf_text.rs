//! PdfText extraction adapter - extracts text from PDFs using `pdftotext` (poppler-utils).

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::process::Command;
use tracing::{debug, warn};

use labrat_core::defaults::EXTRACTION_CMD_TIMEOUT_SECS;
use labrat_core::{Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

use super::{run_cmd_with_timeout, text_stats, write_temp_file};

/// Extracts the text layer of a PDF. Scanned PDFs without one are rejected.
pub struct PdfTextAdapter;

/// Parse `pdfinfo` output into a JSON metadata object.
fn parse_pdfinfo(output: &str) -> serde_json::Map<String, JsonValue> {
    let mut metadata = serde_json::Map::new();

    for line in output.lines() {
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim().to_lowercase().replace(' ', "_");
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            if key == "pages" {
                if let Ok(pages) = value.parse::<u64>() {
                    metadata.insert(key, JsonValue::Number(pages.into()));
                    continue;
                }
            }
            metadata.insert(key, JsonValue::String(value.to_string()));
        }
    }

    metadata
}

#[async_trait]
impl ExtractionAdapter for PdfTextAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::PdfText
    }

    async fn extract(
        &self,
        data: &[u8],
        filename: &str,
        _mime_type: &str,
    ) -> Result<ExtractionResult> {
        if data.is_empty() {
            return Err(Error::UnreadableDocument(format!(
                "File '{}' is empty",
                filename
            )));
        }

        if data.len() < 4 || &data[0..4] != b"%PDF" {
            return Err(Error::UnreadableDocument(format!(
                "File '{}' is not a valid PDF (missing %PDF header)",
                filename
            )));
        }

        let tmpfile = write_temp_file(data, ".pdf")?;
        let tmp_path = tmpfile.path().to_string_lossy().to_string();

        let mut metadata = match run_cmd_with_timeout(
            Command::new("pdfinfo").arg(&tmp_path),
            EXTRACTION_CMD_TIMEOUT_SECS,
        )
        .await
        {
            Ok(output) => parse_pdfinfo(&output),
            Err(e) => {
                warn!(filename, error = %e, "pdfinfo failed, continuing without metadata");
                serde_json::Map::new()
            }
        };

        let text = run_cmd_with_timeout(
            Command::new("pdftotext")
                .arg("-layout")
                .arg(&tmp_path)
                .arg("-"),
            EXTRACTION_CMD_TIMEOUT_SECS,
        )
        .await?;

        if text.trim().is_empty() {
            return Err(Error::UnreadableDocument(format!(
                "File '{}' has no extractable text layer",
                filename
            )));
        }

        if let JsonValue::Object(stats) = text_stats(&text) {
            metadata.extend(stats);
        }
        debug!(filename, chars = text.len(), "PDF text extracted");

        Ok(ExtractionResult {
            extracted_text: text,
            metadata: JsonValue::Object(metadata),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match Command::new("pdftotext").arg("-v").output().await {
            // pdftotext -v exits with 0 or 99 depending on the poppler version
            Ok(output) => Ok(output.status.success() || output.status.code() == Some(99)),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "pdf_text"
    }
}
