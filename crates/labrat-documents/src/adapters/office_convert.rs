//! OfficeConvertAdapter - converts word-processing documents to plain text using pandoc.
//!
//! Supports: docx, odt, rtf. Legacy binary `.doc` files are rejected.

use async_trait::async_trait;
use serde_json::Value as JsonValue;
use tokio::process::Command;
use tracing::debug;

use labrat_core::defaults::EXTRACTION_CMD_TIMEOUT_SECS;
use labrat_core::{Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

use super::{run_cmd_with_timeout, text_stats, write_temp_file};

pub struct OfficeConvertAdapter;

/// Pandoc input format from the filename extension.
fn pandoc_input_format(filename: &str) -> Option<&'static str> {
    let (_, ext) = filename.rsplit_once('.')?;
    match ext.to_lowercase().as_str() {
        "docx" => Some("docx"),
        "odt" => Some("odt"),
        "rtf" => Some("rtf"),
        _ => None,
    }
}

/// Pandoc input format from the mime type.
fn pandoc_format_from_mime(mime_type: &str) -> Option<&'static str> {
    match mime_type {
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document" => Some("docx"),
        "application/vnd.oasis.opendocument.text" => Some("odt"),
        "application/rtf" | "text/rtf" => Some("rtf"),
        _ => None,
    }
}

#[async_trait]
impl ExtractionAdapter for OfficeConvertAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::OfficeConvert
    }

    async fn extract(
        &self,
        data: &[u8],
        filename: &str,
        mime_type: &str,
    ) -> Result<ExtractionResult> {
        if data.is_empty() {
            return Err(Error::UnreadableDocument(format!(
                "File '{}' is empty",
                filename
            )));
        }

        let format = pandoc_input_format(filename)
            .or_else(|| pandoc_format_from_mime(mime_type))
            .ok_or_else(|| {
                Error::UnreadableDocument(format!(
                    "File '{}' is not a supported word-processing format (docx, odt, rtf)",
                    filename
                ))
            })?;

        let tmpfile = write_temp_file(data, &format!(".{}", format))?;
        let tmp_path = tmpfile.path().to_string_lossy().to_string();

        debug!(filename, format, "Converting with pandoc");

        let text = run_cmd_with_timeout(
            Command::new("pandoc")
                .arg("-f")
                .arg(format)
                .arg("-t")
                .arg("plain")
                .arg("--wrap=none")
                .arg(&tmp_path),
            EXTRACTION_CMD_TIMEOUT_SECS,
        )
        .await?;

        if text.trim().is_empty() {
            return Err(Error::UnreadableDocument(format!(
                "File '{}' contains no text",
                filename
            )));
        }

        let mut metadata = text_stats(&text);
        if let JsonValue::Object(ref mut map) = metadata {
            map.insert("format".to_string(), JsonValue::String(format.to_string()));
        }

        Ok(ExtractionResult {
            extracted_text: text,
            metadata,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        match Command::new("pandoc").arg("--version").output().await {
            Ok(output) => Ok(output.status.success()),
            Err(_) => Ok(false),
        }
    }

    fn name(&self) -> &str {
        "office_convert"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pandoc_format_detection() {
        assert_eq!(pandoc_input_format("Lab Report.DOCX"), Some("docx"));
        assert_eq!(pandoc_input_format("notes.odt"), Some("odt"));
        assert_eq!(pandoc_input_format("legacy.doc"), None);
        assert_eq!(pandoc_input_format("no_extension"), None);
        assert_eq!(pandoc_format_from_mime("application/rtf"), Some("rtf"));
        assert_eq!(pandoc_format_from_mime("application/msword"), None);
    }

    #[test]
    fn test_office_convert_identity() {
        assert_eq!(
            OfficeConvertAdapter.strategy(),
            ExtractionStrategy::OfficeConvert
        );
        assert_eq!(OfficeConvertAdapter.name(), "office_convert");
    }

    #[tokio::test]
    async fn test_legacy_doc_rejected() {
        let err = OfficeConvertAdapter
            .extract(&[0xD0, 0xCF, 0x11, 0xE0], "old.doc", "application/msword")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnreadableDocument(_)));
    }

    #[tokio::test]
    async fn test_empty_input_rejected() {
        let err = OfficeConvertAdapter
            .extract(b"", "empty.docx", "")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[tokio::test]
    async fn test_rtf_conversion() {
        if !OfficeConvertAdapter.health_check().await.unwrap_or(false) {
            eprintln!("Skipping test_rtf_conversion: pandoc not installed");
            return;
        }

        let rtf = br"{\rtf1\ansi\deff0 {\fonttbl {\f0 Times;}} \f0 Hooke's law: F = -kx\par}";
        let result = OfficeConvertAdapter
            .extract(rtf, "hooke.rtf", "application/rtf")
            .await
            .unwrap();
        assert!(result.extracted_text.contains("F = -kx"));
        assert_eq!(result.metadata["format"], "rtf");
    }
}
