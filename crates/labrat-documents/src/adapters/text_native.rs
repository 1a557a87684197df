//! TextNative extraction adapter - handles plain text uploads.

use async_trait::async_trait;

use labrat_core::{Error, ExtractionAdapter, ExtractionResult, ExtractionStrategy, Result};

use super::text_stats;

/// Reads bytes as UTF-8, replacing invalid sequences.
pub struct TextNativeAdapter;

#[async_trait]
impl ExtractionAdapter for TextNativeAdapter {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::TextNative
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

        let text = String::from_utf8_lossy(data).into_owned();
        let metadata = text_stats(&text);

        Ok(ExtractionResult {
            extracted_text: text,
            metadata,
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "text_native"
    }
}
