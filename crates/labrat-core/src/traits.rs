//! Trait seams for LabRat.
//!
//! Inference backends and document extraction adapters are the two points
//! where the pipeline talks to the outside world. Both are async and
//! object-safe so the assistant can hold them behind `Arc<dyn ...>`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::{
    ImageEncoding, InferenceParameters, InferencePayload, MediaKind, ModelResponse, Result,
};

// =============================================================================
// INFERENCE BACKEND TRAITS
// =============================================================================

/// A hosted multimodal model reachable over HTTP.
///
/// Implementations perform exactly one provider call per `invoke` and never
/// retry; any failure surfaces as `Error::InferenceFailure`.
#[async_trait]
pub trait InferenceBackend: Send + Sync {
    /// Send an assembled payload and return the model's reply text.
    async fn invoke(
        &self,
        payload: &InferencePayload,
        params: &InferenceParameters,
    ) -> Result<ModelResponse>;

    /// Check whether the provider is reachable and configured.
    async fn health_check(&self) -> Result<bool>;

    /// Model identifier sent to the provider.
    fn model_name(&self) -> &str;

    /// Short backend name for logs ("bedrock", "openai", "mock").
    fn backend_name(&self) -> &'static str;

    /// Image encodings the provider accepts.
    fn accepted_encodings(&self) -> &[ImageEncoding] {
        ImageEncoding::PROVIDER_ACCEPTED
    }
}

// =============================================================================
// EXTRACTION ADAPTER TRAITS
// =============================================================================

/// How an uploaded document is turned into plain text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStrategy {
    /// Text-like files decoded directly as UTF-8.
    #[default]
    TextNative,
    /// PDF text layer via pdftotext.
    PdfText,
    /// Word processing formats converted via pandoc.
    OfficeConvert,
}

impl ExtractionStrategy {
    /// Strategy for a document kind; images and unknown kinds have none.
    pub fn for_media(kind: MediaKind) -> Option<Self> {
        match kind {
            MediaKind::PlainText => Some(Self::TextNative),
            MediaKind::Pdf => Some(Self::PdfText),
            MediaKind::WordProcessing => Some(Self::OfficeConvert),
            MediaKind::Image(_) | MediaKind::Unknown => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TextNative => "text_native",
            Self::PdfText => "pdf_text",
            Self::OfficeConvert => "office_convert",
        }
    }
}

/// Result of extracting text from an uploaded document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionResult {
    /// Extracted text content.
    pub extracted_text: String,
    /// Format-specific metadata (page count, char count, tool used).
    pub metadata: JsonValue,
}

/// Adapter for extracting text from uploaded documents.
///
/// Each adapter handles one `ExtractionStrategy` and is registered in an
/// extraction registry that dispatches on the detected strategy.
#[async_trait]
pub trait ExtractionAdapter: Send + Sync {
    /// The extraction strategy this adapter handles.
    fn strategy(&self) -> ExtractionStrategy;

    /// Extract text from raw file data.
    async fn extract(&self, data: &[u8], filename: &str, mime_type: &str)
        -> Result<ExtractionResult>;

    /// Check if the adapter's external dependencies are available.
    async fn health_check(&self) -> Result<bool>;

    /// Human-readable name of this adapter.
    fn name(&self) -> &str;
}
