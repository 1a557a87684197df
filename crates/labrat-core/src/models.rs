//! Request-scoped data model for LabRat.
//!
//! Every type in this module lives for exactly one client call: nothing is
//! persisted, cached, or shared between requests.

use std::collections::BTreeMap;
use std::fmt;

use base64::Engine;
use serde::{Deserialize, Serialize};

use crate::defaults;
use crate::Error;

// =============================================================================
// MEDIA
// =============================================================================

/// Image encodings understood by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageEncoding {
    Png,
    Jpeg,
    Webp,
    Gif,
}

impl ImageEncoding {
    /// Encodings the vision providers declare they accept.
    pub const PROVIDER_ACCEPTED: &'static [ImageEncoding] =
        &[ImageEncoding::Png, ImageEncoding::Jpeg, ImageEncoding::Webp];

    /// Parse an image mime type such as `image/png` or `image/jpg`.
    pub fn from_mime(mime: &str) -> Option<Self> {
        match mime.trim().to_ascii_lowercase().as_str() {
            "image/png" => Some(Self::Png),
            "image/jpeg" | "image/jpg" | "image/pjpeg" => Some(Self::Jpeg),
            "image/webp" => Some(Self::Webp),
            "image/gif" => Some(Self::Gif),
            _ => None,
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpeg => "image/jpeg",
            Self::Webp => "image/webp",
            Self::Gif => "image/gif",
        }
    }

    /// Short format name as used on the provider wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpeg => "jpeg",
            Self::Webp => "webp",
            Self::Gif => "gif",
        }
    }
}

impl fmt::Display for ImageEncoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared or sniffed kind of an uploaded buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image(ImageEncoding),
    Pdf,
    PlainText,
    WordProcessing,
    Unknown,
}

impl MediaKind {
    /// Classify a mime type.
    pub fn from_mime(mime: &str) -> Self {
        if let Some(encoding) = ImageEncoding::from_mime(mime) {
            return Self::Image(encoding);
        }
        match mime.trim().to_ascii_lowercase().as_str() {
            "application/pdf" => Self::Pdf,
            "text/plain" | "text/markdown" | "text/csv" | "text/x-python" => Self::PlainText,
            "application/msword"
            | "application/vnd.openxmlformats-officedocument.wordprocessingml.document"
            | "application/vnd.oasis.opendocument.text"
            | "application/rtf" => Self::WordProcessing,
            _ => Self::Unknown,
        }
    }

    /// Classify by filename extension.
    pub fn from_filename(filename: &str) -> Self {
        let ext = match filename.rsplit_once('.') {
            Some((_, ext)) => ext.to_ascii_lowercase(),
            None => return Self::Unknown,
        };
        match ext.as_str() {
            "png" => Self::Image(ImageEncoding::Png),
            "jpg" | "jpeg" => Self::Image(ImageEncoding::Jpeg),
            "webp" => Self::Image(ImageEncoding::Webp),
            "gif" => Self::Image(ImageEncoding::Gif),
            "pdf" => Self::Pdf,
            "txt" | "md" | "csv" | "py" | "sql" => Self::PlainText,
            "doc" | "docx" | "odt" | "rtf" => Self::WordProcessing,
            _ => Self::Unknown,
        }
    }

    pub fn is_image(&self) -> bool {
        matches!(self, Self::Image(_))
    }
}

/// A client-supplied buffer with its declared or sniffed media kind.
/// Lives only for the request that carried it.
#[derive(Debug, Clone)]
pub struct RawMedia {
    pub data: Vec<u8>,
    pub kind: MediaKind,
    pub filename: Option<String>,
}

impl RawMedia {
    /// Image encoding the kind claims, if it is an image at all.
    pub fn declared_encoding(&self) -> Option<ImageEncoding> {
        match self.kind {
            MediaKind::Image(encoding) => Some(encoding),
            _ => None,
        }
    }
}

/// An image that satisfies the provider's format, size and dimension limits.
///
/// Produced only by the image normalizer; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedImage {
    pub encoding: ImageEncoding,
    pub width: u32,
    pub height: u32,
    pub bytes: Vec<u8>,
    pub size_bytes: usize,
}

impl NormalizedImage {
    pub fn to_base64(&self) -> String {
        base64::engine::general_purpose::STANDARD.encode(&self.bytes)
    }

    /// `data:<mime>;base64,<payload>` form, as OpenAI-style APIs expect.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.encoding.mime_type(), self.to_base64())
    }

    /// Length of the base64 expansion without allocating it.
    pub fn base64_len(&self) -> usize {
        base64_len(self.size_bytes)
    }
}

/// Length of the padded standard base64 encoding of `n` bytes.
pub fn base64_len(n: usize) -> usize {
    n.div_ceil(3) * 4
}

// =============================================================================
// INFERENCE REQUEST
// =============================================================================

/// Prompt text built from a fixed template plus caller content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

/// One item of a multi-part user message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentItem {
    Text(String),
    Image(NormalizedImage),
}

/// Ordered content items for a single provider call. Text precedes images.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InferencePayload {
    items: Vec<ContentItem>,
}

impl InferencePayload {
    /// Build a payload; only the payload assembler should call this.
    pub fn from_items(items: Vec<ContentItem>) -> Self {
        Self { items }
    }

    pub fn items(&self) -> &[ContentItem] {
        &self.items
    }

    /// The first text item.
    pub fn text(&self) -> Option<&str> {
        self.items.iter().find_map(|item| match item {
            ContentItem::Text(text) => Some(text.as_str()),
            ContentItem::Image(_) => None,
        })
    }

    /// The first image item.
    pub fn image(&self) -> Option<&NormalizedImage> {
        self.items.iter().find_map(|item| match item {
            ContentItem::Image(image) => Some(image),
            ContentItem::Text(_) => None,
        })
    }

    pub fn has_image(&self) -> bool {
        self.image().is_some()
    }
}

/// Request classes, each with its own fixed generation parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestClass {
    /// Guidance-only tutoring replies.
    General,
    /// Structured analysis of a whiteboard drawing.
    DrawingAnalysis,
    /// Drawing analysis with the full reasoning write-up.
    DetailedReasoning,
}

impl RequestClass {
    pub fn parameters(&self) -> InferenceParameters {
        let max_output_tokens = match self {
            Self::General => defaults::GENERAL_MAX_TOKENS,
            Self::DrawingAnalysis => defaults::DRAWING_MAX_TOKENS,
            Self::DetailedReasoning => defaults::REASONING_MAX_TOKENS,
        };
        InferenceParameters {
            max_output_tokens,
            temperature: defaults::TEMPERATURE,
            top_p: defaults::TOP_P,
        }
    }

    /// Whether a call in this class is meaningless without an image.
    pub fn requires_image(&self) -> bool {
        matches!(self, Self::DrawingAnalysis | Self::DetailedReasoning)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::DrawingAnalysis => "drawing_analysis",
            Self::DetailedReasoning => "detailed_reasoning",
        }
    }
}

impl fmt::Display for RequestClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::General => write!(f, "general guidance"),
            Self::DrawingAnalysis => write!(f, "drawing analysis"),
            Self::DetailedReasoning => write!(f, "detailed reasoning analysis"),
        }
    }
}

/// Generation parameters sent with every provider call.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InferenceParameters {
    pub max_output_tokens: u32,
    pub temperature: f32,
    pub top_p: f32,
}

/// Raw provider reply and the model that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub text: String,
    pub model: String,
}

// =============================================================================
// EXTRACTED ARTIFACTS
// =============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CellType {
    #[default]
    Code,
    Markdown,
}

/// One fenced code block pulled out of model text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeCell {
    #[serde(default)]
    pub cell_type: CellType,
    #[serde(default = "default_language")]
    pub language: String,
    /// Body of a leading comment line, if the block had one.
    #[serde(default)]
    pub description: Option<String>,
    pub code: String,
    /// 1-based position in order of appearance.
    #[serde(default)]
    pub index: u32,
}

fn default_language() -> String {
    "python".to_string()
}

/// A named reasoning subsection of the model's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReasoningSection {
    pub heading: String,
    pub text: String,
}

/// Everything the response extractor found in one reply.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedArtifacts {
    pub code_cells: Vec<CodeCell>,
    /// Score label (lowercase) to value in `[1, 10]`.
    pub scores: BTreeMap<String, u8>,
    pub reasoning_sections: Vec<ReasoningSection>,
}

impl ExtractedArtifacts {
    /// Score for `label`, or the neutral default when it was not found.
    pub fn score(&self, label: &str) -> u8 {
        self.scores
            .get(&label.to_ascii_lowercase())
            .copied()
            .unwrap_or(defaults::DEFAULT_SCORE)
    }

    pub fn feasibility_score(&self) -> u8 {
        self.score(defaults::FEASIBILITY_LABEL)
    }

    pub fn confidence_score(&self) -> u8 {
        self.score(defaults::CONFIDENCE_LABEL)
    }

    pub fn has_reasoning(&self) -> bool {
        !self.reasoning_sections.is_empty()
    }
}

// =============================================================================
// NOTEBOOK
// =============================================================================

/// Synthesized markdown cell (introduction, conclusion).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkdownCell {
    pub cell_type: CellType,
    pub content: String,
}

impl MarkdownCell {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            cell_type: CellType::Markdown,
            content: content.into(),
        }
    }
}

/// A notebook cell; serialized flat with its `cell_type` discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NotebookCell {
    Code(CodeCell),
    Markdown(MarkdownCell),
}

/// Ordered notebook returned to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookDocument {
    pub name: String,
    pub description: String,
    pub cells: Vec<NotebookCell>,
}

// =============================================================================
// CALLER-FACING RESULT
// =============================================================================

/// The result shape every LabRat operation hands back to its caller.
///
/// Absent fields are omitted from JSON. A failed request carries only
/// `error` (and `filename` for uploads); `success` is omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisResult {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook_cells: Option<Vec<CodeCell>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feasibility_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code_conversion_feasible: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<Vec<ReasoningSection>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notebook: Option<NotebookDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalysisResult {
    /// Successful result carrying the raw reply.
    pub fn from_response(response: ModelResponse) -> Self {
        Self {
            success: Some(true),
            text: Some(response.text),
            model: Some(response.model),
            ..Default::default()
        }
    }

    /// Failed result: a single descriptive message and no partial artifacts.
    pub fn from_error(err: &Error) -> Self {
        Self {
            error: Some(err.to_string()),
            ..Default::default()
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn is_success(&self) -> bool {
        self.success == Some(true) && self.error.is_none()
    }
}
