//! Error types for LabRat.

use thiserror::Error;

/// Result type alias using LabRat's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for LabRat operations.
///
/// Every variant is terminal for the request that produced it: nothing in
/// the pipeline retries. The assistant service turns any of these into a
/// caller-facing `{ "error": ... }` result.
#[derive(Error, Debug)]
pub enum Error {
    /// Base64 payload could not be decoded, or decoded to nothing
    #[error("Invalid image encoding: {0}")]
    InvalidEncoding(String),

    /// Decoded bytes are not an image the codec understands
    #[error("Unreadable image: {0}")]
    UnreadableImage(String),

    /// Image is below the minimum usable dimension
    #[error("Image too small: {width}x{height} (minimum {min}px per side)")]
    ImageTooSmall { width: u32, height: u32, min: u32 },

    /// Re-encoding produced no usable bytes
    #[error("Image processing produced empty output")]
    EmptyOutput,

    /// No encoding attempt fit the provider's size budget
    #[error("Image exceeds size budget: {size_bytes} bytes base64 (budget {budget})")]
    ImageOverBudget { size_bytes: usize, budget: usize },

    /// Request class requires an image and none was supplied
    #[error("An image is required for {0}")]
    MissingImage(String),

    /// Image encoding is outside the provider's accepted set
    #[error("Unsupported image encoding: {0}")]
    UnsupportedImageEncoding(String),

    /// Provider call failed (transport, auth, throttling, provider error)
    #[error("Inference failed: {0}")]
    InferenceFailure(String),

    /// Uploaded document could not be turned into text
    #[error("Unreadable document: {0}")]
    UnreadableDocument(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),

    /// File I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Short machine-readable name of the variant, used as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            Error::InvalidEncoding(_) => "invalid_encoding",
            Error::UnreadableImage(_) => "unreadable_image",
            Error::ImageTooSmall { .. } => "image_too_small",
            Error::EmptyOutput => "empty_output",
            Error::ImageOverBudget { .. } => "image_over_budget",
            Error::MissingImage(_) => "missing_image",
            Error::UnsupportedImageEncoding(_) => "unsupported_image_encoding",
            Error::InferenceFailure(_) => "inference_failure",
            Error::UnreadableDocument(_) => "unreadable_document",
            Error::Config(_) => "config",
            Error::InvalidInput(_) => "invalid_input",
            Error::Serialization(_) => "serialization",
            Error::Internal(_) => "internal",
            Error::Io(_) => "io",
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization(e.to_string())
    }
}

impl From<base64::DecodeError> for Error {
    fn from(e: base64::DecodeError) -> Self {
        Error::InvalidEncoding(e.to_string())
    }
}
