//! Bedrock-specific error handling.
//!
//! Every provider failure becomes `Error::InferenceFailure`; the code only
//! shapes the message so logs and callers can tell failures apart.

use labrat_core::Error;

/// Bedrock runtime error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BedrockErrorCode {
    /// Missing or invalid API key, or no model access.
    AccessDenied,
    /// Too many requests.
    Throttling,
    /// Model identifier unknown in this region.
    ModelNotFound,
    /// Malformed request (bad image, token limits).
    Validation,
    /// The model itself failed or timed out.
    ModelError,
    /// Service-side failure.
    ServiceUnavailable,
    /// Unknown error.
    Unknown,
}

impl BedrockErrorCode {
    /// Determine error code from HTTP status and the `x-amzn-ErrorType` header.
    pub fn from_response(status: u16, error_type: &str) -> Self {
        let error_type = error_type.split(':').next().unwrap_or_default();
        match (status, error_type) {
            (401 | 403, _) | (_, "AccessDeniedException") => Self::AccessDenied,
            (429, _) | (_, "ThrottlingException") => Self::Throttling,
            (404, _) | (_, "ResourceNotFoundException") => Self::ModelNotFound,
            (_, "ModelTimeoutException" | "ModelErrorException") | (408 | 424, _) => {
                Self::ModelError
            }
            (400, _) | (_, "ValidationException") => Self::Validation,
            (500..=599, _) => Self::ServiceUnavailable,
            _ => Self::Unknown,
        }
    }

    fn label(&self) -> &'static str {
        match self {
            Self::AccessDenied => "Access denied",
            Self::Throttling => "Throttled",
            Self::ModelNotFound => "Model not found",
            Self::Validation => "Request rejected",
            Self::ModelError => "Model error",
            Self::ServiceUnavailable => "Service unavailable",
            Self::Unknown => "Provider error",
        }
    }
}

/// Convert a Bedrock error to a LabRat error.
pub fn to_labrat_error(model_id: &str, code: BedrockErrorCode, message: &str) -> Error {
    Error::InferenceFailure(format!(
        "Can't invoke '{}'. Reason: {}: {}",
        model_id,
        code.label(),
        message
    ))
}
