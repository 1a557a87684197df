//! Centralized default constants for LabRat.
//!
//! **This module is the single source of truth** for shared default values.
//! Crates reference these constants instead of defining their own magic
//! numbers.

// =============================================================================
// IMAGE NORMALIZATION
// =============================================================================

/// Longest edge allowed for images attached to general chat requests.
pub const CHAT_MAX_DIMENSION: u32 = 1568;

/// Longest edge allowed for whiteboard drawings sent for analysis.
pub const DRAWING_MAX_DIMENSION: u32 = 1024;

/// Effective provider budget for the base64-encoded image, in bytes.
pub const IMAGE_SIZE_BUDGET_BYTES: usize = 3 * 1024 * 1024;

/// Images narrower or shorter than this are rejected as unusable.
pub const MIN_IMAGE_DIMENSION: u32 = 10;

/// JPEG quality for the general chat path.
pub const CHAT_JPEG_QUALITY: u8 = 95;

/// JPEG quality used when a drawing's PNG encoding exceeds the size budget.
pub const FALLBACK_JPEG_QUALITY: u8 = 85;

/// Lowest JPEG quality tried while fitting an image into the size budget.
pub const MIN_JPEG_QUALITY: u8 = 50;

/// Quality decrement between successive JPEG attempts.
pub const JPEG_QUALITY_STEP: u8 = 10;

/// Scale applied per downscale step once the quality floor is reached.
pub const BUDGET_DOWNSCALE_FACTOR: f64 = 0.75;

/// Downscale steps attempted before giving up on the size budget.
pub const MAX_BUDGET_DOWNSCALES: u32 = 4;

/// Encoded (base64) images at or below this length are treated as truncated.
pub const MIN_ENCODED_IMAGE_LEN: usize = 100;

/// Mime type assumed when an image arrives without a data-URL prefix.
pub const DEFAULT_IMAGE_MIME: &str = "image/png";

// =============================================================================
// INFERENCE PARAMETERS
// =============================================================================

/// Output token cap for general guidance requests.
pub const GENERAL_MAX_TOKENS: u32 = 500;

/// Output token cap for structured drawing analysis.
pub const DRAWING_MAX_TOKENS: u32 = 2500;

/// Output token cap for detailed reasoning analysis.
pub const REASONING_MAX_TOKENS: u32 = 3000;

/// Sampling temperature shared by every request class.
pub const TEMPERATURE: f32 = 0.1;

/// Nucleus sampling cutoff shared by every request class.
pub const TOP_P: f32 = 0.9;

// =============================================================================
// RESPONSE EXTRACTION
// =============================================================================

/// Score reported when the model's text carries no parsable score.
pub const DEFAULT_SCORE: u8 = 5;

/// Lowest accepted score value.
pub const MIN_SCORE: u8 = 1;

/// Highest accepted score value.
pub const MAX_SCORE: u8 = 10;

/// Minimum feasibility score for code conversion to be recommended.
pub const CONVERSION_THRESHOLD: u8 = 6;

/// Label of the feasibility score heading.
pub const FEASIBILITY_LABEL: &str = "feasibility score";

/// Label of the confidence score heading.
pub const CONFIDENCE_LABEL: &str = "confidence level";

// =============================================================================
// PROVIDERS
// =============================================================================

/// Default provider region.
pub const BEDROCK_REGION: &str = "us-west-2";

/// Default model for the primary vision backend.
pub const BEDROCK_MODEL_ID: &str = "us.anthropic.claude-opus-4-20250514-v1:0";

/// Default base URL for the alternate (OpenAI-compatible) backend.
pub const OPENAI_URL: &str = "https://api.openai.com/v1";

/// Default model for the alternate vision backend.
pub const OPENAI_VISION_MODEL: &str = "gpt-4o-mini";

/// Default provider request timeout in seconds.
pub const INFERENCE_TIMEOUT_SECS: u64 = 300;

/// Timeout for backend health probes in seconds.
pub const HEALTH_CHECK_TIMEOUT_SECS: u64 = 5;

// =============================================================================
// DOCUMENT EXTRACTION
// =============================================================================

/// Timeout for external extraction commands (pdftotext, pandoc).
pub const EXTRACTION_CMD_TIMEOUT_SECS: u64 = 60;

/// Extracted document text beyond this many characters is cut before prompting.
pub const DOCUMENT_PROMPT_MAX_CHARS: usize = 12_000;

// =============================================================================
// SERVER
// =============================================================================

/// Default HTTP server port.
pub const SERVER_PORT: u16 = 8000;

/// Default request body limit (base64 images are large).
pub const MAX_BODY_BYTES: usize = 25 * 1024 * 1024;

/// Service name reported by the health endpoint.
pub const SERVICE_NAME: &str = "LabRat API";

// =============================================================================
// ENVIRONMENT VARIABLES
// =============================================================================

/// Selects the default vision backend ("bedrock" or "openai").
pub const ENV_VISION_BACKEND: &str = "LABRAT_VISION_BACKEND";

/// Bedrock model identifier.
pub const ENV_BEDROCK_MODEL_ID: &str = "BEDROCK_MODEL_ID";

/// Bedrock region (falls back to AWS_REGION).
pub const ENV_BEDROCK_REGION: &str = "BEDROCK_REGION";

/// Bedrock API key (falls back to AWS_BEARER_TOKEN_BEDROCK).
pub const ENV_BEDROCK_API_KEY: &str = "BEDROCK_API_KEY";

/// Full endpoint override for the Bedrock runtime.
pub const ENV_BEDROCK_ENDPOINT: &str = "BEDROCK_ENDPOINT";

/// Alternate backend vision model.
pub const ENV_OPENAI_VISION_MODEL: &str = "OPENAI_VISION_MODEL";
