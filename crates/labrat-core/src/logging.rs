//! Structured logging schema and field name constants for LabRat.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation can query by the same names across subsystems.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (startup, shutdown), operation completions |
//! | DEBUG | Decision points, intermediate values, config choices |
//! | TRACE | Per-item iteration, high-volume data (cells, sections) |

// ─── Identity fields ───────────────────────────────────────────────────────

/// Subsystem originating the log event.
/// Values: "api", "inference", "image", "documents"
pub const SUBSYSTEM: &str = "subsystem";

/// Logical operation name.
/// Examples: "normalize", "invoke", "extract", "analyze_drawing"
pub const OPERATION: &str = "op";

/// Request class driving inference parameters.
pub const REQUEST_CLASS: &str = "request_class";

// ─── Image fields ──────────────────────────────────────────────────────────

/// Image width in pixels.
pub const WIDTH: &str = "width";

/// Image height in pixels.
pub const HEIGHT: &str = "height";

/// Image encoding ("png", "jpeg", "webp").
pub const ENCODING: &str = "encoding";

/// Byte size of an encoded artifact.
pub const SIZE_BYTES: &str = "size_bytes";

// ─── Measurement fields ────────────────────────────────────────────────────

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Byte length of a prompt.
pub const PROMPT_LEN: &str = "prompt_len";

/// Byte length of a model response.
pub const RESPONSE_LEN: &str = "response_len";

/// Number of code cells extracted.
pub const CELL_COUNT: &str = "cell_count";

// ─── Inference fields ──────────────────────────────────────────────────────

/// Model name used for inference.
pub const MODEL: &str = "model";

/// Backend kind ("bedrock", "openai").
pub const BACKEND: &str = "backend";

// ─── Outcome fields ────────────────────────────────────────────────────────

/// Boolean success/failure indicator.
pub const SUCCESS: &str = "success";

/// Error variant name (see `Error::kind`).
pub const ERROR_KIND: &str = "error_kind";

/// Error message when an operation fails.
pub const ERROR_MSG: &str = "error";
