//! # labrat-inference
//!
//! Vision inference pipeline for the LabRat assistant.
//!
//! This crate provides:
//! - Image normalization to provider constraints (size, format, alpha)
//! - Payload assembly with pre-flight validation
//! - Bedrock Converse backend (primary) and OpenAI-compatible backend (alternate)
//! - Prompt templates for the tutoring request kinds
//! - Best-effort extraction of code cells, scores and reasoning from replies
//! - Notebook assembly from extracted code cells
//!
//! # Feature Flags
//!
//! - `mock`: Enable `MockInferenceBackend` for tests in dependent crates
//!
//! # Example
//!
//! ```rust,no_run
//! use labrat_inference::{assemble, extract, normalize, BedrockBackend, NormalizeOptions};
//! use labrat_core::{InferenceBackend, Prompt, RequestClass};
//!
//! #[tokio::main]
//! async fn main() -> labrat_core::Result<()> {
//!     let backend = BedrockBackend::from_env()?;
//!     let image = normalize("data:image/png;base64,...", &NormalizeOptions::drawing())?;
//!     let payload = assemble(
//!         Prompt::new("Describe this drawing"),
//!         Some(image),
//!         RequestClass::DrawingAnalysis,
//!         backend.accepted_encodings(),
//!     )?;
//!     let reply = backend
//!         .invoke(&payload, &RequestClass::DrawingAnalysis.parameters())
//!         .await?;
//!     let artifacts = extract(&reply.text);
//!     println!("{} code cells", artifacts.code_cells.len());
//!     Ok(())
//! }
//! ```

pub mod bedrock;
pub mod config;
pub mod extract;
pub mod notebook;
pub mod normalizer;
pub mod openai;
pub mod payload;
pub mod prompts;

// Mock inference backend for testing
#[cfg(any(test, feature = "mock"))]
pub mod mock;

// Re-export core types
pub use labrat_core::*;

pub use bedrock::{BedrockBackend, BedrockConfig};
pub use config::{BackendKind, ConfigError, ConfigResult, VisionConfig};
pub use extract::{conversion_recommended, extract, extract_code_cells, extract_score};
pub use normalizer::{normalize, normalize_media, parse_data_url, EncodingPolicy, NormalizeOptions};
pub use notebook::{build_notebook, to_ipynb};
pub use openai::{OpenAIBackend, OpenAIConfig};
pub use payload::assemble;

#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCall, MockInferenceBackend};
