//! OpenAI-compatible vision backend.
//!
//! Works with any endpoint implementing `POST /chat/completions` with image
//! content parts (OpenAI, Azure OpenAI, vLLM, LM Studio, Ollama's OpenAI
//! mode). The image travels as a `data:` URL.
//!
//! # Example
//!
//! ```rust,no_run
//! use labrat_inference::openai::{OpenAIBackend, OpenAIConfig};
//!
//! let backend = OpenAIBackend::new(OpenAIConfig {
//!     base_url: "http://localhost:11434/v1".to_string(),
//!     vision_model: "llava".to_string(),
//!     ..Default::default()
//! })
//! .unwrap();
//! ```

mod backend;
mod error;
mod types;

pub use backend::{OpenAIBackend, OpenAIConfig};
pub use error::{to_labrat_error, OpenAIErrorCode};
pub use types::*;
