//! Bedrock Converse vision backend.
//!
//! Speaks `POST {endpoint}/model/{modelId}/converse` with a bearer API key.
//! One user message carries the prompt text followed by the image block.
//!
//! # Example
//!
//! ```rust,no_run
//! use labrat_inference::bedrock::{BedrockBackend, BedrockConfig};
//!
//! let backend = BedrockBackend::new(BedrockConfig {
//!     region: "us-east-1".to_string(),
//!     api_key: Some("bedrock-api-key".to_string()),
//!     ..Default::default()
//! })
//! .unwrap();
//! ```

mod backend;
mod error;
mod types;

pub use backend::{BedrockBackend, BedrockConfig};
pub use error::{to_labrat_error, BedrockErrorCode};
pub use types::*;
