//! OpenAI-compatible vision backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::error::{to_labrat_error, OpenAIErrorCode};
use super::types::{
    ChatCompletionRequest, ChatCompletionResponse, OpenAIError, OpenAIErrorResponse,
};
use crate::config::{validate_url, ConfigError, ConfigResult};
use labrat_core::{
    defaults, Error, InferenceBackend, InferenceParameters, InferencePayload, ModelResponse,
    Result,
};

/// OpenAI backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenAIConfig {
    /// Base URL for OpenAI-compatible API.
    pub base_url: String,
    /// API key for authentication (optional for local endpoints).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Vision-capable model.
    pub vision_model: String,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::OPENAI_URL.to_string(),
            api_key: None,
            vision_model: defaults::OPENAI_VISION_MODEL.to_string(),
            timeout_seconds: defaults::INFERENCE_TIMEOUT_SECS,
        }
    }
}

impl OpenAIConfig {
    /// Load from environment variables.
    ///
    /// - `OPENAI_BASE_URL`
    /// - `OPENAI_API_KEY`
    /// - `OPENAI_VISION_MODEL`
    /// - `OPENAI_TIMEOUT`
    pub fn from_env() -> Self {
        Self {
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| defaults::OPENAI_URL.to_string()),
            api_key: std::env::var("OPENAI_API_KEY")
                .ok()
                .filter(|key| !key.is_empty()),
            vision_model: std::env::var(defaults::ENV_OPENAI_VISION_MODEL)
                .unwrap_or_else(|_| defaults::OPENAI_VISION_MODEL.to_string()),
            timeout_seconds: std::env::var("OPENAI_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::INFERENCE_TIMEOUT_SECS),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        validate_url("OpenAI base_url", &self.base_url)?;
        if self.vision_model.is_empty() {
            return Err(ConfigError::Validation(
                "OpenAI vision_model cannot be empty".to_string(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "OpenAI timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Alternate vision backend for any OpenAI-compatible endpoint.
pub struct OpenAIBackend {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIBackend {
    /// Create a new OpenAI backend with the given configuration.
    pub fn new(config: OpenAIConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            backend = "openai",
            endpoint = %config.base_url,
            model = %config.vision_model,
            "Initializing OpenAI vision backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(OpenAIConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), endpoint)
    }

    /// Build a POST request with authentication if configured.
    fn build_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(self.url(endpoint));
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req.header("Content-Type", "application/json")
    }

    /// Build a GET request with authentication.
    fn build_get_request(&self, endpoint: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.get(self.url(endpoint));
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req
    }
}

#[async_trait]
impl InferenceBackend for OpenAIBackend {
    #[instrument(
        skip(self, payload, params),
        fields(
            subsystem = "inference",
            op = "invoke",
            backend = "openai",
            model = %self.config.vision_model,
            max_tokens = params.max_output_tokens
        )
    )]
    async fn invoke(
        &self,
        payload: &InferencePayload,
        params: &InferenceParameters,
    ) -> Result<ModelResponse> {
        let start = Instant::now();
        let model = &self.config.vision_model;
        let request = ChatCompletionRequest::from_payload(model, payload, params);

        let response = self
            .build_request("/chat/completions")
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Error::InferenceFailure(format!("Can't invoke '{}'. Reason: {}", model, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body: OpenAIErrorResponse = response.json().await.unwrap_or(OpenAIErrorResponse {
                error: OpenAIError {
                    message: "Unknown error".to_string(),
                    error_type: "unknown".to_string(),
                    code: None,
                },
            });
            let code = OpenAIErrorCode::from_response(status.as_u16(), &body.error.error_type);
            warn!(
                status = status.as_u16(),
                error = %body.error.message,
                duration_ms = start.elapsed().as_millis() as u64,
                "OpenAI returned an error"
            );
            return Err(to_labrat_error(model, code, &body.error.message));
        }

        let result: ChatCompletionResponse = response.json().await.map_err(|e| {
            Error::InferenceFailure(format!(
                "Can't invoke '{}'. Reason: Failed to parse response: {}",
                model, e
            ))
        })?;

        let content = result
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| {
                Error::InferenceFailure(format!(
                    "Can't invoke '{}'. Reason: Response contained no text",
                    model
                ))
            })?;

        debug!(
            response_len = content.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "OpenAI invocation complete"
        );

        Ok(ModelResponse {
            text: content,
            model: model.clone(),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        // For OpenAI-compatible APIs, we try a minimal models list request
        let response = self
            .build_get_request("/models")
            .timeout(Duration::from_secs(defaults::HEALTH_CHECK_TIMEOUT_SECS))
            .send()
            .await;

        match response {
            Ok(resp) => {
                if resp.status().is_success() {
                    debug!("OpenAI health check passed");
                    Ok(true)
                } else {
                    warn!("OpenAI health check failed: {}", resp.status());
                    Ok(false)
                }
            }
            Err(e) => {
                warn!("OpenAI health check error: {}", e);
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.vision_model
    }

    fn backend_name(&self) -> &'static str {
        "openai"
    }
}
