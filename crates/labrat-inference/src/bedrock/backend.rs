//! Bedrock Converse backend implementation.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use super::error::{to_labrat_error, BedrockErrorCode};
use super::types::{BedrockErrorResponse, ConverseRequest, ConverseResponse};
use crate::config::{validate_url, ConfigError, ConfigResult};
use labrat_core::{
    defaults, Error, InferenceBackend, InferenceParameters, InferencePayload, ModelResponse,
    Result,
};

/// Bedrock backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BedrockConfig {
    /// Provider region, used to derive the runtime endpoint.
    pub region: String,
    /// Model identifier (inference profile or foundation model id).
    pub model_id: String,
    /// Bedrock API key sent as a bearer token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Explicit runtime endpoint; derived from `region` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    /// Request timeout in seconds.
    pub timeout_seconds: u64,
}

impl Default for BedrockConfig {
    fn default() -> Self {
        Self {
            region: defaults::BEDROCK_REGION.to_string(),
            model_id: defaults::BEDROCK_MODEL_ID.to_string(),
            api_key: None,
            endpoint: None,
            timeout_seconds: defaults::INFERENCE_TIMEOUT_SECS,
        }
    }
}

impl BedrockConfig {
    /// Load from environment variables.
    ///
    /// - `BEDROCK_REGION` (falls back to `AWS_REGION`)
    /// - `BEDROCK_MODEL_ID`
    /// - `BEDROCK_API_KEY` (falls back to `AWS_BEARER_TOKEN_BEDROCK`)
    /// - `BEDROCK_ENDPOINT`
    /// - `BEDROCK_TIMEOUT`
    pub fn from_env() -> Self {
        Self {
            region: std::env::var(defaults::ENV_BEDROCK_REGION)
                .or_else(|_| std::env::var("AWS_REGION"))
                .unwrap_or_else(|_| defaults::BEDROCK_REGION.to_string()),
            model_id: std::env::var(defaults::ENV_BEDROCK_MODEL_ID)
                .unwrap_or_else(|_| defaults::BEDROCK_MODEL_ID.to_string()),
            api_key: std::env::var(defaults::ENV_BEDROCK_API_KEY)
                .or_else(|_| std::env::var("AWS_BEARER_TOKEN_BEDROCK"))
                .ok()
                .filter(|key| !key.is_empty()),
            endpoint: std::env::var(defaults::ENV_BEDROCK_ENDPOINT)
                .ok()
                .filter(|url| !url.is_empty()),
            timeout_seconds: std::env::var("BEDROCK_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults::INFERENCE_TIMEOUT_SECS),
        }
    }

    /// Runtime endpoint without trailing slash.
    pub fn endpoint_url(&self) -> String {
        match self.endpoint {
            Some(ref endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.region.is_empty() && self.endpoint.is_none() {
            return Err(ConfigError::Validation(
                "Bedrock region cannot be empty".to_string(),
            ));
        }
        validate_url("Bedrock endpoint", &self.endpoint_url())?;
        if self.model_id.is_empty() {
            return Err(ConfigError::Validation(
                "Bedrock model_id cannot be empty".to_string(),
            ));
        }
        if self.timeout_seconds == 0 {
            return Err(ConfigError::Validation(
                "Bedrock timeout must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Primary vision backend speaking the Bedrock Converse API.
pub struct BedrockBackend {
    client: Client,
    config: BedrockConfig,
}

impl BedrockBackend {
    /// Create a new Bedrock backend with the given configuration.
    pub fn new(config: BedrockConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        if config.api_key.is_none() {
            warn!(
                subsystem = "inference",
                backend = "bedrock",
                "No Bedrock API key configured; requests will be rejected by the provider"
            );
        }

        info!(
            subsystem = "inference",
            backend = "bedrock",
            endpoint = %config.endpoint_url(),
            model = %config.model_id,
            "Initializing Bedrock backend"
        );

        Ok(Self { client, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(BedrockConfig::from_env())
    }

    /// Get the current configuration.
    pub fn config(&self) -> &BedrockConfig {
        &self.config
    }

    fn converse_url(&self) -> String {
        format!(
            "{}/model/{}/converse",
            self.config.endpoint_url(),
            self.config.model_id
        )
    }

    /// Build a request with authentication if configured.
    fn build_request(&self, url: &str) -> reqwest::RequestBuilder {
        let mut req = self.client.post(url);
        if let Some(ref api_key) = self.config.api_key {
            req = req.header("Authorization", format!("Bearer {}", api_key));
        }
        req.header("Content-Type", "application/json")
            .header("Accept", "application/json")
    }
}

#[async_trait]
impl InferenceBackend for BedrockBackend {
    #[instrument(
        skip(self, payload, params),
        fields(
            subsystem = "inference",
            op = "invoke",
            backend = "bedrock",
            model = %self.config.model_id,
            max_tokens = params.max_output_tokens,
            has_image = payload.has_image()
        )
    )]
    async fn invoke(
        &self,
        payload: &InferencePayload,
        params: &InferenceParameters,
    ) -> Result<ModelResponse> {
        let start = Instant::now();
        let request = ConverseRequest::from_payload(payload, params);
        let model_id = &self.config.model_id;

        let response = self
            .build_request(&self.converse_url())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                Error::InferenceFailure(format!("Can't invoke '{}'. Reason: {}", model_id, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_type = response
                .headers()
                .get("x-amzn-ErrorType")
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default()
                .to_string();
            let body: BedrockErrorResponse =
                response.json().await.unwrap_or(BedrockErrorResponse {
                    message: status.to_string(),
                });
            let code = BedrockErrorCode::from_response(status.as_u16(), &error_type);
            warn!(
                status = status.as_u16(),
                error_type = %error_type,
                error = %body.message,
                duration_ms = start.elapsed().as_millis() as u64,
                "Bedrock returned an error"
            );
            return Err(to_labrat_error(model_id, code, &body.message));
        }

        let result: ConverseResponse = response.json().await.map_err(|e| {
            Error::InferenceFailure(format!(
                "Can't invoke '{}'. Reason: Failed to parse response: {}",
                model_id, e
            ))
        })?;

        let text = result.first_text().ok_or_else(|| {
            Error::InferenceFailure(format!(
                "Can't invoke '{}'. Reason: Response contained no text",
                model_id
            ))
        })?;

        debug!(
            response_len = text.len(),
            stop_reason = result.stop_reason.as_deref().unwrap_or("unknown"),
            duration_ms = start.elapsed().as_millis() as u64,
            "Bedrock invocation complete"
        );

        Ok(ModelResponse {
            text: text.to_string(),
            model: model_id.clone(),
        })
    }

    /// Reachability probe: any HTTP answer from the runtime endpoint counts.
    async fn health_check(&self) -> Result<bool> {
        if self.config.api_key.is_none() {
            warn!("Bedrock health check: no API key configured");
            return Ok(false);
        }

        let response = self
            .client
            .get(self.config.endpoint_url())
            .timeout(Duration::from_secs(defaults::HEALTH_CHECK_TIMEOUT_SECS))
            .send()
            .await;

        match response {
            Ok(resp) => {
                debug!(status = resp.status().as_u16(), "Bedrock health check passed");
                Ok(true)
            }
            Err(e) => {
                warn!("Bedrock health check error: {}", e);
                Ok(false)
            }
        }
    }

    fn model_name(&self) -> &str {
        &self.config.model_id
    }

    fn backend_name(&self) -> &'static str {
        "bedrock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = BedrockConfig::default();
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.model_id, "us.anthropic.claude-opus-4-20250514-v1:0");
        assert_eq!(config.timeout_seconds, 300);
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_endpoint_derived_from_region() {
        let config = BedrockConfig {
            region: "eu-central-1".to_string(),
            ..Default::default()
        };
        assert_eq!(
            config.endpoint_url(),
            "https://bedrock-runtime.eu-central-1.amazonaws.com"
        );
    }

    #[test]
    fn test_endpoint_override_trims_slash() {
        let config = BedrockConfig {
            endpoint: Some("http://localhost:9000/".to_string()),
            ..Default::default()
        };
        assert_eq!(config.endpoint_url(), "http://localhost:9000");
    }

    #[test]
    fn test_validate_rejects_empty_model() {
        let config = BedrockConfig {
            model_id: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_bad_endpoint_scheme() {
        let config = BedrockConfig {
            endpoint: Some("localhost:9000".to_string()),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = BedrockConfig {
            timeout_seconds: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backend_accessors() {
        let backend = BedrockBackend::new(BedrockConfig::default()).unwrap();
        assert_eq!(backend.model_name(), defaults::BEDROCK_MODEL_ID);
        assert_eq!(backend.backend_name(), "bedrock");
        assert_eq!(backend.accepted_encodings().len(), 3);
        assert!(backend
            .converse_url()
            .ends_with("/model/us.anthropic.claude-opus-4-20250514-v1:0/converse"));
    }

    #[tokio::test]
    async fn test_health_check_without_key_is_false() {
        let backend = BedrockBackend::new(BedrockConfig::default()).unwrap();
        assert!(!backend.health_check().await.unwrap());
    }
}
