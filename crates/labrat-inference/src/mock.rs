//! Mock inference backend for deterministic testing.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use labrat_inference::mock::MockInferenceBackend;
//!
//! let backend = MockInferenceBackend::new()
//!     .with_fixed_response("```python\n# Load data\nimport pandas\n```")
//!     .with_model("mock-vision");
//! assert_eq!(backend.call_count(), 0);
//! ```

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};

use async_trait::async_trait;

use labrat_core::{
    Error, ImageEncoding, InferenceBackend, InferenceParameters, InferencePayload, ModelResponse,
    Result,
};

/// Mock vision backend that records every call.
#[derive(Clone)]
pub struct MockInferenceBackend {
    config: Arc<MockConfig>,
    call_log: Arc<Mutex<Vec<MockCall>>>,
}

#[derive(Debug, Clone)]
struct MockConfig {
    model: String,
    default_response: String,
    response_mappings: Vec<(String, String)>,
    failure: Option<String>,
    healthy: bool,
    latency_ms: u64,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            model: "mock-vision".to_string(),
            default_response: "Mock response".to_string(),
            response_mappings: Vec::new(),
            failure: None,
            healthy: true,
            latency_ms: 0,
        }
    }
}

/// One recorded `invoke` call.
#[derive(Debug, Clone)]
pub struct MockCall {
    pub prompt: String,
    pub image_encoding: Option<ImageEncoding>,
    pub params: InferenceParameters,
    pub timestamp: Instant,
}

impl MockInferenceBackend {
    pub fn new() -> Self {
        Self {
            config: Arc::new(MockConfig::default()),
            call_log: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Model name reported in responses.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).model = model.into();
        self
    }

    /// Reply text for every call without a matching mapping.
    pub fn with_fixed_response(mut self, response: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).default_response = response.into();
        self
    }

    /// Reply with `output` whenever the prompt contains `needle`.
    pub fn with_response_mapping(
        mut self,
        needle: impl Into<String>,
        output: impl Into<String>,
    ) -> Self {
        Arc::make_mut(&mut self.config)
            .response_mappings
            .push((needle.into(), output.into()));
        self
    }

    /// Fail every call with an `InferenceFailure` carrying `reason`.
    pub fn with_failure(mut self, reason: impl Into<String>) -> Self {
        Arc::make_mut(&mut self.config).failure = Some(reason.into());
        self
    }

    pub fn with_health(mut self, healthy: bool) -> Self {
        Arc::make_mut(&mut self.config).healthy = healthy;
        self
    }

    /// Simulated latency for every call.
    pub fn with_latency_ms(mut self, latency_ms: u64) -> Self {
        Arc::make_mut(&mut self.config).latency_ms = latency_ms;
        self
    }

    fn log(&self) -> MutexGuard<'_, Vec<MockCall>> {
        self.call_log
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// All recorded calls, oldest first.
    pub fn get_calls(&self) -> Vec<MockCall> {
        self.log().clone()
    }

    pub fn call_count(&self) -> usize {
        self.log().len()
    }

    pub fn clear_calls(&self) {
        self.log().clear()
    }
}

impl Default for MockInferenceBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl InferenceBackend for MockInferenceBackend {
    async fn invoke(
        &self,
        payload: &InferencePayload,
        params: &InferenceParameters,
    ) -> Result<ModelResponse> {
        let prompt = payload.text().unwrap_or_default().to_string();
        self.log().push(MockCall {
            prompt: prompt.clone(),
            image_encoding: payload.image().map(|image| image.encoding),
            params: *params,
            timestamp: Instant::now(),
        });

        if self.config.latency_ms > 0 {
            tokio::time::sleep(Duration::from_millis(self.config.latency_ms)).await;
        }

        if let Some(ref reason) = self.config.failure {
            return Err(Error::InferenceFailure(format!(
                "Can't invoke '{}'. Reason: {}",
                self.config.model, reason
            )));
        }

        let text = self
            .config
            .response_mappings
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_else(|| self.config.default_response.clone());

        Ok(ModelResponse {
            text,
            model: self.config.model.clone(),
        })
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(self.config.healthy)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }

    fn backend_name(&self) -> &'static str {
        "mock"
    }
}
