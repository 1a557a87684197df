//! The LabRat assistant: tutoring request kinds mapped onto the inference
//! pipeline (normalize, assemble, invoke, extract, assemble notebook).
//!
//! Every public operation returns an [`AnalysisResult`]. Pipeline failures
//! become `{error}` results rather than `Err`, so one bad upload never sinks
//! a batch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use base64::Engine;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use labrat_core::{
    defaults, AnalysisResult, CodeCell, Error, InferenceBackend, ModelResponse, NormalizedImage,
    NotebookDocument, Prompt, RawMedia, RequestClass, Result,
};
use labrat_documents::{detect_kind, ExtractionRegistry};
use labrat_inference::{
    assemble, build_notebook, conversion_recommended, extract, extract_code_cells, normalize,
    normalize_media, parse_data_url, prompts, BackendKind, BedrockBackend, NormalizeOptions,
    OpenAIBackend, VisionConfig,
};

/// Drawing analysis inputs as they arrive from the client.
#[derive(Debug, Clone, Default)]
pub struct DrawingRequest {
    /// Base64 or data-URL encoded image.
    pub image: Option<String>,
    /// Free-text context from the student.
    pub context: String,
    /// Backend selector ("claude", "writer", "bedrock", "openai", ...).
    pub selector: Option<String>,
    pub include_reasoning: bool,
    pub verbose: bool,
}

/// One uploaded file.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadedFile {
    /// Data URL or bare base64 payload.
    pub data: String,
    /// Declared mime type.
    #[serde(rename = "type", default)]
    pub mime_type: String,
    #[serde(default)]
    pub name: String,
}

/// Health of one configured vision backend.
#[derive(Debug, Clone, Serialize)]
pub struct BackendHealth {
    pub backend: &'static str,
    pub model: String,
    pub healthy: bool,
    pub default: bool,
}

/// Stateless request handler over immutable backends.
pub struct Assistant {
    default_kind: BackendKind,
    backends: HashMap<BackendKind, Arc<dyn InferenceBackend>>,
    documents: Arc<ExtractionRegistry>,
}

impl Assistant {
    /// Assistant with a single backend serving as the default.
    pub fn new(default_kind: BackendKind, backend: Arc<dyn InferenceBackend>) -> Self {
        let mut backends = HashMap::new();
        backends.insert(default_kind, backend);
        Self {
            default_kind,
            backends,
            documents: Arc::new(ExtractionRegistry::with_defaults()),
        }
    }

    /// Add (or replace) the backend for `kind`.
    pub fn with_backend(mut self, kind: BackendKind, backend: Arc<dyn InferenceBackend>) -> Self {
        self.backends.insert(kind, backend);
        self
    }

    pub fn with_documents(mut self, documents: ExtractionRegistry) -> Self {
        self.documents = Arc::new(documents);
        self
    }

    /// Build every configured backend from `config`.
    pub fn from_config(config: &VisionConfig) -> Result<Self> {
        config.validate()?;

        let mut backends: HashMap<BackendKind, Arc<dyn InferenceBackend>> = HashMap::new();
        if let Some(ref bedrock) = config.bedrock {
            backends.insert(
                BackendKind::Bedrock,
                Arc::new(BedrockBackend::new(bedrock.clone())?),
            );
        }
        if let Some(ref openai) = config.openai {
            backends.insert(
                BackendKind::OpenAI,
                Arc::new(OpenAIBackend::new(openai.clone())?),
            );
        }

        info!(
            default = %config.default,
            backends = backends.len(),
            "Assistant configured"
        );

        Ok(Self {
            default_kind: config.default,
            backends,
            documents: Arc::new(ExtractionRegistry::with_defaults()),
        })
    }

    pub fn default_kind(&self) -> BackendKind {
        self.default_kind
    }

    /// Backend named by `selector`, or the default when the selector is
    /// absent, unknown or names an unconfigured backend.
    pub fn select_backend(&self, selector: Option<&str>) -> Result<Arc<dyn InferenceBackend>> {
        if let Some(selector) = selector.filter(|s| !s.trim().is_empty()) {
            match BackendKind::from_selector(selector) {
                Some(kind) => {
                    if let Some(backend) = self.backends.get(&kind) {
                        return Ok(Arc::clone(backend));
                    }
                    debug!(selector, "Selected backend not configured, using default");
                }
                None => debug!(selector, "Unknown backend selector, using default"),
            }
        }

        self.backends
            .get(&self.default_kind)
            .cloned()
            .ok_or_else(|| {
                Error::Config(format!("Default backend '{}' is not configured", self.default_kind))
            })
    }

    /// Assemble the payload and call `backend`.
    async fn invoke(
        &self,
        backend: &Arc<dyn InferenceBackend>,
        prompt: Prompt,
        image: Option<NormalizedImage>,
        class: RequestClass,
    ) -> Result<ModelResponse> {
        let prompt_len = prompt.len();
        let payload = assemble(prompt, image, class, backend.accepted_encodings())?;

        let start = Instant::now();
        let response = backend.invoke(&payload, &class.parameters()).await?;

        info!(
            backend = backend.backend_name(),
            model = %response.model,
            request_class = class.as_str(),
            prompt_len,
            response_len = response.text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Inference complete"
        );

        Ok(response)
    }

    async fn general(&self, prompt: Prompt, image: Option<String>) -> Result<AnalysisResult> {
        let image = match image.filter(|raw| !raw.trim().is_empty()) {
            Some(raw) => Some(normalize_encoded(raw, NormalizeOptions::chat()).await?),
            None => None,
        };
        let backend = self.select_backend(None)?;
        let response = self
            .invoke(&backend, prompt, image, RequestClass::General)
            .await?;
        Ok(AnalysisResult::from_response(response))
    }

    /// General tutoring chat, optionally about an attached image.
    #[instrument(skip_all, fields(subsystem = "api", op = "chat"))]
    pub async fn chat(&self, input: &str, image: Option<String>) -> AnalysisResult {
        settle("chat", self.general(prompts::tutor_prompt(input), image).await)
    }

    #[instrument(skip_all, fields(subsystem = "api", op = "whiteboard_conversion"))]
    pub async fn whiteboard_conversion(&self, description: &str) -> AnalysisResult {
        let prompt = prompts::whiteboard_conversion_prompt(description);
        settle("whiteboard_conversion", self.general(prompt, None).await)
    }

    #[instrument(skip_all, fields(subsystem = "api", op = "experiment_analysis"))]
    pub async fn experiment_analysis(&self, description: &str) -> AnalysisResult {
        let prompt = prompts::experiment_analysis_prompt(description);
        settle("experiment_analysis", self.general(prompt, None).await)
    }

    #[instrument(skip_all, fields(subsystem = "api", op = "simulation_guidance"))]
    pub async fn simulation_guidance(&self, input: &str) -> AnalysisResult {
        let prompt = prompts::simulation_guidance_prompt(input);
        settle("simulation_guidance", self.general(prompt, None).await)
    }

    async fn drawing_pipeline(
        &self,
        image: Option<NormalizedImage>,
        context: &str,
        selector: Option<&str>,
        include_reasoning: bool,
        verbose: bool,
    ) -> Result<AnalysisResult> {
        let class = if include_reasoning {
            RequestClass::DetailedReasoning
        } else {
            RequestClass::DrawingAnalysis
        };
        let backend = self.select_backend(selector)?;
        let prompt = prompts::drawing_analysis_prompt(context, include_reasoning);
        let response = self.invoke(&backend, prompt, image, class).await?;

        let artifacts = extract(&response.text);
        let feasibility = artifacts.feasibility_score();
        let feasible = conversion_recommended(&response.text, feasibility);

        let mut result = AnalysisResult::from_response(response);
        result.feasibility_score = Some(feasibility);
        result.confidence_score = Some(artifacts.confidence_score());
        result.code_conversion_feasible = Some(feasible);
        if verbose {
            result.reasoning = Some(artifacts.reasoning_sections);
        }
        result.notebook_cells = Some(artifacts.code_cells);
        Ok(result)
    }

    /// Structured analysis of a whiteboard drawing.
    #[instrument(
        skip_all,
        fields(
            subsystem = "api",
            op = "analyze_drawing",
            include_reasoning = request.include_reasoning,
            verbose = request.verbose
        )
    )]
    pub async fn analyze_drawing(&self, request: DrawingRequest) -> AnalysisResult {
        let outcome = async {
            let image = match request.image.filter(|raw| !raw.trim().is_empty()) {
                Some(raw) => Some(normalize_encoded(raw, NormalizeOptions::drawing()).await?),
                None => None,
            };
            self.drawing_pipeline(
                image,
                &request.context,
                request.selector.as_deref(),
                request.include_reasoning,
                request.verbose,
            )
            .await
        }
        .await;
        settle("analyze_drawing", outcome)
    }

    async fn upload_pipeline(&self, file: &UploadedFile) -> Result<AnalysisResult> {
        let bytes = decode_upload(&file.data)?;
        let mime_type = if file.mime_type.is_empty() {
            data_url_mime(&file.data).unwrap_or_default()
        } else {
            file.mime_type.as_str()
        };

        let kind = detect_kind(&bytes, &file.name, mime_type);
        debug!(filename = %file.name, ?kind, size_bytes = bytes.len(), "Upload classified");

        if kind.is_image() {
            let media = RawMedia {
                data: bytes,
                kind,
                filename: Some(file.name.clone()),
            };
            let image = normalize_decoded(media, NormalizeOptions::drawing()).await?;
            let context = format!("The drawing was uploaded as '{}'.", file.name);
            return self
                .drawing_pipeline(Some(image), &context, None, false, false)
                .await;
        }

        let extraction = self
            .documents
            .extract_document(&bytes, &file.name, mime_type)
            .await?;
        let text = truncate_chars(&extraction.extracted_text, defaults::DOCUMENT_PROMPT_MAX_CHARS);

        let backend = self.select_backend(None)?;
        let prompt = prompts::document_guidance_prompt(&file.name, text);
        let response = self
            .invoke(&backend, prompt, None, RequestClass::General)
            .await?;

        let cells = extract_code_cells(&response.text);
        let mut result = AnalysisResult::from_response(response);
        result.notebook_cells = Some(cells);
        Ok(result)
    }

    /// Analyze one uploaded file: images as drawings, documents as text.
    #[instrument(skip_all, fields(subsystem = "api", op = "analyze_upload", filename = %file.name))]
    pub async fn analyze_upload(&self, file: UploadedFile) -> AnalysisResult {
        settle("analyze_upload", self.upload_pipeline(&file).await).with_filename(file.name)
    }

    /// Analyze a batch of uploads concurrently, preserving order.
    pub async fn analyze_uploads(&self, files: Vec<UploadedFile>) -> Vec<AnalysisResult> {
        join_all(files.into_iter().map(|file| self.analyze_upload(file))).await
    }

    /// Assemble a notebook from code cells; names default to today's date.
    pub fn create_notebook(&self, cells: Vec<CodeCell>, name: Option<&str>) -> NotebookDocument {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(name) => name.to_string(),
            None => format!("Drawing_Analysis_{}", chrono::Utc::now().format("%Y-%m-%d")),
        };
        build_notebook(cells, &name)
    }

    /// Health of every configured vision backend, default first.
    pub async fn backend_health(&self) -> Vec<BackendHealth> {
        let mut entries: Vec<(&BackendKind, &Arc<dyn InferenceBackend>)> =
            self.backends.iter().collect();
        entries.sort_by_key(|(kind, _)| **kind != self.default_kind);

        join_all(entries.into_iter().map(|(kind, backend)| async move {
            BackendHealth {
                backend: backend.backend_name(),
                model: backend.model_name().to_string(),
                healthy: backend.health_check().await.unwrap_or(false),
                default: *kind == self.default_kind,
            }
        }))
        .await
    }

    /// Availability of the external document converters.
    pub async fn document_health(&self) -> HashMap<&'static str, bool> {
        self.documents
            .health_check_all()
            .await
            .into_iter()
            .map(|(strategy, healthy)| (strategy.as_str(), healthy))
            .collect()
    }
}

/// Collapse a pipeline outcome into the caller-facing result.
fn settle(op: &'static str, outcome: Result<AnalysisResult>) -> AnalysisResult {
    match outcome {
        Ok(result) => result,
        Err(err) => {
            warn!(op, error_kind = err.kind(), error = %err, "Request failed");
            AnalysisResult::from_error(&err)
        }
    }
}

async fn normalize_encoded(raw: String, options: NormalizeOptions) -> Result<NormalizedImage> {
    tokio::task::spawn_blocking(move || normalize(&raw, &options))
        .await
        .map_err(|e| Error::Internal(format!("Image normalization task failed: {}", e)))?
}

async fn normalize_decoded(media: RawMedia, options: NormalizeOptions) -> Result<NormalizedImage> {
    tokio::task::spawn_blocking(move || normalize_media(&media, &options))
        .await
        .map_err(|e| Error::Internal(format!("Image normalization task failed: {}", e)))?
}

/// Decode an uploaded data URL or bare base64 payload.
fn decode_upload(data: &str) -> Result<Vec<u8>> {
    let (_, payload) = parse_data_url(data);
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = base64::engine::general_purpose::STANDARD.decode(cleaned.as_bytes())?;
    if bytes.is_empty() {
        return Err(Error::InvalidInput("Uploaded file is empty".to_string()));
    }
    Ok(bytes)
}

/// Mime type named by a `data:<mime>;base64,` prefix.
fn data_url_mime(data: &str) -> Option<&str> {
    let header = data.trim_start().strip_prefix("data:")?.split_once(',')?.0;
    header.split(';').next().filter(|mime| !mime.is_empty())
}

/// At most `max_chars` characters of `text`.
fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}
