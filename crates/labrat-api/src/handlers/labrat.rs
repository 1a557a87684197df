//! Main assistance endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Deserialize;
use tracing::debug;

use labrat_core::AnalysisResult;

use crate::services::DrawingRequest;
use crate::{ApiError, AppState};

/// Request kinds the client can ask for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    General,
    WhiteboardConversion,
    ExperimentAnalysis,
    SimulationGuidance,
    DrawingAnalysis,
}

impl RequestKind {
    /// Unrecognized kinds fall back to general guidance.
    pub fn parse(kind: &str) -> Self {
        match kind.trim() {
            "whiteboard_conversion" => Self::WhiteboardConversion,
            "experiment_analysis" => Self::ExperimentAnalysis,
            "simulation_guidance" => Self::SimulationGuidance,
            "drawing_analysis" => Self::DrawingAnalysis,
            _ => Self::General,
        }
    }
}

fn default_kind() -> String {
    "general".to_string()
}

fn default_true() -> bool {
    true
}

/// Request body for `POST /api/labrat`.
#[derive(Debug, Deserialize)]
pub struct LabratRequest {
    #[serde(rename = "type", default = "default_kind")]
    pub kind: String,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub vision_model: Option<String>,
    #[serde(default = "default_true")]
    pub include_reasoning: bool,
    #[serde(default = "default_true")]
    pub verbose: bool,
}

/// Route a request to the matching assistant operation.
///
/// Pipeline failures come back as `200 {error}`; only an unparseable body
/// is a 400.
pub async fn labrat(
    State(state): State<AppState>,
    body: Result<Json<LabratRequest>, JsonRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let Json(req) = body?;
    let kind = RequestKind::parse(&req.kind);
    debug!(request_type = %req.kind, ?kind, has_image = req.image.is_some(), "Handling labrat request");

    let assistant = &state.assistant;
    let result = match kind {
        RequestKind::General => assistant.chat(&req.input, req.image).await,
        RequestKind::WhiteboardConversion => assistant.whiteboard_conversion(&req.input).await,
        RequestKind::ExperimentAnalysis => assistant.experiment_analysis(&req.input).await,
        RequestKind::SimulationGuidance => assistant.simulation_guidance(&req.input).await,
        RequestKind::DrawingAnalysis => {
            assistant
                .analyze_drawing(DrawingRequest {
                    image: req.image,
                    context: req.input,
                    selector: req.vision_model,
                    include_reasoning: req.include_reasoning,
                    verbose: req.verbose,
                })
                .await
        }
    };

    Ok(Json(result))
}
