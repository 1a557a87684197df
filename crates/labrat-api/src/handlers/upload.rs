//! Batch file upload analysis.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use labrat_core::AnalysisResult;

use crate::services::UploadedFile;
use crate::{ApiError, AppState};

/// Request body for `POST /api/upload`.
#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub files: Vec<UploadedFile>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub results: Vec<AnalysisResult>,
}

/// Analyze every uploaded file. Per-file failures are reported in that
/// file's result.
pub async fn upload(
    State(state): State<AppState>,
    body: Result<Json<UploadRequest>, JsonRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let Json(req) = body?;
    if req.files.is_empty() {
        return Err(ApiError::BadRequest("No files provided".to_string()));
    }

    let results = state.assistant.analyze_uploads(req.files).await;
    Ok(Json(UploadResponse {
        success: true,
        results,
    }))
}
