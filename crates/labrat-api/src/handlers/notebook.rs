//! Notebook assembly endpoint.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use labrat_core::{CodeCell, NotebookDocument};
use labrat_inference::to_ipynb;

use crate::{ApiError, AppState};

/// Request body for `POST /api/create-notebook`.
#[derive(Debug, Deserialize)]
pub struct CreateNotebookRequest {
    #[serde(default)]
    pub cells: Vec<CodeCell>,
    #[serde(default)]
    pub name: Option<String>,
    /// Also return the notebook as nbformat v4 JSON.
    #[serde(default)]
    pub ipynb: bool,
}

#[derive(Debug, Serialize)]
pub struct CreateNotebookResponse {
    pub success: bool,
    pub notebook: NotebookDocument,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipynb: Option<JsonValue>,
}

pub async fn create_notebook(
    State(state): State<AppState>,
    body: Result<Json<CreateNotebookRequest>, JsonRejection>,
) -> Result<Json<CreateNotebookResponse>, ApiError> {
    let Json(req) = body?;
    let notebook = state
        .assistant
        .create_notebook(req.cells, req.name.as_deref());
    let ipynb = req.ipynb.then(|| to_ipynb(&notebook));

    Ok(Json(CreateNotebookResponse {
        success: true,
        notebook,
        ipynb,
    }))
}
