//! Service health endpoint.

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use labrat_core::defaults;

use crate::AppState;

/// Liveness plus the reachability of each vision backend and converter.
///
/// Always `healthy` while the process serves requests; backend status is
/// informational.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let (backends, documents) = futures::join!(
        state.assistant.backend_health(),
        state.assistant.document_health()
    );

    Json(serde_json::json!({
        "status": "healthy",
        "service": defaults::SERVICE_NAME,
        "version": env!("CARGO_PKG_VERSION"),
        "default_backend": state.assistant.default_kind().to_string(),
        "backends": backends,
        "document_converters": documents,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
