use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::Deserialize;
use tracing::warn;

use greenfork_pipeline::{IngestService, PipelineError};

pub struct AppState {
    pub ingest: IngestService,
}

#[derive(Debug, Deserialize)]
pub struct VeganizeRequest {
    url: Option<String>,
}

/// The ingestion trigger: `{url}` in, veganized recipe out.
pub async fn api_veganize(
    State(state): State<Arc<AppState>>,
    Json(body): Json<VeganizeRequest>,
) -> impl IntoResponse {
    let Some(url) = body.url.as_deref() else {
        return error_response(&PipelineError::InvalidUrl);
    };

    match state.ingest.ingest(url).await {
        Ok(response) => (StatusCode::OK, Json(serde_json::json!(response))).into_response(),
        Err(e) => {
            warn!(url, error = %e, "Ingestion failed");
            error_response(&e)
        }
    }
}

fn error_response(error: &PipelineError) -> axum::response::Response {
    let (status, message) = classify(error);
    (
        status,
        Json(serde_json::json!({
            "success": false,
            "error": message,
        })),
    )
        .into_response()
}

/// Validation failures are the caller's fault; everything else on the
/// ingestion path surfaces as a server-side failure.
fn classify(error: &PipelineError) -> (StatusCode, String) {
    match error {
        PipelineError::InvalidUrl => (StatusCode::BAD_REQUEST, error.to_string()),
        PipelineError::Fetch { .. } => (StatusCode::BAD_GATEWAY, error.to_string()),
        PipelineError::Transform(_) | PipelineError::Persistence(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, error.to_string())
        }
    }
}
