use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::domain::ModelStatus;
use crate::presentation::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: ModelStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

fn report(state: &AppState) -> HealthResponse {
    let runtime = state.inference_service.runtime();
    HealthResponse {
        status: runtime.status(),
        reason: runtime.failure_reason(),
    }
}

/// Liveness: always 200, the body carries the model state.
pub async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    (StatusCode::OK, Json(report(&state)))
}

/// Readiness: 200 only once the model can serve requests.
pub async fn readiness_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = report(&state);
    let status = match body.status {
        ModelStatus::Ready => StatusCode::OK,
        ModelStatus::Loading | ModelStatus::Failed => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(body))
}
