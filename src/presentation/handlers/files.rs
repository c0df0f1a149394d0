use axum::Json;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::IntoResponse;
use serde::Serialize;

use crate::domain::{JobId, WAV_MIME};
use crate::presentation::state::AppState;

use super::api_error::ApiError;

#[derive(Serialize)]
pub struct DeleteResponse {
    pub status: &'static str,
}

fn parse_job_id(raw: &str) -> Result<JobId, ApiError> {
    JobId::parse(raw).ok_or_else(|| ApiError::not_found(format!("job not found: {raw}")))
}

pub async fn get_file_handler(
    State(state): State<AppState>,
    Path((job_id, filename)): Path<(String, String)>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = parse_job_id(&job_id)?;
    let data = state
        .separation_service
        .fetch_file(&job_id, &filename)
        .await?;

    Ok(([(header::CONTENT_TYPE, WAV_MIME)], data))
}

pub async fn delete_job_handler(
    State(state): State<AppState>,
    Path(job_id): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let job_id = parse_job_id(&job_id)?;
    state.separation_service.delete_job(&job_id).await?;

    Ok((StatusCode::OK, Json(DeleteResponse { status: "deleted" })))
}
