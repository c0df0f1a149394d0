use axum::Json;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use serde::Serialize;

use crate::domain::{GenerationParams, MediaPayload, StoragePath};
use crate::presentation::state::AppState;

use super::api_error::ApiError;

#[derive(Debug, Serialize)]
pub struct SeparateResponse {
    pub job_id: String,
    pub description: String,
    pub speech_url: String,
    pub background_url: Option<String>,
}

/// Builds absolute file links from the caller's view of the host.
fn base_url(headers: &HeaderMap) -> String {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("http");
    format!("{scheme}://{host}")
}

fn file_url(base: &str, path: &StoragePath) -> String {
    format!("{base}/files/{path}")
}

fn parse_field<T: std::str::FromStr>(name: &str, raw: &str) -> Result<Option<T>, ApiError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse()
        .map(Some)
        .map_err(|_| ApiError::validation(format!("{name} is not a valid number: {raw}")))
}

#[tracing::instrument(skip(state, headers, multipart))]
pub async fn separate_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ApiError> {
    let mut media = None;
    let mut description = None;
    let mut params = GenerationParams::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::rejected(e.status(), format!("failed to read multipart: {e}")))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            "file" => {
                let filename = field.file_name().map(str::to_string);
                let content_type = field.content_type().map(str::to_string);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::rejected(e.status(), format!("failed to read file: {e}")))?;
                tracing::debug!(bytes = data.len(), filename = ?filename, "File data received");
                media = Some(MediaPayload::new(data, content_type.as_deref(), filename));
            }
            other => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::rejected(e.status(), format!("failed to read {other}: {e}")))?;
                match other {
                    "description" => {
                        description = Some(value).filter(|v| !v.trim().is_empty());
                    }
                    "duration_secs" => params.duration_secs = parse_field(other, &value)?,
                    "seed" => params.seed = parse_field(other, &value)?,
                    "guidance_scale" => params.guidance_scale = parse_field(other, &value)?,
                    _ => tracing::debug!(field = other, "Ignoring unknown multipart field"),
                }
            }
        }
    }

    let media = media.ok_or_else(|| ApiError::validation("no file uploaded"))?;

    let job = state
        .separation_service
        .separate(media, description, params)
        .await?;

    let base = base_url(&headers);
    Ok((
        StatusCode::OK,
        Json(SeparateResponse {
            job_id: job.job_id.to_string(),
            description: job.description,
            speech_url: file_url(&base, &job.speech),
            background_url: job.background.as_ref().map(|p| file_url(&base, p)),
        }),
    ))
}
