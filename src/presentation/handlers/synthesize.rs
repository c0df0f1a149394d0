use axum::Json;
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderName, HeaderValue, header};
use axum::response::{IntoResponse, Response};
use base64::{Engine as _, engine::general_purpose};
use bytes::Bytes;
use serde::Deserialize;

use crate::application::services::InferenceCommand;
use crate::domain::{GenerationParams, MediaPayload};
use crate::presentation::state::AppState;

use super::api_error::ApiError;

pub const SAMPLE_RATE_HEADER: &str = "x-sample-rate";
pub const DURATION_HEADER: &str = "x-duration-secs";
pub const PROMPT_AUGMENTED_HEADER: &str = "x-prompt-augmented";

fn default_augment() -> bool {
    true
}

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub prompt: String,
    pub duration_secs: Option<f32>,
    pub seed: Option<u64>,
    pub guidance_scale: Option<f32>,
    /// Base64 encoded audio or video.
    pub reference_audio: Option<String>,
    pub reference_mime_type: Option<String>,
    #[serde(default = "default_augment")]
    pub augment: bool,
}

#[tracing::instrument(skip(state, payload))]
pub async fn synthesize_handler(
    State(state): State<AppState>,
    payload: Result<Json<SynthesizeRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(request) = payload.map_err(|e| ApiError::rejected(e.status(), e.body_text()))?;

    let media = match request.reference_audio.as_deref() {
        Some(encoded) => {
            let data = general_purpose::STANDARD
                .decode(encoded.trim())
                .map_err(|e| ApiError::validation(format!("reference_audio is not valid base64: {e}")))?;
            Some(MediaPayload::new(
                Bytes::from(data),
                Some(request.reference_mime_type.as_deref().unwrap_or("audio/wav")),
                None,
            ))
        }
        None => None,
    };

    let result = state
        .inference_service
        .run(InferenceCommand {
            prompt: Some(request.prompt),
            media,
            params: GenerationParams {
                duration_secs: request.duration_secs,
                seed: request.seed,
                guidance_scale: request.guidance_scale,
            },
            augment: request.augment,
        })
        .await?;

    tracing::info!(
        bytes = result.audio.len(),
        duration_secs = result.duration_secs,
        "Synthesis completed"
    );

    let headers = [
        (header::CONTENT_TYPE, HeaderValue::from_static(result.content_type())),
        (
            HeaderName::from_static(SAMPLE_RATE_HEADER),
            HeaderValue::from(result.sample_rate),
        ),
        (
            HeaderName::from_static(DURATION_HEADER),
            header_value(format!("{:.3}", result.duration_secs)),
        ),
        (
            HeaderName::from_static(PROMPT_AUGMENTED_HEADER),
            HeaderValue::from_static(if result.prompt_augmented { "true" } else { "false" }),
        ),
    ];

    Ok((headers, result.audio).into_response())
}

fn header_value(value: String) -> HeaderValue {
    HeaderValue::from_str(&value).unwrap_or_else(|_| HeaderValue::from_static("0"))
}
