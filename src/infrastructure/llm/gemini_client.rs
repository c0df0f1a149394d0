use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::application::ports::{CompletionRequest, LlmClient, LlmClientError};
use crate::domain::Secret;

pub const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// `generateContent` client for Gemini models; media is sent inline.
pub struct GeminiClient {
    client: Client,
    base_url: String,
    model: String,
    api_key: Secret,
}

impl GeminiClient {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Secret,
        timeout: Duration,
    ) -> Result<Self, LlmClientError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LlmClientError::ApiRequestFailed(format!("client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            api_key,
        })
    }
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
#[serde(untagged)]
enum Part<'a> {
    InlineData { inline_data: InlineData<'a> },
    Text { text: &'a str },
}

#[derive(Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[async_trait]
impl LlmClient for GeminiClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmClientError> {
        let mut parts = Vec::with_capacity(2);
        if let Some(media) = &request.media {
            parts.push(Part::InlineData {
                inline_data: InlineData {
                    mime_type: &media.mime_type,
                    data: general_purpose::STANDARD.encode(&media.data),
                },
            });
        }
        parts.push(Part::Text {
            text: &request.instruction,
        });
        let body = GenerateContentRequest {
            contents: vec![Content { parts }],
        };

        let url = format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model);

        tracing::debug!(
            model = %self.model,
            has_media = request.media.is_some(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose())
            .json(&body)
            .send()
            .await
            .map_err(|e| LlmClientError::ApiRequestFailed(format!("request: {}", e.without_url())))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(match status {
                StatusCode::TOO_MANY_REQUESTS => LlmClientError::RateLimited,
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LlmClientError::Unauthorized,
                _ => LlmClientError::ApiRequestFailed(format!("status {}: {}", status, text)),
            });
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| LlmClientError::InvalidResponse(e.without_url().to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or_else(|| LlmClientError::InvalidResponse("no candidates".to_string()))?;

        Ok(text.trim().to_string())
    }
}
