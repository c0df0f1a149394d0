use async_trait::async_trait;

use crate::domain::MediaPayload;

/// A single-turn request to a text generation model.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub instruction: String,
    pub media: Option<MediaPayload>,
}

impl CompletionRequest {
    pub fn text(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
            media: None,
        }
    }

    pub fn with_media(mut self, media: Option<MediaPayload>) -> Self {
        self.media = media;
        self
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, LlmClientError>;
}

#[derive(Debug, thiserror::Error)]
pub enum LlmClientError {
    #[error("api request failed: {0}")]
    ApiRequestFailed(String),
    #[error("rate limited")]
    RateLimited,
    #[error("unauthorized")]
    Unauthorized,
    #[error("invalid response: {0}")]
    InvalidResponse(String),
}
