use crate::domain::{GenerationParams, MediaPayload};

/// Bounds a request must satisfy before it may reach the cache or the model.
#[derive(Debug, Clone)]
pub struct RequestLimits {
    pub max_prompt_chars: usize,
    pub max_duration_secs: f32,
    pub min_guidance_scale: f32,
    pub max_guidance_scale: f32,
    pub max_media_bytes: usize,
}

impl Default for RequestLimits {
    fn default() -> Self {
        Self {
            max_prompt_chars: 1000,
            max_duration_secs: 60.0,
            min_guidance_scale: 0.0,
            max_guidance_scale: 20.0,
            max_media_bytes: 200 * 1024 * 1024,
        }
    }
}

impl RequestLimits {
    pub fn validate(
        &self,
        prompt: &str,
        media: Option<&MediaPayload>,
        params: &GenerationParams,
    ) -> Result<(), ValidationError> {
        self.validate_prompt(prompt)?;
        if let Some(media) = media {
            self.validate_media(media)?;
        }
        self.validate_params(params)
    }

    fn validate_prompt(&self, prompt: &str) -> Result<(), ValidationError> {
        if prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }
        let len = prompt.chars().count();
        if len > self.max_prompt_chars {
            return Err(ValidationError::PromptTooLong {
                len,
                max: self.max_prompt_chars,
            });
        }
        Ok(())
    }

    fn validate_media(&self, media: &MediaPayload) -> Result<(), ValidationError> {
        if media.is_empty() {
            return Err(ValidationError::EmptyMedia);
        }
        if media.len() > self.max_media_bytes {
            return Err(ValidationError::MediaTooLarge {
                size: media.len(),
                max: self.max_media_bytes,
            });
        }
        if media.kind().is_none() {
            return Err(ValidationError::UnsupportedMedia(media.mime_type.clone()));
        }
        Ok(())
    }

    fn validate_params(&self, params: &GenerationParams) -> Result<(), ValidationError> {
        if let Some(duration) = params.duration_secs {
            if !duration.is_finite() || duration <= 0.0 || duration > self.max_duration_secs {
                return Err(ValidationError::DurationOutOfRange {
                    value: duration,
                    max: self.max_duration_secs,
                });
            }
        }
        if let Some(guidance) = params.guidance_scale {
            if !guidance.is_finite()
                || guidance < self.min_guidance_scale
                || guidance > self.max_guidance_scale
            {
                return Err(ValidationError::GuidanceOutOfRange {
                    value: guidance,
                    min: self.min_guidance_scale,
                    max: self.max_guidance_scale,
                });
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("prompt must not be empty")]
    EmptyPrompt,
    #[error("prompt is {len} characters, the limit is {max}")]
    PromptTooLong { len: usize, max: usize },
    #[error("duration_secs must be in (0, {max}], got {value}")]
    DurationOutOfRange { value: f32, max: f32 },
    #[error("guidance_scale must be in [{min}, {max}], got {value}")]
    GuidanceOutOfRange { value: f32, min: f32, max: f32 },
    #[error("media payload is empty")]
    EmptyMedia,
    #[error("media payload is {size} bytes, the limit is {max}")]
    MediaTooLarge { size: usize, max: usize },
    #[error("unsupported media type: {0}")]
    UnsupportedMedia(String),
    #[error("invalid request: {0}")]
    Malformed(String),
}
