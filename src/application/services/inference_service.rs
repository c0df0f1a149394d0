use std::sync::Arc;
use std::time::Duration;

use crate::domain::{GenerationParams, InferenceRequest, InferenceResult, MediaPayload};
use crate::infrastructure::observability::sanitize_prompt;

use super::model_runtime::{ModelRuntime, RuntimeError};
use super::prompt_augmenter::{AugmentedPrompt, PromptAugmenter};
use super::request_validator::{RequestLimits, ValidationError};

/// What a caller asks for, before validation and augmentation.
#[derive(Debug, Clone)]
pub struct InferenceCommand {
    pub prompt: Option<String>,
    pub media: Option<MediaPayload>,
    pub params: GenerationParams,
    pub augment: bool,
}

/// Validate, augment, wait for the model, infer.
pub struct InferenceService {
    runtime: Arc<ModelRuntime>,
    augmenter: Arc<PromptAugmenter>,
    limits: RequestLimits,
    load_wait: Duration,
}

impl InferenceService {
    pub fn new(
        runtime: Arc<ModelRuntime>,
        augmenter: Arc<PromptAugmenter>,
        limits: RequestLimits,
        load_wait: Duration,
    ) -> Self {
        Self {
            runtime,
            augmenter,
            limits,
            load_wait,
        }
    }

    pub fn runtime(&self) -> &Arc<ModelRuntime> {
        &self.runtime
    }

    pub fn limits(&self) -> &RequestLimits {
        &self.limits
    }

    pub async fn run(&self, command: InferenceCommand) -> Result<InferenceResult, InferenceError> {
        let requested = command
            .prompt
            .as_deref()
            .unwrap_or(self.augmenter.default_prompt());
        self.limits
            .validate(requested, command.media.as_ref(), &command.params)?;

        let augmented = if command.augment {
            self.augmenter
                .augment(command.prompt.as_deref(), command.media.as_ref())
                .await
        } else {
            AugmentedPrompt::Original {
                prompt: requested.trim().to_string(),
            }
        };
        let prompt_augmented = augmented.is_augmented();

        tracing::info!(
            prompt = %sanitize_prompt(augmented.prompt()),
            prompt_augmented,
            has_media = command.media.is_some(),
            "Running inference"
        );

        let model = tokio::time::timeout(self.load_wait, self.runtime.get_or_load())
            .await
            .map_err(|_| {
                RuntimeError::ModelUnavailable(format!(
                    "model is still loading after {}s",
                    self.load_wait.as_secs()
                ))
            })??;

        let mut request = InferenceRequest::new(augmented.into_prompt()).with_params(command.params);
        request.media = command.media;

        let mut result = self.runtime.infer(model, request).await?;
        result.prompt_augmented = prompt_augmented;
        Ok(result)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum InferenceError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Runtime(#[from] RuntimeError),
}
