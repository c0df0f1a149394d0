use std::sync::Arc;

use bytes::Bytes;

use crate::application::ports::{OutputStore, OutputStoreError};
use crate::domain::{GenerationParams, JobId, MediaPayload, StoragePath};

use super::inference_service::{InferenceCommand, InferenceError, InferenceService};

pub const SPEECH_FILE: &str = "speech.wav";
pub const BACKGROUND_FILE: &str = "background.wav";

/// Where the stems of a finished separation job can be fetched.
#[derive(Debug, Clone)]
pub struct SeparationJob {
    pub job_id: JobId,
    pub description: String,
    pub prompt_augmented: bool,
    pub speech: StoragePath,
    pub background: Option<StoragePath>,
    pub sample_rate: u32,
    pub duration_secs: f32,
}

/// Splits uploaded media into the described speaker and the rest, keeping
/// both stems around for download.
pub struct SeparationService {
    inference: Arc<InferenceService>,
    store: Arc<dyn OutputStore>,
}

impl SeparationService {
    pub fn new(inference: Arc<InferenceService>, store: Arc<dyn OutputStore>) -> Self {
        Self { inference, store }
    }

    #[tracing::instrument(skip(self, media, description), fields(bytes = media.len(), mime = %media.mime_type))]
    pub async fn separate(
        &self,
        media: MediaPayload,
        description: Option<String>,
        params: GenerationParams,
    ) -> Result<SeparationJob, SeparationError> {
        let result = self
            .inference
            .run(InferenceCommand {
                prompt: description,
                media: Some(media),
                params,
                augment: true,
            })
            .await?;

        let job_id = JobId::new();
        let speech = StoragePath::new(&job_id, SPEECH_FILE);
        let background = result
            .residual
            .as_ref()
            .map(|_| StoragePath::new(&job_id, BACKGROUND_FILE));

        if let Err(e) = self.persist(&speech, result.audio, background.as_ref(), result.residual).await {
            tracing::error!(job_id = %job_id, error = %e, "Failed to store job output");
            if let Err(cleanup) = self.store.delete_job(&job_id).await {
                tracing::debug!(job_id = %job_id, error = %cleanup, "Nothing to clean up");
            }
            return Err(e.into());
        }

        tracing::info!(
            job_id = %job_id,
            duration_secs = result.duration_secs,
            prompt_augmented = result.prompt_augmented,
            "Separation job completed"
        );

        Ok(SeparationJob {
            job_id,
            description: result.prompt,
            prompt_augmented: result.prompt_augmented,
            speech,
            background,
            sample_rate: result.sample_rate,
            duration_secs: result.duration_secs,
        })
    }

    pub async fn fetch_file(&self, job_id: &JobId, filename: &str) -> Result<Bytes, SeparationError> {
        let path = StoragePath::for_job_file(job_id, filename)
            .ok_or_else(|| SeparationError::InvalidFilename(filename.to_string()))?;
        Ok(self.store.fetch(&path).await?)
    }

    pub async fn delete_job(&self, job_id: &JobId) -> Result<usize, SeparationError> {
        let removed = self.store.delete_job(job_id).await?;
        tracing::info!(job_id = %job_id, removed, "Job output deleted");
        Ok(removed)
    }

    async fn persist(
        &self,
        speech: &StoragePath,
        speech_wav: Bytes,
        background: Option<&StoragePath>,
        background_wav: Option<Bytes>,
    ) -> Result<(), OutputStoreError> {
        self.store.put(speech, speech_wav).await?;
        if let (Some(path), Some(wav)) = (background, background_wav) {
            self.store.put(path, wav).await?;
        }
        Ok(())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SeparationError {
    #[error(transparent)]
    Inference(#[from] InferenceError),
    #[error("storage: {0}")]
    Storage(#[from] OutputStoreError),
    #[error("invalid filename: {0}")]
    InvalidFilename(String),
}
