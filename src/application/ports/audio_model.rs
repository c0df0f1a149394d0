use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::domain::{GenerationParams, MediaPayload};

/// Local paths of every artifact the model needs, keyed by artifact id.
#[derive(Debug, Clone, Default)]
pub struct ArtifactPaths {
    paths: HashMap<String, PathBuf>,
}

impl ArtifactPaths {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, artifact_id: impl Into<String>, path: PathBuf) {
        self.paths.insert(artifact_id.into(), path);
    }

    pub fn get(&self, artifact_id: &str) -> Option<&Path> {
        self.paths.get(artifact_id).map(PathBuf::as_path)
    }

    pub fn require(&self, artifact_id: &str) -> Result<&Path, ModelError> {
        self.get(artifact_id)
            .ok_or_else(|| ModelError::MissingArtifact(artifact_id.to_string()))
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct ModelInput {
    pub prompt: String,
    pub media: Option<MediaPayload>,
    pub params: GenerationParams,
}

/// Mono f32 samples produced by the model.
#[derive(Debug, Clone)]
pub struct ModelOutput {
    pub target: Vec<f32>,
    pub residual: Option<Vec<f32>>,
    pub sample_rate: u32,
}

impl ModelOutput {
    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.target.len() as f32 / self.sample_rate as f32
    }
}

/// A loaded, device resident model. Calls block the current thread.
pub trait AudioModel: Send + Sync {
    fn device(&self) -> &str;

    fn infer(&self, input: &ModelInput) -> Result<ModelOutput, ModelError>;
}

/// Builds a model from cached artifacts. Blocking; may take minutes.
pub trait ModelLoader: Send + Sync {
    fn load(&self, artifacts: &ArtifactPaths) -> Result<Arc<dyn AudioModel>, ModelError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ModelError {
    #[error("model loading failed: {0}")]
    LoadFailed(String),
    #[error("missing artifact: {0}")]
    MissingArtifact(String),
    #[error("device fault: {0}")]
    DeviceFault(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
}

impl ModelError {
    pub fn is_device_fault(&self) -> bool {
        matches!(self, ModelError::DeviceFault(_))
    }
}
