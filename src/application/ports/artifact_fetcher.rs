use std::io;
use std::path::Path;

use async_trait::async_trait;

use crate::domain::ArtifactSpec;

#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    /// Writes the artifact's bytes to `dest` and returns the byte count.
    /// `dest` is scratch space; publishing it is the caller's job.
    async fn fetch(&self, artifact: &ArtifactSpec, dest: &Path) -> Result<u64, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("transport error: {0}")]
    Transport(String),
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("access denied for {0}")]
    Unauthorized(String),
    #[error("artifact not found: {0}")]
    NotFound(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl FetchError {
    pub fn is_retryable(&self) -> bool {
        match self {
            FetchError::Transport(_) | FetchError::Io(_) => true,
            FetchError::Status { status, .. } => *status == 429 || *status >= 500,
            FetchError::Unauthorized(_) | FetchError::NotFound(_) => false,
        }
    }
}
