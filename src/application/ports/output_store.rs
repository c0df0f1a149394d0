use std::io;

use bytes::Bytes;

use crate::domain::{JobId, StoragePath};

/// Persistence for the audio files a job leaves behind for later download.
#[async_trait::async_trait]
pub trait OutputStore: Send + Sync {
    async fn put(&self, path: &StoragePath, data: Bytes) -> Result<u64, OutputStoreError>;

    async fn fetch(&self, path: &StoragePath) -> Result<Bytes, OutputStoreError>;

    /// Removes every file of the job. Errors with `NotFound` when nothing was stored.
    async fn delete_job(&self, job_id: &JobId) -> Result<usize, OutputStoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum OutputStoreError {
    #[error("upload failed: {0}")]
    UploadFailed(String),
    #[error("object not found: {0}")]
    NotFound(String),
    #[error("download failed: {0}")]
    DownloadFailed(String),
    #[error("delete failed: {0}")]
    DeleteFailed(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}
