use std::path::PathBuf;
use std::sync::Arc;

use bytes::Bytes;
use futures::TryStreamExt;
use object_store::local::LocalFileSystem;
use object_store::path::Path as StorePath;
use object_store::{ObjectStore, PutPayload};

use crate::application::ports::{OutputStore, OutputStoreError};
use crate::domain::{JobId, StoragePath};

pub struct LocalOutputStore {
    inner: Arc<LocalFileSystem>,
}

impl LocalOutputStore {
    pub fn new(base_path: PathBuf) -> Result<Self, OutputStoreError> {
        std::fs::create_dir_all(&base_path).map_err(OutputStoreError::Io)?;
        let fs = LocalFileSystem::new_with_prefix(base_path)
            .map_err(|e| OutputStoreError::UploadFailed(e.to_string()))?;
        Ok(Self {
            inner: Arc::new(fs),
        })
    }
}

fn map_read_error(err: object_store::Error) -> OutputStoreError {
    match err {
        object_store::Error::NotFound { path, .. } => OutputStoreError::NotFound(path),
        other => OutputStoreError::DownloadFailed(other.to_string()),
    }
}

#[async_trait::async_trait]
impl OutputStore for LocalOutputStore {
    async fn put(&self, path: &StoragePath, data: Bytes) -> Result<u64, OutputStoreError> {
        let store_path = StorePath::from(path.as_str());
        let size = data.len() as u64;
        self.inner
            .put(&store_path, PutPayload::from(data))
            .await
            .map_err(|e| OutputStoreError::UploadFailed(e.to_string()))?;

        tracing::debug!(path = %path, bytes = size, "Stored job output");
        Ok(size)
    }

    async fn fetch(&self, path: &StoragePath) -> Result<Bytes, OutputStoreError> {
        let store_path = StorePath::from(path.as_str());
        let result = self.inner.get(&store_path).await.map_err(map_read_error)?;
        result.bytes().await.map_err(map_read_error)
    }

    async fn delete_job(&self, job_id: &JobId) -> Result<usize, OutputStoreError> {
        let prefix = StorePath::from(StoragePath::job_prefix(job_id).as_str());
        let objects: Vec<_> = self
            .inner
            .list(Some(&prefix))
            .try_collect()
            .await
            .map_err(|e| OutputStoreError::DeleteFailed(e.to_string()))?;

        if objects.is_empty() {
            return Err(OutputStoreError::NotFound(job_id.to_string()));
        }

        for meta in &objects {
            self.inner
                .delete(&meta.location)
                .await
                .map_err(|e| OutputStoreError::DeleteFailed(e.to_string()))?;
        }

        Ok(objects.len())
    }
}
