use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use uuid::Uuid;

use crate::application::ports::{ArtifactFetcher, ArtifactPaths, FetchError};
use crate::domain::{ArtifactSpec, CacheEntry};

const PARTIAL_SUFFIX: &str = ".partial";

/// Bounded exponential backoff for artifact downloads.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
}

impl RetryPolicy {
    /// Delay before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            initial_backoff: Duration::from_millis(500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

/// Keeps model artifacts in a persistent directory, downloading each one at
/// most once. Files only ever appear at their final path through a rename, so
/// anything found there is complete.
pub struct WeightCache {
    cache_dir: PathBuf,
    artifacts: Vec<ArtifactSpec>,
    fetcher: Arc<dyn ArtifactFetcher>,
    retry: RetryPolicy,
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl WeightCache {
    pub fn new(
        cache_dir: PathBuf,
        artifacts: Vec<ArtifactSpec>,
        fetcher: Arc<dyn ArtifactFetcher>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            cache_dir,
            artifacts,
            fetcher,
            retry,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn artifacts(&self) -> &[ArtifactSpec] {
        &self.artifacts
    }

    pub fn entry_path(&self, artifact: &ArtifactSpec) -> PathBuf {
        self.cache_dir.join(artifact.relative_path())
    }

    /// Existence check only; contents are trusted because of the rename protocol.
    pub async fn lookup(&self, artifact_id: &str) -> Result<Option<CacheEntry>, CacheError> {
        let artifact = self.spec(artifact_id)?;
        let path = self.entry_path(artifact);
        Ok(is_file(&path).await.then(|| CacheEntry {
            artifact_id: artifact.id.clone(),
            path,
        }))
    }

    #[tracing::instrument(skip(self))]
    pub async fn ensure(&self, artifact_id: &str) -> Result<PathBuf, CacheError> {
        let artifact = self.spec(artifact_id)?;
        let final_path = self.entry_path(artifact);

        if is_file(&final_path).await {
            tracing::debug!(path = %final_path.display(), "Artifact already cached");
            return Ok(final_path);
        }

        let lock = self.lock_for(artifact_id);
        let _guard = lock.lock().await;

        // Another caller may have finished the download while we waited.
        if is_file(&final_path).await {
            tracing::debug!(path = %final_path.display(), "Artifact downloaded by concurrent caller");
            return Ok(final_path);
        }

        self.download(artifact, &final_path).await?;
        Ok(final_path)
    }

    pub async fn ensure_all(&self) -> Result<ArtifactPaths, CacheError> {
        let mut paths = ArtifactPaths::new();
        for artifact in &self.artifacts {
            let path = self.ensure(&artifact.id).await?;
            paths.insert(artifact.id.clone(), path);
        }
        Ok(paths)
    }

    /// Removes scratch files a crashed download left behind.
    pub async fn sweep_partial_downloads(&self) -> Result<usize, CacheError> {
        let root = self.cache_dir.clone();
        let swept = tokio::task::spawn_blocking(move || sweep_dir(&root))
            .await
            .map_err(|e| CacheError::unavailable(&self.cache_dir, e.to_string()))?
            .map_err(|e| CacheError::unavailable(&self.cache_dir, e.to_string()))?;

        if swept > 0 {
            tracing::info!(swept, "Removed stale partial downloads");
        }
        Ok(swept)
    }

    async fn download(&self, artifact: &ArtifactSpec, final_path: &Path) -> Result<(), CacheError> {
        let parent = final_path.parent().unwrap_or(&self.cache_dir);
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| CacheError::unavailable(parent, e.to_string()))?;

        let file_name = final_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| artifact.id.clone());

        let mut attempt = 0;
        loop {
            attempt += 1;
            let partial = parent.join(format!(
                "{}.{}{}",
                file_name,
                Uuid::new_v4().simple(),
                PARTIAL_SUFFIX
            ));

            // Creating the scratch file up front separates an unwritable cache
            // from a failing remote.
            tokio::fs::File::create(&partial)
                .await
                .map_err(|e| CacheError::unavailable(parent, e.to_string()))?;

            tracing::info!(
                artifact = %artifact.id,
                repo = %artifact.repo,
                file = %artifact.filename,
                attempt,
                "Downloading model artifact"
            );

            match self.fetcher.fetch(artifact, &partial).await {
                Ok(bytes) => {
                    if let Err(e) = tokio::fs::rename(&partial, final_path).await {
                        let _ = tokio::fs::remove_file(&partial).await;
                        return Err(CacheError::unavailable(parent, e.to_string()));
                    }
                    tracing::info!(artifact = %artifact.id, bytes, "Artifact cached");
                    return Ok(());
                }
                Err(err) => {
                    let _ = tokio::fs::remove_file(&partial).await;

                    if !err.is_retryable() || attempt >= self.retry.max_attempts {
                        tracing::error!(
                            artifact = %artifact.id,
                            attempt,
                            error = %err,
                            "Artifact download failed"
                        );
                        return Err(CacheError::DownloadFailed {
                            artifact: artifact.id.clone(),
                            attempts: attempt,
                            source: err,
                        });
                    }

                    let delay = self.retry.backoff(attempt);
                    tracing::warn!(
                        artifact = %artifact.id,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "Artifact download failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    fn spec(&self, artifact_id: &str) -> Result<&ArtifactSpec, CacheError> {
        self.artifacts
            .iter()
            .find(|a| a.id == artifact_id)
            .ok_or_else(|| CacheError::UnknownArtifact(artifact_id.to_string()))
    }

    fn lock_for(&self, artifact_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        Arc::clone(locks.entry(artifact_id.to_string()).or_default())
    }
}

async fn is_file(path: &Path) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

fn sweep_dir(dir: &Path) -> io::Result<usize> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(0),
        Err(e) => return Err(e),
    };

    let mut swept = 0;
    for entry in entries {
        let path = entry?.path();
        if path.is_dir() {
            swept += sweep_dir(&path)?;
        } else if path
            .file_name()
            .is_some_and(|n| n.to_string_lossy().ends_with(PARTIAL_SUFFIX))
        {
            std::fs::remove_file(&path)?;
            swept += 1;
        }
    }
    Ok(swept)
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("unknown artifact: {0}")]
    UnknownArtifact(String),
    #[error("cache directory unavailable at {path}: {reason}")]
    CacheUnavailable { path: PathBuf, reason: String },
    #[error("download of {artifact} failed after {attempts} attempt(s): {source}")]
    DownloadFailed {
        artifact: String,
        attempts: u32,
        #[source]
        source: FetchError,
    },
}

impl CacheError {
    fn unavailable(path: &Path, reason: String) -> Self {
        CacheError::CacheUnavailable {
            path: path.to_path_buf(),
            reason,
        }
    }
}
