use std::path::PathBuf;

use serde::Deserialize;

/// A model file that must be present locally before the model can load.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ArtifactSpec {
    pub id: String,
    pub repo: String,
    pub filename: String,
    #[serde(default = "default_revision")]
    pub revision: String,
}

fn default_revision() -> String {
    "main".to_string()
}

impl ArtifactSpec {
    pub fn new(id: &str, repo: &str, filename: &str) -> Self {
        Self {
            id: id.to_string(),
            repo: repo.to_string(),
            filename: filename.to_string(),
            revision: default_revision(),
        }
    }

    /// Location relative to the cache root: `<repo-with-dashes>/<revision>/<filename>`.
    pub fn relative_path(&self) -> PathBuf {
        PathBuf::from(self.repo.replace('/', "--"))
            .join(&self.revision)
            .join(&self.filename)
    }
}

/// An artifact that exists at its final location in the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    pub artifact_id: String,
    pub path: PathBuf,
}
