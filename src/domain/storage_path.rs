use std::fmt;

use super::job_id::JobId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoragePath(String);

impl StoragePath {
    pub fn new(job_id: &JobId, filename: &str) -> Self {
        Self(format!("{}/{}", job_id, filename))
    }

    /// Builds a path from a client supplied filename, refusing anything that
    /// could escape the job directory.
    pub fn for_job_file(job_id: &JobId, filename: &str) -> Option<Self> {
        let safe = !filename.is_empty()
            && !filename.starts_with('.')
            && !filename.contains(['/', '\\']);
        safe.then(|| Self::new(job_id, filename))
    }

    pub fn job_prefix(job_id: &JobId) -> Self {
        Self(job_id.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StoragePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
