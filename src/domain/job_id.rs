use std::fmt;

use uuid::Uuid;

const JOB_ID_LEN: usize = 12;

/// Identifier of a separation job; also the directory name of its outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new() -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(simple[..JOB_ID_LEN].to_string())
    }

    /// Accepts only ids this service could have issued, so a job id can be
    /// used as a path segment safely.
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = raw.len() == JOB_ID_LEN
            && raw
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
