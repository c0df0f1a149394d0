use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use reqwest::{Client, StatusCode};
use tokio::io::AsyncWriteExt;

use crate::application::ports::{ArtifactFetcher, FetchError};
use crate::domain::{ArtifactSpec, Secret};

pub const HUB_ENDPOINT: &str = "https://huggingface.co";

/// Streams model files from a Hugging Face compatible `resolve` endpoint.
pub struct HubFetcher {
    client: Client,
    endpoint: String,
    token: Option<Secret>,
}

impl HubFetcher {
    pub fn new(
        endpoint: &str,
        token: Option<Secret>,
        timeout: Duration,
    ) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dubgate/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Transport(format!("client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.trim_end_matches('/').to_string(),
            token,
        })
    }

    fn url(&self, artifact: &ArtifactSpec) -> String {
        format!(
            "{}/{}/resolve/{}/{}",
            self.endpoint, artifact.repo, artifact.revision, artifact.filename
        )
    }
}

#[async_trait]
impl ArtifactFetcher for HubFetcher {
    async fn fetch(&self, artifact: &ArtifactSpec, dest: &Path) -> Result<u64, FetchError> {
        let url = self.url(artifact);
        tracing::debug!(artifact = %artifact.id, url = %url, "Requesting artifact");

        let mut request = self.client.get(&url);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token.expose());
        }

        // `without_url` keeps signed redirect targets out of error messages.
        let response = request
            .send()
            .await
            .map_err(|e| FetchError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        match status {
            s if s.is_success() => {}
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(FetchError::Unauthorized(artifact.repo.clone()));
            }
            StatusCode::NOT_FOUND => {
                return Err(FetchError::NotFound(format!(
                    "{}/{}@{}",
                    artifact.repo, artifact.filename, artifact.revision
                )));
            }
            _ => {
                let message = response.text().await.unwrap_or_default();
                return Err(FetchError::Status {
                    status: status.as_u16(),
                    message: message.chars().take(200).collect(),
                });
            }
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| FetchError::Transport(e.without_url().to_string()))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        file.sync_all().await?;

        tracing::debug!(artifact = %artifact.id, bytes = written, "Artifact downloaded");
        Ok(written)
    }
}
