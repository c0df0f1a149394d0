mod artifact_fetcher;
mod audio_model;
mod llm_client;
mod output_store;

pub use artifact_fetcher::{ArtifactFetcher, FetchError};
pub use audio_model::{ArtifactPaths, AudioModel, ModelError, ModelInput, ModelLoader, ModelOutput};
pub use llm_client::{CompletionRequest, LlmClient, LlmClientError};
pub use output_store::{OutputStore, OutputStoreError};
