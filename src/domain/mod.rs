mod artifact;
mod generation_params;
mod inference_request;
mod inference_result;
mod job_id;
mod media;
mod model_status;
mod secret;
mod storage_path;

pub use artifact::{ArtifactSpec, CacheEntry};
pub use generation_params::GenerationParams;
pub use inference_request::InferenceRequest;
pub use inference_result::{InferenceResult, WAV_MIME};
pub use job_id::JobId;
pub use media::{FALLBACK_MIME, MediaKind, MediaPayload, mime_from_filename};
pub use model_status::ModelStatus;
pub use secret::Secret;
pub use storage_path::StoragePath;
