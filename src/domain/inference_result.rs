use bytes::Bytes;

use super::generation_params::GenerationParams;

pub const WAV_MIME: &str = "audio/wav";

/// Encoded output of a single inference call.
#[derive(Debug, Clone)]
pub struct InferenceResult {
    /// Target stem as a 16-bit PCM WAV file.
    pub audio: Bytes,
    /// Everything the model separated away from the target, when it produces it.
    pub residual: Option<Bytes>,
    pub sample_rate: u32,
    pub duration_secs: f32,
    pub prompt: String,
    pub prompt_augmented: bool,
    pub params: GenerationParams,
}

impl InferenceResult {
    pub fn content_type(&self) -> &'static str {
        WAV_MIME
    }
}
