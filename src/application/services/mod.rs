mod inference_service;
mod model_runtime;
mod prompt_augmenter;
mod request_validator;
mod separation_service;
mod wav_encoder;
mod weight_cache;

pub use inference_service::{InferenceCommand, InferenceError, InferenceService};
pub use model_runtime::{ModelRuntime, RuntimeError};
pub use prompt_augmenter::{AugmentedPrompt, PromptAugmenter, SPEAKER_PROMPT};
pub use request_validator::{RequestLimits, ValidationError};
pub use separation_service::{
    BACKGROUND_FILE, SPEECH_FILE, SeparationError, SeparationJob, SeparationService,
};
pub use wav_encoder::encode_wav;
pub use weight_cache::{CacheError, RetryPolicy, WeightCache};
