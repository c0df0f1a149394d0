mod api_error;
mod files;
mod health;
mod separate;
mod synthesize;

pub use api_error::{ApiError, ErrorResponse};
pub use files::{delete_job_handler, get_file_handler};
pub use health::{HealthResponse, health_handler, readiness_handler};
pub use separate::{SeparateResponse, separate_handler};
pub use synthesize::{
    DURATION_HEADER, PROMPT_AUGMENTED_HEADER, SAMPLE_RATE_HEADER, SynthesizeRequest,
    synthesize_handler,
};
