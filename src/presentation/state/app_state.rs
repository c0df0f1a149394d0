use std::sync::Arc;

use crate::application::services::{InferenceService, SeparationService};

#[derive(Clone)]
pub struct AppState {
    pub inference_service: Arc<InferenceService>,
    pub separation_service: Arc<SeparationService>,
    pub body_limit_bytes: usize,
}
