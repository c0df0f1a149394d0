use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;

use crate::application::ports::{AudioModel, ModelError, ModelInput, ModelLoader};
use crate::domain::{InferenceRequest, InferenceResult, ModelStatus};

use super::wav_encoder::encode_wav;
use super::weight_cache::WeightCache;

enum ModelState {
    Uninitialized,
    Loading,
    Ready(Arc<dyn AudioModel>),
    Failed(String),
}

/// Owns the single model instance of the process.
///
/// Loading is exclusive and shared: the first caller starts it, everyone else
/// waits on the same attempt. Inference is serialized so two requests never
/// drive the device at once, and a load holds the device too, so no inference
/// overlaps it.
pub struct ModelRuntime {
    cache: Arc<WeightCache>,
    loader: Arc<dyn ModelLoader>,
    state: RwLock<ModelState>,
    load_gate: Arc<Mutex<()>>,
    finished_loads: AtomicU64,
    inference_gate: Arc<Mutex<()>>,
    inference_timeout: Option<Duration>,
}

impl ModelRuntime {
    pub fn new(
        cache: Arc<WeightCache>,
        loader: Arc<dyn ModelLoader>,
        inference_timeout: Option<Duration>,
    ) -> Self {
        Self {
            cache,
            loader,
            state: RwLock::new(ModelState::Uninitialized),
            load_gate: Arc::new(Mutex::new(())),
            finished_loads: AtomicU64::new(0),
            inference_gate: Arc::new(Mutex::new(())),
            inference_timeout,
        }
    }

    pub fn status(&self) -> ModelStatus {
        match &*self.read_state() {
            ModelState::Uninitialized | ModelState::Loading => ModelStatus::Loading,
            ModelState::Ready(_) => ModelStatus::Ready,
            ModelState::Failed(_) => ModelStatus::Failed,
        }
    }

    pub fn failure_reason(&self) -> Option<String> {
        match &*self.read_state() {
            ModelState::Failed(reason) => Some(reason.clone()),
            _ => None,
        }
    }

    /// Warms the model in the background so the first request does not pay for it.
    pub fn spawn_preload(self: &Arc<Self>) -> JoinHandle<()> {
        let runtime = Arc::clone(self);
        tokio::spawn(async move {
            if let Err(e) = runtime.get_or_load().await {
                tracing::error!(error = %e, "Model preload failed");
            }
        })
    }

    pub async fn get_or_load(self: &Arc<Self>) -> Result<Arc<dyn AudioModel>, RuntimeError> {
        if let Some(model) = self.ready_model() {
            return Ok(model);
        }

        let seen_loads = self.finished_loads.load(Ordering::SeqCst);
        let gate = Arc::clone(&self.load_gate).lock_owned().await;

        match &*self.read_state() {
            ModelState::Ready(model) => return Ok(Arc::clone(model)),
            ModelState::Failed(reason) if self.finished_loads.load(Ordering::SeqCst) != seen_loads => {
                return Err(RuntimeError::ModelUnavailable(reason.clone()));
            }
            _ => {}
        }

        // The load runs in its own task so a caller that goes away mid-load
        // cannot leave the handle stuck in `Loading`.
        let runtime = Arc::clone(self);
        let task = tokio::spawn(async move {
            let _gate = gate;
            runtime.write_state(ModelState::Loading);

            // Inference already on the device finishes first; anything queued
            // behind it sees `Loading` and backs off.
            let _device = Arc::clone(&runtime.inference_gate).lock_owned().await;
            tracing::info!("Loading model");
            let started = std::time::Instant::now();

            let outcome = match runtime.load().await {
                Ok(model) => {
                    tracing::info!(
                        device = model.device(),
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Model ready"
                    );
                    runtime.write_state(ModelState::Ready(Arc::clone(&model)));
                    Ok(model)
                }
                Err(reason) => {
                    tracing::error!(error = %reason, "Model load failed");
                    runtime.write_state(ModelState::Failed(reason.clone()));
                    Err(RuntimeError::ModelUnavailable(reason))
                }
            };
            runtime.finished_loads.fetch_add(1, Ordering::SeqCst);
            outcome
        });

        task.await
            .map_err(|e| RuntimeError::ModelUnavailable(format!("load task aborted: {e}")))?
    }

    /// Runs on the model published at the time the device is acquired, which
    /// is `model` unless a reload happened while the request was queued.
    pub async fn infer(
        self: &Arc<Self>,
        model: Arc<dyn AudioModel>,
        request: InferenceRequest,
    ) -> Result<InferenceResult, RuntimeError> {
        if self.status() != ModelStatus::Ready {
            return Err(RuntimeError::ModelUnavailable(
                "model is not ready".to_string(),
            ));
        }

        let params = request.params;
        let prompt = request.prompt.clone();
        let input = ModelInput {
            prompt: request.prompt,
            media: request.media,
            params,
        };

        // The permit moves into the blocking task so the device stays locked
        // until the work really ends, even if this future is dropped.
        let runtime = Arc::clone(self);
        let gate = Arc::clone(&self.inference_gate);
        let work = async move {
            let permit = gate.lock_owned().await;
            let current = runtime.ready_model().ok_or_else(|| {
                RuntimeError::ModelUnavailable("model is reloading".to_string())
            })?;
            if !std::ptr::addr_eq(Arc::as_ptr(&current), Arc::as_ptr(&model)) {
                tracing::debug!("Model was reloaded while the request was queued");
            }
            let model = current;

            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                model.infer(&input).inspect_err(|e| {
                    // Marked while the device is still held, so nothing queued
                    // runs on the faulted model.
                    if e.is_device_fault() {
                        tracing::error!(error = %e, "Device fault during inference, marking model failed");
                        runtime.write_state(ModelState::Failed(e.to_string()));
                    }
                })
            })
            .await
            .map_err(|e| RuntimeError::Inference(format!("inference task panicked: {e}")))?
            .map_err(RuntimeError::from)
        };

        let output = match self.inference_timeout {
            Some(limit) => tokio::time::timeout(limit, work)
                .await
                .map_err(|_| RuntimeError::InferenceTimeout(limit))??,
            None => work.await?,
        };

        let duration_secs = output.duration_secs();
        let audio = encode_wav(&output.target, output.sample_rate)
            .map_err(|e| RuntimeError::Inference(format!("wav encoding: {e}")))?;
        let residual = output
            .residual
            .as_deref()
            .map(|samples| encode_wav(samples, output.sample_rate))
            .transpose()
            .map_err(|e| RuntimeError::Inference(format!("wav encoding: {e}")))?;

        tracing::info!(
            sample_rate = output.sample_rate,
            duration_secs,
            has_residual = residual.is_some(),
            "Inference completed"
        );

        Ok(InferenceResult {
            audio,
            residual,
            sample_rate: output.sample_rate,
            duration_secs,
            prompt,
            prompt_augmented: false,
            params,
        })
    }

    /// Every failure becomes the reason stored in `Failed`, so the caller
    /// that ran the load and the callers waiting on it see the same error.
    async fn load(&self) -> Result<Arc<dyn AudioModel>, String> {
        let paths = self.cache.ensure_all().await.map_err(|e| e.to_string())?;
        let loader = Arc::clone(&self.loader);

        tokio::task::spawn_blocking(move || loader.load(&paths))
            .await
            .map_err(|e| format!("loader panicked: {e}"))?
            .map_err(|e| e.to_string())
    }

    fn ready_model(&self) -> Option<Arc<dyn AudioModel>> {
        match &*self.read_state() {
            ModelState::Ready(model) => Some(Arc::clone(model)),
            _ => None,
        }
    }

    fn read_state(&self) -> std::sync::RwLockReadGuard<'_, ModelState> {
        self.state.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_state(&self, next: ModelState) {
        *self.state.write().unwrap_or_else(|e| e.into_inner()) = next;
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("model unavailable: {0}")]
    ModelUnavailable(String),
    #[error("inference failed: {0}")]
    Inference(String),
    #[error("inference timed out after {0:?}")]
    InferenceTimeout(Duration),
    #[error("unsupported input: {0}")]
    UnsupportedInput(String),
}

impl From<ModelError> for RuntimeError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::UnsupportedInput(msg) => RuntimeError::UnsupportedInput(msg),
            ModelError::LoadFailed(_) | ModelError::MissingArtifact(_) => {
                RuntimeError::ModelUnavailable(err.to_string())
            }
            ModelError::DeviceFault(_) | ModelError::InferenceFailed(_) => {
                RuntimeError::Inference(err.to_string())
            }
        }
    }
}
