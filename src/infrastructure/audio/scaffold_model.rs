use std::f32::consts::TAU;
use std::sync::Arc;
use std::time::Duration;

use crate::application::ports::{
    ArtifactPaths, AudioModel, ModelError, ModelInput, ModelLoader, ModelOutput,
};

use super::audio_decoder::decode_audio;

const FADE_SECS: f32 = 0.01;
const AMPLITUDE: f32 = 0.25;

/// Stand-in backend for wiring and connectivity checks. Behaves like a
/// separation model on audio it can decode and renders a tone otherwise.
pub struct ScaffoldModelLoader {
    sample_rate: u32,
    default_duration_secs: f32,
    warmup: Duration,
}

impl ScaffoldModelLoader {
    pub fn new(sample_rate: u32, default_duration_secs: f32, warmup: Duration) -> Self {
        Self {
            sample_rate,
            default_duration_secs,
            warmup,
        }
    }
}

impl ModelLoader for ScaffoldModelLoader {
    fn load(&self, artifacts: &ArtifactPaths) -> Result<Arc<dyn AudioModel>, ModelError> {
        tracing::info!(
            artifacts = artifacts.len(),
            warmup_ms = self.warmup.as_millis() as u64,
            "Loading scaffold model"
        );
        if !self.warmup.is_zero() {
            std::thread::sleep(self.warmup);
        }
        Ok(Arc::new(ScaffoldModel {
            sample_rate: self.sample_rate,
            default_duration_secs: self.default_duration_secs,
        }))
    }
}

pub struct ScaffoldModel {
    sample_rate: u32,
    default_duration_secs: f32,
}

impl AudioModel for ScaffoldModel {
    fn device(&self) -> &str {
        "cpu"
    }

    fn infer(&self, input: &ModelInput) -> Result<ModelOutput, ModelError> {
        match &input.media {
            Some(media) => {
                let extension = media
                    .filename
                    .as_deref()
                    .and_then(|f| f.rsplit_once('.'))
                    .map(|(_, ext)| ext);
                let decoded = decode_audio(&media.data, extension)
                    .map_err(|e| ModelError::UnsupportedInput(e.to_string()))?;

                let mut target = decoded.samples;
                if let Some(limit) = input.params.duration_secs {
                    target.truncate((limit * decoded.sample_rate as f32) as usize);
                }
                let residual = vec![0.0; target.len()];

                Ok(ModelOutput {
                    target,
                    residual: Some(residual),
                    sample_rate: decoded.sample_rate,
                })
            }
            None => {
                let duration = input.params.duration_secs.unwrap_or(self.default_duration_secs);
                let seed = input.params.seed.unwrap_or_else(|| fnv1a(input.prompt.as_bytes()));
                Ok(ModelOutput {
                    target: render_tone(seed, duration, self.sample_rate),
                    residual: None,
                    sample_rate: self.sample_rate,
                })
            }
        }
    }
}

fn render_tone(seed: u64, duration_secs: f32, sample_rate: u32) -> Vec<f32> {
    let frequency = 110.0 + (seed % 660) as f32;
    let total = (duration_secs * sample_rate as f32).round() as usize;
    let fade = ((FADE_SECS * sample_rate as f32) as usize).max(1);

    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let edge = i.min(total - 1 - i);
            let envelope = (edge as f32 / fade as f32).min(1.0);
            AMPLITUDE * envelope * (TAU * frequency * t).sin()
        })
        .collect()
}

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0xcbf2_9ce4_8422_2325, |hash, &b| {
        (hash ^ b as u64).wrapping_mul(0x0000_0100_0000_01b3)
    })
}
