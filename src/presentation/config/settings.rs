use std::path::PathBuf;
use std::time::Duration;

use config::{Config, ConfigError, File};
use serde::Deserialize;

use crate::application::services::{RequestLimits, RetryPolicy};
use crate::domain::ArtifactSpec;
use crate::infrastructure::hub::HUB_ENDPOINT;
use crate::infrastructure::llm::GEMINI_BASE_URL;

use super::Environment;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub model: ModelSettings,
    pub cache: CacheSettings,
    pub augmentation: AugmentationSettings,
    pub limits: LimitsSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Built-in defaults, then `appsettings.{env}.toml`, then `APP_<SECTION>__<KEY>`.
    pub fn load(environment: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::with_name(&environment.settings_file()).required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub body_limit_mb: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            body_limit_mb: 256,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelBackend {
    Scaffold,
    Python,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub backend: ModelBackend,
    pub sample_rate: u32,
    pub default_duration_secs: f32,
    pub scaffold_warmup_ms: u64,
    pub preload: bool,
    pub load_wait_timeout_secs: u64,
    pub inference_timeout_secs: Option<u64>,
    pub python: PythonBackendSettings,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            backend: ModelBackend::Scaffold,
            sample_rate: 48_000,
            default_duration_secs: 5.0,
            scaffold_warmup_ms: 0,
            preload: true,
            load_wait_timeout_secs: 300,
            inference_timeout_secs: None,
            python: PythonBackendSettings::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PythonBackendSettings {
    pub module: String,
    pub class: String,
    pub checkpoint_artifact: String,
    pub dtype: String,
    pub python_path: Option<PathBuf>,
}

impl Default for PythonBackendSettings {
    fn default() -> Self {
        Self {
            module: "sam_audio_infer".to_string(),
            class: "SamAudioInfer".to_string(),
            checkpoint_artifact: "checkpoint".to_string(),
            dtype: "bfloat16".to_string(),
            python_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub dir: PathBuf,
    pub hub_endpoint: String,
    pub download_timeout_secs: u64,
    pub artifacts: Vec<ArtifactSpec>,
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("model-cache"),
            hub_endpoint: HUB_ENDPOINT.to_string(),
            download_timeout_secs: 3600,
            artifacts: Vec::new(),
            max_attempts: 4,
            initial_backoff_ms: 500,
            max_backoff_ms: 30_000,
        }
    }
}

impl CacheSettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts.max(1),
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.max_backoff_ms),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AugmentationSettings {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    pub timeout_ms: u64,
    pub default_prompt: String,
}

impl Default for AugmentationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: GEMINI_BASE_URL.to_string(),
            model: "gemini-2.0-flash".to_string(),
            timeout_ms: 10_000,
            default_prompt: "Person speaking".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LimitsSettings {
    pub max_prompt_chars: usize,
    pub max_duration_secs: f32,
    pub min_guidance_scale: f32,
    pub max_guidance_scale: f32,
    pub max_media_mb: usize,
}

impl Default for LimitsSettings {
    fn default() -> Self {
        Self {
            max_prompt_chars: 1000,
            max_duration_secs: 60.0,
            min_guidance_scale: 0.0,
            max_guidance_scale: 20.0,
            max_media_mb: 200,
        }
    }
}

impl LimitsSettings {
    pub fn request_limits(&self) -> RequestLimits {
        RequestLimits {
            max_prompt_chars: self.max_prompt_chars,
            max_duration_secs: self.max_duration_secs,
            min_guidance_scale: self.min_guidance_scale,
            max_guidance_scale: self.max_guidance_scale,
            max_media_bytes: self.max_media_mb * 1024 * 1024,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub output_dir: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("output"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info,dubgate=debug,tower_http=debug".to_string(),
            json: false,
        }
    }
}
