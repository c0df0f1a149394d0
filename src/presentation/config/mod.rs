mod credentials;
mod environment;
mod settings;

pub use credentials::{Credentials, GEMINI_API_KEY_VAR, HF_TOKEN_VAR};
pub use environment::{ENVIRONMENT_VAR, Environment, UnknownEnvironment};
pub use settings::{
    AugmentationSettings, CacheSettings, LimitsSettings, LoggingSettings, ModelBackend,
    ModelSettings, PythonBackendSettings, ServerSettings, Settings, StorageSettings,
};
