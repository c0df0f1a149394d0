use crate::presentation::config::{Environment, LoggingSettings};

const LOG_FORMAT_VAR: &str = "LOG_FORMAT";

/// Configuration for tracing initialization.
pub struct TracingConfig {
    pub environment: Environment,
    pub json_format: bool,
    pub default_filter: String,
}

/// `LOG_FORMAT=json` forces JSON output regardless of settings.
fn json_requested(fallback: bool) -> bool {
    std::env::var(LOG_FORMAT_VAR)
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(fallback)
}

impl TracingConfig {
    pub fn new(environment: Environment, logging: &LoggingSettings) -> Self {
        Self {
            environment,
            json_format: json_requested(logging.json),
            default_filter: logging.level.clone(),
        }
    }
}

impl Default for TracingConfig {
    fn default() -> Self {
        Self::new(Environment::default(), &LoggingSettings::default())
    }
}
