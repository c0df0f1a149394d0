use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

use super::TracingConfig;

/// `RUST_LOG` wins over the configured level. A malformed `RUST_LOG` falls
/// back to the configured level instead of silencing everything.
pub fn build_filter(config: &TracingConfig) -> EnvFilter {
    match std::env::var(EnvFilter::DEFAULT_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(&directives)
            .unwrap_or_else(|_| EnvFilter::new(&config.default_filter)),
        _ => EnvFilter::new(&config.default_filter),
    }
}

/// Installs the global subscriber. Errors when one is already installed.
pub fn try_init_tracing(config: &TracingConfig) -> Result<(), TryInitError> {
    // Only one of the two layers is ever `Some`.
    let json_layer = config.json_format.then(|| {
        fmt::layer()
            .json()
            .with_current_span(true)
            .with_file(true)
            .with_line_number(true)
    });
    let text_layer = (!config.json_format).then(|| fmt::layer().with_target(true));

    tracing_subscriber::registry()
        .with(build_filter(config))
        .with(json_layer)
        .with(text_layer)
        .try_init()?;

    tracing::info!(
        environment = %config.environment,
        json_format = config.json_format,
        filter = %config.default_filter,
        "Tracing initialized"
    );
    Ok(())
}

pub fn init_tracing(config: &TracingConfig) {
    if let Err(e) = try_init_tracing(config) {
        eprintln!("tracing already initialized: {e}");
    }
}
