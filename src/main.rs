use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::net::TcpListener;

use dubgate::application::ports::{ArtifactFetcher, LlmClient, OutputStore};
use dubgate::application::services::{
    InferenceService, ModelRuntime, PromptAugmenter, SeparationService, WeightCache,
};
use dubgate::infrastructure::audio::ModelLoaderFactory;
use dubgate::infrastructure::hub::HubFetcher;
use dubgate::infrastructure::llm::GeminiClient;
use dubgate::infrastructure::observability::{TracingConfig, init_tracing};
use dubgate::infrastructure::storage::LocalOutputStore;
use dubgate::presentation::{AppState, Credentials, Environment, Settings, create_router};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let environment = Environment::from_env()?;
    let settings = Settings::load(environment).context("Failed to load settings")?;

    init_tracing(&TracingConfig::new(environment, &settings.logging));

    let credentials = Credentials::from_env();
    tracing::info!(
        hf_token = credentials.hf_token.is_some(),
        gemini_api_key = credentials.gemini_api_key.is_some(),
        "Credentials loaded"
    );

    let fetcher: Arc<dyn ArtifactFetcher> = Arc::new(HubFetcher::new(
        &settings.cache.hub_endpoint,
        credentials.hf_token.clone(),
        Duration::from_secs(settings.cache.download_timeout_secs),
    )?);

    let cache = Arc::new(WeightCache::new(
        settings.cache.dir.clone(),
        settings.cache.artifacts.clone(),
        fetcher,
        settings.cache.retry_policy(),
    ));
    if let Err(e) = cache.sweep_partial_downloads().await {
        tracing::warn!(error = %e, "Could not sweep partial downloads");
    }

    let loader = ModelLoaderFactory::create(&settings.model)?;
    let runtime = Arc::new(ModelRuntime::new(
        Arc::clone(&cache),
        loader,
        settings.model.inference_timeout_secs.map(Duration::from_secs),
    ));
    if settings.model.preload {
        runtime.spawn_preload();
    }

    let augmenter = Arc::new(build_augmenter(&settings, &credentials)?);

    let inference_service = Arc::new(InferenceService::new(
        Arc::clone(&runtime),
        augmenter,
        settings.limits.request_limits(),
        Duration::from_secs(settings.model.load_wait_timeout_secs),
    ));

    let store: Arc<dyn OutputStore> =
        Arc::new(LocalOutputStore::new(settings.storage.output_dir.clone())?);
    let separation_service = Arc::new(SeparationService::new(
        Arc::clone(&inference_service),
        store,
    ));

    let state = AppState {
        inference_service,
        separation_service,
        body_limit_bytes: settings.server.body_limit_mb * 1024 * 1024,
    };
    let router = create_router(state);

    let addr: SocketAddr = format!("{}:{}", settings.server.host, settings.server.port)
        .parse()
        .context("Invalid server address")?;
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, backend = ?settings.model.backend, "Listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

fn build_augmenter(
    settings: &Settings,
    credentials: &Credentials,
) -> anyhow::Result<PromptAugmenter> {
    let augmentation = &settings.augmentation;
    let default_prompt = augmentation.default_prompt.clone();

    let Some(api_key) = credentials.gemini_api_key.clone().filter(|_| augmentation.enabled)
    else {
        tracing::warn!("Prompt augmentation disabled: no API key or turned off in settings");
        return Ok(PromptAugmenter::disabled(default_prompt));
    };

    let timeout = Duration::from_millis(augmentation.timeout_ms);
    let client: Arc<dyn LlmClient> = Arc::new(GeminiClient::new(
        &augmentation.base_url,
        &augmentation.model,
        api_key,
        timeout,
    )?);

    Ok(PromptAugmenter::new(Some(client), timeout, default_prompt))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => tracing::error!(error = %e, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
