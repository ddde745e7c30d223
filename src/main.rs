use std::sync::Arc;

use tokio::sync::watch;

use pm_copilot::config::AppConfig;
use pm_copilot::engine::provider::OpenAiProvider;
use pm_copilot::logging;
use pm_copilot::server::{self, AppState};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init();

    tracing::info!("Starting pm-copilot v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::from_env();
    if config.model_api_key.is_none() {
        // The service still boots for health checks; every assist request
        // surfaces a config error until the key is provided.
        tracing::warn!("MODEL_API_KEY is not set; assist endpoints will return 500");
    }

    let provider = Arc::new(OpenAiProvider::new(&config));
    let state = Arc::new(AppState::new(&config, provider));

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Received ctrl-c, shutting down");
            let _ = shutdown_tx.send(true);
        }
    });

    if let Err(e) = server::serve(&config, state, shutdown_rx).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
