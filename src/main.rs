//! taskdesk - HTTP Server Entry Point
//!
//! Starts the HTTP server that exposes the task assistant API.

use taskdesk::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "taskdesk=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={} store={:?} batch_intents={}",
        config.llm.model, config.store_type, config.batch_intents
    );

    api::serve(config).await
}
