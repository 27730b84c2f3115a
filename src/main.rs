use anyhow::Result;
use arbibot_api::{api::ApiServer, config::Config};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .init();

    info!("Starting ArbiBot Pro API");

    // Load configuration
    let config = Config::load().map_err(|e| {
        error!("Failed to load configuration: {}", e);
        e
    })?;

    info!("Configuration loaded successfully");

    let server = ApiServer::new(config).await.map_err(|e| {
        error!("Failed to initialize API: {}", e);
        e
    })?;

    // Handle graceful shutdown
    let shutdown_signal = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for shutdown signal: {}", e);
        }
        info!("Shutdown signal received");
    };

    match server.run(shutdown_signal).await {
        Ok(()) => info!("API server stopped"),
        Err(e) => {
            error!("API server error: {}", e);
            return Err(e);
        }
    }

    info!("ArbiBot Pro API shutdown complete");
    Ok(())
}
