use anyhow::{anyhow, Result};
use std::{future::Future, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::{
    api::routes::{create_router, AppState},
    arbitrage::{mock, ArbitrageService},
    bot::{MonitorSupervisor, StopOutcome},
    config::Config,
    database::JournalRepository,
    remote::RemoteEntityClient,
};

pub struct ApiServer {
    config: Config,
    state: AppState,
}

impl ApiServer {
    pub async fn new(config: Config) -> Result<Self> {
        info!("Initializing ArbiBot API");

        let state = build_state(&config).await?;

        info!("ArbiBot API initialized successfully");
        Ok(Self { config, state })
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Serves until `shutdown` resolves, then stops the monitor if it is still running.
    pub async fn run<F>(self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.config.bind_address();
        let router = create_router(self.state.clone(), &self.config.server)?;

        let listener = TcpListener::bind(&address)
            .await
            .map_err(|e| anyhow!("Failed to bind {}: {}", address, e))?;

        info!("API listening on http://{}", address);

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown)
            .await
            .map_err(|e| anyhow!("Server error: {}", e))?;

        match self.state.monitor.stop().await {
            Ok(StopOutcome::Stopped) => info!("Monitor stopped during shutdown"),
            Ok(StopOutcome::NotRunning) => {}
            Err(e) => warn!("Failed to stop monitor during shutdown: {}", e),
        }

        Ok(())
    }
}

/// Seeds the store and wires every collaborator the handlers need.
pub async fn build_state(config: &Config) -> Result<AppState> {
    let service = ArbitrageService::new(Duration::from_millis(config.store.execution_delay_ms));

    let opportunities = mock::generate_opportunities(&mut rand::thread_rng(), config.store.mock_opportunities);
    let seeded = service
        .seed_opportunities(opportunities)
        .map_err(|e| anyhow!("Failed to seed opportunities: {}", e))?;

    let journal = Arc::new(JournalRepository::new(&config.journal).await?);

    let fallback_configs = || {
        if config.store.seed_default_configs {
            mock::default_configs()
        } else {
            Vec::new()
        }
    };

    let configs = match journal.load_configs().await? {
        Some(persisted) => {
            info!("Loaded {} persisted monitoring configs", persisted.len());
            match service.replace_configs(persisted) {
                Ok(configs) => configs,
                Err(e) => {
                    warn!("Ignoring persisted monitoring configs: {}", e);
                    service
                        .replace_configs(fallback_configs())
                        .map_err(|e| anyhow!("Failed to load monitoring configs: {}", e))?
                }
            }
        }
        None => service
            .replace_configs(fallback_configs())
            .map_err(|e| anyhow!("Failed to load monitoring configs: {}", e))?,
    };

    info!(
        "Store initialized with {} opportunities and {} configs",
        seeded,
        configs.len()
    );

    let remote = if config.remote.enabled {
        Some(Arc::new(RemoteEntityClient::new(&config.remote)?))
    } else {
        None
    };

    Ok(AppState {
        service,
        journal,
        monitor: Arc::new(MonitorSupervisor::new(config.monitor.clone())),
        remote,
        store_config: Arc::new(config.store.clone()),
    })
}
