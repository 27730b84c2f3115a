use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub journal: JournalConfig,
    pub monitor: MonitorConfig,
    pub remote: RemoteConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,
    pub cors_max_age_seconds: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            cors_max_age_seconds: 600,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub mock_opportunities: usize,
    pub seed_default_configs: bool,
    pub execution_delay_ms: u64,
    pub default_limit: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            mock_opportunities: 15,
            seed_default_configs: true,
            execution_delay_ms: 100,
            default_limit: 50,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct JournalConfig {
    pub data_dir: String,
    pub max_entries: usize,
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
            max_entries: 100,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct MonitorConfig {
    pub program: String,
    pub args: Vec<String>,
    pub working_dir: String,
    pub stop_timeout_seconds: u64,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            program: "node".to_string(),
            args: vec!["../scripts/monitor-arbitrage.js".to_string()],
            working_dir: ".".to_string(),
            stop_timeout_seconds: 10,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
#[serde(default)]
pub struct RemoteConfig {
    pub enabled: bool,
    pub base_url: String,
    pub app_id: String,
    pub api_key: String,
    pub timeout_seconds: u64,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://app.base44.com/api".to_string(),
            app_id: String::new(),
            api_key: String::new(),
            timeout_seconds: 10,
        }
    }
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        dotenv::dotenv().ok();

        let mut settings = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(
                config::Environment::with_prefix("ARBIBOT")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .with_list_parse_key("monitor.args"),
            );

        // Override API port from environment if present
        if let Ok(port) = std::env::var("API_PORT") {
            settings = settings.set_override("server.port", port)?;
        }

        // Override remote API key from environment if present
        if let Ok(api_key) = std::env::var("BASE44_API_KEY") {
            settings = settings.set_override("remote.api_key", api_key)?;
        }

        // Override monitor script from environment if present
        if let Ok(script) = std::env::var("MONITOR_SCRIPT") {
            settings = settings.set_override("monitor.args", vec![script])?;
        }

        let config: Config = settings.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.store.default_limit == 0 {
            return Err(anyhow!("store.default_limit must be positive"));
        }

        if self.journal.max_entries == 0 {
            return Err(anyhow!("journal.max_entries must be positive"));
        }

        if self.monitor.program.trim().is_empty() {
            return Err(anyhow!("monitor.program must not be empty"));
        }

        if self.remote.enabled && (self.remote.app_id.is_empty() || self.remote.api_key.is_empty()) {
            return Err(anyhow!("remote.app_id and remote.api_key are required when the remote backend is enabled"));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
