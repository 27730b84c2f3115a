use anyhow::{anyhow, Result};
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::{config::JournalConfig, types::MonitoringConfig};

const MONITORING_CONFIGS_FILE: &str = "monitoring_configs.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JournalKind {
    BotLogs,
    Executions,
}

impl JournalKind {
    pub fn file_name(&self) -> &'static str {
        match self {
            JournalKind::BotLogs => "bot_logs.json",
            JournalKind::Executions => "executions.json",
        }
    }
}

/// JSON-file persistence for bot logs, executions and monitoring configs.
/// Each file holds one JSON array.
pub struct JournalRepository {
    data_dir: PathBuf,
    max_entries: usize,
    write_lock: Mutex<()>,
}

impl JournalRepository {
    pub async fn new(config: &JournalConfig) -> Result<Self> {
        let data_dir = PathBuf::from(&config.data_dir);

        tokio::fs::create_dir_all(&data_dir)
            .await
            .map_err(|e| anyhow!("Failed to create journal directory {}: {}", data_dir.display(), e))?;

        info!("Journal directory: {}", data_dir.display());

        Ok(Self {
            data_dir,
            max_entries: config.max_entries,
            write_lock: Mutex::new(()),
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Newest first.
    pub async fn load_entries(&self, kind: JournalKind) -> Result<Vec<Value>> {
        Ok(self.read_json(kind.file_name()).await?.unwrap_or_default())
    }

    /// Prepends `entry` and keeps only the most recent `max_entries`.
    /// Returns the number of retained entries.
    pub async fn append_entry(&self, kind: JournalKind, entry: Value) -> Result<usize> {
        let _guard = self.write_lock.lock().await;

        let mut entries: Vec<Value> = self.read_json(kind.file_name()).await?.unwrap_or_default();
        entries.insert(0, entry);
        entries.truncate(self.max_entries);

        self.write_json(kind.file_name(), &entries).await?;
        debug!("Appended entry to {} ({} retained)", kind.file_name(), entries.len());

        Ok(entries.len())
    }

    /// `None` when no configs have been persisted yet.
    pub async fn load_configs(&self) -> Result<Option<Vec<MonitoringConfig>>> {
        self.read_json(MONITORING_CONFIGS_FILE).await
    }

    pub async fn save_configs(&self, configs: &[MonitoringConfig]) -> Result<()> {
        self.save_configs_snapshot(|| configs.to_vec()).await?;
        Ok(())
    }

    /// Calls `snapshot` only once the write lock is held, so the last writer
    /// always persists the newest table. Returns the number of configs written.
    pub async fn save_configs_snapshot<F>(&self, snapshot: F) -> Result<usize>
    where
        F: FnOnce() -> Vec<MonitoringConfig>,
    {
        let _guard = self.write_lock.lock().await;

        let configs = snapshot();
        self.write_json(MONITORING_CONFIGS_FILE, &configs).await?;
        debug!("Saved {} monitoring configs", configs.len());

        Ok(configs.len())
    }

    async fn read_json<T: DeserializeOwned>(&self, file_name: &str) -> Result<Option<T>> {
        let path = self.data_dir.join(file_name);

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(anyhow!("Failed to read {}: {}", path.display(), e)),
        };

        // Unparsable files read as absent instead of failing the request.
        match serde_json::from_slice(&contents) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!("Ignoring unparsable journal file {}: {}", path.display(), e);
                Ok(None)
            }
        }
    }

    async fn write_json<T: Serialize + ?Sized>(&self, file_name: &str, value: &T) -> Result<()> {
        let path = self.data_dir.join(file_name);

        let contents = serde_json::to_vec_pretty(value)
            .map_err(|e| anyhow!("Failed to serialize {}: {}", file_name, e))?;

        tokio::fs::write(&path, contents)
            .await
            .map_err(|e| anyhow!("Failed to write {}: {}", path.display(), e))?;

        Ok(())
    }
}
