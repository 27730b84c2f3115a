use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::{
    process::{Child, Command},
    sync::Mutex,
    time::timeout,
};
use tracing::{debug, error, info, warn};

use crate::config::MonitorConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartOutcome {
    Started { pid: Option<u32> },
    AlreadyRunning,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    Stopped,
    /// Nothing was running; reported to the caller, not an error.
    NotRunning,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotStatus {
    pub active: bool,
}

/// Starts and stops the external monitoring script and reports whether it is alive.
pub struct MonitorSupervisor {
    config: MonitorConfig,
    child: Mutex<Option<Child>>,
}

impl MonitorSupervisor {
    pub fn new(config: MonitorConfig) -> Self {
        Self {
            config,
            child: Mutex::new(None),
        }
    }

    pub async fn start(&self) -> Result<StartOutcome> {
        let mut slot = self.child.lock().await;

        if Self::is_alive(&mut slot) {
            info!("Monitor is already running");
            return Ok(StartOutcome::AlreadyRunning);
        }

        info!(
            "Starting monitor: {} {}",
            self.config.program,
            self.config.args.join(" ")
        );

        let child = Command::new(&self.config.program)
            .args(&self.config.args)
            .current_dir(&self.config.working_dir)
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| anyhow!("Failed to start monitor {}: {}", self.config.program, e))?;

        let pid = child.id();
        *slot = Some(child);

        info!("Monitor started (pid: {:?})", pid);
        Ok(StartOutcome::Started { pid })
    }

    /// Interrupts the monitor and waits for it to exit, killing it once the
    /// configured timeout elapses.
    pub async fn stop(&self) -> Result<StopOutcome> {
        let mut slot = self.child.lock().await;

        if !Self::is_alive(&mut slot) {
            info!("Stop requested but monitor is not running");
            return Ok(StopOutcome::NotRunning);
        }

        let Some(mut child) = slot.take() else {
            return Ok(StopOutcome::NotRunning);
        };

        info!("Stopping monitor (pid: {:?})", child.id());
        interrupt(&mut child)?;

        let stop_timeout = Duration::from_secs(self.config.stop_timeout_seconds);
        match timeout(stop_timeout, child.wait()).await {
            Ok(Ok(status)) => debug!("Monitor exited with {}", status),
            Ok(Err(e)) => warn!("Failed to wait for monitor exit: {}", e),
            Err(_) => {
                warn!("Monitor did not exit within {:?}, killing it", stop_timeout);
                if let Err(e) = child.kill().await {
                    error!("Failed to kill monitor: {}", e);
                    return Err(anyhow!("Failed to kill monitor: {}", e));
                }
            }
        }

        info!("Monitor stopped");
        Ok(StopOutcome::Stopped)
    }

    pub async fn is_running(&self) -> bool {
        let mut slot = self.child.lock().await;
        Self::is_alive(&mut slot)
    }

    pub async fn status(&self) -> BotStatus {
        BotStatus {
            active: self.is_running().await,
        }
    }

    /// Acknowledges a manual status report from the dashboard. Nothing is
    /// stored: `status` always reflects whether the process is alive.
    pub fn set_active(&self, active: bool) -> BotStatus {
        info!("Dashboard reported monitor active={}", active);
        BotStatus { active }
    }

    fn is_alive(slot: &mut Option<Child>) -> bool {
        let Some(child) = slot.as_mut() else {
            return false;
        };

        match child.try_wait() {
            Ok(None) => true,
            Ok(Some(status)) => {
                info!("Monitor exited with {}", status);
                *slot = None;
                false
            }
            Err(e) => {
                warn!("Failed to poll monitor process: {}", e);
                false
            }
        }
    }
}

#[cfg(unix)]
fn interrupt(child: &mut Child) -> Result<()> {
    use nix::{
        sys::signal::{kill, Signal},
        unistd::Pid,
    };

    let pid = child
        .id()
        .ok_or_else(|| anyhow!("Monitor process has already exited"))?;
    let pid = i32::try_from(pid).map_err(|_| anyhow!("Monitor pid {} out of range", pid))?;

    kill(Pid::from_raw(pid), Signal::SIGINT).map_err(|e| anyhow!("Failed to interrupt monitor: {}", e))
}

#[cfg(not(unix))]
fn interrupt(child: &mut Child) -> Result<()> {
    child
        .start_kill()
        .map_err(|e| anyhow!("Failed to stop monitor: {}", e))
}
