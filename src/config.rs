use std::path::PathBuf;
use std::time::Duration;

use tracing::trace;

use crate::storage::RetentionPolicy;
use crate::util;

/// Top-level settings of the monitor process
#[derive(Debug, Clone, Default, serde::Deserialize)]
pub struct MonitorSettings {
    #[serde(default)]
    pub storage: StorageSettings,

    #[serde(default)]
    pub workload: WorkloadSettings,

    #[serde(default)]
    pub alerts: AlertSettings,

    #[serde(default)]
    pub retention: RetentionPolicy,

    /// Seconds between collection cycles in watch mode
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
}

impl MonitorSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    /// Apply `MONITOR_*` environment overrides
    pub fn with_env_overrides(mut self) -> Self {
        if let Some(path) = util::get_db_path() {
            self.storage.path = path;
        }
        if let Some(url) = util::get_workload_url() {
            self.workload.base_url = url;
        }
        if let Some(token) = util::get_workload_token() {
            self.workload.token = Some(token);
        }
        self
    }
}

/// SQLite database location
#[derive(Debug, Clone, serde::Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_sqlite_path")]
    pub path: PathBuf,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            path: default_sqlite_path(),
        }
    }
}

/// Where the workload inspection API lives
#[derive(Debug, Clone, serde::Deserialize)]
pub struct WorkloadSettings {
    #[serde(default = "default_workload_url")]
    pub base_url: String,

    /// Sent as `X-MONITORING-SECRET` when present
    pub token: Option<String>,

    #[serde(default = "default_workload_timeout")]
    pub timeout_secs: u64,
}

impl Default for WorkloadSettings {
    fn default() -> Self {
        Self {
            base_url: default_workload_url(),
            token: None,
            timeout_secs: default_workload_timeout(),
        }
    }
}

/// Fixed constants of alert evaluation
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct AlertSettings {
    /// How far back the engine looks for the latest sample of each kind
    #[serde(default = "default_window_secs")]
    pub window_secs: u64,

    /// Memory alerts fire above this many megabytes, regardless of the
    /// per-application `memory_threshold`
    #[serde(default = "default_memory_checkpoint_mb")]
    pub memory_checkpoint_mb: f64,

    /// Millicores that count as 100% CPU; not derived from pod limits
    #[serde(default = "default_cpu_capacity_millicores")]
    pub cpu_capacity_millicores: f64,

    /// Values strictly above `threshold * critical_multiplier` are critical
    #[serde(default = "default_critical_multiplier")]
    pub critical_multiplier: f64,
}

impl AlertSettings {
    /// The lookback window; saturates at the largest representable duration
    pub fn window(&self) -> chrono::Duration {
        self.checked_window().unwrap_or(chrono::Duration::MAX)
    }

    fn checked_window(&self) -> Option<chrono::Duration> {
        i64::try_from(self.window_secs)
            .ok()
            .and_then(chrono::Duration::try_seconds)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.window_secs == 0 || self.checked_window().is_none() {
            anyhow::bail!("alerts.window_secs out of range: {}", self.window_secs);
        }
        if !(self.cpu_capacity_millicores.is_finite() && self.cpu_capacity_millicores > 0.0) {
            anyhow::bail!(
                "alerts.cpu_capacity_millicores must be positive: {}",
                self.cpu_capacity_millicores
            );
        }
        if !(self.critical_multiplier.is_finite() && self.critical_multiplier >= 1.0) {
            anyhow::bail!(
                "alerts.critical_multiplier must be at least 1: {}",
                self.critical_multiplier
            );
        }
        if !self.memory_checkpoint_mb.is_finite() {
            anyhow::bail!(
                "alerts.memory_checkpoint_mb must be finite: {}",
                self.memory_checkpoint_mb
            );
        }
        Ok(())
    }
}

impl Default for AlertSettings {
    fn default() -> Self {
        Self {
            window_secs: default_window_secs(),
            memory_checkpoint_mb: default_memory_checkpoint_mb(),
            cpu_capacity_millicores: default_cpu_capacity_millicores(),
            critical_multiplier: default_critical_multiplier(),
        }
    }
}

fn default_sqlite_path() -> PathBuf {
    PathBuf::from("./monitor.db")
}

fn default_workload_url() -> String {
    String::from("http://127.0.0.1:8001")
}

fn default_workload_timeout() -> u64 {
    10
}

fn default_interval() -> u64 {
    30
}

fn default_window_secs() -> u64 {
    5 * 60
}

fn default_memory_checkpoint_mb() -> f64 {
    500.0
}

fn default_cpu_capacity_millicores() -> f64 {
    1000.0
}

fn default_critical_multiplier() -> f64 {
    1.2
}

pub fn read_config_file(path: &str) -> anyhow::Result<MonitorSettings> {
    let file_content = std::fs::read_to_string(path)?;
    let settings: MonitorSettings = serde_json::from_str(&file_content)
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))?;
    settings
        .alerts
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration file provided: {e}"))?;
    trace!("loaded config: {settings:?}");
    Ok(settings)
}
