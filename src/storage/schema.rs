//! Record definitions for everything the monitor persists
//!
//! ## Tables
//!
//! - `applications` - one row per monitored application, created on first reference
//! - `metrics` - append-only time series, one row per observation
//! - `health_checks` - append-only probe outcomes
//! - `alerts` - derived alert state, at most one `active` row per (app, type)
//! - `monitoring_configs` - one row per application (unique)
//! - `events` - deduplicated occurrence log, optionally cluster-wide
//!
//! Kinds, statuses and severities are stored as lower-case text so new
//! metric kinds can be introduced without a migration.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Opaque identifier of an application row
pub type AppId = i64;

/// Identifier of an alert row
pub type AlertId = i64;

/// The unit of deployment being monitored (one workload plus one service)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Application {
    pub id: AppId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Kind of a metric observation
///
/// Unknown kinds read back from the store become [`MetricKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    Cpu,
    Memory,
    Network,
    Disk,
    Pods,
    Requests,
    Errors,
    Latency,
    ReplicasDesired,
    ReplicasReady,
    Custom(String),
}

impl MetricKind {
    pub fn as_str(&self) -> &str {
        match self {
            MetricKind::Cpu => "cpu",
            MetricKind::Memory => "memory",
            MetricKind::Network => "network",
            MetricKind::Disk => "disk",
            MetricKind::Pods => "pods",
            MetricKind::Requests => "requests",
            MetricKind::Errors => "errors",
            MetricKind::Latency => "latency",
            MetricKind::ReplicasDesired => "replicas_desired",
            MetricKind::ReplicasReady => "replicas_ready",
            MetricKind::Custom(kind) => kind,
        }
    }
}

impl From<&str> for MetricKind {
    fn from(value: &str) -> Self {
        match value {
            "cpu" => MetricKind::Cpu,
            "memory" => MetricKind::Memory,
            "network" => MetricKind::Network,
            "disk" => MetricKind::Disk,
            "pods" => MetricKind::Pods,
            "requests" => MetricKind::Requests,
            "errors" => MetricKind::Errors,
            "latency" => MetricKind::Latency,
            "replicas_desired" => MetricKind::ReplicasDesired,
            "replicas_ready" => MetricKind::ReplicasReady,
            other => MetricKind::Custom(other.to_string()),
        }
    }
}

impl fmt::Display for MetricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single timestamped observation of one kind for one application
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricPoint {
    pub app_id: AppId,
    pub kind: MetricKind,
    pub value: f64,
    pub unit: String,
    pub pod_name: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl MetricPoint {
    pub fn new(
        app_id: AppId,
        kind: MetricKind,
        value: f64,
        unit: impl Into<String>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            app_id,
            kind,
            value,
            unit: unit.into(),
            pod_name: None,
            timestamp,
        }
    }

    pub fn with_pod(mut self, pod_name: impl Into<String>) -> Self {
        self.pod_name = Some(pod_name.into());
        self
    }
}

/// Outcome classification of a health probe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    Timeout,
    Error,
}

/// One probe against an application's service endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheckResult {
    pub app_id: AppId,
    pub endpoint: String,
    pub method: String,
    pub status: HealthStatus,
    pub status_code: Option<u16>,
    pub response_time_ms: u64,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertStatus {
    Active,
    Resolved,
    Suppressed,
}

/// A persisted alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub app_id: AppId,
    pub alert_type: String,
    pub threshold: f64,
    pub current_value: f64,
    pub severity: Severity,
    pub status: AlertStatus,
    pub message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
    pub acknowledged_at: Option<DateTime<Utc>>,
}

/// Values for a freshly fired alert; the store assigns the id
#[derive(Debug, Clone, PartialEq)]
pub struct NewAlert {
    pub app_id: AppId,
    pub alert_type: String,
    pub threshold: f64,
    pub current_value: f64,
    pub severity: Severity,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

/// In-place refresh of an active alert while its condition persists
#[derive(Debug, Clone, PartialEq)]
pub struct AlertUpdate {
    pub threshold: f64,
    pub current_value: f64,
    pub severity: Severity,
    pub message: String,
    pub updated_at: DateTime<Utc>,
}

/// Per-application monitoring configuration
///
/// `memory_threshold` is stored and reported but the memory rule checks a
/// fixed checkpoint instead, see `AlertSettings::memory_checkpoint_mb`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub app_id: AppId,
    pub enabled: bool,
    pub alerts_enabled: bool,
    pub health_check_path: String,
    pub health_check_interval_secs: u64,
    pub health_check_timeout_secs: u64,
    pub metrics_path: String,
    pub metrics_port: u16,
    pub retention_days: u32,
    pub cpu_threshold: f64,
    pub memory_threshold: f64,
    pub error_rate_threshold: f64,
    pub response_time_threshold_ms: u64,
}

impl MonitoringConfig {
    /// Configuration used for applications that were never configured
    pub fn defaults_for(app_id: AppId) -> Self {
        Self {
            app_id,
            enabled: true,
            alerts_enabled: true,
            health_check_path: "/health".to_string(),
            health_check_interval_secs: 30,
            health_check_timeout_secs: 5,
            metrics_path: "/metrics".to_string(),
            metrics_port: 9090,
            retention_days: 7,
            cpu_threshold: 80.0,
            memory_threshold: 85.0,
            error_rate_threshold: 5.0,
            response_time_threshold_ms: 1000,
        }
    }
}

/// An occurrence worth keeping, deduplicated by (app, type, reason, object)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// `None` means cluster-wide
    pub app_id: Option<AppId>,
    pub event_type: String,
    pub reason: String,
    pub message: String,
    pub object_kind: String,
    pub object_name: String,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub count: u32,
}

macro_rules! text_enum {
    ($ty:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = StorageError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($ty::$variant),)+
                    other => Err(StorageError::InvalidValue {
                        field: stringify!($ty),
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

text_enum!(HealthStatus {
    Healthy => "healthy",
    Unhealthy => "unhealthy",
    Timeout => "timeout",
    Error => "error",
});

text_enum!(Severity {
    Info => "info",
    Warning => "warning",
    Critical => "critical",
});

text_enum!(AlertStatus {
    Active => "active",
    Resolved => "resolved",
    Suppressed => "suppressed",
});
