//! Storage backend trait definition
//!
//! This module defines the `MonitorStore` trait the monitoring core talks to.
//! Every operation is a single auto-committing statement (or a short
//! statement pair for get-or-create); there is no transaction spanning a
//! whole evaluate-then-write cycle.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::error::StorageResult;
use super::schema::{
    Alert, AlertId, AlertStatus, AlertUpdate, AppId, Application, Event, HealthCheckResult,
    MetricKind, MetricPoint, MonitoringConfig, NewAlert,
};

/// Query parameters for fetching metric history
#[derive(Debug, Clone)]
pub struct MetricQuery {
    /// Application to query
    pub app_id: AppId,

    /// Restrict to one metric kind (all kinds if `None`)
    pub kind: Option<MetricKind>,

    /// Start of time range (inclusive)
    pub start: DateTime<Utc>,

    /// End of time range (inclusive)
    pub end: DateTime<Utc>,

    /// Maximum number of results to return
    pub limit: Option<usize>,
}

impl MetricQuery {
    pub fn range(app_id: AppId, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            app_id,
            kind: None,
            start,
            end,
            limit: None,
        }
    }

    pub fn kind(mut self, kind: MetricKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

/// Active alert count of one application
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSummary {
    pub app_id: AppId,
    pub app_name: String,
    pub active_alerts: u64,
}

/// Trait for the persistent store behind the monitor
///
/// ## Ordering
///
/// Metric and health-check history is returned oldest first. Rows sharing a
/// timestamp keep insertion order, which the alert engine relies on for
/// "latest wins".
///
/// ## Thread Safety
///
/// Implementations must be `Send + Sync`; the orchestrator holds them behind
/// an `Arc<dyn MonitorStore>`.
#[async_trait]
pub trait MonitorStore: Send + Sync {
    // ========================================================================
    // Applications
    // ========================================================================

    /// Get the application with this name, creating it on first reference
    async fn ensure_application(&self, name: &str) -> StorageResult<Application>;

    async fn find_application(&self, name: &str) -> StorageResult<Option<Application>>;

    /// All applications in store iteration order
    async fn list_applications(&self) -> StorageResult<Vec<Application>>;

    // ========================================================================
    // Monitoring configuration
    // ========================================================================

    async fn get_monitoring_config(&self, app_id: AppId)
    -> StorageResult<Option<MonitoringConfig>>;

    /// Insert `config` unless a row for the application already exists
    ///
    /// Returns the row that is stored afterwards, which is the pre-existing
    /// one if another writer got there first.
    async fn insert_monitoring_config_if_absent(
        &self,
        config: &MonitoringConfig,
    ) -> StorageResult<MonitoringConfig>;

    /// Replace the configuration of an application (operator edits)
    async fn update_monitoring_config(&self, config: &MonitoringConfig) -> StorageResult<()>;

    // ========================================================================
    // Metrics
    // ========================================================================

    async fn insert_metric(&self, point: &MetricPoint) -> StorageResult<()>;

    async fn query_metrics(&self, query: MetricQuery) -> StorageResult<Vec<MetricPoint>>;

    /// Delete metrics older than the timestamp, returning the number deleted
    async fn delete_metrics_before(&self, before: DateTime<Utc>) -> StorageResult<usize>;

    // ========================================================================
    // Health checks
    // ========================================================================

    async fn insert_health_check(&self, check: &HealthCheckResult) -> StorageResult<()>;

    async fn query_health_checks(
        &self,
        app_id: AppId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<HealthCheckResult>>;

    async fn delete_health_checks_before(&self, before: DateTime<Utc>) -> StorageResult<usize>;

    // ========================================================================
    // Alerts
    // ========================================================================

    /// The active alert of this type, oldest first if duplicates exist
    async fn find_active_alert(
        &self,
        app_id: AppId,
        alert_type: &str,
    ) -> StorageResult<Option<Alert>>;

    /// The active or suppressed alert of this type
    ///
    /// Either status holds the (app, type) slot until the alert resolves.
    async fn find_open_alert(
        &self,
        app_id: AppId,
        alert_type: &str,
    ) -> StorageResult<Option<Alert>>;

    async fn insert_alert(&self, alert: &NewAlert) -> StorageResult<Alert>;

    async fn update_alert(&self, id: AlertId, update: &AlertUpdate) -> StorageResult<()>;

    /// Mark every active or suppressed alert of this type resolved
    ///
    /// Returns the number of rows that changed; zero is not an error.
    async fn resolve_alerts(
        &self,
        app_id: AppId,
        alert_type: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<usize>;

    async fn get_alert(&self, id: AlertId) -> StorageResult<Option<Alert>>;

    async fn set_alert_status(&self, id: AlertId, status: AlertStatus) -> StorageResult<()>;

    async fn acknowledge_alert(&self, id: AlertId, at: DateTime<Utc>) -> StorageResult<()>;

    /// Alerts of an application, newest first
    async fn list_alerts(
        &self,
        app_id: AppId,
        status: Option<AlertStatus>,
    ) -> StorageResult<Vec<Alert>>;

    /// Active alerts of one application, or cluster-wide with `None`
    async fn count_active_alerts(&self, app_id: Option<AppId>) -> StorageResult<u64>;

    /// Active alert counts for every application
    async fn alert_summary(&self) -> StorageResult<Vec<AlertSummary>>;

    // ========================================================================
    // Events
    // ========================================================================

    /// Record an event, folding repeats into the existing row
    async fn record_event(&self, event: &Event) -> StorageResult<()>;

    /// Events of one application, or cluster-wide ones with `None`
    async fn list_events(&self, app_id: Option<AppId>) -> StorageResult<Vec<Event>>;

    async fn delete_events_before(&self, before: DateTime<Utc>) -> StorageResult<usize>;

    /// Close the backend and release resources
    async fn close(&self) -> StorageResult<()>;
}
