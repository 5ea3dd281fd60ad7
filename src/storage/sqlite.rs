//! SQLite storage backend implementation
//!
//! This module provides a SQLite-based implementation of the `MonitorStore` trait.
//!
//! ## Features
//!
//! - **Embedded**: No separate database server required
//! - **WAL mode**: Better concurrency for reads during writes
//! - **Connection pooling**: Efficient resource usage
//! - **Migrations**: Automatic schema versioning with sqlx
//!
//! ## Limitations
//!
//! - **Concurrency**: Limited concurrent writes
//! - **Distributed**: Single-machine only, one collector per database

use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Pool, Row, Sqlite};
use tracing::{debug, info, instrument};

use super::backend::{AlertSummary, MetricQuery, MonitorStore};
use super::error::{StorageError, StorageResult};
use super::schema::{
    Alert, AlertId, AlertStatus, AlertUpdate, AppId, Application, Event, HealthCheckResult,
    MetricKind, MetricPoint, MonitoringConfig, NewAlert,
};

const ALERT_COLUMNS: &str = "id, app_id, alert_type, threshold, current_value, severity, status, \
     message, created_at, updated_at, resolved_at, acknowledged_at";

const CONFIG_COLUMNS: &str = "app_id, enabled, alerts_enabled, health_check_path, \
     health_check_interval_secs, health_check_timeout_secs, metrics_path, metrics_port, \
     retention_days, cpu_threshold, memory_threshold, error_rate_threshold, \
     response_time_threshold_ms";

const EVENT_COLUMNS: &str =
    "app_id, event_type, reason, message, object_kind, object_name, first_seen, last_seen, count";

/// SQLite storage backend
///
/// Stores every monitor table in a local SQLite database file.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
    db_path: String,
}

impl SqliteStore {
    /// Open (or create) the database and run migrations
    ///
    /// ## Example
    ///
    /// ```no_run
    /// # use workload_monitor::storage::sqlite::SqliteStore;
    /// # async fn example() -> anyhow::Result<()> {
    /// let store = SqliteStore::new("./monitor.db").await?;
    /// # Ok(())
    /// # }
    /// ```
    #[instrument(skip_all)]
    pub async fn new(db_path: impl AsRef<Path>) -> StorageResult<Self> {
        let db_path_str = db_path.as_ref().to_string_lossy().to_string();

        info!("initializing SQLite store at: {}", db_path_str);

        let options = SqliteConnectOptions::new()
            .filename(&db_path_str)
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .busy_timeout(std::time::Duration::from_secs(30));

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::ConnectionFailed(e.to_string()))?;

        debug!("running database migrations");
        sqlx::migrate!("./migrations").run(&pool).await?;

        info!("database migrations complete");

        Ok(Self {
            pool,
            db_path: db_path_str,
        })
    }

    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    fn timestamp_to_millis(dt: &DateTime<Utc>) -> i64 {
        dt.timestamp_millis()
    }

    fn millis_to_timestamp(millis: i64) -> DateTime<Utc> {
        DateTime::from_timestamp_millis(millis).unwrap_or_else(Utc::now)
    }

    fn application_from_row(row: &SqliteRow) -> StorageResult<Application> {
        Ok(Application {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: Self::millis_to_timestamp(row.try_get("created_at")?),
        })
    }

    fn metric_from_row(row: &SqliteRow) -> StorageResult<MetricPoint> {
        let kind: String = row.try_get("kind")?;
        Ok(MetricPoint {
            app_id: row.try_get("app_id")?,
            kind: MetricKind::from(kind.as_str()),
            value: row.try_get("value")?,
            unit: row.try_get("unit")?,
            pod_name: row.try_get("pod_name")?,
            timestamp: Self::millis_to_timestamp(row.try_get("timestamp")?),
        })
    }

    fn health_check_from_row(row: &SqliteRow) -> StorageResult<HealthCheckResult> {
        let status: String = row.try_get("status")?;
        let status_code: Option<i64> = row.try_get("status_code")?;
        let response_time_ms: i64 = row.try_get("response_time_ms")?;
        Ok(HealthCheckResult {
            app_id: row.try_get("app_id")?,
            endpoint: row.try_get("endpoint")?,
            method: row.try_get("method")?,
            status: status.parse()?,
            status_code: status_code.map(|code| code as u16),
            response_time_ms: response_time_ms.max(0) as u64,
            error: row.try_get("error")?,
            timestamp: Self::millis_to_timestamp(row.try_get("timestamp")?),
        })
    }

    fn alert_from_row(row: &SqliteRow) -> StorageResult<Alert> {
        let severity: String = row.try_get("severity")?;
        let status: String = row.try_get("status")?;
        let resolved_at: Option<i64> = row.try_get("resolved_at")?;
        let acknowledged_at: Option<i64> = row.try_get("acknowledged_at")?;
        Ok(Alert {
            id: row.try_get("id")?,
            app_id: row.try_get("app_id")?,
            alert_type: row.try_get("alert_type")?,
            threshold: row.try_get("threshold")?,
            current_value: row.try_get("current_value")?,
            severity: severity.parse()?,
            status: status.parse()?,
            message: row.try_get("message")?,
            created_at: Self::millis_to_timestamp(row.try_get("created_at")?),
            updated_at: Self::millis_to_timestamp(row.try_get("updated_at")?),
            resolved_at: resolved_at.map(Self::millis_to_timestamp),
            acknowledged_at: acknowledged_at.map(Self::millis_to_timestamp),
        })
    }

    fn config_from_row(row: &SqliteRow) -> StorageResult<MonitoringConfig> {
        let interval: i64 = row.try_get("health_check_interval_secs")?;
        let timeout: i64 = row.try_get("health_check_timeout_secs")?;
        let port: i64 = row.try_get("metrics_port")?;
        let retention: i64 = row.try_get("retention_days")?;
        let response_time: i64 = row.try_get("response_time_threshold_ms")?;
        Ok(MonitoringConfig {
            app_id: row.try_get("app_id")?,
            enabled: row.try_get("enabled")?,
            alerts_enabled: row.try_get("alerts_enabled")?,
            health_check_path: row.try_get("health_check_path")?,
            health_check_interval_secs: interval.max(0) as u64,
            health_check_timeout_secs: timeout.max(0) as u64,
            metrics_path: row.try_get("metrics_path")?,
            metrics_port: u16::try_from(port).map_err(|_| StorageError::InvalidValue {
                field: "metrics_port",
                value: port.to_string(),
            })?,
            retention_days: retention.max(0) as u32,
            cpu_threshold: row.try_get("cpu_threshold")?,
            memory_threshold: row.try_get("memory_threshold")?,
            error_rate_threshold: row.try_get("error_rate_threshold")?,
            response_time_threshold_ms: response_time.max(0) as u64,
        })
    }

    fn event_from_row(row: &SqliteRow) -> StorageResult<Event> {
        let count: i64 = row.try_get("count")?;
        Ok(Event {
            app_id: row.try_get("app_id")?,
            event_type: row.try_get("event_type")?,
            reason: row.try_get("reason")?,
            message: row.try_get("message")?,
            object_kind: row.try_get("object_kind")?,
            object_name: row.try_get("object_name")?,
            first_seen: Self::millis_to_timestamp(row.try_get("first_seen")?),
            last_seen: Self::millis_to_timestamp(row.try_get("last_seen")?),
            count: count.max(0) as u32,
        })
    }
}

#[async_trait]
impl MonitorStore for SqliteStore {
    #[instrument(skip(self))]
    async fn ensure_application(&self, name: &str) -> StorageResult<Application> {
        sqlx::query(
            "INSERT INTO applications (name, created_at) VALUES (?, ?) \
             ON CONFLICT (name) DO NOTHING",
        )
        .bind(name)
        .bind(Self::timestamp_to_millis(&Utc::now()))
        .execute(&self.pool)
        .await?;

        self.find_application(name)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("application '{name}'")))
    }

    async fn find_application(&self, name: &str) -> StorageResult<Option<Application>> {
        let row = sqlx::query("SELECT id, name, created_at FROM applications WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::application_from_row).transpose()
    }

    async fn list_applications(&self) -> StorageResult<Vec<Application>> {
        let rows = sqlx::query("SELECT id, name, created_at FROM applications ORDER BY id ASC")
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::application_from_row).collect()
    }

    async fn get_monitoring_config(
        &self,
        app_id: AppId,
    ) -> StorageResult<Option<MonitoringConfig>> {
        let sql = format!("SELECT {CONFIG_COLUMNS} FROM monitoring_configs WHERE app_id = ?");
        let row = sqlx::query(&sql)
            .bind(app_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::config_from_row).transpose()
    }

    #[instrument(skip(self, config), fields(app_id = config.app_id))]
    async fn insert_monitoring_config_if_absent(
        &self,
        config: &MonitoringConfig,
    ) -> StorageResult<MonitoringConfig> {
        let sql = format!(
            "INSERT INTO monitoring_configs ({CONFIG_COLUMNS}) \
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) \
             ON CONFLICT (app_id) DO NOTHING"
        );
        let result = sqlx::query(&sql)
            .bind(config.app_id)
            .bind(config.enabled)
            .bind(config.alerts_enabled)
            .bind(&config.health_check_path)
            .bind(config.health_check_interval_secs as i64)
            .bind(config.health_check_timeout_secs as i64)
            .bind(&config.metrics_path)
            .bind(i64::from(config.metrics_port))
            .bind(i64::from(config.retention_days))
            .bind(config.cpu_threshold)
            .bind(config.memory_threshold)
            .bind(config.error_rate_threshold)
            .bind(config.response_time_threshold_ms as i64)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            debug!("created monitoring config");
        }

        self.get_monitoring_config(config.app_id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("config of app {}", config.app_id)))
    }

    async fn update_monitoring_config(&self, config: &MonitoringConfig) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE monitoring_configs SET
                enabled = ?, alerts_enabled = ?, health_check_path = ?,
                health_check_interval_secs = ?, health_check_timeout_secs = ?,
                metrics_path = ?, metrics_port = ?, retention_days = ?,
                cpu_threshold = ?, memory_threshold = ?, error_rate_threshold = ?,
                response_time_threshold_ms = ?
            WHERE app_id = ?
            "#,
        )
        .bind(config.enabled)
        .bind(config.alerts_enabled)
        .bind(&config.health_check_path)
        .bind(config.health_check_interval_secs as i64)
        .bind(config.health_check_timeout_secs as i64)
        .bind(&config.metrics_path)
        .bind(i64::from(config.metrics_port))
        .bind(i64::from(config.retention_days))
        .bind(config.cpu_threshold)
        .bind(config.memory_threshold)
        .bind(config.error_rate_threshold)
        .bind(config.response_time_threshold_ms as i64)
        .bind(config.app_id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "config of app {}",
                config.app_id
            )));
        }
        Ok(())
    }

    async fn insert_metric(&self, point: &MetricPoint) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO metrics (app_id, kind, value, unit, pod_name, timestamp)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(point.app_id)
        .bind(point.kind.as_str())
        .bind(point.value)
        .bind(&point.unit)
        .bind(point.pod_name.as_deref())
        .bind(Self::timestamp_to_millis(&point.timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(app_id = query.app_id))]
    async fn query_metrics(&self, query: MetricQuery) -> StorageResult<Vec<MetricPoint>> {
        let kind_clause = if query.kind.is_some() {
            "AND kind = ?"
        } else {
            ""
        };
        let limit_clause = query
            .limit
            .map(|l| format!("LIMIT {}", l))
            .unwrap_or_default();

        let sql = format!(
            r#"
            SELECT app_id, kind, value, unit, pod_name, timestamp
            FROM metrics
            WHERE app_id = ? AND timestamp >= ? AND timestamp <= ? {kind_clause}
            ORDER BY timestamp ASC, id ASC
            {limit_clause}
            "#
        );

        let mut statement = sqlx::query(&sql)
            .bind(query.app_id)
            .bind(Self::timestamp_to_millis(&query.start))
            .bind(Self::timestamp_to_millis(&query.end));
        if let Some(kind) = &query.kind {
            statement = statement.bind(kind.as_str());
        }

        let rows = statement.fetch_all(&self.pool).await?;
        let points: Vec<MetricPoint> = rows
            .iter()
            .map(Self::metric_from_row)
            .collect::<StorageResult<_>>()?;

        debug!("query returned {} metrics", points.len());
        Ok(points)
    }

    async fn delete_metrics_before(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        let result = sqlx::query("DELETE FROM metrics WHERE timestamp < ?")
            .bind(Self::timestamp_to_millis(&before))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as usize)
    }

    async fn insert_health_check(&self, check: &HealthCheckResult) -> StorageResult<()> {
        sqlx::query(
            r#"
            INSERT INTO health_checks (
                app_id, endpoint, method, status, status_code,
                response_time_ms, error, timestamp
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(check.app_id)
        .bind(&check.endpoint)
        .bind(&check.method)
        .bind(check.status.as_str())
        .bind(check.status_code.map(i64::from))
        .bind(check.response_time_ms as i64)
        .bind(check.error.as_deref())
        .bind(Self::timestamp_to_millis(&check.timestamp))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn query_health_checks(
        &self,
        app_id: AppId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<HealthCheckResult>> {
        let rows = sqlx::query(
            r#"
            SELECT app_id, endpoint, method, status, status_code,
                   response_time_ms, error, timestamp
            FROM health_checks
            WHERE app_id = ? AND timestamp >= ? AND timestamp <= ?
            ORDER BY timestamp ASC, id ASC
            "#,
        )
        .bind(app_id)
        .bind(Self::timestamp_to_millis(&start))
        .bind(Self::timestamp_to_millis(&end))
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(Self::health_check_from_row).collect()
    }

    async fn delete_health_checks_before(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        let result = sqlx::query("DELETE FROM health_checks WHERE timestamp < ?")
            .bind(Self::timestamp_to_millis(&before))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as usize)
    }

    async fn find_active_alert(
        &self,
        app_id: AppId,
        alert_type: &str,
    ) -> StorageResult<Option<Alert>> {
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM alerts \
             WHERE app_id = ? AND alert_type = ? AND status = 'active' \
             ORDER BY created_at ASC, id ASC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(app_id)
            .bind(alert_type)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::alert_from_row).transpose()
    }

    async fn find_open_alert(
        &self,
        app_id: AppId,
        alert_type: &str,
    ) -> StorageResult<Option<Alert>> {
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM alerts \
             WHERE app_id = ? AND alert_type = ? AND status IN ('active', 'suppressed') \
             ORDER BY created_at ASC, id ASC LIMIT 1"
        );
        let row = sqlx::query(&sql)
            .bind(app_id)
            .bind(alert_type)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::alert_from_row).transpose()
    }

    #[instrument(skip(self, alert), fields(app_id = alert.app_id, alert_type = %alert.alert_type))]
    async fn insert_alert(&self, alert: &NewAlert) -> StorageResult<Alert> {
        let created_at = Self::timestamp_to_millis(&alert.created_at);
        let result = sqlx::query(
            r#"
            INSERT INTO alerts (
                app_id, alert_type, threshold, current_value, severity, status,
                message, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, 'active', ?, ?, ?)
            "#,
        )
        .bind(alert.app_id)
        .bind(&alert.alert_type)
        .bind(alert.threshold)
        .bind(alert.current_value)
        .bind(alert.severity.as_str())
        .bind(&alert.message)
        .bind(created_at)
        .bind(created_at)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_rowid();
        self.get_alert(id)
            .await?
            .ok_or_else(|| StorageError::NotFound(format!("alert {id}")))
    }

    async fn update_alert(&self, id: AlertId, update: &AlertUpdate) -> StorageResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE alerts
            SET threshold = ?, current_value = ?, severity = ?, message = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(update.threshold)
        .bind(update.current_value)
        .bind(update.severity.as_str())
        .bind(&update.message)
        .bind(Self::timestamp_to_millis(&update.updated_at))
        .bind(id)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("alert {id}")));
        }
        Ok(())
    }

    async fn resolve_alerts(
        &self,
        app_id: AppId,
        alert_type: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<usize> {
        let at = Self::timestamp_to_millis(&at);
        let result = sqlx::query(
            r#"
            UPDATE alerts
            SET status = 'resolved', resolved_at = ?, updated_at = ?
            WHERE app_id = ? AND alert_type = ? AND status IN ('active', 'suppressed')
            "#,
        )
        .bind(at)
        .bind(at)
        .bind(app_id)
        .bind(alert_type)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() as usize)
    }

    async fn get_alert(&self, id: AlertId) -> StorageResult<Option<Alert>> {
        let sql = format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::alert_from_row).transpose()
    }

    async fn set_alert_status(&self, id: AlertId, status: AlertStatus) -> StorageResult<()> {
        let result = sqlx::query("UPDATE alerts SET status = ? WHERE id = ?")
            .bind(status.as_str())
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("alert {id}")));
        }
        Ok(())
    }

    async fn acknowledge_alert(&self, id: AlertId, at: DateTime<Utc>) -> StorageResult<()> {
        let result = sqlx::query("UPDATE alerts SET acknowledged_at = ? WHERE id = ?")
            .bind(Self::timestamp_to_millis(&at))
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!("alert {id}")));
        }
        Ok(())
    }

    async fn list_alerts(
        &self,
        app_id: AppId,
        status: Option<AlertStatus>,
    ) -> StorageResult<Vec<Alert>> {
        let status_clause = if status.is_some() {
            "AND status = ?"
        } else {
            ""
        };
        let sql = format!(
            "SELECT {ALERT_COLUMNS} FROM alerts WHERE app_id = ? {status_clause} \
             ORDER BY created_at DESC, id DESC"
        );

        let mut statement = sqlx::query(&sql).bind(app_id);
        if let Some(status) = status {
            statement = statement.bind(status.as_str());
        }

        let rows = statement.fetch_all(&self.pool).await?;
        rows.iter().map(Self::alert_from_row).collect()
    }

    async fn count_active_alerts(&self, app_id: Option<AppId>) -> StorageResult<u64> {
        let (count,): (i64,) = match app_id {
            Some(app_id) => {
                sqlx::query_as("SELECT COUNT(*) FROM alerts WHERE status = 'active' AND app_id = ?")
                    .bind(app_id)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_as("SELECT COUNT(*) FROM alerts WHERE status = 'active'")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        Ok(count.max(0) as u64)
    }

    async fn alert_summary(&self) -> StorageResult<Vec<AlertSummary>> {
        let rows = sqlx::query(
            r#"
            SELECT a.id AS app_id, a.name AS app_name,
                   COUNT(al.id) AS active_alerts
            FROM applications a
            LEFT JOIN alerts al ON al.app_id = a.id AND al.status = 'active'
            GROUP BY a.id, a.name
            ORDER BY a.id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| -> StorageResult<AlertSummary> {
                let active: i64 = row.try_get("active_alerts")?;
                Ok(AlertSummary {
                    app_id: row.try_get("app_id")?,
                    app_name: row.try_get("app_name")?,
                    active_alerts: active.max(0) as u64,
                })
            })
            .collect()
    }

    async fn record_event(&self, event: &Event) -> StorageResult<()> {
        let folded = sqlx::query(
            r#"
            UPDATE events
            SET count = count + ?, last_seen = ?, message = ?
            WHERE app_id IS ? AND event_type = ? AND reason = ?
              AND object_kind = ? AND object_name = ?
            "#,
        )
        .bind(i64::from(event.count.max(1)))
        .bind(Self::timestamp_to_millis(&event.last_seen))
        .bind(&event.message)
        .bind(event.app_id)
        .bind(&event.event_type)
        .bind(&event.reason)
        .bind(&event.object_kind)
        .bind(&event.object_name)
        .execute(&self.pool)
        .await?;

        if folded.rows_affected() > 0 {
            return Ok(());
        }

        let sql = format!(
            "INSERT INTO events ({EVENT_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"
        );
        sqlx::query(&sql)
            .bind(event.app_id)
            .bind(&event.event_type)
            .bind(&event.reason)
            .bind(&event.message)
            .bind(&event.object_kind)
            .bind(&event.object_name)
            .bind(Self::timestamp_to_millis(&event.first_seen))
            .bind(Self::timestamp_to_millis(&event.last_seen))
            .bind(i64::from(event.count.max(1)))
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn list_events(&self, app_id: Option<AppId>) -> StorageResult<Vec<Event>> {
        let sql = format!(
            "SELECT {EVENT_COLUMNS} FROM events WHERE app_id IS ? ORDER BY last_seen DESC, id DESC"
        );
        let rows = sqlx::query(&sql)
            .bind(app_id)
            .fetch_all(&self.pool)
            .await?;

        rows.iter().map(Self::event_from_row).collect()
    }

    async fn delete_events_before(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        let result = sqlx::query("DELETE FROM events WHERE last_seen < ?")
            .bind(Self::timestamp_to_millis(&before))
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() as usize)
    }

    async fn close(&self) -> StorageResult<()> {
        info!("closing SQLite store");
        self.pool.close().await;
        Ok(())
    }
}
