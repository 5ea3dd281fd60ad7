//! Persistence for applications, metrics, health checks, alerts and events
//!
//! ## Design
//!
//! - **Trait-based**: `MonitorStore` allows swapping implementations
//! - **Async**: All operations are async for compatibility with Tokio
//! - **Auto-committing**: every call is its own statement, no cycle-wide transaction
//!
//! Retention is not a scheduled job: the [`retention::Recorder`] sweeps the
//! table it just wrote to after every insert.
//!
//! ## Usage
//!
//! ```no_run
//! use workload_monitor::storage::{MonitorStore, sqlite::SqliteStore};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let store = SqliteStore::new("./monitor.db").await?;
//!     let app = store.ensure_application("web").await?;
//!     println!("{} active alerts", store.count_active_alerts(Some(app.id)).await?);
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod error;
pub mod retention;
pub mod schema;
#[cfg(feature = "storage-sqlite")]
pub mod sqlite;

pub use backend::{AlertSummary, MetricQuery, MonitorStore};
pub use error::{StorageError, StorageResult};
pub use retention::{Recorder, RetentionPolicy, RetentionSweeper};
pub use schema::{
    Alert, AlertStatus, AppId, Application, Event, HealthCheckResult, HealthStatus, MetricKind,
    MetricPoint, MonitoringConfig, Severity,
};
