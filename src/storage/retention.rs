//! Horizon-per-insert retention
//!
//! Every write through the [`Recorder`] is followed by a sweep of the same
//! table, so a horizon is enforced within one insert after a row expires
//! rather than exactly at expiry.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tracing::{debug, info, warn};

use crate::clock::Clock;

use super::backend::MonitorStore;
use super::error::StorageResult;
use super::schema::{Event, HealthCheckResult, MetricPoint};

/// Maximum age per table before rows become eligible for deletion
#[derive(Debug, Clone, PartialEq, Eq, serde::Deserialize)]
pub struct RetentionPolicy {
    #[serde(default = "default_metrics_days")]
    pub metrics_days: u32,

    #[serde(default = "default_health_checks_days")]
    pub health_checks_days: u32,

    #[serde(default = "default_events_days")]
    pub events_days: u32,
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            metrics_days: default_metrics_days(),
            health_checks_days: default_health_checks_days(),
            events_days: default_events_days(),
        }
    }
}

fn default_metrics_days() -> u32 {
    7
}

fn default_health_checks_days() -> u32 {
    7
}

fn default_events_days() -> u32 {
    30
}

/// Deletes rows older than the policy's horizons
pub struct RetentionSweeper {
    store: Arc<dyn MonitorStore>,
    policy: RetentionPolicy,
    clock: Arc<dyn Clock>,
}

impl RetentionSweeper {
    pub fn new(
        store: Arc<dyn MonitorStore>,
        policy: RetentionPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &RetentionPolicy {
        &self.policy
    }

    /// Horizons reaching before the earliest representable instant keep everything
    fn cutoff(&self, days: u32) -> DateTime<Utc> {
        self.clock
            .now()
            .checked_sub_signed(Duration::days(i64::from(days)))
            .unwrap_or(DateTime::<Utc>::MIN_UTC)
    }

    pub async fn sweep_metrics(&self) -> StorageResult<usize> {
        let deleted = self
            .store
            .delete_metrics_before(self.cutoff(self.policy.metrics_days))
            .await?;
        if deleted > 0 {
            info!("retention: deleted {deleted} expired metrics");
        }
        Ok(deleted)
    }

    pub async fn sweep_health_checks(&self) -> StorageResult<usize> {
        let deleted = self
            .store
            .delete_health_checks_before(self.cutoff(self.policy.health_checks_days))
            .await?;
        if deleted > 0 {
            info!("retention: deleted {deleted} expired health checks");
        }
        Ok(deleted)
    }

    pub async fn sweep_events(&self) -> StorageResult<usize> {
        let deleted = self
            .store
            .delete_events_before(self.cutoff(self.policy.events_days))
            .await?;
        if deleted > 0 {
            info!("retention: deleted {deleted} expired events");
        }
        Ok(deleted)
    }
}

/// Write path for append-only records
///
/// Inserts, then sweeps the table that was written. A failed sweep is
/// logged; it never fails the insert that triggered it.
#[derive(Clone)]
pub struct Recorder {
    store: Arc<dyn MonitorStore>,
    sweeper: Arc<RetentionSweeper>,
}

impl Recorder {
    pub fn new(store: Arc<dyn MonitorStore>, sweeper: Arc<RetentionSweeper>) -> Self {
        Self { store, sweeper }
    }

    pub fn store(&self) -> &Arc<dyn MonitorStore> {
        &self.store
    }

    pub async fn record_metric(&self, point: &MetricPoint) -> StorageResult<()> {
        self.store.insert_metric(point).await?;
        trace_sweep("metrics", self.sweeper.sweep_metrics().await);
        Ok(())
    }

    pub async fn record_health_check(&self, check: &HealthCheckResult) -> StorageResult<()> {
        self.store.insert_health_check(check).await?;
        trace_sweep("health_checks", self.sweeper.sweep_health_checks().await);
        Ok(())
    }

    pub async fn record_event(&self, event: &Event) -> StorageResult<()> {
        self.store.record_event(event).await?;
        trace_sweep("events", self.sweeper.sweep_events().await);
        Ok(())
    }
}

fn trace_sweep(table: &str, result: StorageResult<usize>) {
    match result {
        Ok(deleted) => debug!("swept {table}: {deleted} rows"),
        Err(e) => warn!("retention sweep of {table} failed: {e}"),
    }
}
