//! Helper types for integration tests
//!
//! - `FakeWorkload`: scripted `WorkloadApi`; an app without a script is unavailable
//! - `FaultyStore`: `SqliteStore` wrapper that fails selected calls for one app
//! - `TestEnv`: temp database, manual clock and wired components

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tempfile::TempDir;
use workload_monitor::alerts::AlertEngine;
use workload_monitor::clock::ManualClock;
use workload_monitor::config::{AlertSettings, MonitorSettings};
use workload_monitor::monitors::{HealthProber, MetricSampler};
use workload_monitor::orchestrator::CollectionOrchestrator;
use workload_monitor::storage::backend::{AlertSummary, MetricQuery};
use workload_monitor::storage::schema::{AlertId, AlertUpdate, NewAlert};
use workload_monitor::storage::sqlite::SqliteStore;
use workload_monitor::storage::{
    Alert, AlertStatus, AppId, Application, Event, HealthCheckResult, MetricPoint, MonitorStore,
    MonitoringConfig, Recorder, RetentionPolicy, RetentionSweeper, StorageError, StorageResult,
};
use workload_monitor::workload::{
    ContainerUsage, Deployment, Pod, PodUsage, ServiceEndpoint, WorkloadApi, WorkloadError,
    WorkloadResult,
};

/// Current time truncated to the millisecond precision the store keeps
pub fn now_millis() -> DateTime<Utc> {
    DateTime::from_timestamp_millis(Utc::now().timestamp_millis()).unwrap()
}

pub fn pod(name: &str) -> Pod {
    Pod {
        name: name.to_string(),
        phase: Some("Running".to_string()),
        ready: true,
    }
}

pub fn usage(pod: &str, cpu_millicores: f64, memory_bytes: f64) -> PodUsage {
    PodUsage {
        name: pod.to_string(),
        containers: vec![ContainerUsage {
            name: "app".to_string(),
            cpu_millicores,
            memory_bytes,
        }],
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakeApp {
    pub pods: Option<Vec<Pod>>,
    pub usage: Option<Vec<PodUsage>>,
    pub deployment: Option<Deployment>,
    pub service: Option<ServiceEndpoint>,
}

impl FakeApp {
    /// One running pod with the given usage and a 1/1 deployment
    pub fn single_pod(cpu_millicores: f64, memory_bytes: f64) -> Self {
        Self {
            pods: Some(vec![pod("pod-0")]),
            usage: Some(vec![usage("pod-0", cpu_millicores, memory_bytes)]),
            deployment: Some(Deployment {
                desired_replicas: 1,
                ready_replicas: 1,
            }),
            service: None,
        }
    }
}

#[derive(Default)]
pub struct FakeWorkload {
    apps: Mutex<HashMap<String, FakeApp>>,
}

impl FakeWorkload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_app(&self, name: &str, app: FakeApp) {
        self.apps.lock().unwrap().insert(name.to_string(), app);
    }

    pub fn set_usage(&self, name: &str, cpu_millicores: f64, memory_bytes: f64) {
        let mut apps = self.apps.lock().unwrap();
        let app = apps.entry(name.to_string()).or_default();
        app.usage = Some(vec![usage("pod-0", cpu_millicores, memory_bytes)]);
    }

    pub fn set_service(&self, name: &str, cluster_address: &str, port: u16) {
        let mut apps = self.apps.lock().unwrap();
        let app = apps.entry(name.to_string()).or_default();
        app.service = Some(ServiceEndpoint {
            cluster_address: cluster_address.to_string(),
            ports: vec![port],
        });
    }

    fn get<T>(
        &self,
        name: &str,
        resource: &str,
        pick: impl Fn(&FakeApp) -> Option<T>,
    ) -> WorkloadResult<T> {
        self.apps
            .lock()
            .unwrap()
            .get(name)
            .and_then(pick)
            .ok_or_else(|| WorkloadError::Unavailable(format!("no {resource} scripted for {name}")))
    }
}

#[async_trait]
impl WorkloadApi for FakeWorkload {
    async fn list_pods(&self, app_name: &str) -> WorkloadResult<Vec<Pod>> {
        self.get(app_name, "pods", |app| app.pods.clone())
    }

    async fn pod_resource_usage(&self, app_name: &str) -> WorkloadResult<Vec<PodUsage>> {
        self.get(app_name, "usage", |app| app.usage.clone())
    }

    async fn get_deployment(&self, app_name: &str) -> WorkloadResult<Deployment> {
        self.get(app_name, "deployment", |app| app.deployment)
    }

    async fn get_service(&self, app_name: &str) -> WorkloadResult<ServiceEndpoint> {
        self.get(app_name, "service", |app| app.service.clone())
    }
}

/// Calls of [`FaultyStore`] that can be made to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Fault {
    Config,
    InsertMetric,
    InsertHealthCheck,
    QueryMetrics,
}

/// Delegates to a real store, failing chosen calls for chosen apps
pub struct FaultyStore {
    inner: Arc<SqliteStore>,
    faults: Mutex<HashSet<(AppId, Fault)>>,
}

impl FaultyStore {
    pub fn new(inner: Arc<SqliteStore>) -> Self {
        Self {
            inner,
            faults: Mutex::new(HashSet::new()),
        }
    }

    pub fn fail(&self, app_id: AppId, fault: Fault) {
        self.faults.lock().unwrap().insert((app_id, fault));
    }

    fn check(&self, app_id: AppId, fault: Fault) -> StorageResult<()> {
        if self.faults.lock().unwrap().contains(&(app_id, fault)) {
            Err(StorageError::QueryFailed(format!("injected {fault:?} failure")))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl MonitorStore for FaultyStore {
    async fn ensure_application(&self, name: &str) -> StorageResult<Application> {
        self.inner.ensure_application(name).await
    }

    async fn find_application(&self, name: &str) -> StorageResult<Option<Application>> {
        self.inner.find_application(name).await
    }

    async fn list_applications(&self) -> StorageResult<Vec<Application>> {
        self.inner.list_applications().await
    }

    async fn get_monitoring_config(
        &self,
        app_id: AppId,
    ) -> StorageResult<Option<MonitoringConfig>> {
        self.check(app_id, Fault::Config)?;
        self.inner.get_monitoring_config(app_id).await
    }

    async fn insert_monitoring_config_if_absent(
        &self,
        config: &MonitoringConfig,
    ) -> StorageResult<MonitoringConfig> {
        self.check(config.app_id, Fault::Config)?;
        self.inner.insert_monitoring_config_if_absent(config).await
    }

    async fn update_monitoring_config(&self, config: &MonitoringConfig) -> StorageResult<()> {
        self.inner.update_monitoring_config(config).await
    }

    async fn insert_metric(&self, point: &MetricPoint) -> StorageResult<()> {
        self.check(point.app_id, Fault::InsertMetric)?;
        self.inner.insert_metric(point).await
    }

    async fn query_metrics(&self, query: MetricQuery) -> StorageResult<Vec<MetricPoint>> {
        self.check(query.app_id, Fault::QueryMetrics)?;
        self.inner.query_metrics(query).await
    }

    async fn delete_metrics_before(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        self.inner.delete_metrics_before(before).await
    }

    async fn insert_health_check(&self, check: &HealthCheckResult) -> StorageResult<()> {
        self.check(check.app_id, Fault::InsertHealthCheck)?;
        self.inner.insert_health_check(check).await
    }

    async fn query_health_checks(
        &self,
        app_id: AppId,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StorageResult<Vec<HealthCheckResult>> {
        self.inner.query_health_checks(app_id, start, end).await
    }

    async fn delete_health_checks_before(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        self.inner.delete_health_checks_before(before).await
    }

    async fn find_active_alert(
        &self,
        app_id: AppId,
        alert_type: &str,
    ) -> StorageResult<Option<Alert>> {
        self.inner.find_active_alert(app_id, alert_type).await
    }

    async fn find_open_alert(
        &self,
        app_id: AppId,
        alert_type: &str,
    ) -> StorageResult<Option<Alert>> {
        self.inner.find_open_alert(app_id, alert_type).await
    }

    async fn insert_alert(&self, alert: &NewAlert) -> StorageResult<Alert> {
        self.inner.insert_alert(alert).await
    }

    async fn update_alert(&self, id: AlertId, update: &AlertUpdate) -> StorageResult<()> {
        self.inner.update_alert(id, update).await
    }

    async fn resolve_alerts(
        &self,
        app_id: AppId,
        alert_type: &str,
        at: DateTime<Utc>,
    ) -> StorageResult<usize> {
        self.inner.resolve_alerts(app_id, alert_type, at).await
    }

    async fn get_alert(&self, id: AlertId) -> StorageResult<Option<Alert>> {
        self.inner.get_alert(id).await
    }

    async fn set_alert_status(&self, id: AlertId, status: AlertStatus) -> StorageResult<()> {
        self.inner.set_alert_status(id, status).await
    }

    async fn acknowledge_alert(&self, id: AlertId, at: DateTime<Utc>) -> StorageResult<()> {
        self.inner.acknowledge_alert(id, at).await
    }

    async fn list_alerts(
        &self,
        app_id: AppId,
        status: Option<AlertStatus>,
    ) -> StorageResult<Vec<Alert>> {
        self.inner.list_alerts(app_id, status).await
    }

    async fn count_active_alerts(&self, app_id: Option<AppId>) -> StorageResult<u64> {
        self.inner.count_active_alerts(app_id).await
    }

    async fn alert_summary(&self) -> StorageResult<Vec<AlertSummary>> {
        self.inner.alert_summary().await
    }

    async fn record_event(&self, event: &Event) -> StorageResult<()> {
        self.inner.record_event(event).await
    }

    async fn list_events(&self, app_id: Option<AppId>) -> StorageResult<Vec<Event>> {
        self.inner.list_events(app_id).await
    }

    async fn delete_events_before(&self, before: DateTime<Utc>) -> StorageResult<usize> {
        self.inner.delete_events_before(before).await
    }

    async fn close(&self) -> StorageResult<()> {
        self.inner.close().await
    }
}

/// Temp database, manual clock and a scripted workload
pub struct TestEnv {
    _dir: TempDir,
    pub sqlite: Arc<SqliteStore>,
    pub faulty: Arc<FaultyStore>,
    pub clock: ManualClock,
    pub workload: Arc<FakeWorkload>,
    pub settings: MonitorSettings,
}

impl TestEnv {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let sqlite = Arc::new(SqliteStore::new(dir.path().join("monitor.db")).await.unwrap());
        let faulty = Arc::new(FaultyStore::new(sqlite.clone()));

        Self {
            _dir: dir,
            sqlite,
            faulty,
            clock: ManualClock::new(now_millis()),
            workload: Arc::new(FakeWorkload::new()),
            settings: MonitorSettings::default(),
        }
    }

    /// Store seen by the components; failures can be injected through `faulty`
    pub fn store(&self) -> Arc<dyn MonitorStore> {
        self.faulty.clone()
    }

    pub fn recorder(&self) -> Recorder {
        let sweeper = Arc::new(RetentionSweeper::new(
            self.store(),
            RetentionPolicy::default(),
            Arc::new(self.clock.clone()),
        ));
        Recorder::new(self.store(), sweeper)
    }

    pub fn engine(&self) -> AlertEngine {
        AlertEngine::new(self.store(), Arc::new(self.clock.clone()), AlertSettings::default())
    }

    pub fn sampler(&self) -> MetricSampler {
        MetricSampler::new(self.workload.clone(), self.recorder(), Arc::new(self.clock.clone()))
    }

    pub fn prober(&self) -> HealthProber {
        HealthProber::new(self.workload.clone(), self.recorder(), Arc::new(self.clock.clone()))
    }

    pub fn orchestrator(&self) -> CollectionOrchestrator {
        CollectionOrchestrator::new(
            self.store(),
            self.workload.clone(),
            Arc::new(self.clock.clone()),
            &self.settings,
        )
    }
}
