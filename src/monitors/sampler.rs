//! MetricSampler - turns workload state into metric points
//!
//! ## Steps
//!
//! ```text
//! list_pods          → pods (count)
//! pod_resource_usage → cpu (millicores) + memory (bytes), per pod
//! get_deployment     → replicas_desired + replicas_ready (count)
//! ```
//!
//! A failed workload call degrades only its own step. Store failures abort
//! the whole sampling stage.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, instrument, trace, warn};

use crate::clock::Clock;
use crate::storage::{Application, MetricKind, MetricPoint, Recorder, StorageResult};
use crate::workload::{WorkloadApi, WorkloadError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStep {
    Pods,
    ResourceUsage,
    Deployment,
}

impl fmt::Display for SampleStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SampleStep::Pods => write!(f, "pods"),
            SampleStep::ResourceUsage => write!(f, "resource usage"),
            SampleStep::Deployment => write!(f, "deployment"),
        }
    }
}

/// What one sampling pass managed to write
#[derive(Debug, Default)]
pub struct SampleReport {
    pub points_written: usize,

    /// Steps whose workload call failed
    pub degraded: Vec<(SampleStep, WorkloadError)>,
}

impl SampleReport {
    pub fn is_degraded(&self) -> bool {
        !self.degraded.is_empty()
    }

    pub fn describe_degraded(&self) -> String {
        self.degraded
            .iter()
            .map(|(step, err)| format!("{step}: {err}"))
            .collect::<Vec<_>>()
            .join("; ")
    }
}

pub struct MetricSampler {
    workload: Arc<dyn WorkloadApi>,
    recorder: Recorder,
    clock: Arc<dyn Clock>,
}

impl MetricSampler {
    pub fn new(workload: Arc<dyn WorkloadApi>, recorder: Recorder, clock: Arc<dyn Clock>) -> Self {
        Self {
            workload,
            recorder,
            clock,
        }
    }

    #[instrument(skip(self, app), fields(app = %app.name))]
    pub async fn sample(&self, app: &Application) -> StorageResult<SampleReport> {
        let mut report = SampleReport::default();

        match self.workload.list_pods(&app.name).await {
            Ok(pods) => {
                let point = MetricPoint::new(
                    app.id,
                    MetricKind::Pods,
                    pods.len() as f64,
                    "count",
                    self.clock.now(),
                );
                self.write(&mut report, point).await?;
            }
            Err(e) => {
                warn!("failed to list pods: {e}");
                report.degraded.push((SampleStep::Pods, e));
            }
        }

        match self.workload.pod_resource_usage(&app.name).await {
            Ok(usages) => {
                let now = self.clock.now();
                for usage in usages {
                    let Some(container) = usage.representative() else {
                        trace!("pod {} reports no containers, skipping", usage.name);
                        continue;
                    };

                    let cpu = MetricPoint::new(
                        app.id,
                        MetricKind::Cpu,
                        container.cpu_millicores,
                        "millicores",
                        now,
                    )
                    .with_pod(&usage.name);
                    let memory = MetricPoint::new(
                        app.id,
                        MetricKind::Memory,
                        container.memory_bytes,
                        "bytes",
                        now,
                    )
                    .with_pod(&usage.name);

                    self.write(&mut report, cpu).await?;
                    self.write(&mut report, memory).await?;
                }
            }
            Err(e) => {
                warn!("failed to fetch pod resource usage: {e}");
                report.degraded.push((SampleStep::ResourceUsage, e));
            }
        }

        match self.workload.get_deployment(&app.name).await {
            Ok(deployment) => {
                let now = self.clock.now();
                let desired = MetricPoint::new(
                    app.id,
                    MetricKind::ReplicasDesired,
                    f64::from(deployment.desired_replicas),
                    "count",
                    now,
                );
                let ready = MetricPoint::new(
                    app.id,
                    MetricKind::ReplicasReady,
                    f64::from(deployment.ready_replicas),
                    "count",
                    now,
                );
                self.write(&mut report, desired).await?;
                self.write(&mut report, ready).await?;
            }
            Err(e) => {
                warn!("failed to fetch deployment: {e}");
                report.degraded.push((SampleStep::Deployment, e));
            }
        }

        debug!(
            "sampled {} points ({} steps degraded)",
            report.points_written,
            report.degraded.len()
        );
        Ok(report)
    }

    async fn write(&self, report: &mut SampleReport, point: MetricPoint) -> StorageResult<()> {
        self.recorder.record_metric(&point).await?;
        report.points_written += 1;
        Ok(())
    }
}
