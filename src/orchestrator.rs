//! CollectionOrchestrator - one pass over the target applications
//!
//! ## Pipeline
//!
//! ```text
//! target apps (all, or one named)
//!     └─ for each app, sequentially
//!          ConfigResolver → MetricSampler → HealthProber → AlertEngine
//! ```
//!
//! A failing stage is logged, recorded as a `Warning` event and reported; it
//! never stops other applications. Only a config failure skips the later
//! stages of its application.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, trace, warn};

use crate::alerts::{AlertEngine, EvaluationReport};
use crate::clock::Clock;
use crate::config::MonitorSettings;
use crate::error::MonitorResult;
use crate::monitors::{ConfigResolver, HealthProber, MetricSampler};
use crate::storage::{
    Application, Event, HealthStatus, MonitorStore, Recorder, RetentionSweeper, StorageError,
};
use crate::workload::WorkloadApi;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Config,
    Sample,
    Probe,
    Evaluate,
}

impl Stage {
    /// Event reason recorded when the stage fails
    pub fn failure_reason(&self) -> String {
        format!("{self}Failed")
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Config => "Config",
            Stage::Sample => "Sample",
            Stage::Probe => "Probe",
            Stage::Evaluate => "Evaluate",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageFailure {
    pub app: String,
    pub stage: Stage,
    pub message: String,
}

/// What happened to one application during a cycle
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppReport {
    pub app: String,
    pub points_written: usize,

    /// Sampling steps whose workload call failed
    pub degraded: Option<String>,

    pub health: Option<HealthStatus>,
    pub evaluation: Option<EvaluationReport>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    pub apps: Vec<AppReport>,
    pub failures: Vec<StageFailure>,

    /// Set when the cancellation token stopped the cycle early
    pub cancelled: bool,
}

impl CycleReport {
    pub fn app(&self, name: &str) -> Option<&AppReport> {
        self.apps.iter().find(|report| report.app == name)
    }

    pub fn failures_of(&self, name: &str) -> Vec<Stage> {
        self.failures
            .iter()
            .filter(|failure| failure.app == name)
            .map(|failure| failure.stage)
            .collect()
    }
}

pub struct CollectionOrchestrator {
    store: Arc<dyn MonitorStore>,
    resolver: ConfigResolver,
    sampler: MetricSampler,
    prober: HealthProber,
    engine: AlertEngine,
    recorder: Recorder,
    clock: Arc<dyn Clock>,
    cancel: CancellationToken,
}

impl CollectionOrchestrator {
    /// Wire every stage against one store, workload API and clock
    pub fn new(
        store: Arc<dyn MonitorStore>,
        workload: Arc<dyn WorkloadApi>,
        clock: Arc<dyn Clock>,
        settings: &MonitorSettings,
    ) -> Self {
        let sweeper = Arc::new(RetentionSweeper::new(
            store.clone(),
            settings.retention.clone(),
            clock.clone(),
        ));
        let recorder = Recorder::new(store.clone(), sweeper);

        Self {
            resolver: ConfigResolver::new(store.clone()),
            sampler: MetricSampler::new(workload.clone(), recorder.clone(), clock.clone()),
            prober: HealthProber::new(workload, recorder.clone(), clock.clone()),
            engine: AlertEngine::new(store.clone(), clock.clone(), settings.alerts.clone()),
            store,
            recorder,
            clock,
            cancel: CancellationToken::new(),
        }
    }

    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn engine(&self) -> &AlertEngine {
        &self.engine
    }

    /// Run one collection cycle
    ///
    /// With a filter only the named application is processed; it is created
    /// on first reference. Fails only when the targets cannot be resolved.
    #[instrument(skip(self))]
    pub async fn run(&self, app_filter: Option<&str>) -> MonitorResult<CycleReport> {
        let targets = match app_filter {
            Some(name) => vec![self.store.ensure_application(name).await?],
            None => self.store.list_applications().await?,
        };
        debug!("collecting {} applications", targets.len());

        let mut report = CycleReport::default();
        for app in &targets {
            if self.cancel.is_cancelled() {
                info!("cycle cancelled before {}", app.name);
                report.cancelled = true;
                break;
            }
            let app_report = self.run_app(app, &mut report.failures).await;
            report.apps.push(app_report);
        }

        Ok(report)
    }

    /// Run a cycle every `interval` until cancelled
    pub async fn run_periodic(&self, app_filter: Option<&str>, interval: Duration) {
        info!("collecting every {}s", interval.as_secs());

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.cancel.cancelled() => {
                    info!("collection loop stopping");
                    break;
                }
                _ = ticker.tick() => {
                    match self.run(app_filter).await {
                        Ok(report) if report.failures.is_empty() => {
                            debug!("cycle finished for {} applications", report.apps.len());
                        }
                        Ok(report) => {
                            warn!(
                                "cycle finished for {} applications with {} failed stages",
                                report.apps.len(),
                                report.failures.len()
                            );
                        }
                        Err(e) => error!("cycle aborted: {e}"),
                    }
                }
            }
        }
    }

    #[instrument(skip(self, app, failures), fields(app = %app.name))]
    async fn run_app(&self, app: &Application, failures: &mut Vec<StageFailure>) -> AppReport {
        let mut report = AppReport {
            app: app.name.clone(),
            ..Default::default()
        };

        let config = match self.resolver.resolve(app).await {
            Ok(config) => config,
            Err(e) => {
                self.stage_failed(app, Stage::Config, &e, failures).await;
                return report;
            }
        };

        match self.sampler.sample(app).await {
            Ok(sample) => {
                if sample.is_degraded() {
                    let description = sample.describe_degraded();
                    warn!("sampling degraded: {description}");
                    report.degraded = Some(description);
                }
                report.points_written = sample.points_written;
            }
            Err(e) => self.stage_failed(app, Stage::Sample, &e, failures).await,
        }

        match self.prober.probe(app, &config).await {
            Ok(check) => report.health = check.map(|check| check.status),
            Err(e) => self.stage_failed(app, Stage::Probe, &e, failures).await,
        }

        match self.engine.evaluate(app, &config).await {
            Ok(evaluation) => report.evaluation = Some(evaluation),
            Err(e) => self.stage_failed(app, Stage::Evaluate, &e, failures).await,
        }

        trace!("finished {}", app.name);
        report
    }

    async fn stage_failed(
        &self,
        app: &Application,
        stage: Stage,
        err: &StorageError,
        failures: &mut Vec<StageFailure>,
    ) {
        warn!("{stage} stage failed: {err}");

        let now = self.clock.now();
        let event = Event {
            app_id: Some(app.id),
            event_type: "Warning".to_string(),
            reason: stage.failure_reason(),
            message: err.to_string(),
            object_kind: "Application".to_string(),
            object_name: app.name.clone(),
            first_seen: now,
            last_seen: now,
            count: 1,
        };
        if let Err(e) = self.recorder.record_event(&event).await {
            warn!("could not record {} event: {e}", event.reason);
        }

        failures.push(StageFailure {
            app: app.name.clone(),
            stage,
            message: err.to_string(),
        });
    }
}
