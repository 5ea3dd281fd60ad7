//! HealthProber - one HTTP probe per application per cycle
//!
//! ## Classification
//!
//! ```text
//! transport timeout     → timeout
//! other transport error → error (with error text)
//! 2xx                   → healthy
//! anything else         → unhealthy
//! ```
//!
//! The per-request timeout comes from the application's
//! `health_check_timeout_secs`. Elapsed time is recorded for every outcome.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, instrument, trace, warn};

use crate::clock::Clock;
use crate::storage::{
    Application, HealthCheckResult, HealthStatus, MonitoringConfig, Recorder, StorageResult,
};
use crate::workload::WorkloadApi;

const PROBE_METHOD: &str = "GET";

pub struct HealthProber {
    client: reqwest::Client,
    workload: Arc<dyn WorkloadApi>,
    recorder: Recorder,
    clock: Arc<dyn Clock>,
}

/// Outcome of the HTTP exchange, before it becomes a record
struct ProbeOutcome {
    status: HealthStatus,
    status_code: Option<u16>,
    error: Option<String>,
}

impl HealthProber {
    pub fn new(workload: Arc<dyn WorkloadApi>, recorder: Recorder, clock: Arc<dyn Clock>) -> Self {
        Self {
            client: reqwest::Client::new(),
            workload,
            recorder,
            clock,
        }
    }

    /// Probe the application and record exactly one result
    ///
    /// Returns `None` without writing anything when monitoring is disabled
    /// for the application.
    #[instrument(skip(self, app, config), fields(app = %app.name))]
    pub async fn probe(
        &self,
        app: &Application,
        config: &MonitoringConfig,
    ) -> StorageResult<Option<HealthCheckResult>> {
        if !config.enabled {
            trace!("monitoring disabled, skipping probe");
            return Ok(None);
        }

        let start = Instant::now();
        let (endpoint, outcome) = match self.resolve_endpoint(app, config).await {
            Ok(endpoint) => {
                let outcome = self.execute(&endpoint, config).await;
                (endpoint, outcome)
            }
            Err(message) => {
                warn!("cannot resolve probe endpoint: {message}");
                let outcome = ProbeOutcome {
                    status: HealthStatus::Error,
                    status_code: None,
                    error: Some(message),
                };
                (app.name.clone(), outcome)
            }
        };
        let response_time_ms = start.elapsed().as_millis() as u64;

        let result = HealthCheckResult {
            app_id: app.id,
            endpoint,
            method: PROBE_METHOD.to_string(),
            status: outcome.status,
            status_code: outcome.status_code,
            response_time_ms,
            error: outcome.error,
            timestamp: self.clock.now(),
        };

        debug!(
            "probe of {} → {} in {}ms",
            result.endpoint, result.status, result.response_time_ms
        );

        self.recorder.record_health_check(&result).await?;
        Ok(Some(result))
    }

    async fn resolve_endpoint(
        &self,
        app: &Application,
        config: &MonitoringConfig,
    ) -> Result<String, String> {
        let service = self
            .workload
            .get_service(&app.name)
            .await
            .map_err(|e| e.to_string())?;

        let port = service
            .first_port()
            .ok_or_else(|| format!("service of '{}' declares no ports", app.name))?;

        Ok(format!(
            "http://{}:{}{}",
            service.cluster_address, port, config.health_check_path
        ))
    }

    async fn execute(&self, url: &str, config: &MonitoringConfig) -> ProbeOutcome {
        let timeout = Duration::from_secs(config.health_check_timeout_secs.max(1));

        match self.client.get(url).timeout(timeout).send().await {
            Ok(response) => {
                let code = response.status().as_u16();
                let status = if (200..300).contains(&code) {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Unhealthy
                };
                ProbeOutcome {
                    status,
                    status_code: Some(code),
                    error: None,
                }
            }
            Err(e) if e.is_timeout() => ProbeOutcome {
                status: HealthStatus::Timeout,
                status_code: None,
                error: Some(format!("no response within {}s", timeout.as_secs())),
            },
            Err(e) => ProbeOutcome {
                status: HealthStatus::Error,
                status_code: None,
                error: Some(e.to_string()),
            },
        }
    }
}
