//! AlertEngine - derives alert state from the latest metric window
//!
//! ## Lifecycle
//!
//! ```text
//! condition holds, no open row    → insert active row          (Fired)
//! condition holds, active row     → update value/severity/msg  (Escalated | Refreshed)
//! condition holds, suppressed row → update value/severity/msg  (Suppressed)
//! condition clear, open row       → status=resolved            (Resolved)
//! condition clear, no open row    → nothing                    (Clear)
//! no sample of the kind in window → nothing                    (NoData)
//! ```
//!
//! An alert keeps its identity and `created_at` while its condition
//! persists, so it never flaps into a new row between cycles. A suppressed
//! alert stays suppressed until its condition clears.
//!
//! The existence check and the write are separate statements. A crash in
//! between can leave the store without the write; the next cycle converges.

pub mod rules;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, instrument, trace};

use crate::clock::Clock;
use crate::config::AlertSettings;
use crate::error::{MonitorError, MonitorResult};
use crate::storage::backend::MetricQuery;
use crate::storage::schema::{AlertId, AlertUpdate, NewAlert};
use crate::storage::{
    Alert, AlertStatus, AppId, Application, MetricKind, MetricPoint, MonitorStore,
    MonitoringConfig, Severity, StorageResult,
};

pub use rules::{AlertRule, RuleOutcome, default_rules};

/// What a rule did to the alert state in one evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Fired,
    Escalated,
    Refreshed,
    /// Condition still holds on a suppressed alert
    Suppressed,
    Resolved,
    Clear,
    NoData,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Transition::Fired => "fired",
            Transition::Escalated => "escalated",
            Transition::Refreshed => "refreshed",
            Transition::Suppressed => "suppressed",
            Transition::Resolved => "resolved",
            Transition::Clear => "clear",
            Transition::NoData => "no data",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EvaluationReport {
    /// One entry per rule, in rule order
    pub transitions: Vec<(&'static str, Transition)>,
}

impl EvaluationReport {
    pub fn transition(&self, alert_type: &str) -> Option<Transition> {
        self.transitions
            .iter()
            .find(|(kind, _)| *kind == alert_type)
            .map(|(_, transition)| *transition)
    }
}

pub struct AlertEngine {
    store: Arc<dyn MonitorStore>,
    clock: Arc<dyn Clock>,
    settings: AlertSettings,
    rules: Vec<AlertRule>,
}

impl AlertEngine {
    pub fn new(
        store: Arc<dyn MonitorStore>,
        clock: Arc<dyn Clock>,
        settings: AlertSettings,
    ) -> Self {
        Self::with_rules(store, clock, settings, default_rules())
    }

    pub fn with_rules(
        store: Arc<dyn MonitorStore>,
        clock: Arc<dyn Clock>,
        settings: AlertSettings,
        rules: Vec<AlertRule>,
    ) -> Self {
        Self {
            store,
            clock,
            settings,
            rules,
        }
    }

    pub fn rules(&self) -> &[AlertRule] {
        &self.rules
    }

    /// Evaluate every rule against the newest sample of its metric kind
    #[instrument(skip(self, app, config), fields(app = %app.name))]
    pub async fn evaluate(
        &self,
        app: &Application,
        config: &MonitoringConfig,
    ) -> StorageResult<EvaluationReport> {
        let mut report = EvaluationReport::default();

        if !config.alerts_enabled {
            trace!("alerting disabled, skipping evaluation");
            return Ok(report);
        }

        let now = self.clock.now();
        let since = now
            .checked_sub_signed(self.settings.window())
            .unwrap_or(DateTime::<Utc>::MIN_UTC);
        let points = self
            .store
            .query_metrics(MetricQuery::range(app.id, since, now))
            .await?;
        let latest = latest_per_kind(&points);

        for rule in &self.rules {
            let Some(point) = latest.get(&rule.metric_kind) else {
                trace!("no {} sample in window for {}", rule.metric_kind, rule.alert_type);
                report.transitions.push((rule.alert_type, Transition::NoData));
                continue;
            };

            let transition = match rule.evaluate(point.value, config, &self.settings) {
                RuleOutcome::Firing {
                    value,
                    threshold,
                    severity,
                } => {
                    let message = rule.message(value, threshold);
                    self.upsert(app.id, rule.alert_type, threshold, value, severity, message)
                        .await?
                }
                RuleOutcome::Clear { .. } => self.resolve(app.id, rule.alert_type).await?,
            };

            debug!("{}: {transition}", rule.alert_type);
            report.transitions.push((rule.alert_type, transition));
        }

        Ok(report)
    }

    /// Keep exactly one open row for (app, type) carrying the latest values
    pub async fn upsert(
        &self,
        app_id: AppId,
        alert_type: &str,
        threshold: f64,
        current_value: f64,
        severity: Severity,
        message: String,
    ) -> StorageResult<Transition> {
        let now = self.clock.now();

        match self.store.find_open_alert(app_id, alert_type).await? {
            Some(existing) => {
                let update = AlertUpdate {
                    threshold,
                    current_value,
                    severity,
                    message,
                    updated_at: now,
                };
                self.store.update_alert(existing.id, &update).await?;

                if existing.status == AlertStatus::Suppressed {
                    trace!("{alert_type} still holds while suppressed");
                    Ok(Transition::Suppressed)
                } else if severity > existing.severity {
                    info!(
                        "{alert_type} escalated from {} to {severity}: {}",
                        existing.severity, update.message
                    );
                    Ok(Transition::Escalated)
                } else {
                    if severity != existing.severity {
                        info!("{alert_type} lowered from {} to {severity}", existing.severity);
                    }
                    Ok(Transition::Refreshed)
                }
            }
            None => {
                let alert = NewAlert {
                    app_id,
                    alert_type: alert_type.to_string(),
                    threshold,
                    current_value,
                    severity,
                    message,
                    created_at: now,
                };
                self.store.insert_alert(&alert).await?;
                info!("{alert_type} fired ({severity}): {}", alert.message);
                Ok(Transition::Fired)
            }
        }
    }

    /// Resolve the open alert of this type, if there is one
    pub async fn resolve(&self, app_id: AppId, alert_type: &str) -> StorageResult<Transition> {
        let resolved = self
            .store
            .resolve_alerts(app_id, alert_type, self.clock.now())
            .await?;

        if resolved > 0 {
            info!("{alert_type} resolved");
            Ok(Transition::Resolved)
        } else {
            Ok(Transition::Clear)
        }
    }

    /// Record that an operator has seen the alert
    pub async fn acknowledge(&self, id: AlertId) -> MonitorResult<Alert> {
        if self.store.get_alert(id).await?.is_none() {
            return Err(MonitorError::AlertNotFound(id));
        }

        self.store.acknowledge_alert(id, self.clock.now()).await?;
        self.store
            .get_alert(id)
            .await?
            .ok_or(MonitorError::AlertNotFound(id))
    }

    /// Silence an active alert
    ///
    /// A suppressed alert no longer counts as active but keeps its slot:
    /// later cycles update it in place and resolve it once the condition
    /// clears.
    pub async fn suppress(&self, id: AlertId) -> MonitorResult<Alert> {
        let alert = self
            .store
            .get_alert(id)
            .await?
            .ok_or(MonitorError::AlertNotFound(id))?;

        if alert.status != AlertStatus::Active {
            return Err(MonitorError::AlertNotActive {
                id,
                status: alert.status.to_string(),
            });
        }

        self.store.set_alert_status(id, AlertStatus::Suppressed).await?;
        info!("{} suppressed", alert.alert_type);
        self.store
            .get_alert(id)
            .await?
            .ok_or(MonitorError::AlertNotFound(id))
    }
}

/// Newest point per kind; rows sharing a timestamp keep store order
fn latest_per_kind(points: &[MetricPoint]) -> HashMap<MetricKind, &MetricPoint> {
    let mut latest: HashMap<MetricKind, &MetricPoint> = HashMap::new();
    for point in points {
        match latest.get(&point.kind) {
            Some(current) if current.timestamp > point.timestamp => {}
            _ => {
                latest.insert(point.kind.clone(), point);
            }
        }
    }
    latest
}
