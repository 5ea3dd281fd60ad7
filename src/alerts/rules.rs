//! Alert rules as data
//!
//! Each rule names the metric kind it reads, how to normalize the raw value,
//! where its threshold comes from and how severity is chosen. The engine
//! evaluates every rule the same way, so adding a rule (error rate, latency)
//! means adding a descriptor, not new control flow.

use crate::config::AlertSettings;
use crate::storage::{MetricKind, MonitoringConfig, Severity};

/// Result of checking one normalized value against its threshold
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RuleOutcome {
    /// Value is strictly above the threshold
    Firing {
        value: f64,
        threshold: f64,
        severity: Severity,
    },

    /// Value is at or below the threshold
    Clear { value: f64, threshold: f64 },
}

#[derive(Debug, Clone)]
pub struct AlertRule {
    /// Key of the alert rows this rule owns, e.g. `cpu_high`
    pub alert_type: &'static str,

    pub metric_kind: MetricKind,

    /// Human readable name used in messages
    pub label: &'static str,

    /// Unit suffix of the normalized value in messages
    pub unit: &'static str,

    pub normalize: fn(f64, &AlertSettings) -> f64,

    pub threshold: fn(&MonitoringConfig, &AlertSettings) -> f64,

    pub severity: fn(f64, f64, &AlertSettings) -> Severity,
}

impl AlertRule {
    pub fn evaluate(
        &self,
        raw_value: f64,
        config: &MonitoringConfig,
        settings: &AlertSettings,
    ) -> RuleOutcome {
        let value = (self.normalize)(raw_value, settings);
        let threshold = (self.threshold)(config, settings);

        if exceeds(value, threshold) {
            RuleOutcome::Firing {
                value,
                threshold,
                severity: (self.severity)(value, threshold, settings),
            }
        } else {
            RuleOutcome::Clear { value, threshold }
        }
    }

    pub fn message(&self, value: f64, threshold: f64) -> String {
        format!(
            "{} is {:.1}{} (threshold: {:.1}{})",
            self.label, value, self.unit, threshold, self.unit
        )
    }
}

/// The rules evaluated every cycle
pub fn default_rules() -> Vec<AlertRule> {
    vec![cpu_high(), memory_high()]
}

/// CPU above the configured percentage
///
/// Millicores are normalized against `cpu_capacity_millicores`, not against
/// the pod's actual limit.
pub fn cpu_high() -> AlertRule {
    AlertRule {
        alert_type: "cpu_high",
        metric_kind: MetricKind::Cpu,
        label: "CPU usage",
        unit: "%",
        normalize: |millicores, settings| millicores * 100.0 / settings.cpu_capacity_millicores,
        threshold: |config, _| config.cpu_threshold,
        severity: escalating_severity,
    }
}

/// Memory above the fixed checkpoint
///
/// Deliberately ignores `MonitoringConfig::memory_threshold`; see DESIGN.md.
pub fn memory_high() -> AlertRule {
    AlertRule {
        alert_type: "memory_high",
        metric_kind: MetricKind::Memory,
        label: "Memory usage",
        unit: "MB",
        normalize: |bytes, _| bytes / (1024.0 * 1024.0),
        threshold: |_, settings| settings.memory_checkpoint_mb,
        severity: |_, _, _| Severity::Warning,
    }
}

/// Critical strictly above `threshold * critical_multiplier`, warning otherwise
pub fn escalating_severity(value: f64, threshold: f64, settings: &AlertSettings) -> Severity {
    if exceeds(value, threshold * settings.critical_multiplier) {
        Severity::Critical
    } else {
        Severity::Warning
    }
}

/// Relative slack below which two values count as equal
///
/// Percentages and bounds are each rounded once or twice, so a value that is
/// mathematically equal to its bound may land a few ulps on either side.
pub const RELATIVE_TOLERANCE: f64 = 1e-9;

/// `value > bound`, ignoring differences within [`RELATIVE_TOLERANCE`]
pub fn exceeds(value: f64, bound: f64) -> bool {
    value - bound > bound.abs().max(1.0) * RELATIVE_TOLERANCE
}
