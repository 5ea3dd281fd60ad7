//! Integration tests for the alert lifecycle
//!
//! These tests verify that:
//! - An alert is fired, escalated in place and resolved across cycles
//! - Repeated evaluation of a persisting condition does not create new rows
//! - Missing data leaves alert state untouched
//! - Acknowledge and suppress follow the status rules
//! - A suppressed alert keeps its slot until its condition clears

use std::sync::Arc;

use assert_matches::assert_matches;
use chrono::{DateTime, Duration, Utc};
use pretty_assertions::assert_eq;
use workload_monitor::alerts::{AlertEngine, Transition};
use workload_monitor::clock::Clock;
use workload_monitor::config::AlertSettings;
use workload_monitor::error::MonitorError;
use workload_monitor::storage::schema::NewAlert;
use workload_monitor::storage::{
    Alert, AlertStatus, Application, MetricKind, MetricPoint, MonitorStore, MonitoringConfig,
    Severity,
};

use crate::helpers::{FakeApp, TestEnv};

const MB: f64 = 1024.0 * 1024.0;

fn cpu_sample(app_id: i64, millicores: f64, at: DateTime<Utc>) -> MetricPoint {
    MetricPoint::new(app_id, MetricKind::Cpu, millicores, "millicores", at)
}

#[tokio::test]
async fn test_cpu_alert_fires_escalates_and_resolves() {
    let env = TestEnv::new().await;
    env.workload.set_app("web", FakeApp::single_pod(900.0, 100.0 * MB));
    let orchestrator = env.orchestrator();

    // Cycle 1: 90% is above 80% but not above 96%
    let report = orchestrator.run(Some("web")).await.unwrap();
    let evaluation = report.app("web").unwrap().evaluation.as_ref().unwrap();
    assert_eq!(evaluation.transition("cpu_high"), Some(Transition::Fired));
    assert_eq!(evaluation.transition("memory_high"), Some(Transition::Clear));

    let app = env.sqlite.find_application("web").await.unwrap().unwrap();
    let fired = env
        .store()
        .find_active_alert(app.id, "cpu_high")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(fired.severity, Severity::Warning);
    assert_eq!(fired.current_value, 90.0);
    assert_eq!(fired.threshold, 80.0);
    assert_eq!(fired.message, "CPU usage is 90.0% (threshold: 80.0%)");

    // Cycle 2: 100% is above 96%
    env.clock.advance(Duration::seconds(30));
    env.workload.set_usage("web", 1000.0, 100.0 * MB);
    let report = orchestrator.run(Some("web")).await.unwrap();
    let evaluation = report.app("web").unwrap().evaluation.as_ref().unwrap();
    assert_eq!(evaluation.transition("cpu_high"), Some(Transition::Escalated));

    let escalated = env.store().get_alert(fired.id).await.unwrap().unwrap();
    assert_eq!(escalated.status, AlertStatus::Active);
    assert_eq!(escalated.severity, Severity::Critical);
    assert_eq!(escalated.current_value, 100.0);
    assert_eq!(escalated.created_at, fired.created_at);
    assert_eq!(escalated.updated_at, env.clock.now());

    // Cycle 3: 70% clears the condition
    env.clock.advance(Duration::seconds(30));
    env.workload.set_usage("web", 700.0, 100.0 * MB);
    let report = orchestrator.run(Some("web")).await.unwrap();
    let evaluation = report.app("web").unwrap().evaluation.as_ref().unwrap();
    assert_eq!(evaluation.transition("cpu_high"), Some(Transition::Resolved));

    let resolved = env.store().get_alert(fired.id).await.unwrap().unwrap();
    assert_eq!(resolved.status, AlertStatus::Resolved);
    assert_eq!(resolved.resolved_at, Some(env.clock.now()));

    let all = env.store().list_alerts(app.id, None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(env.store().count_active_alerts(Some(app.id)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_persisting_condition_keeps_one_alert() {
    let env = TestEnv::new().await;
    env.workload.set_app("web", FakeApp::single_pod(850.0, 700.0 * MB));
    let orchestrator = env.orchestrator();

    for _ in 0..4 {
        orchestrator.run(Some("web")).await.unwrap();
        env.clock.advance(Duration::seconds(30));
    }

    let app = env.sqlite.find_application("web").await.unwrap().unwrap();
    let active = env
        .store()
        .list_alerts(app.id, Some(AlertStatus::Active))
        .await
        .unwrap();
    assert_eq!(active.len(), 2);

    let memory = active.iter().find(|a| a.alert_type == "memory_high").unwrap();
    assert_eq!(memory.severity, Severity::Warning);
    assert_eq!(memory.message, "Memory usage is 700.0MB (threshold: 500.0MB)");
    assert!(memory.updated_at > memory.created_at);
}

#[tokio::test]
async fn test_latest_sample_wins() {
    let env = TestEnv::new().await;
    let store = env.store();
    let app = store.ensure_application("web").await.unwrap();
    let now = env.clock.now();

    store.insert_metric(&cpu_sample(app.id, 990.0, now - Duration::seconds(60))).await.unwrap();
    store.insert_metric(&cpu_sample(app.id, 500.0, now - Duration::seconds(5))).await.unwrap();

    let report = env
        .engine()
        .evaluate(&app, &MonitoringConfig::defaults_for(app.id))
        .await
        .unwrap();

    assert_eq!(report.transition("cpu_high"), Some(Transition::Clear));
    assert_eq!(store.count_active_alerts(Some(app.id)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_no_data_in_window_leaves_alert_active() {
    let env = TestEnv::new().await;
    let store = env.store();
    let app = store.ensure_application("web").await.unwrap();
    let config = MonitoringConfig::defaults_for(app.id);
    let engine = env.engine();

    store.insert_metric(&cpu_sample(app.id, 900.0, env.clock.now())).await.unwrap();
    engine.evaluate(&app, &config).await.unwrap();

    // The only sample falls out of the five minute window
    env.clock.advance(Duration::minutes(6));
    let report = engine.evaluate(&app, &config).await.unwrap();

    assert_eq!(report.transition("cpu_high"), Some(Transition::NoData));
    assert_eq!(report.transition("memory_high"), Some(Transition::NoData));
    assert_eq!(store.count_active_alerts(Some(app.id)).await.unwrap(), 1);
}

#[tokio::test]
async fn test_unbounded_window_sees_old_samples() {
    let env = TestEnv::new().await;
    let store = env.store();
    let app = store.ensure_application("web").await.unwrap();
    let settings = AlertSettings {
        window_secs: u64::MAX,
        ..AlertSettings::default()
    };
    let engine = AlertEngine::new(store.clone(), Arc::new(env.clock.clone()), settings);

    let old = env.clock.now() - Duration::days(365);
    store.insert_metric(&cpu_sample(app.id, 900.0, old)).await.unwrap();

    let report = engine
        .evaluate(&app, &MonitoringConfig::defaults_for(app.id))
        .await
        .unwrap();
    assert_eq!(report.transition("cpu_high"), Some(Transition::Fired));
}

#[tokio::test]
async fn test_alerts_disabled_skips_evaluation() {
    let env = TestEnv::new().await;
    let store = env.store();
    let app = store.ensure_application("web").await.unwrap();
    let mut config = MonitoringConfig::defaults_for(app.id);
    config.alerts_enabled = false;

    store.insert_metric(&cpu_sample(app.id, 1000.0, env.clock.now())).await.unwrap();

    let report = env.engine().evaluate(&app, &config).await.unwrap();

    assert!(report.transitions.is_empty());
    assert_eq!(store.count_active_alerts(Some(app.id)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_resolve_without_active_alert_is_noop() {
    let env = TestEnv::new().await;
    let app = env.store().ensure_application("web").await.unwrap();

    let transition = env.engine().resolve(app.id, "cpu_high").await.unwrap();

    assert_eq!(transition, Transition::Clear);
    assert!(env.store().list_alerts(app.id, None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_second_active_alert_of_same_type_is_rejected() {
    let env = TestEnv::new().await;
    let store = env.store();
    let app = store.ensure_application("web").await.unwrap();

    let alert = NewAlert {
        app_id: app.id,
        alert_type: "cpu_high".to_string(),
        threshold: 80.0,
        current_value: 90.0,
        severity: Severity::Warning,
        message: "CPU usage is 90.0% (threshold: 80.0%)".to_string(),
        created_at: env.clock.now(),
    };

    store.insert_alert(&alert).await.unwrap();
    assert!(store.insert_alert(&alert).await.is_err());

    // Once resolved, the type may fire again
    store.resolve_alerts(app.id, "cpu_high", env.clock.now()).await.unwrap();
    store.insert_alert(&alert).await.unwrap();
    assert_eq!(store.list_alerts(app.id, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_acknowledge_keeps_alert_active() {
    let env = TestEnv::new().await;
    let store = env.store();
    let app = store.ensure_application("web").await.unwrap();
    let engine = env.engine();

    engine
        .upsert(app.id, "cpu_high", 80.0, 90.0, Severity::Warning, "high".to_string())
        .await
        .unwrap();
    let alert = store.find_active_alert(app.id, "cpu_high").await.unwrap().unwrap();

    env.clock.advance(Duration::seconds(10));
    let acknowledged = engine.acknowledge(alert.id).await.unwrap();

    assert_eq!(acknowledged.status, AlertStatus::Active);
    assert_eq!(acknowledged.acknowledged_at, Some(env.clock.now()));
    assert_matches!(engine.acknowledge(alert.id + 100).await, Err(MonitorError::AlertNotFound(_)));
}

/// Fire a cpu_high alert at 90% and suppress it
async fn fire_and_suppress(env: &TestEnv, app: &Application) -> Alert {
    let store = env.store();
    let engine = env.engine();

    store.insert_metric(&cpu_sample(app.id, 900.0, env.clock.now())).await.unwrap();
    engine
        .evaluate(app, &MonitoringConfig::defaults_for(app.id))
        .await
        .unwrap();
    let alert = store.find_active_alert(app.id, "cpu_high").await.unwrap().unwrap();

    let suppressed = engine.suppress(alert.id).await.unwrap();
    assert_eq!(suppressed.status, AlertStatus::Suppressed);
    assert_matches!(
        engine.suppress(alert.id).await,
        Err(MonitorError::AlertNotActive { .. })
    );
    suppressed
}

#[tokio::test]
async fn test_suppressed_alert_is_not_refired_while_condition_holds() {
    let env = TestEnv::new().await;
    let store = env.store();
    let app = store.ensure_application("web").await.unwrap();
    let config = MonitoringConfig::defaults_for(app.id);
    let suppressed = fire_and_suppress(&env, &app).await;

    // Still firing, now at critical level
    env.clock.advance(Duration::seconds(30));
    store.insert_metric(&cpu_sample(app.id, 990.0, env.clock.now())).await.unwrap();
    let report = env.engine().evaluate(&app, &config).await.unwrap();
    assert_eq!(report.transition("cpu_high"), Some(Transition::Suppressed));

    let all = store.list_alerts(app.id, None).await.unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].id, suppressed.id);
    assert_eq!(all[0].status, AlertStatus::Suppressed);
    assert_eq!(all[0].severity, Severity::Critical);
    assert_eq!(all[0].current_value, 99.0);
    assert_eq!(all[0].updated_at, env.clock.now());
    assert_eq!(store.count_active_alerts(Some(app.id)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_suppressed_alert_resolves_when_condition_clears() {
    let env = TestEnv::new().await;
    let store = env.store();
    let app = store.ensure_application("web").await.unwrap();
    let config = MonitoringConfig::defaults_for(app.id);
    let suppressed = fire_and_suppress(&env, &app).await;

    env.clock.advance(Duration::seconds(30));
    store.insert_metric(&cpu_sample(app.id, 400.0, env.clock.now())).await.unwrap();
    let report = env.engine().evaluate(&app, &config).await.unwrap();
    assert_eq!(report.transition("cpu_high"), Some(Transition::Resolved));

    let resolved = store.get_alert(suppressed.id).await.unwrap().unwrap();
    assert_eq!(resolved.status, AlertStatus::Resolved);
    assert_eq!(resolved.resolved_at, Some(env.clock.now()));

    // The slot is free again, so a new condition fires a fresh alert
    env.clock.advance(Duration::seconds(30));
    store.insert_metric(&cpu_sample(app.id, 900.0, env.clock.now())).await.unwrap();
    let report = env.engine().evaluate(&app, &config).await.unwrap();
    assert_eq!(report.transition("cpu_high"), Some(Transition::Fired));
    assert_eq!(store.list_alerts(app.id, None).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_suppressed_alert_holds_the_slot_in_store() {
    let env = TestEnv::new().await;
    let store = env.store();
    let app = store.ensure_application("web").await.unwrap();
    let suppressed = fire_and_suppress(&env, &app).await;

    let alert = NewAlert {
        app_id: app.id,
        alert_type: "cpu_high".to_string(),
        threshold: 80.0,
        current_value: 90.0,
        severity: Severity::Warning,
        message: "CPU usage is 90.0% (threshold: 80.0%)".to_string(),
        created_at: env.clock.now(),
    };
    assert!(store.insert_alert(&alert).await.is_err());

    let open = store.find_open_alert(app.id, "cpu_high").await.unwrap().unwrap();
    assert_eq!(open.id, suppressed.id);
    assert!(store.find_active_alert(app.id, "cpu_high").await.unwrap().is_none());
}

#[tokio::test]
async fn test_evaluating_same_inputs_twice_is_idempotent() {
    let env = TestEnv::new().await;
    let store = env.store();
    let app = store.ensure_application("web").await.unwrap();
    let config = MonitoringConfig::defaults_for(app.id);
    let engine = env.engine();

    store.insert_metric(&cpu_sample(app.id, 880.0, env.clock.now())).await.unwrap();

    let first = engine.evaluate(&app, &config).await.unwrap();
    let before = store.find_active_alert(app.id, "cpu_high").await.unwrap().unwrap();
    let second = engine.evaluate(&app, &config).await.unwrap();
    let after = store.find_active_alert(app.id, "cpu_high").await.unwrap().unwrap();

    assert_eq!(first.transition("cpu_high"), Some(Transition::Fired));
    assert_eq!(second.transition("cpu_high"), Some(Transition::Refreshed));
    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(store.list_alerts(app.id, None).await.unwrap().len(), 1);
}
