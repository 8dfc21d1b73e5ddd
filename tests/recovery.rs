mod common;

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use common::{CallLog, Fake, config, drain, registry};
use subvisor::{
    BackoffPolicy, Controller, ControllerConfig, Event, EventKind, JitterPolicy, Severity,
    Subscribe, SubsystemDescriptor, SubsystemStatus,
};

fn one_critical(tmp: &tempfile::TempDir) -> ControllerConfig {
    config(vec![SubsystemDescriptor::new("db", "Database").critical()], tmp.path())
}

async fn started(cfg: ControllerConfig, fake: &Fake) -> Arc<Controller> {
    let ctrl = Controller::builder(cfg)
        .with_registry(registry(&[fake]))
        .build()
        .unwrap();
    ctrl.start().await.unwrap();
    ctrl
}

#[tokio::test(start_paused = true)]
async fn test_recovery_stops_after_max_attempts() {
    let tmp = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let db = Fake::new("db", &log);
    let ctrl = started(one_critical(&tmp), &db).await;
    let mut rx = ctrl.bus().subscribe();

    db.set_healthy(false);
    db.emitter().fail("connection lost");
    assert_eq!(ctrl.hub().state("db").unwrap().status(), SubsystemStatus::Failed);

    for _ in 0..6 {
        let health = ctrl.check_health().await;
        assert!(!health.critical_systems_ok);
    }

    // one initial start plus three recovery attempts
    assert_eq!(log.starts().len(), 4);
    let state = ctrl.hub().state("db").unwrap();
    assert_eq!(state.restart_count(), 3);
    assert_eq!(state.status(), SubsystemStatus::Failed);

    let events = drain(&mut rx);
    let attempts: Vec<u32> = events
        .iter()
        .filter(|e| e.kind == EventKind::RecoveryAttempt)
        .filter_map(|e| e.attempt)
        .collect();
    assert_eq!(attempts, [1, 2, 3]);
    assert_eq!(
        events
            .iter()
            .filter(|e| e.kind == EventKind::RecoveryExhausted)
            .count(),
        1
    );
    assert!(events.iter().any(|e| e.kind == EventKind::HealthCritical));

    ctrl.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_manual_restart_ignores_exhausted_budget() {
    let tmp = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let db = Fake::new("db", &log);
    let ctrl = started(one_critical(&tmp), &db).await;

    db.set_healthy(false);
    db.emitter().fail("disk full");
    for _ in 0..3 {
        ctrl.check_health().await;
    }
    assert_eq!(ctrl.hub().state("db").unwrap().restart_count(), 3);

    db.set_healthy(true);
    ctrl.restart_system("db").await.unwrap();

    let state = ctrl.hub().state("db").unwrap();
    assert_eq!(state.status(), SubsystemStatus::Running);
    assert_eq!(state.restart_count(), 3);
    assert!(ctrl.check_health().await.critical_systems_ok);

    ctrl.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_successful_recovery_counts_attempt() {
    let tmp = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let db = Fake::new("db", &log);
    let ctrl = started(one_critical(&tmp), &db).await;

    db.emitter().fail("transient");
    let health = ctrl.check_health().await;
    assert!(!health.critical_systems_ok);

    let state = ctrl.hub().state("db").unwrap();
    assert_eq!(state.status(), SubsystemStatus::Running);
    assert_eq!(state.restart_count(), 1);
    assert!(ctrl.check_health().await.critical_systems_ok);

    let alerts = ctrl.hub().alerts();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].severity, Severity::Critical);

    ctrl.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_auto_restart_disabled() {
    let tmp = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let db = Fake::new("db", &log);
    let mut cfg = one_critical(&tmp);
    cfg.auto_restart = false;
    let ctrl = started(cfg, &db).await;

    db.emitter().fail("gone");
    ctrl.check_health().await;
    ctrl.check_health().await;

    assert_eq!(log.starts().len(), 1);
    assert_eq!(ctrl.hub().state("db").unwrap().restart_count(), 0);
    ctrl.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_non_critical_failures_are_not_recovered() {
    let tmp = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let (db, cache) = (Fake::new("db", &log), Fake::new("cache", &log));
    let cfg = config(
        vec![
            SubsystemDescriptor::new("db", "Database").critical(),
            SubsystemDescriptor::new("cache", "Cache"),
        ],
        tmp.path(),
    );
    let ctrl = Controller::builder(cfg)
        .with_registry(registry(&[&db, &cache]))
        .build()
        .unwrap();
    ctrl.start().await.unwrap();

    cache.emitter().fail("evicted");
    db.emitter().fail("lost");
    ctrl.check_health().await;

    assert_eq!(log.starts(), ["db", "cache", "db"]);
    assert_eq!(
        ctrl.hub().state("cache").unwrap().status(),
        SubsystemStatus::Failed
    );
    ctrl.stop().await;
}

#[tokio::test(start_paused = true)]
async fn test_backoff_defers_next_attempt() {
    let tmp = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let db = Fake::new("db", &log);
    let mut cfg = one_critical(&tmp);
    cfg.recovery_backoff = Some(BackoffPolicy {
        first: Duration::from_secs(3600),
        max: Duration::from_secs(7200),
        factor: 2.0,
        jitter: JitterPolicy::None,
    });
    let ctrl = started(cfg, &db).await;

    db.set_healthy(false);
    db.emitter().fail("lost");
    ctrl.check_health().await;
    ctrl.check_health().await;
    ctrl.check_health().await;

    // first attempt is immediate, the next one waits out the backoff
    assert_eq!(log.starts().len(), 2);
    assert_eq!(ctrl.hub().state("db").unwrap().restart_count(), 1);
    ctrl.stop().await;
}

#[derive(Default)]
struct Collect(Mutex<Vec<EventKind>>);

#[async_trait]
impl Subscribe for Collect {
    async fn on_event(&self, ev: &Event) {
        self.0.lock().unwrap().push(ev.kind);
    }

    fn name(&self) -> &'static str {
        "collect"
    }
}

#[tokio::test]
async fn test_subscribers_see_lifecycle_and_domain_events() {
    let tmp = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let db = Fake::new("db", &log);
    let collect = Arc::new(Collect::default());
    let subs: Vec<Arc<dyn Subscribe>> = vec![collect.clone()];

    let ctrl = Controller::builder(one_critical(&tmp))
        .with_registry(registry(&[&db]))
        .with_subscribers(subs)
        .build()
        .unwrap();
    ctrl.start().await.unwrap();
    db.emitter().emit("db:backup:complete");
    db.emitter().emit("db:replica:failed");
    ctrl.stop().await;
    ctrl.shutdown_observers().await;

    let seen = collect.0.lock().unwrap().clone();
    assert_eq!(seen.last(), Some(&EventKind::ShutdownCompleted));
    for kind in [
        EventKind::SubsystemRegistered,
        EventKind::SubsystemStarted,
        EventKind::StartupCompleted,
        EventKind::SubsystemEvent,
        EventKind::Alert,
        EventKind::SubsystemStopped,
        EventKind::ShutdownCompleted,
    ] {
        assert!(seen.contains(&kind), "missing {kind:?}");
    }

    let metrics = ctrl.hub().metrics();
    assert_eq!(metrics.total_events, 2);
    assert_eq!(metrics.success_events, 1);
    assert_eq!(metrics.alerts_raised, 1);
}

#[tokio::test(start_paused = true)]
async fn test_health_loop_recovers_and_reports_on_interval() {
    let tmp = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let db = Fake::new("db", &log);
    let mut cfg = one_critical(&tmp);
    cfg.health_interval = Duration::from_secs(1);
    cfg.status_report_every = 1;
    let ctrl = started(cfg, &db).await;

    db.emitter().fail("worker crashed");
    tokio::time::sleep(Duration::from_millis(1500)).await;

    let state = ctrl.hub().state("db").unwrap();
    assert_eq!(state.status(), SubsystemStatus::Running);
    assert_eq!(state.restart_count(), 1);
    assert_eq!(log.starts().len(), 2);

    // ticks at 1s..=5s
    tokio::time::sleep(Duration::from_secs(4)).await;
    ctrl.stop().await;

    let names: Vec<String> = std::fs::read_dir(tmp.path())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    let count = |prefix: &str| names.iter().filter(|n| n.starts_with(prefix)).count();
    assert_eq!(count("startup-"), 1);
    assert_eq!(count("status-"), 5);
}

#[tokio::test(start_paused = true)]
async fn test_recovery_skips_subsystem_under_manual_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let log = CallLog::default();
    let db = Fake::new("db", &log);
    let ctrl = started(one_critical(&tmp), &db).await;

    let restarting = {
        let ctrl = Arc::clone(&ctrl);
        tokio::spawn(async move { ctrl.restart_system("db").await })
    };
    // restart is now waiting out its 5s delay with the slot locked
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert_eq!(log.entries(), ["start:db", "stop:db"]);

    db.emitter().fail("crashed while restarting");
    let mut rx = ctrl.bus().subscribe();
    let health = ctrl.check_health().await;
    assert!(!health.critical_systems_ok);
    assert!(
        !drain(&mut rx)
            .iter()
            .any(|e| e.kind == EventKind::RecoveryAttempt)
    );
    assert_eq!(ctrl.hub().state("db").unwrap().restart_count(), 0);
    assert_eq!(log.starts().len(), 1);

    restarting.await.unwrap().unwrap();
    let state = ctrl.hub().state("db").unwrap();
    assert_eq!(state.status(), SubsystemStatus::Running);
    assert_eq!(state.restart_count(), 0);
    assert_eq!(log.starts().len(), 2);

    ctrl.stop().await;
}
