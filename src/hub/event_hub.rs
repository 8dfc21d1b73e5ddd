//! # EventHub: registry, counters and classifier for subsystem events.
//!
//! ```text
//! Subsystem ── Emitter::emit(name, payload) ──► EventHub::observe(Event)
//!                                                   │
//!                      ┌────────────────────────────┼───────────────────────────┐
//!                      ▼                            ▼                           ▼
//!            per-subsystem counters        Outcome::classify(name)        Bus.publish(ev)
//!            events += 1                    ├─ Success → success += 1     ("system:event")
//!            last_event_at = ev.at          ├─ Failure → errors += 1,
//!                                           │            Alert, "command:alert"
//!                                           └─ Neutral → (counted only)
//! ```
//!
//! The hub also owns the runtime-state table the controller drives
//! (`mark_running`, `mark`, `record_restart`) and derives the aggregate views:
//! [`EventHub::systems_status`] and [`EventHub::overall_health`].
//!
//! ## Rules
//! - `observe` never blocks on I/O and never panics into the emitter; the
//!   state lock is only held for counter updates.
//! - Events for unknown subsystems are counted globally and forwarded, nothing else.
//! - At most 100 alerts are retained (oldest dropped first).

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::events::{Bus, Event, EventKind, Outcome, Severity};
use crate::subsystems::SubsystemDescriptor;

use super::alert::{AggregateHealth, Alert, HubMetrics, SystemStatus};
use super::emitter::Emitter;
use super::state::{SubsystemRuntimeState, SubsystemStatus};

const MAX_ALERTS: usize = 100;

struct Record {
    display_name: String,
    critical: bool,
    state: SubsystemRuntimeState,
}

#[derive(Default)]
struct HubInner {
    order: Vec<Arc<str>>,
    records: HashMap<Arc<str>, Record>,
    metrics: HubMetrics,
    alerts: VecDeque<Alert>,
}

impl HubInner {
    fn push_alert(&mut self, alert: Alert) {
        if self.alerts.len() == MAX_ALERTS {
            self.alerts.pop_front();
        }
        self.alerts.push_back(alert);
        self.metrics.alerts_raised += 1;
    }
}

pub struct EventHub {
    inner: RwLock<HubInner>,
    bus: Bus,
    window: Duration,
}

impl EventHub {
    /// Creates a hub forwarding to `bus`; `window` is the responsiveness window.
    pub fn new(bus: Bus, window: Duration) -> Arc<Self> {
        Arc::new(Self {
            inner: RwLock::new(HubInner::default()),
            bus,
            window,
        })
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    fn read(&self) -> RwLockReadGuard<'_, HubInner> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HubInner> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Registers (or re-registers) a subsystem and returns its emitter.
    ///
    /// Re-registration resets the runtime state to `initialized`.
    pub fn register_system(self: &Arc<Self>, descriptor: &SubsystemDescriptor) -> Emitter {
        let id: Arc<str> = Arc::from(descriptor.id.as_str());
        let now = Utc::now();
        let mut state = SubsystemRuntimeState::new(now);
        state.mark(SubsystemStatus::Initialized, now);

        {
            let mut inner = self.write();
            let record = Record {
                display_name: descriptor.display_name.clone(),
                critical: descriptor.critical,
                state,
            };
            if inner.records.insert(Arc::clone(&id), record).is_none() {
                inner.order.push(Arc::clone(&id));
            }
        }

        self.bus
            .publish(Event::new(EventKind::SubsystemRegistered).with_subsystem(Arc::clone(&id)));
        Emitter::new(id, Arc::clone(self))
    }

    /// Copy of the runtime state of `id`.
    pub fn state(&self, id: &str) -> Option<SubsystemRuntimeState> {
        self.read().records.get(id).map(|r| r.state.clone())
    }

    /// Records, classifies and forwards one subsystem event.
    pub fn observe(&self, event: Event) {
        let name = event.name.clone().unwrap_or_else(|| Arc::from(event.kind.as_str()));
        let severity = Severity::classify(&name);
        let outcome = Outcome::classify(&name);

        let alert = {
            let mut guard = self.write();
            let inner = &mut *guard;
            inner.metrics.total_events += 1;

            let record = event
                .subsystem
                .as_deref()
                .and_then(|id| inner.records.get_mut(id));
            match record {
                None => {
                    debug!(event = %name, subsystem = ?event.subsystem, "event from unregistered subsystem");
                    None
                }
                Some(record) => {
                    record
                        .state
                        .record_event(event.at, outcome == Outcome::Failure);
                    match outcome {
                        Outcome::Success => {
                            inner.metrics.success_events += 1;
                            None
                        }
                        Outcome::Failure => {
                            let id = event.subsystem.as_deref().unwrap_or_default();
                            let alert = Alert::new(id, &name, severity, event.at, event.seq);
                            inner.push_alert(alert.clone());
                            Some(alert)
                        }
                        Outcome::Neutral => None,
                    }
                }
            }
        };

        let subsystem = event.subsystem.clone();
        self.bus.publish(event.with_severity(severity));
        if let Some(alert) = alert {
            self.publish_alert(subsystem, &alert);
        }
    }

    /// Marks `id` failed after a steady-state failure and raises a critical alert.
    pub(crate) fn report_failure(&self, id: &str, reason: Arc<str>) {
        let subsystem: Arc<str> = Arc::from(id);
        let failed = Event::new(EventKind::SubsystemFailed)
            .with_subsystem(Arc::clone(&subsystem))
            .with_reason(reason)
            .with_severity(Severity::Critical);
        let now = failed.at;
        let event_name = format!("{id}:failed");
        let alert = {
            let mut guard = self.write();
            let inner = &mut *guard;
            let Some(record) = inner.records.get_mut(id) else {
                debug!(subsystem = id, "failure reported by unregistered subsystem");
                return;
            };
            record.state.record_event(now, true);
            record.state.mark(SubsystemStatus::Failed, now);
            inner.metrics.total_events += 1;
            let alert = Alert::new(id, &event_name, Severity::Critical, now, failed.seq);
            inner.push_alert(alert.clone());
            alert
        };

        self.bus.publish(failed);
        self.publish_alert(Some(subsystem), &alert);
    }

    fn publish_alert(&self, subsystem: Option<Arc<str>>, alert: &Alert) {
        let mut ev = Event::new(EventKind::Alert)
            .with_name(alert.event_name.as_str())
            .with_reason(alert.id.as_str())
            .with_severity(alert.severity);
        if let Some(id) = subsystem {
            ev = ev.with_subsystem(id);
        }
        self.bus.publish(ev);
    }

    pub(crate) fn mark_running(&self, id: &str) {
        if let Some(record) = self.write().records.get_mut(id) {
            record.state.mark_running(Utc::now());
        }
    }

    pub(crate) fn mark(&self, id: &str, status: SubsystemStatus) {
        if let Some(record) = self.write().records.get_mut(id) {
            record.state.mark(status, Utc::now());
        }
    }

    /// Increments the auto-restart counter of `id`; returns the new value.
    pub(crate) fn record_restart(&self, id: &str) -> u32 {
        self.write()
            .records
            .get_mut(id)
            .map(|r| r.state.record_restart(Utc::now()))
            .unwrap_or_default()
    }

    /// Per-subsystem status, in registration order.
    pub fn systems_status(&self) -> Vec<SystemStatus> {
        self.systems_status_at(Utc::now())
    }

    pub fn systems_status_at(&self, now: DateTime<Utc>) -> Vec<SystemStatus> {
        let inner = self.read();
        inner
            .order
            .iter()
            .filter_map(|id| inner.records.get(id).map(|r| (id, r)))
            .map(|(id, r)| SystemStatus {
                id: id.to_string(),
                name: r.display_name.clone(),
                status: r.state.status(),
                critical: r.critical,
                last_update: r.state.last_event_at(),
                started_at: r.state.started_at(),
                uptime_secs: r.state.uptime(now).map(|d| d.as_secs()),
                events: r.state.events(),
                errors: r.state.errors(),
                responsive: r.state.is_responsive(now, self.window),
                restart_count: r.state.restart_count(),
            })
            .collect()
    }

    pub fn overall_health(&self) -> AggregateHealth {
        self.overall_health_at(Utc::now())
    }

    pub fn overall_health_at(&self, now: DateTime<Utc>) -> AggregateHealth {
        let inner = self.read();
        let total = inner.records.len();
        let healthy = inner
            .records
            .values()
            .filter(|r| r.state.is_running() && r.state.is_responsive(now, self.window))
            .count();
        let critical_systems_ok = inner
            .records
            .values()
            .filter(|r| r.critical)
            .all(|r| r.state.is_running());

        AggregateHealth {
            overall: if total == 0 {
                0.0
            } else {
                healthy as f64 / total as f64
            },
            healthy,
            total,
            critical_systems_ok,
        }
    }

    /// Retained alerts, oldest first.
    pub fn alerts(&self) -> Vec<Alert> {
        self.read().alerts.iter().cloned().collect()
    }

    /// Marks an alert acknowledged; false if no retained alert has that id.
    pub fn acknowledge_alert(&self, alert_id: &str) -> bool {
        let mut inner = self.write();
        match inner.alerts.iter_mut().find(|a| a.id == alert_id) {
            Some(alert) => {
                alert.acknowledged = true;
                true
            }
            None => false,
        }
    }

    pub fn metrics(&self) -> HubMetrics {
        self.read().metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hub_with(descriptors: &[SubsystemDescriptor]) -> (Arc<EventHub>, Vec<Emitter>) {
        let hub = EventHub::new(Bus::new(64), Duration::from_secs(300));
        let emitters = descriptors.iter().map(|d| hub.register_system(d)).collect();
        (hub, emitters)
    }

    #[test]
    fn test_counters_and_classification() {
        let (hub, em) = hub_with(&[SubsystemDescriptor::new("a", "A")]);
        em[0].emit("x:failed");
        em[0].emit("health:critical:alert");
        em[0].emit("y:warning");
        em[0].emit("z:complete");

        let m = hub.metrics();
        assert_eq!(m.total_events, 4);
        assert_eq!(m.success_events, 1);
        assert_eq!(m.alerts_raised, 2);

        let alerts = hub.alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].event_name, "x:failed");
        assert_eq!(alerts[0].severity, Severity::Critical);
        assert_eq!(alerts[1].severity, Severity::Critical);

        let st = hub.state("a").expect("registered");
        assert_eq!(st.events(), 4);
        assert_eq!(st.errors(), 2);
    }

    #[tokio::test]
    async fn test_forwards_events_and_alerts() {
        let (hub, em) = hub_with(&[SubsystemDescriptor::new("a", "A")]);
        let mut rx = hub.bus().subscribe();
        em[0].emit_with("sync:failed", serde_json::json!({ "repo": "site" }));

        let forwarded = rx.recv().await.expect("forwarded");
        assert_eq!(forwarded.kind, EventKind::SubsystemEvent);
        assert_eq!(forwarded.severity, Some(Severity::Critical));
        assert_eq!(forwarded.payload.as_deref(), Some(&serde_json::json!({ "repo": "site" })));

        let alert = rx.recv().await.expect("alert");
        assert_eq!(alert.kind, EventKind::Alert);
        assert_eq!(alert.subsystem.as_deref(), Some("a"));
        assert_eq!(alert.name.as_deref(), Some("sync:failed"));
    }

    #[test]
    fn test_critical_systems_ok_tracks_critical_statuses() {
        let (hub, _em) = hub_with(&[
            SubsystemDescriptor::new("a", "A").critical(),
            SubsystemDescriptor::new("b", "B"),
        ]);
        assert!(!hub.overall_health().critical_systems_ok);

        hub.mark_running("a");
        assert!(hub.overall_health().critical_systems_ok);

        hub.mark("b", SubsystemStatus::Failed);
        assert!(hub.overall_health().critical_systems_ok);

        hub.mark("a", SubsystemStatus::Failed);
        assert!(!hub.overall_health().critical_systems_ok);

        hub.mark_running("a");
        assert!(hub.overall_health().critical_systems_ok);
    }

    #[test]
    fn test_overall_ratio_and_responsiveness() {
        let (hub, _em) = hub_with(&[
            SubsystemDescriptor::new("a", "A").critical(),
            SubsystemDescriptor::new("b", "B"),
            SubsystemDescriptor::new("c", "C").critical(),
        ]);
        hub.mark_running("a");
        hub.mark("b", SubsystemStatus::Failed);
        hub.mark_running("c");

        let now = Utc::now();
        let health = hub.overall_health_at(now);
        assert_eq!(health.healthy, 2);
        assert_eq!(health.total, 3);
        assert!((health.overall - 2.0 / 3.0).abs() < f64::EPSILON);
        assert!(health.critical_systems_ok);

        let later = now + chrono::Duration::minutes(6);
        let stale = hub.overall_health_at(later);
        assert_eq!(stale.healthy, 0);
        assert!(stale.critical_systems_ok);
        assert!(hub.systems_status_at(later).iter().all(|s| !s.responsive));
    }

    #[test]
    fn test_report_failure_marks_failed_and_alerts() {
        let (hub, em) = hub_with(&[SubsystemDescriptor::new("a", "A").critical()]);
        hub.mark_running("a");
        em[0].fail("worker crashed");

        let st = hub.state("a").expect("registered");
        assert_eq!(st.status(), SubsystemStatus::Failed);
        let alerts = hub.alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].event_name, "a:failed");

        assert!(hub.acknowledge_alert(&alerts[0].id));
        assert!(hub.alerts()[0].acknowledged);
        assert!(!hub.acknowledge_alert("missing"));
    }

    #[test]
    fn test_alert_ids_unique_within_a_millisecond() {
        let (hub, _em) = hub_with(&[SubsystemDescriptor::new("a", "A")]);
        let first = Event::domain("a", "job:failed", serde_json::Value::Null);
        let mut second = Event::domain("a", "job:failed", serde_json::Value::Null);
        second.at = first.at;
        hub.observe(first);
        hub.observe(second);

        let alerts = hub.alerts();
        assert_eq!(alerts.len(), 2);
        assert_eq!(alerts[0].at, alerts[1].at);
        assert_ne!(alerts[0].id, alerts[1].id);

        assert!(hub.acknowledge_alert(&alerts[1].id));
        let alerts = hub.alerts();
        assert!(!alerts[0].acknowledged);
        assert!(alerts[1].acknowledged);
    }

    #[test]
    fn test_unregistered_events_only_counted() {
        let hub = EventHub::new(Bus::new(8), Duration::from_secs(300));
        hub.observe(Event::domain("ghost", "ghost:failed", serde_json::Value::Null));
        assert_eq!(hub.metrics().total_events, 1);
        assert_eq!(hub.metrics().alerts_raised, 0);
        assert!(hub.systems_status().is_empty());
        assert_eq!(hub.overall_health().overall, 0.0);
    }

    #[test]
    fn test_alert_retention_is_bounded() {
        let (hub, em) = hub_with(&[SubsystemDescriptor::new("a", "A")]);
        for _ in 0..(MAX_ALERTS + 5) {
            em[0].emit("job:error");
        }
        assert_eq!(hub.alerts().len(), MAX_ALERTS);
        assert_eq!(hub.metrics().alerts_raised, (MAX_ALERTS + 5) as u64);
    }
}
