//! # Events published by the controller and by managed subsystems.
//!
//! [`EventKind`] classifies everything that travels over the [`Bus`](super::Bus):
//! - **Subsystem lifecycle**: starting, started, start-failed, stopped, ...
//! - **Domain events**: anything a subsystem emits through its emitter
//!   ([`EventKind::SubsystemEvent`], with `name`/`payload` set)
//! - **Controller events**: startup, health checks, recovery, alerts, shutdown
//! - **Observer events**: subscriber overflow / panic
//!
//! Each event carries a global, monotonically increasing `seq`; use it to restore
//! ordering when events reach observers through independent queues.
//!
//! ## Example
//! ```rust
//! use subvisor::{Event, EventKind, Severity};
//!
//! let ev = Event::domain("report-pipeline", "report:generation:failed", serde_json::Value::Null);
//!
//! assert_eq!(ev.kind, EventKind::SubsystemEvent);
//! assert_eq!(ev.subsystem.as_deref(), Some("report-pipeline"));
//! assert_eq!(ev.severity, Some(Severity::Critical));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::severity::Severity;

/// Global sequence counter for event ordering.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Classification of bus events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    // === Observer events ===
    /// Subscriber panicked while handling an event (`subsystem` = subscriber name).
    SubscriberPanicked,
    /// Subscriber queue was full or closed; event dropped for it.
    SubscriberOverflow,

    // === Subsystem lifecycle ===
    /// Descriptor constructed and registered with the hub.
    SubsystemRegistered,
    /// Descriptor skipped at init (disabled, or non-critical construction failure).
    SubsystemSkipped,
    /// `start()` is about to be invoked (`attempt` set for recoveries).
    SubsystemStarting,
    /// `start()` resolved; status is now running.
    SubsystemStarted,
    /// `start()` rejected or timed out (`reason` set).
    SubsystemStartFailed,
    /// `stop()` resolved; status is now stopped.
    SubsystemStopped,
    /// `stop()` rejected or timed out (`reason` set).
    SubsystemStopFailed,
    /// The subsystem reported a steady-state failure through its emitter.
    SubsystemFailed,
    /// Domain event emitted by a subsystem (`name`, optional `payload`).
    SubsystemEvent,

    // === Controller ===
    /// Every entry of the startup sequence has been attempted.
    StartupCompleted,
    /// A critical subsystem failed; the startup sequence stopped early.
    StartupAborted,
    /// Periodic health evaluation finished (`reason` = summary).
    HealthChecked,
    /// At least one critical subsystem is not running.
    HealthCritical,
    /// Auto-recovery is about to restart a failed critical subsystem.
    RecoveryAttempt,
    /// Auto-recovery gave up on a subsystem after the configured attempts.
    RecoveryExhausted,
    /// Alert raised for a failure-like event (`severity`, `name` set).
    Alert,
    /// A report was written (`reason` = path).
    ReportWritten,

    // === Shutdown ===
    /// Graceful shutdown requested (OS signal or API call).
    ShutdownRequested,
    /// Graceful shutdown finished.
    ShutdownCompleted,
    /// Forced stop of every subsystem after an unrecoverable fault.
    EmergencyShutdown,
}

impl EventKind {
    /// Stable wire name of the event kind.
    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::SubscriberPanicked => "subscriber:panicked",
            EventKind::SubscriberOverflow => "subscriber:overflow",
            EventKind::SubsystemRegistered => "subsystem:registered",
            EventKind::SubsystemSkipped => "subsystem:skipped",
            EventKind::SubsystemStarting => "subsystem:starting",
            EventKind::SubsystemStarted => "subsystem:started",
            EventKind::SubsystemStartFailed => "subsystem:start_failed",
            EventKind::SubsystemStopped => "subsystem:stopped",
            EventKind::SubsystemStopFailed => "subsystem:stop_failed",
            EventKind::SubsystemFailed => "subsystem:failed",
            EventKind::SubsystemEvent => "system:event",
            EventKind::StartupCompleted => "startup:completed",
            EventKind::StartupAborted => "startup:aborted",
            EventKind::HealthChecked => "health:checked",
            EventKind::HealthCritical => "health:critical",
            EventKind::RecoveryAttempt => "recovery:attempt",
            EventKind::RecoveryExhausted => "recovery:exhausted",
            EventKind::Alert => "command:alert",
            EventKind::ReportWritten => "report:written",
            EventKind::ShutdownRequested => "shutdown:requested",
            EventKind::ShutdownCompleted => "shutdown:completed",
            EventKind::EmergencyShutdown => "shutdown:emergency",
        }
    }
}

/// Bus event with optional metadata.
///
/// - `seq`: monotonic global sequence for ordering
/// - `at`: wall-clock timestamp
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Globally unique, monotonically increasing sequence number.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: DateTime<Utc>,
    /// Event classification.
    pub kind: EventKind,
    /// Subsystem id, if the event concerns one.
    pub subsystem: Option<Arc<str>>,
    /// Domain event name (`area:action`), for subsystem and alert events.
    pub name: Option<Arc<str>>,
    /// Domain payload, as emitted by the subsystem.
    pub payload: Option<Arc<serde_json::Value>>,
    /// Human-readable reason (errors, summaries, paths).
    pub reason: Option<Arc<str>>,
    /// Attempt number, for recovery events.
    pub attempt: Option<u32>,
    /// Delay in milliseconds (startup delay, restart delay).
    pub delay_ms: Option<u32>,
    /// Derived severity.
    pub severity: Option<Severity>,
}

impl Event {
    /// Creates a new event of the given kind with current timestamp and next sequence number.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: Utc::now(),
            kind,
            subsystem: None,
            name: None,
            payload: None,
            reason: None,
            attempt: None,
            delay_ms: None,
            severity: None,
        }
    }

    /// Creates a domain event for `subsystem`; severity is derived from `name`.
    pub fn domain(
        subsystem: impl Into<Arc<str>>,
        name: impl Into<Arc<str>>,
        payload: serde_json::Value,
    ) -> Self {
        let name: Arc<str> = name.into();
        let severity = Severity::classify(&name);
        let ev = Event::new(EventKind::SubsystemEvent)
            .with_subsystem(subsystem)
            .with_name(name)
            .with_severity(severity);
        if payload.is_null() {
            ev
        } else {
            ev.with_payload(payload)
        }
    }

    #[inline]
    pub fn with_subsystem(mut self, id: impl Into<Arc<str>>) -> Self {
        self.subsystem = Some(id.into());
        self
    }

    #[inline]
    pub fn with_name(mut self, name: impl Into<Arc<str>>) -> Self {
        self.name = Some(name.into());
        self
    }

    #[inline]
    pub fn with_payload(mut self, payload: serde_json::Value) -> Self {
        self.payload = Some(Arc::new(payload));
        self
    }

    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a delay (stored as milliseconds, saturating at `u32::MAX`).
    #[inline]
    pub fn with_delay(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.delay_ms = Some(ms);
        self
    }

    #[inline]
    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = Some(severity);
        self
    }

    /// Creates a subscriber overflow event.
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_subsystem(subscriber)
            .with_reason(reason)
            .with_severity(Severity::Medium)
    }

    /// Creates a subscriber panic event.
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_subsystem(subscriber)
            .with_reason(info)
            .with_severity(Severity::High)
    }

    /// Event name for logs: the domain name if present, else the kind's wire name.
    pub fn label(&self) -> &str {
        self.name.as_deref().unwrap_or_else(|| self.kind.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seq_is_monotonic() {
        let a = Event::new(EventKind::HealthChecked);
        let b = Event::new(EventKind::HealthChecked);
        assert!(b.seq > a.seq);
    }

    #[test]
    fn test_domain_event_without_payload() {
        let ev = Event::domain("ai-orchestrator", "ai:task:completed", serde_json::Value::Null);
        assert!(ev.payload.is_none());
        assert_eq!(ev.label(), "ai:task:completed");
        assert_eq!(ev.severity, Some(Severity::Low));
    }

    #[test]
    fn test_label_falls_back_to_kind() {
        let ev = Event::new(EventKind::HealthCritical);
        assert_eq!(ev.label(), "health:critical");
    }
}
