//! # LogWriter: one tracing line per bus event
//!
//! The log level follows the event: alerts and failures go to `error`/`warn`
//! by severity, lifecycle transitions to `info`, chatty domain events and
//! health ticks to `debug`.
//!
//! ## Example output (fmt layer)
//! ```text
//! INFO  subsystem="health-monitoring" started
//! WARN  subsystem="report-pipeline" reason="start failed: boom" start failed
//! ERROR subsystem="sports-ingestion" event="ingestion:failed" severity=critical alert
//! DEBUG subsystem="ai-orchestrator" event="ai:task:completed" severity=low event
//! ```

use async_trait::async_trait;
use tracing::{debug, error, info, warn};

use crate::events::{Event, EventKind, Severity};
use crate::subscribers::Subscribe;

/// Tracing-backed event writer.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        let subsystem = e.subsystem.as_deref().unwrap_or("-");
        let reason = e.reason.as_deref().unwrap_or("");
        match e.kind {
            EventKind::SubsystemEvent | EventKind::Alert => {
                let severity = e.severity.unwrap_or(Severity::Low);
                let event = e.label();
                let what = if e.kind == EventKind::Alert { "alert" } else { "event" };
                match severity {
                    Severity::Critical => error!(subsystem, event, %severity, "{what}"),
                    Severity::High => warn!(subsystem, event, %severity, "{what}"),
                    Severity::Medium => info!(subsystem, event, %severity, "{what}"),
                    Severity::Low => debug!(subsystem, event, %severity, "{what}"),
                }
            }
            EventKind::SubsystemRegistered => debug!(subsystem, "registered"),
            EventKind::SubsystemSkipped => info!(subsystem, reason, "skipped"),
            EventKind::SubsystemStarting => {
                info!(subsystem, attempt = ?e.attempt, delay_ms = ?e.delay_ms, "starting")
            }
            EventKind::SubsystemStarted => info!(subsystem, "started"),
            EventKind::SubsystemStartFailed => warn!(subsystem, reason, "start failed"),
            EventKind::SubsystemStopped => info!(subsystem, "stopped"),
            EventKind::SubsystemStopFailed => warn!(subsystem, reason, "stop failed"),
            EventKind::SubsystemFailed => error!(subsystem, reason, "failed"),
            EventKind::StartupCompleted => info!(reason, "startup sequence completed"),
            EventKind::StartupAborted => error!(subsystem, reason, "startup sequence aborted"),
            EventKind::HealthChecked => debug!(reason, "health checked"),
            EventKind::HealthCritical => warn!(reason, "critical subsystems down"),
            EventKind::RecoveryAttempt => {
                warn!(subsystem, attempt = ?e.attempt, "auto-recovery attempt")
            }
            EventKind::RecoveryExhausted => {
                error!(subsystem, attempt = ?e.attempt, "auto-recovery exhausted")
            }
            EventKind::ReportWritten => info!(path = reason, "report written"),
            EventKind::ShutdownRequested => info!(reason, "shutdown requested"),
            EventKind::ShutdownCompleted => info!(reason, "shutdown completed"),
            EventKind::EmergencyShutdown => error!(reason, "emergency shutdown"),
            EventKind::SubscriberOverflow => {
                warn!(subscriber = subsystem, reason, "subscriber overflow")
            }
            EventKind::SubscriberPanicked => {
                error!(subscriber = subsystem, reason, "subscriber panicked")
            }
        }
    }

    fn name(&self) -> &'static str {
        "log-writer"
    }
}
