//! Alert records and the hub's aggregate views.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::events::Severity;

use super::state::SubsystemStatus;

/// Record of a failure-like event.
#[derive(Debug, Clone, Serialize)]
pub struct Alert {
    /// `<subsystem>-<unix millis>-<event seq>`.
    pub id: String,
    pub subsystem: String,
    pub event_name: String,
    pub severity: Severity,
    pub at: DateTime<Utc>,
    pub acknowledged: bool,
}

impl Alert {
    pub(crate) fn new(
        subsystem: &str,
        event_name: &str,
        severity: Severity,
        at: DateTime<Utc>,
        seq: u64,
    ) -> Self {
        Self {
            id: format!("{subsystem}-{}-{seq}", at.timestamp_millis()),
            subsystem: subsystem.to_string(),
            event_name: event_name.to_string(),
            severity,
            at,
            acknowledged: false,
        }
    }
}

/// Hub-wide counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HubMetrics {
    pub total_events: u64,
    pub success_events: u64,
    pub alerts_raised: u64,
}

/// Per-subsystem view returned by `EventHub::systems_status`.
#[derive(Debug, Clone, Serialize)]
pub struct SystemStatus {
    pub id: String,
    pub name: String,
    pub status: SubsystemStatus,
    pub critical: bool,
    pub last_update: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    /// Seconds since the current run started; `None` unless running.
    pub uptime_secs: Option<u64>,
    pub events: u64,
    pub errors: u64,
    pub responsive: bool,
    pub restart_count: u32,
}

/// Computed health of all registered subsystems.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AggregateHealth {
    /// `healthy / total`; `0.0` when nothing is registered.
    pub overall: f64,
    pub healthy: usize,
    pub total: usize,
    /// Every critical subsystem is running (vacuously true when none exist).
    pub critical_systems_ok: bool,
}

impl AggregateHealth {
    pub fn percent(&self) -> f64 {
        self.overall * 100.0
    }
}
