//! # Per-subsystem runtime state.
//!
//! ```text
//!  Uninitialized ──register──► Initialized ──start ok──► Running
//!                                   │                       │  ▲
//!                                   └──start err──► Failed ◄┘  │ recovery / resume / restart
//!                                                     │        │
//!                                                     └────────┘
//!  Running ──stop ok──► Stopped        Running ──stop err──► Error
//! ```
//!
//! ## Rules
//! - `Running` is only entered through [`SubsystemRuntimeState::mark_running`],
//!   which also sets `started_at`; so `status == Running ⇒ started_at.is_some()`.
//! - `restart_count` only grows, and only through auto-recovery.
//! - Every transition and every observed event refreshes `last_event_at`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SubsystemStatus {
    Uninitialized,
    Initialized,
    Running,
    Stopped,
    Failed,
    Error,
}

impl SubsystemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubsystemStatus::Uninitialized => "uninitialized",
            SubsystemStatus::Initialized => "initialized",
            SubsystemStatus::Running => "running",
            SubsystemStatus::Stopped => "stopped",
            SubsystemStatus::Failed => "failed",
            SubsystemStatus::Error => "error",
        }
    }
}

impl std::fmt::Display for SubsystemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable state tracked for one registered subsystem.
#[derive(Debug, Clone)]
pub struct SubsystemRuntimeState {
    status: SubsystemStatus,
    started_at: Option<DateTime<Utc>>,
    restart_count: u32,
    last_restart_at: Option<DateTime<Utc>>,
    last_event_at: DateTime<Utc>,
    events: u64,
    errors: u64,
}

impl SubsystemRuntimeState {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            status: SubsystemStatus::Uninitialized,
            started_at: None,
            restart_count: 0,
            last_restart_at: None,
            last_event_at: now,
            events: 0,
            errors: 0,
        }
    }

    pub fn status(&self) -> SubsystemStatus {
        self.status
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn restart_count(&self) -> u32 {
        self.restart_count
    }

    pub fn last_restart_at(&self) -> Option<DateTime<Utc>> {
        self.last_restart_at
    }

    pub fn last_event_at(&self) -> DateTime<Utc> {
        self.last_event_at
    }

    pub fn events(&self) -> u64 {
        self.events
    }

    pub fn errors(&self) -> u64 {
        self.errors
    }

    pub fn is_running(&self) -> bool {
        self.status == SubsystemStatus::Running
    }

    /// Time since the current run started; `None` unless running.
    pub fn uptime(&self, now: DateTime<Utc>) -> Option<Duration> {
        match (self.status, self.started_at) {
            (SubsystemStatus::Running, Some(at)) => {
                Some(now.signed_duration_since(at).to_std().unwrap_or(Duration::ZERO))
            }
            _ => None,
        }
    }

    /// True when the last observed activity is younger than `window`.
    pub fn is_responsive(&self, now: DateTime<Utc>, window: Duration) -> bool {
        now.signed_duration_since(self.last_event_at)
            .to_std()
            .map(|age| age < window)
            .unwrap_or(true)
    }

    pub(crate) fn mark_running(&mut self, now: DateTime<Utc>) {
        self.status = SubsystemStatus::Running;
        self.started_at = Some(now);
        self.last_event_at = now;
    }

    /// Transition to `status`; `Running` is routed through `mark_running`.
    pub(crate) fn mark(&mut self, status: SubsystemStatus, now: DateTime<Utc>) {
        if status == SubsystemStatus::Running {
            self.mark_running(now);
            return;
        }
        self.status = status;
        self.last_event_at = now;
    }

    pub(crate) fn record_event(&mut self, at: DateTime<Utc>, is_error: bool) {
        self.events += 1;
        if is_error {
            self.errors += 1;
        }
        self.last_event_at = self.last_event_at.max(at);
    }

    pub(crate) fn record_restart(&mut self, now: DateTime<Utc>) -> u32 {
        self.restart_count = self.restart_count.saturating_add(1);
        self.last_restart_at = Some(now);
        self.restart_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_implies_started_at() {
        let now = Utc::now();
        let mut st = SubsystemRuntimeState::new(now);
        assert_eq!(st.status(), SubsystemStatus::Uninitialized);
        assert!(st.uptime(now).is_none());

        st.mark_running(now);
        assert!(st.is_running());
        assert_eq!(st.started_at(), Some(now));

        st.mark(SubsystemStatus::Stopped, now);
        assert!(st.uptime(now).is_none());
        assert!(st.started_at().is_some());
    }

    #[test]
    fn test_responsiveness_window() {
        let then = Utc::now();
        let st = SubsystemRuntimeState::new(then);
        let window = Duration::from_secs(300);
        assert!(st.is_responsive(then + chrono::Duration::seconds(299), window));
        assert!(!st.is_responsive(then + chrono::Duration::seconds(300), window));
    }

    #[test]
    fn test_restart_counter_is_monotonic() {
        let now = Utc::now();
        let mut st = SubsystemRuntimeState::new(now);
        assert_eq!(st.record_restart(now), 1);
        assert_eq!(st.record_restart(now), 2);
        assert_eq!(st.last_restart_at(), Some(now));
    }
}
