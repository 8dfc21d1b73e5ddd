//! # Event classification by name.
//!
//! Subsystem events are named `area:action[:detail]` (e.g. `deployment:complete`,
//! `health:critical:alert`). The hub derives two things from the name alone:
//!
//! - a [`Severity`] used for log level and alert records;
//! - an [`Outcome`] deciding whether the event counts as a success, raises an
//!   alert, or is merely counted.
//!
//! ```text
//! name contains "critical" | "failed"  → Critical
//! name contains "error"    | "alert"   → High
//! name contains "warning"              → Medium
//! otherwise                            → Low
//!
//! ends with ":failed" | ":error" | contains "critical" → Outcome::Failure
//! ends with ":complete" | ":completed"                 → Outcome::Success
//! otherwise                                            → Outcome::Neutral
//! ```

use serde::{Deserialize, Serialize};

/// Severity derived from an event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    /// Classifies an event name by substring.
    ///
    /// # Example
    /// ```
    /// use subvisor::Severity;
    ///
    /// assert_eq!(Severity::classify("x:failed"), Severity::Critical);
    /// assert_eq!(Severity::classify("y:warning"), Severity::Medium);
    /// assert_eq!(Severity::classify("z:complete"), Severity::Low);
    /// ```
    pub fn classify(name: &str) -> Self {
        if name.contains("critical") || name.contains("failed") {
            Severity::Critical
        } else if name.contains("error") || name.contains("alert") {
            Severity::High
        } else if name.contains("warning") {
            Severity::Medium
        } else {
            Severity::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What an event means for the hub's counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Counted as a success; never alerts.
    Success,
    /// Recorded as an error and raises an alert.
    Failure,
    /// Counted only.
    Neutral,
}

impl Outcome {
    pub fn classify(name: &str) -> Self {
        if name.ends_with(":failed") || name.ends_with(":error") || name.contains("critical") {
            Outcome::Failure
        } else if name.ends_with(":complete") || name.ends_with(":completed") {
            Outcome::Success
        } else {
            Outcome::Neutral
        }
    }
}
