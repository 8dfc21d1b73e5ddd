//! Error types used by the controller and by managed subsystems.
//!
//! - [`ControllerError`] errors raised by the orchestration core itself
//!   (initialization, startup sequencing, manual control, reporting).
//! - [`SubsystemError`] errors raised by an individual subsystem's
//!   `start()` / `stop()` or by its construction.
//!
//! Both types expose `as_label` for logs; [`SubsystemError`] also reports
//! whether a failure is worth retrying.

use std::time::Duration;
use thiserror::Error;

/// # Errors produced by the controller.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ControllerError {
    /// A critical subsystem could not be constructed; initialization is aborted.
    #[error("critical subsystem '{id}' could not be constructed: {source}")]
    CriticalConstruction {
        id: String,
        #[source]
        source: SubsystemError,
    },

    /// A critical subsystem failed to start; the startup sequence is aborted.
    #[error("critical subsystem '{id}' failed to start: {source}")]
    CriticalStartup {
        id: String,
        #[source]
        source: SubsystemError,
    },

    /// No subsystem with this id is managed by the controller.
    #[error("unknown subsystem '{id}'")]
    UnknownSubsystem { id: String },

    /// An operation needs `initialize_systems()` to have run first.
    #[error("subsystems are not initialized")]
    NotInitialized,

    /// `start()` was called on a controller that is already running.
    #[error("controller is already running")]
    AlreadyRunning,

    /// A manual start/stop transition of one subsystem failed.
    #[error("transition of subsystem '{id}' failed: {source}")]
    Transition {
        id: String,
        #[source]
        source: SubsystemError,
    },

    /// The background health supervisor terminated unexpectedly.
    #[error("health supervisor terminated: {reason}")]
    SupervisorFault { reason: String },

    /// Writing a report to disk failed.
    #[error("failed to write report: {source}")]
    Report {
        #[from]
        source: std::io::Error,
    },

    /// Configuration is invalid or could not be parsed.
    #[error("invalid configuration: {reason}")]
    Config { reason: String },
}

impl ControllerError {
    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use subvisor::ControllerError;
    ///
    /// let err = ControllerError::UnknownSubsystem { id: "nope".into() };
    /// assert_eq!(err.as_label(), "controller_unknown_subsystem");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            ControllerError::CriticalConstruction { .. } => "controller_critical_construction",
            ControllerError::CriticalStartup { .. } => "controller_critical_startup",
            ControllerError::UnknownSubsystem { .. } => "controller_unknown_subsystem",
            ControllerError::NotInitialized => "controller_not_initialized",
            ControllerError::AlreadyRunning => "controller_already_running",
            ControllerError::Transition { .. } => "controller_transition_failed",
            ControllerError::SupervisorFault { .. } => "controller_supervisor_fault",
            ControllerError::Report { .. } => "controller_report_failed",
            ControllerError::Config { .. } => "controller_invalid_config",
        }
    }

    /// True for errors that require the emergency shutdown path.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            ControllerError::CriticalConstruction { .. }
                | ControllerError::CriticalStartup { .. }
                | ControllerError::SupervisorFault { .. }
        )
    }
}

/// # Errors produced by a managed subsystem.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum SubsystemError {
    /// The subsystem could not be instantiated.
    #[error("construction failed: {error}")]
    Construction { error: String },

    /// `start()` rejected.
    #[error("start failed: {error}")]
    Start { error: String },

    /// `stop()` rejected.
    #[error("stop failed: {error}")]
    Stop { error: String },

    /// A start or stop call did not resolve within the configured timeout.
    #[error("timed out after {timeout:?}")]
    Timeout { timeout: Duration },

    /// The controller was cancelled (shutdown) before the start resolved.
    #[error("context cancelled")]
    Canceled,
}

impl SubsystemError {
    pub fn construction(error: impl Into<String>) -> Self {
        SubsystemError::Construction {
            error: error.into(),
        }
    }

    pub fn start(error: impl Into<String>) -> Self {
        SubsystemError::Start {
            error: error.into(),
        }
    }

    pub fn stop(error: impl Into<String>) -> Self {
        SubsystemError::Stop {
            error: error.into(),
        }
    }

    /// Returns a short stable label (snake_case) for use in logs.
    ///
    /// # Example
    /// ```
    /// use subvisor::SubsystemError;
    /// use std::time::Duration;
    ///
    /// let err = SubsystemError::Timeout { timeout: Duration::from_secs(1) };
    /// assert_eq!(err.as_label(), "subsystem_timeout");
    /// ```
    pub fn as_label(&self) -> &'static str {
        match self {
            SubsystemError::Construction { .. } => "subsystem_construction",
            SubsystemError::Start { .. } => "subsystem_start",
            SubsystemError::Stop { .. } => "subsystem_stop",
            SubsystemError::Timeout { .. } => "subsystem_timeout",
            SubsystemError::Canceled => "subsystem_canceled",
        }
    }

    /// Start and timeout failures may clear up on a later attempt; a
    /// construction failure or an explicit cancellation will not.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SubsystemError::Start { .. } | SubsystemError::Stop { .. } | SubsystemError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fatal_errors() {
        let err = ControllerError::CriticalStartup {
            id: "a".into(),
            source: SubsystemError::start("boom"),
        };
        assert!(err.is_fatal());
        assert!(!ControllerError::NotInitialized.is_fatal());
        assert!(err.to_string().contains("'a'"));
    }

    #[test]
    fn test_retryable() {
        assert!(SubsystemError::start("x").is_retryable());
        assert!(!SubsystemError::construction("x").is_retryable());
        assert!(!SubsystemError::Canceled.is_retryable());
    }
}
