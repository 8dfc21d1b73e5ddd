//! # Identity and policy of one managed subsystem.
//!
//! A [`SubsystemDescriptor`] is built once from configuration and never
//! changes afterwards. It says **what** is managed (`id`, `display_name`) and
//! **how** the controller treats it:
//!
//! - `enabled = false` → skipped entirely at initialization;
//! - `critical = true` → construction/start failures abort startup, and
//!   steady-state failures are eligible for auto-recovery;
//! - `startup_delay` → wait applied right before this subsystem is started;
//!   also its position in the startup sequence (ascending).
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use subvisor::SubsystemDescriptor;
//!
//! let d = SubsystemDescriptor::new("sports-ingestion", "Sports Data Ingestion")
//!     .critical()
//!     .with_delay(Duration::from_secs(10));
//!
//! assert!(d.enabled && d.critical);
//! assert_eq!(d.startup_delay, Duration::from_secs(10));
//! ```

use std::time::Duration;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SubsystemDescriptor {
    /// Unique key, e.g. `health-monitoring`.
    pub id: String,
    /// Human label.
    pub display_name: String,
    pub enabled: bool,
    pub critical: bool,
    pub startup_delay: Duration,
}

impl SubsystemDescriptor {
    /// Enabled, non-critical, no delay.
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            enabled: true,
            critical: false,
            startup_delay: Duration::ZERO,
        }
    }

    #[must_use]
    pub fn critical(mut self) -> Self {
        self.critical = true;
        self
    }

    #[must_use]
    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    #[must_use]
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }
}
