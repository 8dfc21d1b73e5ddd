//! # Auto-recovery policy for failed critical subsystems.
//!
//! [`RecoveryPolicy`] decides whether the health supervisor may attempt another
//! automatic restart of a subsystem whose status is `failed`.
//!
//! ```text
//! eligible(restart_count, last_restart_at, now):
//!   ├─ enabled == false                     → no
//!   ├─ restart_count >= max_attempts        → no   (cap reached, stays failed)
//!   ├─ backoff == None                      → yes  (retry on every health tick)
//!   └─ backoff == Some(b):
//!        ├─ no previous attempt             → yes
//!        └─ now - last >= b.next(count - 1) → yes
//! ```
//!
//! Successful and failed attempts both count toward `max_attempts`.
//! Manual restarts are not governed by this policy at all.

use std::time::Duration;

use chrono::{DateTime, Utc};

use super::backoff::BackoffPolicy;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RecoveryPolicy {
    /// Whether auto-restart runs at all.
    pub enabled: bool,
    /// Upper bound on automatic restarts per subsystem.
    pub max_attempts: u32,
    /// Optional spacing between attempts beyond the health interval.
    pub backoff: Option<BackoffPolicy>,
}

impl Default for RecoveryPolicy {
    /// Enabled, 3 attempts, fixed-interval retries.
    fn default() -> Self {
        Self {
            enabled: true,
            max_attempts: 3,
            backoff: None,
        }
    }
}

impl RecoveryPolicy {
    /// True while the restart budget is not spent.
    #[inline]
    pub fn allows(&self, restart_count: u32) -> bool {
        self.enabled && restart_count < self.max_attempts
    }

    /// True when the backoff (if any) since the last attempt has elapsed.
    pub fn is_due(
        &self,
        restart_count: u32,
        last_restart_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        let (Some(backoff), Some(last)) = (self.backoff, last_restart_at) else {
            return true;
        };
        let elapsed = now
            .signed_duration_since(last)
            .to_std()
            .unwrap_or(Duration::ZERO);
        elapsed >= backoff.next(restart_count.saturating_sub(1))
    }

    /// Combined check used by the health supervisor.
    pub fn eligible(
        &self,
        restart_count: u32,
        last_restart_at: Option<DateTime<Utc>>,
        now: DateTime<Utc>,
    ) -> bool {
        self.allows(restart_count) && self.is_due(restart_count, last_restart_at, now)
    }
}
