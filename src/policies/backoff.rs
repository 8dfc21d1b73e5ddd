//! # Backoff between auto-recovery attempts.
//!
//! Recovery normally retries a failed critical subsystem on every health tick.
//! A [`BackoffPolicy`] stretches that: after `n >= 1` attempts, the next one
//! is only made once `next(n - 1)` = `first × factor^(n-1)` (clamped to `max`,
//! then jittered) has elapsed since the previous attempt.
//!
//! The base delay is derived from the attempt number alone, so jitter never
//! feeds back into later delays.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use subvisor::{BackoffPolicy, JitterPolicy};
//!
//! let backoff = BackoffPolicy {
//!     first: Duration::from_secs(60),
//!     max: Duration::from_secs(600),
//!     factor: 2.0,
//!     jitter: JitterPolicy::None,
//! };
//!
//! assert_eq!(backoff.next(0), Duration::from_secs(60));
//! assert_eq!(backoff.next(2), Duration::from_secs(240));
//! assert_eq!(backoff.next(9), Duration::from_secs(600));
//! ```

use std::time::Duration;

use crate::policies::jitter::JitterPolicy;

/// Exponential delay schedule with a cap and optional jitter.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BackoffPolicy {
    /// Delay before the first retry.
    pub first: Duration,
    /// Upper bound for any delay.
    pub max: Duration,
    /// Growth factor per attempt (`1.0` = constant).
    pub factor: f64,
    /// Randomization applied after clamping.
    pub jitter: JitterPolicy,
}

impl Default for BackoffPolicy {
    /// `first = 60s`, `factor = 2.0`, `max = 15min`, no jitter.
    fn default() -> Self {
        Self {
            first: Duration::from_secs(60),
            max: Duration::from_secs(15 * 60),
            factor: 2.0,
            jitter: JitterPolicy::None,
        }
    }
}

impl BackoffPolicy {
    /// Delay to wait before retry number `attempt` (0-indexed).
    ///
    /// Non-finite or negative intermediate values collapse to `max`.
    pub fn next(&self, attempt: u32) -> Duration {
        let exp = attempt.min(i32::MAX as u32) as i32;
        let secs = self.first.as_secs_f64() * self.factor.powi(exp);
        let base = if secs.is_finite() && secs >= 0.0 && secs <= self.max.as_secs_f64() {
            Duration::from_secs_f64(secs)
        } else {
            self.max
        };
        self.jitter.apply(base)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy(first_ms: u64, max_ms: u64, factor: f64) -> BackoffPolicy {
        BackoffPolicy {
            first: Duration::from_millis(first_ms),
            max: Duration::from_millis(max_ms),
            factor,
            jitter: JitterPolicy::None,
        }
    }

    #[test]
    fn test_exponential_growth() {
        let p = policy(100, 30_000, 2.0);
        assert_eq!(p.next(0), Duration::from_millis(100));
        assert_eq!(p.next(1), Duration::from_millis(200));
        assert_eq!(p.next(3), Duration::from_millis(800));
    }

    #[test]
    fn test_constant_factor() {
        let p = policy(500, 30_000, 1.0);
        for attempt in 0..5 {
            assert_eq!(p.next(attempt), Duration::from_millis(500));
        }
    }

    #[test]
    fn test_first_exceeding_max_is_clamped() {
        let p = policy(10_000, 5_000, 2.0);
        assert_eq!(p.next(0), Duration::from_millis(5_000));
    }

    #[test]
    fn test_overflow_clamps_to_max() {
        let p = policy(100, 10_000, 2.0);
        assert_eq!(p.next(u32::MAX), Duration::from_millis(10_000));
    }

    #[test]
    fn test_jitter_stays_under_base() {
        let p = BackoffPolicy {
            jitter: JitterPolicy::Full,
            ..policy(1000, 30_000, 2.0)
        };
        for attempt in 0..4 {
            assert!(p.next(attempt) <= Duration::from_millis(1000 * 2u64.pow(attempt)));
        }
    }
}
