//! Recovery policies.
//!
//! Knobs that control **whether** a failed critical subsystem is restarted
//! automatically and **how far apart** those attempts are.
//!
//! ## Contents
//! - [`RecoveryPolicy`] enable flag, attempt cap, optional backoff
//! - [`BackoffPolicy`] how retry delays evolve (first / factor / max + jitter)
//! - [`JitterPolicy`] randomization of a computed delay
//!
//! ## Defaults
//! - `RecoveryPolicy::default()` → enabled, 3 attempts, no backoff (retry on
//!   every health tick).
//! - `BackoffPolicy::default()` → first=60s, factor=2.0, max=15min, no jitter.

mod backoff;
mod jitter;
mod recovery;

pub use backoff::BackoffPolicy;
pub use jitter::JitterPolicy;
pub use recovery::RecoveryPolicy;
