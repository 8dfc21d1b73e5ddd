//! Runtime core: orchestration and lifecycle.
//!
//! The public API of this module is [`Controller`] (built through
//! [`ControllerBuilder`]), its [`ControllerConfig`] and the [`StatusSnapshot`]
//! it reports.
//!
//! Internal modules:
//! - [`runner`]: the uniform start/stop primitives with timeout and events;
//! - [`slot`]: one constructed subsystem plus its transition lock;
//! - [`startup`]: initialization and the staggered startup sequence;
//! - [`health`]: periodic health checks and bounded auto-recovery;
//! - [`shutdown`]: graceful and emergency shutdown, OS signal handling;
//! - [`report`]: JSON snapshots written to the report directory.

mod builder;
mod config;
mod controller;
mod health;
mod report;
mod runner;
mod shutdown;
mod slot;
mod startup;

pub use builder::ControllerBuilder;
pub use config::ControllerConfig;
pub use controller::Controller;
pub use report::StatusSnapshot;
pub use shutdown::wait_for_shutdown_signal;
