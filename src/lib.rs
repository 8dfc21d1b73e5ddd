//! # subvisor
//!
//! **Subvisor** is a master automation controller for in-process subsystems.
//!
//! It constructs a configured set of subsystems, starts them in a staggered
//! order, observes everything they emit through an event hub, keeps critical
//! subsystems alive with bounded auto-restart, and stops them in reverse order.
//!
//! ## Architecture
//! ### Overview
//! ```text
//!   ControllerConfig (descriptors: id, critical, startup_delay)   Registry (factories by id)
//!            └───────────────────────────┬───────────────────────────────┘
//!                                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  Controller                                                       │
//! │  - startup sequence (ascending delay, critical = fail fast)        │
//! │  - health loop (critical_systems_ok, bounded auto-recovery)       │
//! │  - manual control (restart / pause / resume)                      │
//! │  - shutdown (reverse order) / emergency (concurrent, forced)      │
//! └──────┬──────────────────┬──────────────────┬──────────────────────┘
//!        ▼                  ▼                  ▼
//!   ┌───────────┐      ┌───────────┐      ┌───────────┐
//!   │ Subsystem │      │ Subsystem │      │ Subsystem │   start(ctx) / stop()
//!   └─────┬─────┘      └─────┬─────┘      └─────┬─────┘
//!         │ Emitter          │ Emitter          │ Emitter
//!         ▼                  ▼                  ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │  EventHub: runtime state, counters, success/alert classification  │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                    │
//! └─────────────────────────────────┬─────────────────────────────────┘
//!                                   ▼
//!                            SubscriberSet ──► LogWriter, custom observers
//! ```
//!
//! ## Features
//! | Area              | Description                                              | Key types / traits                              |
//! |-------------------|----------------------------------------------------------|-------------------------------------------------|
//! | **Subsystems**    | Uniform async start/stop contract and factories.         | [`Subsystem`], [`SubsystemFn`], [`Registry`]    |
//! | **Supervision**   | Staggered startup, health checks, recovery, shutdown.    | [`Controller`], [`ControllerBuilder`]           |
//! | **Event hub**     | Per-subsystem state, counters, alerts, health.           | [`EventHub`], [`Emitter`], [`Alert`]            |
//! | **Policies**      | Restart budget and optional backoff between attempts.    | [`RecoveryPolicy`], [`BackoffPolicy`]           |
//! | **Subscriber API**| Observe every bus event.                                 | [`Subscribe`], [`LogWriter`]                    |
//! | **Errors**        | Typed errors for orchestration and subsystems.           | [`ControllerError`], [`SubsystemError`]         |
//! | **Configuration** | Static settings, optional TOML file.                     | [`ControllerConfig`]                            |
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use subvisor::{
//!     Controller, ControllerConfig, Registry, SubsystemContext, SubsystemDescriptor,
//!     SubsystemError, SubsystemFn,
//! };
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let tmp = std::env::temp_dir().join("subvisor-doc");
//!     let cfg = ControllerConfig {
//!         subsystems: vec![SubsystemDescriptor::new("hello", "Hello").critical()],
//!         report_dir: tmp,
//!         ..ControllerConfig::default()
//!     };
//!
//!     let registry = Registry::new().register("hello", |d: &SubsystemDescriptor| {
//!         Ok(SubsystemFn::arc(
//!             d.id.clone(),
//!             |ctx: SubsystemContext| async move {
//!                 ctx.emitter().emit("hello:ready:complete");
//!                 Ok::<_, SubsystemError>(())
//!             },
//!             || async { Ok::<_, SubsystemError>(()) },
//!         ))
//!     });
//!
//!     let controller = Controller::builder(cfg).with_registry(registry).build()?;
//!     let snapshot = controller.start().await?;
//!     assert!(snapshot.health.critical_systems_ok);
//!
//!     controller.stop().await;
//!     Ok(())
//! }
//! ```
mod core;
mod error;
mod events;
mod hub;
mod policies;
mod subscribers;
mod subsystems;

// ---- Public re-exports ----

pub use crate::core::{
    Controller, ControllerBuilder, ControllerConfig, StatusSnapshot, wait_for_shutdown_signal,
};
pub use error::{ControllerError, SubsystemError};
pub use events::{Bus, Event, EventKind, Outcome, Severity};
pub use hub::{
    AggregateHealth, Alert, Emitter, EventHub, HubMetrics, SubsystemRuntimeState,
    SubsystemStatus, SystemStatus,
};
pub use policies::{BackoffPolicy, JitterPolicy, RecoveryPolicy};
pub use subscribers::{LogWriter, Subscribe, SubscriberSet};
pub use subsystems::{
    Factory, PeriodicAdapter, Registry, Subsystem, SubsystemContext, SubsystemDescriptor,
    SubsystemFn, SubsystemRef,
};
