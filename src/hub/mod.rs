//! Event hub: per-subsystem runtime state, event counting and alerts.
//!
//! - [`EventHub`] owns the state table and classifies incoming events;
//! - [`Emitter`] is the handle a subsystem uses to reach the hub;
//! - [`Alert`], [`SystemStatus`], [`AggregateHealth`], [`HubMetrics`] are its read views.

mod alert;
mod emitter;
mod event_hub;
mod state;

pub use alert::{AggregateHealth, Alert, HubMetrics, SystemStatus};
pub use emitter::Emitter;
pub use event_hub::EventHub;
pub use state::{SubsystemRuntimeState, SubsystemStatus};
