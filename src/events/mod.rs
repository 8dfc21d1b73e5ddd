//! Events: data model, name classification and the broadcast bus.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and metadata
//! - [`Severity`], [`Outcome`] name-based classification used by the hub
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: the controller (lifecycle, health, recovery, shutdown),
//!   the event hub (forwarded domain events and alerts), subscriber workers.
//! - **Consumers**: the controller's subscriber listener (fans out to the
//!   `SubscriberSet`) and any receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;
mod severity;

pub use bus::Bus;
pub use event::{Event, EventKind};
pub use severity::{Outcome, Severity};
