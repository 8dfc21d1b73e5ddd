//! # Observers of the controller's event stream.
//!
//! ```text
//! Controller / EventHub ── publish(Event) ──► Bus ──► subscriber listener
//!                                                          │
//!                                                   SubscriberSet::emit
//!                                              ┌───────────┼───────────┐
//!                                              ▼           ▼           ▼
//!                                          LogWriter   dashboard    custom
//! ```
//!
//! Implement [`Subscribe`] and pass the subscriber to
//! [`ControllerBuilder::with_subscribers`](crate::ControllerBuilder::with_subscribers).

mod embedded;
mod set;
mod subscribe;

pub use embedded::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
