//! # Broadcast bus: the global "system:event" stream.
//!
//! Every lifecycle event the controller produces, and every domain event a
//! subsystem emits (after the hub has recorded it), is published here. Observers
//! (the log writer, dashboards, tests) subscribe to it.
//!
//! ```text
//! Controller ──┐
//! EventHub   ──┼──► Bus (tokio broadcast) ──► listener ──► SubscriberSet
//! Recovery   ──┘                          └─► ad-hoc receivers (tests, UIs)
//! ```
//!
//! ## Rules
//! - `publish()` never blocks and never fails back into the caller.
//! - Receivers only see events sent after they subscribed.
//! - Slow receivers observe `RecvError::Lagged(n)` and skip the `n` oldest items.

use tokio::sync::broadcast;

use super::event::Event;

/// Cloneable handle over a bounded broadcast channel of [`Event`]s.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a bus with the given ring-buffer capacity (clamped to at least 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Fire-and-forget publish; dropped silently when nobody listens.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// New independent receiver for subsequent events.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}
