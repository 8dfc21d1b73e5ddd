//! # Observer trait
//!
//! `Subscribe` is the extension point for anything that watches the controller:
//! log writers, dashboards, metrics exporters. Each subscriber is driven by a
//! dedicated worker fed by a bounded queue owned by the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Slow subscribers never block the controller, the hub or other subscribers.
//! - On queue overflow the event is dropped for that subscriber only.
//!
//! ## Example
//! ```rust
//! use async_trait::async_trait;
//! use subvisor::{Event, EventKind, Subscribe};
//!
//! struct AlertCounter(std::sync::atomic::AtomicU64);
//!
//! #[async_trait]
//! impl Subscribe for AlertCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::Alert {
//!             self.0.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "alert-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Name used in overflow/panic reports.
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
