//! # Uniform start/stop primitives.
//!
//! Startup, recovery, manual control and graceful shutdown all drive
//! subsystems through these two functions, so status bookkeeping and event
//! publishing are identical on every path.
//!
//! ```text
//! start_once:
//!   child token ─► publish SubsystemStarting{delay} ─► subsystem.start(ctx) [timeout]
//!     ├─ Ok             → status=running, started_at=now → publish SubsystemStarted
//!     ├─ Err(e)         → status=failed                  → publish SubsystemStartFailed
//!     ├─ timeout        → cancel child, Err(Timeout)     → publish SubsystemStartFailed
//!     └─ parent cancels → cancel child, Err(Canceled)    → publish SubsystemStartFailed
//!
//! stop_once:
//!   subsystem.stop() [timeout] ─► cancel run token
//!     ├─ Ok      → status=stopped → publish SubsystemStopped
//!     └─ Err(e)  → status=error   → publish SubsystemStopFailed
//! ```
//!
//! ## Rules
//! - Callers hold the slot's transition lock.
//! - Exactly one terminal event is published per call.
//! - Each run gets a fresh child of `parent`; cancelling it never affects `parent`.

use std::time::Duration;

use tokio::time;
use tokio_util::sync::CancellationToken;

use crate::error::SubsystemError;
use crate::events::{Event, EventKind};
use crate::hub::{EventHub, SubsystemStatus};
use crate::subsystems::SubsystemContext;

use super::slot::Slot;

/// Starts `slot` once under an optional timeout.
///
/// `delay` is the wait that preceded this start (startup or restart delay);
/// it is only reported on the `SubsystemStarting` event.
pub(crate) async fn start_once(
    slot: &Slot,
    hub: &EventHub,
    parent: &CancellationToken,
    timeout: Option<Duration>,
    delay: Duration,
) -> Result<(), SubsystemError> {
    let child = parent.child_token();
    slot.replace_token(child.clone());
    let mut starting = Event::new(EventKind::SubsystemStarting).with_subsystem(slot.id());
    if !delay.is_zero() {
        starting = starting.with_delay(delay);
    }
    hub.bus().publish(starting);

    let ctx = SubsystemContext::new(slot.emitter.clone(), child.clone());
    let attempt = async {
        match timeout {
            Some(dur) => match time::timeout(dur, slot.subsystem.start(ctx)).await {
                Ok(r) => r,
                Err(_elapsed) => {
                    child.cancel();
                    Err(SubsystemError::Timeout { timeout: dur })
                }
            },
            None => slot.subsystem.start(ctx).await,
        }
    };
    let res = tokio::select! {
        biased;
        r = attempt => r,
        _ = parent.cancelled() => {
            child.cancel();
            Err(SubsystemError::Canceled)
        }
    };

    match res {
        Ok(()) => {
            hub.mark_running(slot.id());
            hub.bus()
                .publish(Event::new(EventKind::SubsystemStarted).with_subsystem(slot.id()));
            Ok(())
        }
        Err(e) => {
            slot.cancel_run();
            hub.mark(slot.id(), SubsystemStatus::Failed);
            hub.bus().publish(
                Event::new(EventKind::SubsystemStartFailed)
                    .with_subsystem(slot.id())
                    .with_reason(e.to_string()),
            );
            Err(e)
        }
    }
}

/// Stops `slot` once under an optional timeout and cancels its run token.
pub(crate) async fn stop_once(
    slot: &Slot,
    hub: &EventHub,
    timeout: Option<Duration>,
) -> Result<(), SubsystemError> {
    let res = match timeout {
        Some(dur) => time::timeout(dur, slot.subsystem.stop())
            .await
            .unwrap_or(Err(SubsystemError::Timeout { timeout: dur })),
        None => slot.subsystem.stop().await,
    };
    slot.cancel_run();

    match res {
        Ok(()) => {
            hub.mark(slot.id(), SubsystemStatus::Stopped);
            hub.bus()
                .publish(Event::new(EventKind::SubsystemStopped).with_subsystem(slot.id()));
            Ok(())
        }
        Err(e) => {
            hub.mark(slot.id(), SubsystemStatus::Error);
            hub.bus().publish(
                Event::new(EventKind::SubsystemStopFailed)
                    .with_subsystem(slot.id())
                    .with_reason(e.to_string()),
            );
            Err(e)
        }
    }
}
