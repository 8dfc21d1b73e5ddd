//! # Shutdown: graceful and emergency paths, plus OS signal handling.
//!
//! ```text
//! stop():
//!   halt health loop ─► for slot in started.rev():
//!                         skip if already stopped
//!                         stop_once (errors logged, never abort the walk)
//!                     ─► ShutdownCompleted
//!
//! emergency_shutdown():
//!   cancel runtime token ─► join_all(stop() on every slot) under emergency_grace
//!                        ─► EmergencyShutdown
//! ```
//!
//! [`wait_for_shutdown_signal`] completes on SIGINT, SIGTERM or SIGQUIT (Unix)
//! or Ctrl-C elsewhere.

use std::sync::atomic::Ordering;

use futures::future::join_all;
use tracing::{error, info, warn};

use crate::events::{Event, EventKind, Severity};
use crate::hub::SubsystemStatus;

use super::controller::Controller;
use super::runner;

/// Waits for a termination signal.
///
/// Each call creates independent signal listeners. Returns `Err` if signal
/// registration fails.
#[cfg(unix)]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigquit = signal(SignalKind::quit())?;

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {},
        _ = sigint.recv()  => {},
        _ = sigterm.recv() => {},
        _ = sigquit.recv() => {},
    }
    Ok(())
}

/// Waits for a termination signal.
#[cfg(not(unix))]
pub async fn wait_for_shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await
}

impl Controller {
    /// Stops every started subsystem in reverse start order.
    ///
    /// Individual failures are logged and mark the subsystem `error`; they
    /// never keep later subsystems from being stopped.
    pub async fn stop(&self) {
        self.running.store(false, Ordering::Release);
        self.halt_health_loop().await;

        let started: Vec<_> = self.started_list().drain(..).collect();
        let mut failed = 0usize;
        for slot in started.iter().rev() {
            let _guard = slot.transition().await;
            let stopped = self
                .hub
                .state(slot.id())
                .is_some_and(|s| s.status() == SubsystemStatus::Stopped);
            if stopped {
                continue;
            }
            if let Err(e) = runner::stop_once(slot, &self.hub, self.cfg.stop_timeout()).await {
                failed += 1;
                error!(subsystem = slot.id(), error = %e, "failed to stop subsystem");
            }
        }

        info!(stopped = started.len() - failed, failed, "shutdown complete");
        self.bus.publish(
            Event::new(EventKind::ShutdownCompleted)
                .with_reason(format!("{} stopped, {failed} failed", started.len() - failed)),
        );
    }

    /// Forces `stop()` on every subsystem at once, ignoring errors and order.
    pub async fn emergency_shutdown(&self) {
        warn!("emergency shutdown");
        self.running.store(false, Ordering::Release);
        self.cancel_health();
        self.runtime_token.cancel();

        let slots = self.slots();
        let stops = slots.iter().map(|slot| async move {
            match slot.subsystem.stop().await {
                Ok(()) => self.hub.mark(slot.id(), SubsystemStatus::Stopped),
                Err(_) => self.hub.mark(slot.id(), SubsystemStatus::Error),
            }
        });
        if tokio::time::timeout(self.cfg.emergency_grace, join_all(stops))
            .await
            .is_err()
        {
            warn!(grace = ?self.cfg.emergency_grace, "emergency stop grace exceeded");
        }
        self.started_list().clear();

        self.bus.publish(
            Event::new(EventKind::EmergencyShutdown)
                .with_reason(format!("{} subsystems", slots.len()))
                .with_severity(Severity::Critical),
        );
    }
}
