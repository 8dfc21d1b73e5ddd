//! # Startup sequencing.
//!
//! ```text
//! initialize_systems():
//!   for d in cfg.subsystems (config order):
//!     ├─ !d.enabled           → SubsystemSkipped
//!     ├─ registry.construct(d)
//!     │     ├─ Err & critical → CriticalConstruction (nothing is registered)
//!     │     └─ Err            → SubsystemSkipped, continue
//!     └─ hub.register_system(d) → Slot
//!   stable sort by startup_delay
//!
//! execute_startup_sequence():
//!   for slot in sequence:
//!     sleep(startup_delay) ─► start_once (SubsystemStarting carries the delay)
//!       ├─ Ok              → started list
//!       ├─ Err & critical  → StartupAborted, CriticalStartup (later slots never start)
//!       └─ Err             → logged, continue
//!   StartupCompleted
//! ```
//!
//! Each slot waits its own `startup_delay` right before it is started; delays
//! are not offsets from the beginning of the sequence.

use std::sync::Arc;
use std::sync::atomic::Ordering;

use tracing::{debug, error, info, warn};

use crate::error::ControllerError;
use crate::events::{Event, EventKind, Severity};

use super::controller::Controller;
use super::runner;
use super::slot::Slot;

impl Controller {
    /// Constructs and registers every enabled subsystem and fixes the startup order.
    pub fn initialize_systems(&self) -> Result<(), ControllerError> {
        if self.is_running() {
            return Err(ControllerError::AlreadyRunning);
        }

        let mut built = Vec::with_capacity(self.cfg.subsystems.len());
        for descriptor in &self.cfg.subsystems {
            if !descriptor.enabled {
                debug!(subsystem = %descriptor.id, "subsystem disabled");
                self.bus.publish(
                    Event::new(EventKind::SubsystemSkipped)
                        .with_subsystem(descriptor.id.as_str())
                        .with_reason("disabled"),
                );
                continue;
            }

            match self.registry.construct(descriptor) {
                Ok(subsystem) => built.push((descriptor.clone(), subsystem)),
                Err(source) if descriptor.critical => {
                    error!(subsystem = %descriptor.id, error = %source, "critical subsystem could not be constructed");
                    return Err(ControllerError::CriticalConstruction {
                        id: descriptor.id.clone(),
                        source,
                    });
                }
                Err(e) => {
                    warn!(subsystem = %descriptor.id, error = %e, "skipping subsystem");
                    self.bus.publish(
                        Event::new(EventKind::SubsystemSkipped)
                            .with_subsystem(descriptor.id.as_str())
                            .with_reason(e.to_string())
                            .with_severity(Severity::High),
                    );
                }
            }
        }

        let mut slots: Vec<Arc<Slot>> = built
            .into_iter()
            .map(|(descriptor, subsystem)| {
                let emitter = self.hub.register_system(&descriptor);
                Arc::new(Slot::new(descriptor, subsystem, emitter))
            })
            .collect();
        slots.sort_by_key(|s| s.descriptor.startup_delay);

        info!(count = slots.len(), "subsystems initialized");
        *self
            .sequence
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner) = slots;
        self.started_list().clear();
        self.initialized.store(true, Ordering::Release);
        Ok(())
    }

    /// Starts the initialized subsystems one after another.
    pub async fn execute_startup_sequence(&self) -> Result<(), ControllerError> {
        if !self.is_initialized() {
            return Err(ControllerError::NotInitialized);
        }

        let slots = self.slots();
        let total = slots.len();
        for slot in &slots {
            let delay = slot.descriptor.startup_delay;
            if !delay.is_zero() {
                debug!(subsystem = slot.id(), delay_ms = delay.as_millis() as u64, "waiting before start");
                tokio::time::sleep(delay).await;
            }

            let _guard = slot.transition().await;
            let started =
                runner::start_once(slot, &self.hub, &self.runtime_token, self.cfg.start_timeout(), delay)
                    .await;
            match started {
                Ok(()) => self.push_started(slot),
                Err(source) if slot.descriptor.critical => {
                    self.bus.publish(
                        Event::new(EventKind::StartupAborted)
                            .with_subsystem(slot.id())
                            .with_reason(source.to_string())
                            .with_severity(Severity::Critical),
                    );
                    return Err(ControllerError::CriticalStartup {
                        id: slot.id().to_string(),
                        source,
                    });
                }
                Err(e) => {
                    warn!(subsystem = slot.id(), error = %e, "non-critical subsystem failed to start");
                }
            }
        }

        let started = self.started_list().len();
        self.bus.publish(
            Event::new(EventKind::StartupCompleted).with_reason(format!("{started}/{total} started")),
        );
        Ok(())
    }
}
