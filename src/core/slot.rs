//! # Slot: one constructed subsystem and its transition lock.
//!
//! Every start/stop transition of a subsystem (startup, recovery, manual
//! control, graceful shutdown) holds `transition` for its whole duration, so
//! at most one transition is in flight per subsystem. Recovery uses
//! `try_transition` and skips a busy slot.
//!
//! `token` holds the cancellation token of the current run; it is replaced on
//! every start and cancelled once the run is stopped.

use std::sync::{Mutex, PoisonError};

use tokio::sync::{Mutex as AsyncMutex, MutexGuard, TryLockError};
use tokio_util::sync::CancellationToken;

use crate::hub::Emitter;
use crate::subsystems::{SubsystemDescriptor, SubsystemRef};

pub(crate) struct Slot {
    pub(crate) descriptor: SubsystemDescriptor,
    pub(crate) subsystem: SubsystemRef,
    pub(crate) emitter: Emitter,
    transition: AsyncMutex<()>,
    token: Mutex<Option<CancellationToken>>,
}

impl Slot {
    pub(crate) fn new(
        descriptor: SubsystemDescriptor,
        subsystem: SubsystemRef,
        emitter: Emitter,
    ) -> Self {
        Self {
            descriptor,
            subsystem,
            emitter,
            transition: AsyncMutex::new(()),
            token: Mutex::new(None),
        }
    }

    pub(crate) fn id(&self) -> &str {
        &self.descriptor.id
    }

    /// Waits for exclusive access to this subsystem's lifecycle.
    pub(crate) async fn transition(&self) -> MutexGuard<'_, ()> {
        self.transition.lock().await
    }

    /// Exclusive access if no other transition is in flight.
    pub(crate) fn try_transition(&self) -> Result<MutexGuard<'_, ()>, TryLockError> {
        self.transition.try_lock()
    }

    /// Stores the token of a new run, cancelling the previous one.
    pub(crate) fn replace_token(&self, token: CancellationToken) {
        let prev = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(token);
        if let Some(prev) = prev {
            prev.cancel();
        }
    }

    /// Cancels the current run's token, if any.
    pub(crate) fn cancel_run(&self) {
        let current = self
            .token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(token) = current {
            token.cancel();
        }
    }
}
