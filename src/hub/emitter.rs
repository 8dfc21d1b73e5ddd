//! # Emitter: a subsystem's only channel into the hub.
//!
//! Handed out by [`EventHub::register_system`]; bound to one subsystem id.
//! Emitting never blocks and never fails back into the subsystem.

use std::sync::Arc;

use crate::events::Event;

use super::event_hub::EventHub;

#[derive(Clone)]
pub struct Emitter {
    id: Arc<str>,
    hub: Arc<EventHub>,
}

impl Emitter {
    pub(crate) fn new(id: Arc<str>, hub: Arc<EventHub>) -> Self {
        Self { id, hub }
    }

    /// Subsystem id this emitter is bound to.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Emits a domain event without payload.
    pub fn emit(&self, name: impl Into<Arc<str>>) {
        self.emit_with(name, serde_json::Value::Null);
    }

    /// Emits a domain event with a JSON payload.
    pub fn emit_with(&self, name: impl Into<Arc<str>>, payload: serde_json::Value) {
        self.hub
            .observe(Event::domain(Arc::clone(&self.id), name, payload));
    }

    /// Reports a steady-state failure: the subsystem is marked `failed` and a
    /// critical alert is raised. Auto-recovery picks it up on the next health
    /// check if the subsystem is critical.
    pub fn fail(&self, reason: impl Into<Arc<str>>) {
        self.hub.report_failure(&self.id, reason.into());
    }
}

impl std::fmt::Debug for Emitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Emitter").field("id", &self.id).finish()
    }
}
