use std::sync::Arc;

use crate::error::ControllerError;
use crate::events::Bus;
use crate::hub::EventHub;
use crate::subscribers::{Subscribe, SubscriberSet};
use crate::subsystems::Registry;

use super::config::ControllerConfig;
use super::controller::Controller;

/// Builder for a [`Controller`].
///
/// Defaults to [`Registry::builtin`] and no subscribers.
pub struct ControllerBuilder {
    cfg: ControllerConfig,
    registry: Registry,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl ControllerBuilder {
    pub fn new(cfg: ControllerConfig) -> Self {
        Self {
            cfg,
            registry: Registry::builtin(),
            subscribers: Vec::new(),
        }
    }

    /// Replaces the subsystem factories.
    pub fn with_registry(mut self, registry: Registry) -> Self {
        self.registry = registry;
        self
    }

    /// Sets event subscribers for observability.
    ///
    /// Subscribers receive every bus event through dedicated workers with
    /// bounded queues.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Validates the configuration and wires bus, hub and subscriber workers.
    ///
    /// Must be called inside a tokio runtime.
    pub fn build(self) -> Result<Arc<Controller>, ControllerError> {
        self.cfg.validate()?;

        let bus = Bus::new(self.cfg.bus_capacity_clamped());
        let subs = Arc::new(SubscriberSet::new(self.subscribers, bus.clone()));
        let hub = EventHub::new(bus.clone(), self.cfg.responsiveness_window);

        let ctrl = Arc::new(Controller::new_internal(
            self.cfg,
            self.registry,
            hub,
            bus,
            subs,
        ));
        ctrl.spawn_subscriber_listener();
        Ok(ctrl)
    }
}
