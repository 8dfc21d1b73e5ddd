//! # Subsystem factories keyed by id.
//!
//! The controller never names concrete subsystem types: for every enabled
//! descriptor it asks the [`Registry`] to construct an instance. A missing
//! factory is a construction error like any other (fatal only for critical
//! descriptors).
//!
//! ## Example
//! ```rust
//! use subvisor::{Registry, SubsystemContext, SubsystemDescriptor, SubsystemError, SubsystemFn};
//!
//! let registry = Registry::new().register("report-pipeline", |d: &SubsystemDescriptor| {
//!     Ok(SubsystemFn::arc(
//!         d.id.clone(),
//!         |_ctx: SubsystemContext| async { Ok::<_, SubsystemError>(()) },
//!         || async { Ok::<_, SubsystemError>(()) },
//!     ))
//! });
//!
//! let built = registry.construct(&SubsystemDescriptor::new("report-pipeline", "Reports"));
//! assert!(built.is_ok());
//! assert!(registry.construct(&SubsystemDescriptor::new("other", "Other")).is_err());
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::SubsystemError;

use super::descriptor::SubsystemDescriptor;
use super::periodic::PeriodicAdapter;
use super::subsystem::SubsystemRef;

/// Builds one subsystem instance for a descriptor.
pub type Factory =
    Arc<dyn Fn(&SubsystemDescriptor) -> Result<SubsystemRef, SubsystemError> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Registry {
    factories: HashMap<String, Factory>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Factories for the six standard subsystems, each backed by a
    /// [`PeriodicAdapter`].
    pub fn builtin() -> Self {
        const BUILTINS: [(&str, &str, &str, u64); 6] = [
            ("health-monitoring", "health", "health:check:complete", 30),
            ("github-deployment", "deployment", "deployment:sync:complete", 120),
            ("sports-ingestion", "ingestion", "ingestion:batch:completed", 60),
            ("ai-orchestrator", "ai", "ai:task:completed", 90),
            ("report-pipeline", "report", "report:generation:complete", 180),
            ("security-backup", "security", "security:scan:complete", 240),
        ];

        BUILTINS
            .into_iter()
            .fold(Self::new(), |reg, (id, prefix, event, secs)| {
                reg.register(id, move |d: &SubsystemDescriptor| {
                    let adapter: SubsystemRef = Arc::new(PeriodicAdapter::new(
                        d.id.clone(),
                        prefix,
                        event,
                        Duration::from_secs(secs),
                    ));
                    Ok(adapter)
                })
            })
    }

    /// Adds (or replaces) the factory for `id`.
    #[must_use]
    pub fn register<F>(mut self, id: impl Into<String>, factory: F) -> Self
    where
        F: Fn(&SubsystemDescriptor) -> Result<SubsystemRef, SubsystemError>
            + Send
            + Sync
            + 'static,
    {
        self.factories.insert(id.into(), Arc::new(factory));
        self
    }

    /// Registers an already-built instance; every construction returns a clone of it.
    #[must_use]
    pub fn with_instance(self, id: impl Into<String>, instance: SubsystemRef) -> Self {
        self.register(id, move |_| Ok(Arc::clone(&instance)))
    }

    pub fn construct(&self, descriptor: &SubsystemDescriptor) -> Result<SubsystemRef, SubsystemError> {
        let factory = self.factories.get(&descriptor.id).ok_or_else(|| {
            SubsystemError::construction(format!("no factory registered for '{}'", descriptor.id))
        })?;
        factory(descriptor)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.factories.contains_key(id)
    }

    /// Registered ids, sorted.
    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.factories.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_covers_default_subsystems() {
        let reg = Registry::builtin();
        assert_eq!(
            reg.ids(),
            vec![
                "ai-orchestrator",
                "github-deployment",
                "health-monitoring",
                "report-pipeline",
                "security-backup",
                "sports-ingestion",
            ]
        );
        let built = reg
            .construct(&SubsystemDescriptor::new("sports-ingestion", "Sports"))
            .expect("builtin factory");
        assert_eq!(built.id(), "sports-ingestion");
    }

    #[test]
    fn test_missing_factory_is_construction_error() {
        let err = Registry::new()
            .construct(&SubsystemDescriptor::new("ghost", "Ghost"))
            .err()
            .expect("must fail");
        assert_eq!(err.as_label(), "subsystem_construction");
    }

    #[test]
    fn test_factory_errors_propagate() {
        let reg = Registry::new().register("bad", |_d: &SubsystemDescriptor| {
            Err(SubsystemError::construction("missing credentials"))
        });
        assert!(reg.contains("bad"));
        assert!(reg.construct(&SubsystemDescriptor::new("bad", "Bad")).is_err());
    }
}
