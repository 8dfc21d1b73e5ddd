//! Managed subsystems: contract, descriptors and construction.
//!
//! - [`Subsystem`] the async start/stop contract every managed unit implements;
//! - [`SubsystemDescriptor`] identity and policy (enabled, critical, startup delay);
//! - [`Registry`] factories the controller uses to build instances by id;
//! - [`SubsystemFn`] closure-backed implementation;
//! - [`PeriodicAdapter`] fixed-interval implementation behind the built-ins.

mod descriptor;
mod periodic;
mod registry;
mod subsystem;
mod subsystem_fn;

pub use descriptor::SubsystemDescriptor;
pub use periodic::PeriodicAdapter;
pub use registry::{Factory, Registry};
pub use subsystem::{Subsystem, SubsystemContext, SubsystemRef};
pub use subsystem_fn::SubsystemFn;
