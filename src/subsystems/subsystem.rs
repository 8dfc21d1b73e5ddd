//! # The managed-subsystem contract.
//!
//! Every unit the controller manages implements [`Subsystem`]: a stable
//! [`id`](Subsystem::id), an async [`start`](Subsystem::start) and an async
//! [`stop`](Subsystem::stop). Adapters that wrap legacy naming (`deploy` /
//! `undeploy`, ...) normalize it inside their own impl.
//!
//! `start` receives a [`SubsystemContext`]:
//! - an [`Emitter`] through which every event the subsystem produces reaches the
//!   event hub (counted, classified, forwarded to observers);
//! - a [`CancellationToken`] cancelled when the controller stops this run, or
//!   when `start` itself exceeds the start timeout.
//!
//! `start` should return once the subsystem is up; long-running work belongs in
//! tasks the subsystem spawns and winds down in `stop` (or on cancellation).
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use subvisor::{Subsystem, SubsystemContext, SubsystemError};
//!
//! struct Deployment;
//!
//! #[async_trait]
//! impl Subsystem for Deployment {
//!     fn id(&self) -> &str { "github-deployment" }
//!
//!     async fn start(&self, ctx: SubsystemContext) -> Result<(), SubsystemError> {
//!         ctx.emitter().emit("deployment:started");
//!         Ok(())
//!     }
//!
//!     async fn stop(&self) -> Result<(), SubsystemError> {
//!         Ok(())
//!     }
//! }
//! ```

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::error::SubsystemError;
use crate::hub::Emitter;

/// Everything a subsystem gets for one run.
#[derive(Clone)]
pub struct SubsystemContext {
    emitter: Emitter,
    token: CancellationToken,
}

impl SubsystemContext {
    pub fn new(emitter: Emitter, token: CancellationToken) -> Self {
        Self { emitter, token }
    }

    /// Channel into the event hub for this subsystem.
    pub fn emitter(&self) -> &Emitter {
        &self.emitter
    }

    /// Cancelled when this run is stopped.
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

#[async_trait]
pub trait Subsystem: Send + Sync + 'static {
    /// Stable id; must match the descriptor it was built for.
    fn id(&self) -> &str;

    /// Brings the subsystem up. Errors mark it `failed`.
    async fn start(&self, ctx: SubsystemContext) -> Result<(), SubsystemError>;

    /// Brings the subsystem down. Errors mark it `error`.
    async fn stop(&self) -> Result<(), SubsystemError>;
}

/// Shared handle to a subsystem.
pub type SubsystemRef = Arc<dyn Subsystem>;
