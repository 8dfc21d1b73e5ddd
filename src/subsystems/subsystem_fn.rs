//! # Closure-backed subsystem (`SubsystemFn`)
//!
//! [`SubsystemFn`] wraps two closures, one producing the `start` future and
//! one producing the `stop` future. Each call builds a fresh future; shared
//! state between calls goes in an explicit `Arc<...>` captured by the closures.
//!
//! ## Example
//! ```rust
//! use subvisor::{SubsystemContext, SubsystemError, SubsystemFn, SubsystemRef};
//!
//! let s: SubsystemRef = SubsystemFn::arc(
//!     "report-pipeline",
//!     |ctx: SubsystemContext| async move {
//!         ctx.emitter().emit("report:pipeline:ready");
//!         Ok::<_, SubsystemError>(())
//!     },
//!     || async { Ok::<_, SubsystemError>(()) },
//! );
//!
//! assert_eq!(s.id(), "report-pipeline");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::SubsystemError;
use crate::subsystems::subsystem::{Subsystem, SubsystemContext};

pub struct SubsystemFn<S, T> {
    id: Cow<'static, str>,
    start: S,
    stop: T,
}

impl<S, T> SubsystemFn<S, T> {
    pub fn new(id: impl Into<Cow<'static, str>>, start: S, stop: T) -> Self {
        Self {
            id: id.into(),
            start,
            stop,
        }
    }

    /// Same as [`SubsystemFn::new`], already wrapped in an `Arc`.
    pub fn arc(id: impl Into<Cow<'static, str>>, start: S, stop: T) -> Arc<Self> {
        Arc::new(Self::new(id, start, stop))
    }
}

#[async_trait]
impl<S, SF, T, TF> Subsystem for SubsystemFn<S, T>
where
    S: Fn(SubsystemContext) -> SF + Send + Sync + 'static,
    SF: Future<Output = Result<(), SubsystemError>> + Send + 'static,
    T: Fn() -> TF + Send + Sync + 'static,
    TF: Future<Output = Result<(), SubsystemError>> + Send + 'static,
{
    fn id(&self) -> &str {
        &self.id
    }

    async fn start(&self, ctx: SubsystemContext) -> Result<(), SubsystemError> {
        (self.start)(ctx).await
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        (self.stop)().await
    }
}
