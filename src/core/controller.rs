//! # Controller: owns the subsystems, the event hub and the supervision loop.
//!
//! ```text
//! Controller::builder(cfg).build()
//!     │
//!     ├─ initialize_systems()        Registry::construct ─► EventHub::register_system ─► Slot
//!     │                              (sorted by startup_delay, stable)
//!     ├─ execute_startup_sequence()  sleep(delay) ─► start_once ─► started list
//!     ├─ start()                     both of the above + startup report + health loop
//!     │
//!     ├─ health loop (every health_interval)
//!     │      check_health() ─► critical not ok ─► recover()
//!     │
//!     ├─ restart_system / pause_system / resume_system   (per-slot transition lock)
//!     │
//!     ├─ stop()                      reverse of the started list
//!     └─ emergency_shutdown()        cancel everything, concurrent stop() under a grace
//! ```
//!
//! [`Controller::run`] ties these together for a process: start, wait for
//! SIGINT/SIGTERM, then stop gracefully; any fatal error takes the emergency path.
//!
//! ## Example
//! ```rust,no_run
//! use subvisor::{Controller, ControllerConfig, LogWriter, Subscribe};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), subvisor::ControllerError> {
//!     let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
//!     let controller = Controller::builder(ControllerConfig::default())
//!         .with_subscribers(subs)
//!         .build()?;
//!     controller.run().await
//! }
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast::error::{RecvError, TryRecvError};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::error::ControllerError;
use crate::events::{Bus, Event, EventKind};
use crate::hub::{EventHub, SubsystemStatus};
use crate::subscribers::SubscriberSet;
use crate::subsystems::Registry;

use super::builder::ControllerBuilder;
use super::config::ControllerConfig;
use super::report::{self, StatusSnapshot};
use super::runner;
use super::shutdown;
use super::slot::Slot;

pub(super) struct HealthLoop {
    pub(super) token: CancellationToken,
    pub(super) join: Option<JoinHandle<()>>,
}

/// Task forwarding bus events to the subscriber set.
struct Listener {
    stop: CancellationToken,
    join: JoinHandle<()>,
}

/// Orchestrates the managed subsystems.
pub struct Controller {
    pub(super) cfg: ControllerConfig,
    pub(super) registry: Registry,
    pub(super) hub: Arc<EventHub>,
    pub(super) bus: Bus,
    pub(super) subs: Arc<SubscriberSet>,
    /// Constructed subsystems, in startup order.
    pub(super) sequence: RwLock<Vec<Arc<Slot>>>,
    /// Realized start order; shutdown walks it backwards.
    pub(super) started: Mutex<Vec<Arc<Slot>>>,
    pub(super) initialized: AtomicBool,
    pub(super) running: AtomicBool,
    pub(super) runtime_token: CancellationToken,
    pub(super) health: Mutex<Option<HealthLoop>>,
    listener: Mutex<Option<Listener>>,
}

enum Exit {
    Signal(std::io::Result<()>),
    Health(Result<(), tokio::task::JoinError>),
}

impl Controller {
    /// Starts building a controller for `cfg` (built-in registry, no subscribers).
    pub fn builder(cfg: ControllerConfig) -> ControllerBuilder {
        ControllerBuilder::new(cfg)
    }

    pub(super) fn new_internal(
        cfg: ControllerConfig,
        registry: Registry,
        hub: Arc<EventHub>,
        bus: Bus,
        subs: Arc<SubscriberSet>,
    ) -> Self {
        Self {
            cfg,
            registry,
            hub,
            bus,
            subs,
            sequence: RwLock::new(Vec::new()),
            started: Mutex::new(Vec::new()),
            initialized: AtomicBool::new(false),
            running: AtomicBool::new(false),
            runtime_token: CancellationToken::new(),
            health: Mutex::new(None),
            listener: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.cfg
    }

    pub fn hub(&self) -> &Arc<EventHub> {
        &self.hub
    }

    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Acquire)
    }

    /// Ids of the constructed subsystems in startup order.
    pub fn sequence(&self) -> Vec<String> {
        self.slots().iter().map(|s| s.id().to_string()).collect()
    }

    /// Ids in the order they were actually started.
    pub fn started_order(&self) -> Vec<String> {
        self.started_list().iter().map(|s| s.id().to_string()).collect()
    }

    pub(super) fn slots(&self) -> Vec<Arc<Slot>> {
        self.sequence
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub(super) fn started_list(&self) -> MutexGuard<'_, Vec<Arc<Slot>>> {
        self.started.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Appends `slot` to the realized start order unless already there.
    pub(super) fn push_started(&self, slot: &Arc<Slot>) {
        let mut started = self.started_list();
        if !started.iter().any(|s| Arc::ptr_eq(s, slot)) {
            started.push(Arc::clone(slot));
        }
    }

    fn slot(&self, id: &str) -> Result<Arc<Slot>, ControllerError> {
        if !self.is_initialized() {
            return Err(ControllerError::NotInitialized);
        }
        self.slots()
            .into_iter()
            .find(|s| s.id() == id)
            .ok_or_else(|| ControllerError::UnknownSubsystem { id: id.to_string() })
    }

    fn status_of(&self, id: &str) -> SubsystemStatus {
        self.hub
            .state(id)
            .map(|s| s.status())
            .unwrap_or(SubsystemStatus::Uninitialized)
    }

    /// Initializes (if needed) and starts every subsystem, writes the startup
    /// report and spawns the health loop.
    ///
    /// A critical construction or start failure is returned as is; callers
    /// are expected to take the emergency path.
    pub async fn start(self: &Arc<Self>) -> Result<StatusSnapshot, ControllerError> {
        if self.is_running() {
            return Err(ControllerError::AlreadyRunning);
        }
        if !self.is_initialized() {
            self.initialize_systems()?;
        }
        self.execute_startup_sequence().await?;
        self.running.store(true, Ordering::Release);

        let snapshot = self.status();
        self.write_report("startup", &snapshot).await;
        self.spawn_health_loop();
        Ok(snapshot)
    }

    /// Runs the controller until SIGINT/SIGTERM, then stops gracefully.
    ///
    /// Fatal startup failures and a crashed health loop trigger
    /// [`Controller::emergency_shutdown`] and are returned as errors.
    pub async fn run(self: &Arc<Self>) -> Result<(), ControllerError> {
        if let Err(e) = self.start().await {
            error!(error = %e, label = e.as_label(), "startup failed");
            if e.is_fatal() {
                self.emergency_shutdown().await;
            }
            return Err(e);
        }

        let Some(mut health) = self.take_health_join() else {
            self.stop().await;
            return Ok(());
        };

        let exit = tokio::select! {
            sig = shutdown::wait_for_shutdown_signal() => Exit::Signal(sig),
            joined = &mut health => Exit::Health(joined),
        };

        match exit {
            Exit::Signal(sig) => {
                if let Err(e) = sig {
                    error!(error = %e, "failed to listen for shutdown signals");
                }
                self.bus.publish(Event::new(EventKind::ShutdownRequested));
                self.cancel_health();
                let _ = health.await;
                self.stop().await;
                Ok(())
            }
            Exit::Health(Err(e)) if e.is_panic() => {
                let err = ControllerError::SupervisorFault {
                    reason: e.to_string(),
                };
                error!(error = %err, label = err.as_label(), "health supervisor crashed");
                self.emergency_shutdown().await;
                Err(err)
            }
            Exit::Health(_) => {
                self.stop().await;
                Ok(())
            }
        }
    }

    /// Stops and starts one subsystem, pausing `restart_delay` in between.
    ///
    /// The stop is skipped only when nothing can be live: never started or
    /// already stopped. A `failed` subsystem is stopped first so it can
    /// release what its previous run still holds.
    ///
    /// Unlike auto-recovery this ignores and never touches `restart_count`.
    pub async fn restart_system(&self, id: &str) -> Result<(), ControllerError> {
        let slot = self.slot(id)?;
        let _guard = slot.transition().await;

        let idle = matches!(
            self.status_of(id),
            SubsystemStatus::Uninitialized | SubsystemStatus::Initialized | SubsystemStatus::Stopped
        );
        if !idle {
            runner::stop_once(&slot, &self.hub, self.cfg.stop_timeout())
                .await
                .map_err(|source| ControllerError::Transition {
                    id: id.to_string(),
                    source,
                })?;
        }
        if !self.cfg.restart_delay.is_zero() {
            tokio::time::sleep(self.cfg.restart_delay).await;
        }
        runner::start_once(
            &slot,
            &self.hub,
            &self.runtime_token,
            self.cfg.start_timeout(),
            self.cfg.restart_delay,
        )
        .await
        .map_err(|source| ControllerError::Transition {
            id: id.to_string(),
            source,
        })?;

        self.push_started(&slot);
        info!(subsystem = id, "subsystem restarted");
        Ok(())
    }

    /// Stops one subsystem without touching the others.
    pub async fn pause_system(&self, id: &str) -> Result<(), ControllerError> {
        let slot = self.slot(id)?;
        let _guard = slot.transition().await;
        runner::stop_once(&slot, &self.hub, self.cfg.stop_timeout())
            .await
            .map_err(|source| ControllerError::Transition {
                id: id.to_string(),
                source,
            })
    }

    /// Starts one subsystem again; no delay, no restart budget.
    pub async fn resume_system(&self, id: &str) -> Result<(), ControllerError> {
        let slot = self.slot(id)?;
        let _guard = slot.transition().await;
        runner::start_once(
            &slot,
            &self.hub,
            &self.runtime_token,
            self.cfg.start_timeout(),
            Duration::ZERO,
        )
        .await
        .map_err(|source| ControllerError::Transition {
            id: id.to_string(),
            source,
        })?;
        self.push_started(&slot);
        Ok(())
    }

    /// Current snapshot: running flag, aggregate health, per-subsystem status, metrics.
    pub fn status(&self) -> StatusSnapshot {
        let now = Utc::now();
        StatusSnapshot {
            timestamp: now,
            running: self.is_running(),
            health: self.hub.overall_health_at(now),
            systems: self.hub.systems_status_at(now),
            metrics: self.hub.metrics(),
        }
    }

    /// Writes `snapshot` as a `kind` report; failures are logged only.
    pub(super) async fn write_report(&self, kind: &str, snapshot: &StatusSnapshot) {
        match report::write_report(&self.cfg.report_dir, kind, snapshot).await {
            Ok(path) => {
                self.bus.publish(
                    Event::new(EventKind::ReportWritten).with_reason(path.display().to_string()),
                );
            }
            Err(e) => warn!(error = %e, kind, "failed to write report"),
        }
    }

    /// Stops the bus listener once it has forwarded everything already
    /// published, then drains every observer.
    pub async fn shutdown_observers(&self) {
        let listener = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(Listener { stop, join }) = listener {
            stop.cancel();
            if let Err(e) = join.await {
                warn!(error = %e, "observer listener crashed");
            }
        }
        self.subs.shutdown().await;
    }

    /// Subscribes to the bus and forwards events to the subscriber set.
    pub(super) fn spawn_subscriber_listener(&self) {
        let mut rx = self.bus.subscribe();
        let set = Arc::clone(&self.subs);
        let stop = CancellationToken::new();
        let cancelled = stop.clone();

        let join = tokio::spawn(async move {
            loop {
                tokio::select! {
                    biased;
                    res = rx.recv() => match res {
                        Ok(ev) => set.emit(&ev),
                        Err(RecvError::Lagged(n)) => warn!(skipped = n, "observer listener lagged"),
                        Err(RecvError::Closed) => break,
                    },
                    _ = cancelled.cancelled() => {
                        // forward what is already queued, then exit
                        loop {
                            match rx.try_recv() {
                                Ok(ev) => set.emit(&ev),
                                Err(TryRecvError::Lagged(n)) => {
                                    warn!(skipped = n, "observer listener lagged");
                                }
                                Err(_) => break,
                            }
                        }
                        break;
                    }
                }
            }
        });

        let prev = self
            .listener
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(Listener { stop, join });
        if let Some(prev) = prev {
            prev.stop.cancel();
        }
    }
}
