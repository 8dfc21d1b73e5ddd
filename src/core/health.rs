//! # Health supervision and bounded auto-recovery.
//!
//! ```text
//! every health_interval:
//!   check_health()
//!     ├─ publish HealthChecked
//!     └─ critical_systems_ok == false
//!          ├─ publish HealthCritical
//!          └─ auto_restart → recover()
//!                 for each critical slot with status == failed (concurrently):
//!                   ├─ transition lock busy     → skip this pass
//!                   ├─ budget spent / not due   → skip
//!                   └─ RecoveryAttempt ─► start_once
//!                        ├─ canceled (shutdown)  → budget untouched
//!                        └─ otherwise            → restart_count += 1
//!                                                   └─ failed at cap → RecoveryExhausted
//!   every status_report_every checks → status report
//! ```
//!
//! The loop holds only a weak reference to the controller and ends when the
//! controller is dropped or its health token is cancelled.

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use chrono::Utc;
use futures::future::join_all;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use crate::events::{Event, EventKind, Severity};
use crate::hub::{AggregateHealth, SubsystemStatus};
use crate::policies::RecoveryPolicy;

use super::controller::{Controller, HealthLoop};
use super::runner;
use super::slot::Slot;

impl Controller {
    /// Computes aggregate health once and runs recovery if a critical subsystem is down.
    pub async fn check_health(&self) -> AggregateHealth {
        let health = self.hub.overall_health();
        self.bus.publish(Event::new(EventKind::HealthChecked).with_reason(format!(
            "{:.1}% healthy ({}/{}), critical ok: {}",
            health.percent(),
            health.healthy,
            health.total,
            health.critical_systems_ok
        )));

        if !health.critical_systems_ok {
            self.bus.publish(
                Event::new(EventKind::HealthCritical)
                    .with_name("health:critical")
                    .with_severity(Severity::Critical),
            );
            if self.cfg.auto_restart {
                self.recover().await;
            }
        }
        health
    }

    /// One recovery pass over the failed critical subsystems.
    ///
    /// Returns the number of attempts made.
    pub(super) async fn recover(&self) -> usize {
        let policy = self.cfg.recovery_policy();
        let candidates: Vec<Arc<Slot>> = self
            .slots()
            .into_iter()
            .filter(|s| s.descriptor.critical)
            .filter(|s| {
                self.hub
                    .state(s.id())
                    .is_some_and(|st| st.status() == SubsystemStatus::Failed)
            })
            .collect();

        let attempts = join_all(candidates.iter().map(|slot| self.recover_one(slot, policy))).await;
        attempts.into_iter().filter(|made| *made).count()
    }

    async fn recover_one(&self, slot: &Arc<Slot>, policy: RecoveryPolicy) -> bool {
        let Ok(_guard) = slot.try_transition() else {
            debug!(subsystem = slot.id(), "transition in progress, skipping recovery");
            return false;
        };

        // re-read under the lock
        let Some(state) = self.hub.state(slot.id()) else {
            return false;
        };
        if state.status() != SubsystemStatus::Failed {
            return false;
        }
        if !policy.eligible(state.restart_count(), state.last_restart_at(), Utc::now()) {
            return false;
        }

        let attempt = state.restart_count() + 1;
        self.bus.publish(
            Event::new(EventKind::RecoveryAttempt)
                .with_subsystem(slot.id())
                .with_attempt(attempt),
        );

        let res = runner::start_once(
            slot,
            &self.hub,
            &self.runtime_token,
            self.cfg.start_timeout(),
            Duration::ZERO,
        )
        .await;
        if matches!(&res, Err(e) if !e.is_retryable()) {
            // interrupted by shutdown; not charged to the budget
            debug!(subsystem = slot.id(), "recovery attempt canceled");
            return true;
        }
        let count = self.hub.record_restart(slot.id());

        match res {
            Ok(()) => {
                self.push_started(slot);
                info!(subsystem = slot.id(), attempt = count, "subsystem recovered");
            }
            Err(e) => {
                warn!(subsystem = slot.id(), attempt = count, error = %e, "recovery attempt failed");
                if count >= policy.max_attempts {
                    self.bus.publish(
                        Event::new(EventKind::RecoveryExhausted)
                            .with_subsystem(slot.id())
                            .with_attempt(count)
                            .with_severity(Severity::Critical),
                    );
                }
            }
        }
        true
    }

    pub(super) fn spawn_health_loop(self: &Arc<Self>) {
        let token = self.runtime_token.child_token();
        let weak = Arc::downgrade(self);
        let every = self.cfg.health_interval;
        let report_every = self.cfg.status_report_every;
        let loop_token = token.clone();

        let join = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // first tick completes immediately
            ticker.tick().await;

            let mut checks: u64 = 0;
            loop {
                tokio::select! {
                    _ = loop_token.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(ctrl) = weak.upgrade() else { break };
                        ctrl.check_health().await;
                        checks += 1;
                        if report_every > 0 && checks % u64::from(report_every) == 0 {
                            let snapshot = ctrl.status();
                            ctrl.write_report("status", &snapshot).await;
                        }
                    }
                }
            }
        });

        let prev = self
            .health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .replace(HealthLoop {
                token,
                join: Some(join),
            });
        if let Some(prev) = prev {
            prev.token.cancel();
        }
    }

    /// Takes the loop's join handle so the caller can watch it for crashes.
    pub(super) fn take_health_join(&self) -> Option<JoinHandle<()>> {
        self.health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_mut()
            .and_then(|h| h.join.take())
    }

    pub(super) fn cancel_health(&self) {
        if let Some(h) = self
            .health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            h.token.cancel();
        }
    }

    /// Cancels the loop and waits for it unless someone else holds its handle.
    pub(super) async fn halt_health_loop(&self) {
        let taken = self
            .health
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(HealthLoop { token, join }) = taken {
            token.cancel();
            if let Some(join) = join {
                let _ = join.await;
            }
        }
    }
}
