//! # PeriodicAdapter: a subsystem driven by a fixed-interval loop.
//!
//! Backs the built-in subsystems. On `start` it spawns a loop that emits
//! `<prefix>:started`, then the configured completion event once per tick with
//! a `{"cycle": n}` payload. `stop` cancels the loop, waits for it and emits
//! `<prefix>:stopped`.
//!
//! ```text
//! start(ctx) ─► emit "<prefix>:started" ─► spawn loop
//!                                             ├─ tick ─► emit "<event>" {"cycle": n}
//!                                             └─ cancelled ─► exit
//! stop()     ─► cancel ─► join ─► emit "<prefix>:stopped"
//! ```
//!
//! Starting an adapter whose loop is still live is a no-op; a loop whose
//! token was cancelled is replaced.

use std::borrow::Cow;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

use crate::error::SubsystemError;
use crate::hub::Emitter;

use super::subsystem::{Subsystem, SubsystemContext};

struct Running {
    token: CancellationToken,
    handle: JoinHandle<()>,
    emitter: Emitter,
}

pub struct PeriodicAdapter {
    id: String,
    prefix: Cow<'static, str>,
    event: Cow<'static, str>,
    interval: Duration,
    running: Mutex<Option<Running>>,
}

impl PeriodicAdapter {
    pub fn new(
        id: impl Into<String>,
        prefix: impl Into<Cow<'static, str>>,
        event: impl Into<Cow<'static, str>>,
        interval: Duration,
    ) -> Self {
        Self {
            id: id.into(),
            prefix: prefix.into(),
            event: event.into(),
            interval: interval.max(Duration::from_millis(1)),
            running: Mutex::new(None),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    async fn run(emitter: Emitter, event: String, every: Duration, token: CancellationToken) {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // first tick completes immediately
        ticker.tick().await;

        let mut cycle: u64 = 0;
        loop {
            tokio::select! {
                _ = token.cancelled() => break,
                _ = ticker.tick() => {
                    cycle += 1;
                    emitter.emit_with(event.as_str(), json!({ "cycle": cycle }));
                }
            }
        }
    }
}

#[async_trait]
impl Subsystem for PeriodicAdapter {
    fn id(&self) -> &str {
        &self.id
    }

    async fn start(&self, ctx: SubsystemContext) -> Result<(), SubsystemError> {
        let mut running = self.running.lock().unwrap_or_else(PoisonError::into_inner);
        let live = running
            .as_ref()
            .is_some_and(|r| !r.token.is_cancelled() && !r.handle.is_finished());
        if live {
            return Ok(());
        }

        let emitter = ctx.emitter().clone();
        let token = ctx.token().child_token();
        emitter.emit(format!("{}:started", self.prefix));

        let handle = tokio::spawn(Self::run(
            emitter.clone(),
            self.event.to_string(),
            self.interval,
            token.clone(),
        ));
        *running = Some(Running {
            token,
            handle,
            emitter,
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), SubsystemError> {
        let taken = self
            .running
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        let Some(Running {
            token,
            handle,
            emitter,
        }) = taken
        else {
            return Ok(());
        };

        token.cancel();
        handle
            .await
            .map_err(|e| SubsystemError::stop(format!("loop task failed: {e}")))?;
        emitter.emit(format!("{}:stopped", self.prefix));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::Bus;
    use crate::hub::EventHub;
    use crate::subsystems::SubsystemDescriptor;

    #[tokio::test(start_paused = true)]
    async fn test_emits_completion_each_tick() {
        let hub = EventHub::new(Bus::new(64), Duration::from_secs(300));
        let emitter = hub.register_system(&SubsystemDescriptor::new("health-monitoring", "Health"));
        let adapter = PeriodicAdapter::new(
            "health-monitoring",
            "health",
            "health:check:complete",
            Duration::from_secs(30),
        );

        let token = CancellationToken::new();
        adapter
            .start(SubsystemContext::new(emitter, token))
            .await
            .expect("start");

        tokio::time::sleep(Duration::from_secs(95)).await;
        adapter.stop().await.expect("stop");

        // started + 3 completions + stopped
        let m = hub.metrics();
        assert_eq!(m.total_events, 5);
        assert_eq!(m.success_events, 3);
        assert_eq!(m.alerts_raised, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_without_start_is_noop() {
        let adapter = PeriodicAdapter::new("x", "x", "x:complete", Duration::ZERO);
        assert_eq!(adapter.interval(), Duration::from_millis(1));
        adapter.stop().await.expect("noop stop");
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_cancellation_ends_loop() {
        let hub = EventHub::new(Bus::new(64), Duration::from_secs(300));
        let emitter = hub.register_system(&SubsystemDescriptor::new("ai", "AI"));
        let adapter = PeriodicAdapter::new("ai", "ai", "ai:task:completed", Duration::from_secs(10));

        let parent = CancellationToken::new();
        adapter
            .start(SubsystemContext::new(emitter, parent.clone()))
            .await
            .expect("start");
        parent.cancel();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(hub.metrics().success_events, 0);
        adapter.stop().await.expect("stop");
    }
}
