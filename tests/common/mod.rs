#![allow(dead_code)]

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use subvisor::{
    ControllerConfig, Emitter, Event, Registry, SubsystemContext, SubsystemDescriptor,
    SubsystemError, SubsystemFn, SubsystemRef,
};
use tokio::sync::broadcast;

/// Shared log of `start:<id>` / `stop:<id>` invocations.
#[derive(Clone, Default)]
pub struct CallLog(Arc<Mutex<Vec<String>>>);

impl CallLog {
    pub fn push(&self, entry: String) {
        self.0.lock().unwrap().push(entry);
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn with_prefix(&self, prefix: &str) -> Vec<String> {
        self.entries()
            .into_iter()
            .filter_map(|e| e.strip_prefix(prefix).map(str::to_string))
            .collect()
    }

    pub fn starts(&self) -> Vec<String> {
        self.with_prefix("start:")
    }

    pub fn stops(&self) -> Vec<String> {
        self.with_prefix("stop:")
    }
}

/// Switchable fake: `start` succeeds while `healthy` is set; the last
/// context's emitter and token are kept for the test to poke at.
#[derive(Clone)]
pub struct Fake {
    pub id: String,
    pub log: CallLog,
    pub healthy: Arc<AtomicBool>,
    pub ctx: Arc<Mutex<Option<SubsystemContext>>>,
}

impl Fake {
    pub fn new(id: &str, log: &CallLog) -> Self {
        Self {
            id: id.to_string(),
            log: log.clone(),
            healthy: Arc::new(AtomicBool::new(true)),
            ctx: Arc::new(Mutex::new(None)),
        }
    }

    pub fn failing(id: &str, log: &CallLog) -> Self {
        let fake = Self::new(id, log);
        fake.set_healthy(false);
        fake
    }

    pub fn set_healthy(&self, healthy: bool) {
        self.healthy.store(healthy, Ordering::SeqCst);
    }

    pub fn emitter(&self) -> Emitter {
        self.ctx
            .lock()
            .unwrap()
            .as_ref()
            .expect("started at least once")
            .emitter()
            .clone()
    }

    pub fn subsystem(&self) -> SubsystemRef {
        let start = self.clone();
        let stop = self.clone();
        SubsystemFn::arc(
            self.id.clone(),
            move |ctx: SubsystemContext| {
                let fake = start.clone();
                async move {
                    fake.log.push(format!("start:{}", fake.id));
                    *fake.ctx.lock().unwrap() = Some(ctx);
                    if fake.healthy.load(Ordering::SeqCst) {
                        Ok(())
                    } else {
                        Err(SubsystemError::start("boom"))
                    }
                }
            },
            move || {
                let fake = stop.clone();
                async move {
                    fake.log.push(format!("stop:{}", fake.id));
                    Ok(())
                }
            },
        )
    }
}

pub fn registry(fakes: &[&Fake]) -> Registry {
    fakes
        .iter()
        .fold(Registry::new(), |reg, f| reg.with_instance(f.id.clone(), f.subsystem()))
}

pub fn config(subsystems: Vec<SubsystemDescriptor>, report_dir: &Path) -> ControllerConfig {
    ControllerConfig {
        subsystems,
        report_dir: report_dir.to_path_buf(),
        health_interval: Duration::from_secs(3600),
        restart_delay: Duration::from_secs(5),
        ..ControllerConfig::default()
    }
}

pub fn drain(rx: &mut broadcast::Receiver<Event>) -> Vec<Event> {
    let mut out = Vec::new();
    while let Ok(ev) = rx.try_recv() {
        out.push(ev);
    }
    out
}
