//! # Controller configuration.
//!
//! [`ControllerConfig`] holds every static setting of the controller: the
//! managed subsystem set and the supervision knobs. `Default` reproduces the
//! standard six-subsystem deployment.
//!
//! ## Sentinel values
//! - `start_timeout = 0s` → no start timeout (`start_timeout()` returns `None`)
//! - `stop_timeout = 0s` → no stop timeout
//! - `status_report_every = 0` → no periodic status reports
//!
//! ## File form
//! [`ControllerConfig::from_toml_str`] / [`ControllerConfig::load`] read a TOML
//! document; durations are given in milliseconds and every key is optional:
//!
//! ```toml
//! health_interval_ms = 30000
//! max_restart_attempts = 5
//!
//! [recovery_backoff]
//! first_ms = 60000
//! max_ms = 900000
//! factor = 2.0
//! jitter = "equal"
//!
//! [[subsystems]]
//! id = "health-monitoring"
//! name = "Health Monitoring"
//! critical = true
//! delay_ms = 0
//! ```
//!
//! A present `[[subsystems]]` array replaces the default set entirely.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::ControllerError;
use crate::policies::{BackoffPolicy, JitterPolicy, RecoveryPolicy};
use crate::subsystems::SubsystemDescriptor;

/// Static configuration of the controller.
///
/// All fields are public; prefer the accessors over checking sentinels inline.
#[derive(Clone, Debug)]
pub struct ControllerConfig {
    /// Managed subsystems in configuration order.
    pub subsystems: Vec<SubsystemDescriptor>,

    /// Period of the health supervisor.
    pub health_interval: Duration,

    /// Upper bound on automatic restarts per subsystem.
    pub max_restart_attempts: u32,

    /// Whether the health supervisor attempts recovery at all.
    pub auto_restart: bool,

    /// A running subsystem silent for longer than this is not healthy.
    pub responsiveness_window: Duration,

    /// Pause between stop and start in `restart_system`.
    pub restart_delay: Duration,

    /// Maximum duration of one `start()` call (`0s` = unbounded).
    pub start_timeout: Duration,

    /// Maximum duration of one `stop()` call (`0s` = unbounded).
    pub stop_timeout: Duration,

    /// How long the emergency path waits for the concurrent stops.
    pub emergency_grace: Duration,

    /// Optional spacing between recovery attempts.
    pub recovery_backoff: Option<BackoffPolicy>,

    /// Capacity of the event bus ring buffer (min 1; clamped by Bus).
    pub bus_capacity: usize,

    /// Directory for startup and status reports.
    pub report_dir: PathBuf,

    /// Write a status report every N health checks (`0` = never).
    pub status_report_every: u32,
}

impl ControllerConfig {
    /// Returns the start timeout as an `Option` (`None` when zero).
    #[inline]
    pub fn start_timeout(&self) -> Option<Duration> {
        (self.start_timeout > Duration::ZERO).then_some(self.start_timeout)
    }

    /// Returns the stop timeout as an `Option` (`None` when zero).
    #[inline]
    pub fn stop_timeout(&self) -> Option<Duration> {
        (self.stop_timeout > Duration::ZERO).then_some(self.stop_timeout)
    }

    /// Recovery policy derived from `auto_restart`, `max_restart_attempts`
    /// and `recovery_backoff`.
    pub fn recovery_policy(&self) -> RecoveryPolicy {
        RecoveryPolicy {
            enabled: self.auto_restart,
            max_attempts: self.max_restart_attempts,
            backoff: self.recovery_backoff,
        }
    }

    /// Bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Descriptor of `id`, if configured.
    pub fn descriptor(&self, id: &str) -> Option<&SubsystemDescriptor> {
        self.subsystems.iter().find(|d| d.id == id)
    }

    /// Rejects empty or duplicate subsystem ids and a zero health interval.
    pub fn validate(&self) -> Result<(), ControllerError> {
        let mut seen = HashSet::new();
        for d in &self.subsystems {
            if d.id.is_empty() {
                return Err(ControllerError::Config {
                    reason: "subsystem id must not be empty".into(),
                });
            }
            if !seen.insert(d.id.as_str()) {
                return Err(ControllerError::Config {
                    reason: format!("duplicate subsystem id '{}'", d.id),
                });
            }
        }
        if self.health_interval.is_zero() {
            return Err(ControllerError::Config {
                reason: "health_interval must be positive".into(),
            });
        }
        Ok(())
    }

    /// Parses a TOML document; absent keys keep their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ControllerError> {
        let file: FileConfig = toml::from_str(s).map_err(|e| ControllerError::Config {
            reason: e.to_string(),
        })?;
        let cfg = file.into_config();
        cfg.validate()?;
        Ok(cfg)
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ControllerError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ControllerError::Config {
            reason: format!("{}: {e}", path.display()),
        })?;
        Self::from_toml_str(&text)
    }
}

impl Default for ControllerConfig {
    /// The standard deployment:
    ///
    /// | id | critical | delay |
    /// |---|---|---|
    /// | health-monitoring | yes | 0s |
    /// | github-deployment | yes | 5s |
    /// | sports-ingestion | yes | 10s |
    /// | ai-orchestrator | no | 15s |
    /// | report-pipeline | no | 20s |
    /// | security-backup | no | 25s |
    ///
    /// Health every 60s, 3 restarts, 5 min responsiveness window.
    fn default() -> Self {
        let secs = Duration::from_secs;
        Self {
            subsystems: vec![
                SubsystemDescriptor::new("health-monitoring", "Health Monitoring").critical(),
                SubsystemDescriptor::new("github-deployment", "GitHub Deployment")
                    .critical()
                    .with_delay(secs(5)),
                SubsystemDescriptor::new("sports-ingestion", "Sports Data Ingestion")
                    .critical()
                    .with_delay(secs(10)),
                SubsystemDescriptor::new("ai-orchestrator", "AI Task Orchestrator")
                    .with_delay(secs(15)),
                SubsystemDescriptor::new("report-pipeline", "Report Pipeline")
                    .with_delay(secs(20)),
                SubsystemDescriptor::new("security-backup", "Security & Backup")
                    .with_delay(secs(25)),
            ],
            health_interval: secs(60),
            max_restart_attempts: 3,
            auto_restart: true,
            responsiveness_window: secs(5 * 60),
            restart_delay: secs(5),
            start_timeout: secs(60),
            stop_timeout: secs(30),
            emergency_grace: secs(5),
            recovery_backoff: None,
            bus_capacity: 1024,
            report_dir: PathBuf::from("reports/automation"),
            status_report_every: 0,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    health_interval_ms: Option<u64>,
    max_restart_attempts: Option<u32>,
    auto_restart: Option<bool>,
    responsiveness_window_ms: Option<u64>,
    restart_delay_ms: Option<u64>,
    start_timeout_ms: Option<u64>,
    stop_timeout_ms: Option<u64>,
    emergency_grace_ms: Option<u64>,
    recovery_backoff: Option<FileBackoff>,
    bus_capacity: Option<usize>,
    report_dir: Option<PathBuf>,
    status_report_every: Option<u32>,
    subsystems: Option<Vec<FileSubsystem>>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileBackoff {
    first_ms: u64,
    max_ms: u64,
    #[serde(default = "default_factor")]
    factor: f64,
    #[serde(default)]
    jitter: JitterPolicy,
}

fn default_factor() -> f64 {
    2.0
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSubsystem {
    id: String,
    name: Option<String>,
    #[serde(default = "default_enabled")]
    enabled: bool,
    #[serde(default)]
    critical: bool,
    #[serde(default)]
    delay_ms: u64,
}

fn default_enabled() -> bool {
    true
}

impl FileConfig {
    fn into_config(self) -> ControllerConfig {
        let mut cfg = ControllerConfig::default();
        let ms = Duration::from_millis;

        if let Some(v) = self.health_interval_ms {
            cfg.health_interval = ms(v);
        }
        if let Some(v) = self.max_restart_attempts {
            cfg.max_restart_attempts = v;
        }
        if let Some(v) = self.auto_restart {
            cfg.auto_restart = v;
        }
        if let Some(v) = self.responsiveness_window_ms {
            cfg.responsiveness_window = ms(v);
        }
        if let Some(v) = self.restart_delay_ms {
            cfg.restart_delay = ms(v);
        }
        if let Some(v) = self.start_timeout_ms {
            cfg.start_timeout = ms(v);
        }
        if let Some(v) = self.stop_timeout_ms {
            cfg.stop_timeout = ms(v);
        }
        if let Some(v) = self.emergency_grace_ms {
            cfg.emergency_grace = ms(v);
        }
        if let Some(b) = self.recovery_backoff {
            cfg.recovery_backoff = Some(BackoffPolicy {
                first: ms(b.first_ms),
                max: ms(b.max_ms),
                factor: b.factor,
                jitter: b.jitter,
            });
        }
        if let Some(v) = self.bus_capacity {
            cfg.bus_capacity = v;
        }
        if let Some(v) = self.report_dir {
            cfg.report_dir = v;
        }
        if let Some(v) = self.status_report_every {
            cfg.status_report_every = v;
        }
        if let Some(subs) = self.subsystems {
            cfg.subsystems = subs
                .into_iter()
                .map(|s| {
                    let name = s.name.unwrap_or_else(|| s.id.clone());
                    let mut d = SubsystemDescriptor::new(s.id, name).with_delay(ms(s.delay_ms));
                    d.enabled = s.enabled;
                    d.critical = s.critical;
                    d
                })
                .collect();
        }
        cfg
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = ControllerConfig::default();
        let ids: Vec<&str> = cfg.subsystems.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(
            ids,
            [
                "health-monitoring",
                "github-deployment",
                "sports-ingestion",
                "ai-orchestrator",
                "report-pipeline",
                "security-backup",
            ]
        );
        assert_eq!(cfg.subsystems.iter().filter(|d| d.critical).count(), 3);
        assert_eq!(cfg.start_timeout(), Some(Duration::from_secs(60)));
        assert_eq!(cfg.recovery_policy(), RecoveryPolicy::default());
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn test_zero_timeouts_disable() {
        let cfg = ControllerConfig {
            start_timeout: Duration::ZERO,
            stop_timeout: Duration::ZERO,
            ..ControllerConfig::default()
        };
        assert_eq!(cfg.start_timeout(), None);
        assert_eq!(cfg.stop_timeout(), None);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let mut cfg = ControllerConfig::default();
        cfg.subsystems
            .push(SubsystemDescriptor::new("report-pipeline", "Again"));
        let err = cfg.validate().err().expect("duplicate");
        assert_eq!(err.as_label(), "controller_invalid_config");
    }

    #[test]
    fn test_toml_overrides() {
        let cfg = ControllerConfig::from_toml_str(
            r#"
            health_interval_ms = 1500
            auto_restart = false
            report_dir = "/tmp/reports"

            [recovery_backoff]
            first_ms = 1000
            max_ms = 8000
            jitter = "full"

            [[subsystems]]
            id = "a"
            critical = true

            [[subsystems]]
            id = "b"
            name = "Bee"
            enabled = false
            delay_ms = 250
            "#,
        )
        .expect("valid toml");

        assert_eq!(cfg.health_interval, Duration::from_millis(1500));
        assert!(!cfg.auto_restart);
        assert_eq!(cfg.max_restart_attempts, 3);
        assert_eq!(cfg.report_dir, PathBuf::from("/tmp/reports"));

        let backoff = cfg.recovery_backoff.expect("backoff");
        assert_eq!(backoff.factor, 2.0);
        assert_eq!(backoff.jitter, JitterPolicy::Full);

        assert_eq!(cfg.subsystems.len(), 2);
        assert_eq!(cfg.subsystems[0].display_name, "a");
        assert!(cfg.subsystems[0].critical);
        assert!(!cfg.subsystems[1].enabled);
        assert_eq!(cfg.subsystems[1].startup_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(ControllerConfig::from_toml_str("health_interval = 5").is_err());
    }
}
