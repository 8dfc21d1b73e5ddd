//! # Startup and status reports.
//!
//! A [`StatusSnapshot`] is what `Controller::status()` returns and what gets
//! persisted as pretty JSON under the configured report directory:
//! `<report_dir>/<kind>-<timestamp>-<n>.json`, where `kind` is `startup` or
//! `status` and `n` is a process-wide counter keeping names unique.
//! Reports are write-only; nothing reads them back.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::ControllerError;
use crate::hub::{AggregateHealth, HubMetrics, SystemStatus};

static REPORT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Point-in-time view of the whole controller.
#[derive(Debug, Clone, Serialize)]
pub struct StatusSnapshot {
    pub timestamp: DateTime<Utc>,
    pub running: bool,
    pub health: AggregateHealth,
    pub systems: Vec<SystemStatus>,
    pub metrics: HubMetrics,
}

impl StatusSnapshot {
    pub fn system(&self, id: &str) -> Option<&SystemStatus> {
        self.systems.iter().find(|s| s.id == id)
    }
}

/// Writes `snapshot` to `dir`, creating the directory if needed.
pub(crate) async fn write_report(
    dir: &Path,
    kind: &str,
    snapshot: &StatusSnapshot,
) -> Result<PathBuf, ControllerError> {
    tokio::fs::create_dir_all(dir).await?;

    let stamp = snapshot.timestamp.format("%Y%m%dT%H%M%S%.3fZ");
    let n = REPORT_SEQ.fetch_add(1, Ordering::Relaxed);
    let path = dir.join(format!("{kind}-{stamp}-{n}.json"));
    let body = serde_json::to_vec_pretty(snapshot).map_err(io::Error::from)?;
    tokio::fs::write(&path, body).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_snapshot() -> StatusSnapshot {
        StatusSnapshot {
            timestamp: Utc::now(),
            running: true,
            health: AggregateHealth {
                overall: 0.0,
                healthy: 0,
                total: 0,
                critical_systems_ok: true,
            },
            systems: Vec::new(),
            metrics: HubMetrics::default(),
        }
    }

    #[tokio::test]
    async fn test_write_report_creates_dir_and_json() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let dir = tmp.path().join("reports/automation");
        let snapshot = empty_snapshot();

        let path = write_report(&dir, "startup", &snapshot).await.expect("written");
        assert!(path.starts_with(&dir));
        assert!(
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with("startup-") && n.ends_with(".json"))
        );

        let body = std::fs::read_to_string(&path).expect("readable");
        let json: serde_json::Value = serde_json::from_str(&body).expect("json");
        assert_eq!(json["running"], serde_json::json!(true));
        assert_eq!(json["metrics"]["total_events"], serde_json::json!(0));
    }

    #[tokio::test]
    async fn test_same_instant_reports_do_not_overwrite() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let snapshot = empty_snapshot();

        let a = write_report(tmp.path(), "status", &snapshot).await.expect("first");
        let b = write_report(tmp.path(), "status", &snapshot).await.expect("second");
        assert_ne!(a, b);
        assert_eq!(std::fs::read_dir(tmp.path()).expect("dir").count(), 2);
    }
}
