use crate::error::Result;
use crate::io::atomic_write;
use crate::paths::daemon_record_path;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// DaemonRecord
// ---------------------------------------------------------------------------

/// Where a running `tickets run` can be reached. Lives at
/// `.tickets/daemon.yaml` for as long as the daemon is up.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DaemonRecord {
    pub root: PathBuf,
    pub pid: u32,
    pub port: u16,
    pub url: String,
    pub started_at: DateTime<Utc>,
}

impl DaemonRecord {
    pub fn new(root: &Path, port: u16) -> Self {
        Self {
            root: root.to_path_buf(),
            pid: std::process::id(),
            port,
            url: format!("http://127.0.0.1:{port}"),
            started_at: Utc::now(),
        }
    }

    pub fn write(&self) -> Result<()> {
        let data = serde_yaml::to_string(self)?;
        atomic_write(&daemon_record_path(&self.root), data.as_bytes())
    }

    /// Remove this record file. Silently succeeds if the file is gone.
    pub fn remove(&self) -> Result<()> {
        let path = daemon_record_path(&self.root);
        if path.exists() {
            std::fs::remove_file(&path)?;
        }
        Ok(())
    }

    pub fn read(root: &Path) -> Result<Option<Self>> {
        let path = daemon_record_path(root);
        if !path.exists() {
            return Ok(None);
        }
        let data = std::fs::read_to_string(&path)?;
        Ok(Some(serde_yaml::from_str(&data)?))
    }
}

// ---------------------------------------------------------------------------
// PID helpers (Unix only)
// ---------------------------------------------------------------------------

/// Check whether a process with `pid` is alive.
#[cfg(unix)]
pub fn is_pid_alive(pid: u32) -> bool {
    std::process::Command::new("kill")
        .args(["-0", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(not(unix))]
pub fn is_pid_alive(_pid: u32) -> bool {
    true
}
