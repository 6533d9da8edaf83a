use crate::error::{Result, TicketsError};
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Intervals below this are accepted but flagged by `validate`: each cycle
/// issues one search per pending line against the tracker.
pub const MIN_RECOMMENDED_INTERVAL_SECS: u64 = 10;

// ---------------------------------------------------------------------------
// ConfigWarning / WarnLevel
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigWarning {
    pub level: WarnLevel,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WarnLevel {
    Warning,
    Error,
}

// ---------------------------------------------------------------------------
// PollConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollConfig {
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

fn default_interval_secs() -> u64 {
    300
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// TrackerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackerConfig {
    #[serde(default = "default_issue_type")]
    pub issue_type: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_issue_type() -> String {
    "Task".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            issue_type: default_issue_type(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

// ---------------------------------------------------------------------------
// ServerConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    3151
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

// ---------------------------------------------------------------------------
// Config (top-level)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default = "default_task_file")]
    pub task_file: PathBuf,
    #[serde(default = "default_secrets_file")]
    pub secrets_file: PathBuf,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

fn default_version() -> u32 {
    1
}

fn default_task_file() -> PathBuf {
    PathBuf::from(paths::DEFAULT_TASK_FILE)
}

fn default_secrets_file() -> PathBuf {
    PathBuf::from(paths::SECRETS_FILE)
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            task_file: default_task_file(),
            secrets_file: default_secrets_file(),
            poll: PollConfig::default(),
            tracker: TrackerConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    pub fn new(task_file: impl Into<PathBuf>) -> Self {
        Self {
            task_file: task_file.into(),
            ..Self::default()
        }
    }

    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Err(TicketsError::NotInitialized);
        }
        let data = std::fs::read_to_string(&path)?;
        let cfg: Config = serde_yaml::from_str(&data)?;
        Ok(cfg)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }

    /// Absolute path of the watched task file.
    pub fn task_file_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.task_file)
    }

    /// Absolute path of the secrets file.
    pub fn secrets_path(&self, root: &Path) -> PathBuf {
        paths::resolve(root, &self.secrets_file)
    }

    /// Check the config for common mistakes. Errors make the service unable
    /// to run; warnings are worth a look.
    pub fn validate(&self, root: &Path) -> Vec<ConfigWarning> {
        let mut warnings = Vec::new();

        if self.task_file.as_os_str().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "task_file is empty".to_string(),
            });
        } else if !self.task_file_path(root).exists() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "task file '{}' does not exist yet; cycles will be skipped until it does",
                    self.task_file_path(root).display()
                ),
            });
        }

        if self.poll.interval_secs == 0 {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "poll.interval_secs must be greater than zero".to_string(),
            });
        } else if self.poll.interval_secs < MIN_RECOMMENDED_INTERVAL_SECS {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "poll.interval_secs is {}s; anything below {}s polls the tracker very often",
                    self.poll.interval_secs, MIN_RECOMMENDED_INTERVAL_SECS
                ),
            });
        }

        if self.tracker.issue_type.trim().is_empty() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Error,
                message: "tracker.issue_type is empty".to_string(),
            });
        }

        if !self.secrets_path(root).exists() {
            warnings.push(ConfigWarning {
                level: WarnLevel::Warning,
                message: format!(
                    "secrets file '{}' not found; JIRA_* environment variables must be set",
                    self.secrets_path(root).display()
                ),
            });
        }

        warnings
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_match_service() {
        let cfg = Config::default();
        assert_eq!(cfg.poll.interval_secs, 300);
        assert_eq!(cfg.tracker.issue_type, "Task");
        assert_eq!(cfg.task_file, PathBuf::from("tickets.md"));
    }

    #[test]
    fn load_without_init_fails() {
        let dir = TempDir::new().unwrap();
        assert!(matches!(
            Config::load(dir.path()),
            Err(TicketsError::NotInitialized)
        ));
    }

    #[test]
    fn save_and_load() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::new("gtd/tickets.md");
        cfg.poll.interval_secs = 60;
        cfg.save(dir.path()).unwrap();

        let loaded = Config::load(dir.path()).unwrap();
        assert_eq!(loaded.task_file, PathBuf::from("gtd/tickets.md"));
        assert_eq!(loaded.poll.interval_secs, 60);
        assert_eq!(
            loaded.task_file_path(dir.path()),
            dir.path().join("gtd/tickets.md")
        );
    }

    #[test]
    fn sparse_yaml_fills_defaults() {
        let cfg: Config = serde_yaml::from_str("task_file: inbox.txt\n").unwrap();
        assert_eq!(cfg.task_file, PathBuf::from("inbox.txt"));
        assert_eq!(cfg.poll.interval_secs, 300);
        assert_eq!(cfg.server.port, 3151);
        assert_eq!(cfg.secrets_file, PathBuf::from(".tickets/secrets.json"));
    }

    #[test]
    fn validate_flags_zero_interval_as_error() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.poll.interval_secs = 0;
        let warnings = cfg.validate(dir.path());
        assert!(warnings
            .iter()
            .any(|w| w.level == WarnLevel::Error && w.message.contains("interval")));
    }

    #[test]
    fn validate_warns_on_short_interval_and_missing_files() {
        let dir = TempDir::new().unwrap();
        let mut cfg = Config::default();
        cfg.poll.interval_secs = 5;
        let warnings = cfg.validate(dir.path());
        assert!(warnings.iter().all(|w| w.level == WarnLevel::Warning));
        assert_eq!(warnings.len(), 3);
    }

    #[test]
    fn validate_clean_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("tickets.md"), "").unwrap();
        std::fs::create_dir_all(dir.path().join(".tickets")).unwrap();
        std::fs::write(dir.path().join(".tickets/secrets.json"), "{}").unwrap();
        let cfg = Config::default();
        assert!(cfg.validate(dir.path()).is_empty());
    }
}
