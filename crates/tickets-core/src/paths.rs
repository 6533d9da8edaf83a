use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Directory constants
// ---------------------------------------------------------------------------

pub const TICKETS_DIR: &str = ".tickets";

pub const CONFIG_FILE: &str = ".tickets/config.yaml";
pub const SECRETS_FILE: &str = ".tickets/secrets.json";
pub const DAEMON_FILE: &str = ".tickets/daemon.yaml";

pub const DEFAULT_TASK_FILE: &str = "tickets.md";

/// Infix Syncthing inserts between the stem and the extension of a file it
/// could not merge.
pub const SYNC_CONFLICT_INFIX: &str = ".sync-conflict-";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn tickets_dir(root: &Path) -> PathBuf {
    root.join(TICKETS_DIR)
}

pub fn config_path(root: &Path) -> PathBuf {
    root.join(CONFIG_FILE)
}

pub fn daemon_record_path(root: &Path) -> PathBuf {
    root.join(DAEMON_FILE)
}

/// Resolve a configured path against the project root. Absolute paths are
/// returned unchanged.
pub fn resolve(root: &Path, configured: &Path) -> PathBuf {
    if configured.is_absolute() {
        configured.to_path_buf()
    } else {
        root.join(configured)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
