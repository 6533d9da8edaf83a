use crate::error::Result;
use crate::paths::SYNC_CONFLICT_INFIX;
use std::path::{Path, PathBuf};

/// Sync-conflict copies of `task_file` sitting next to it, sorted by name.
///
/// For `tickets.md` this matches `tickets.sync-conflict-<stamp>-<device>.md`.
pub fn find_conflict_files(task_file: &Path) -> Result<Vec<PathBuf>> {
    let dir = match task_file.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let Some(stem) = task_file.file_stem().and_then(|s| s.to_str()) else {
        return Ok(Vec::new());
    };
    let ext = task_file
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    let prefix = format!("{stem}{SYNC_CONFLICT_INFIX}");

    let mut found = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let name = entry.file_name();
        let Some(name) = name.to_str() else {
            continue;
        };
        if is_conflict_name(name, &prefix, &ext) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

fn is_conflict_name(name: &str, prefix: &str, ext: &str) -> bool {
    let Some(rest) = name.strip_prefix(prefix) else {
        return false;
    };
    if ext.is_empty() {
        // Without an extension the stamp itself must not contain another dot.
        return !rest.is_empty() && !rest.contains('.');
    }
    rest.strip_suffix(ext).is_some_and(|stamp| !stamp.is_empty())
}
