use crate::error::Result;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents a half-written task file if the process dies mid-cycle.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// Create a directory and all parents, idempotent.
pub fn ensure_dir(path: &Path) -> Result<()> {
    std::fs::create_dir_all(path)?;
    Ok(())
}

/// Write a file only if it does not already exist. Returns true if written.
pub fn write_if_missing(path: &Path, data: &[u8]) -> Result<bool> {
    if path.exists() {
        return Ok(false);
    }
    atomic_write(path, data)?;
    Ok(true)
}

/// Read a file as lines. A missing file reads as no lines.
pub fn read_lines(path: &Path) -> Result<Vec<String>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let content = std::fs::read_to_string(path)?;
    Ok(content.lines().map(str::to_string).collect())
}

/// Atomically replace a file's content with `lines`, one per line. A file
/// that used CRLF endings keeps them.
pub fn write_lines(path: &Path, lines: &[String]) -> Result<()> {
    let ending = if path.is_file() {
        line_ending(&std::fs::read_to_string(path)?)
    } else {
        "\n"
    };
    atomic_write(path, join_lines(lines, ending).as_bytes())
}

/// Append `lines` to a file, creating it if needed. Inserts a newline first
/// when the existing content does not end with one.
pub fn append_lines(path: &Path, lines: &[String]) -> Result<()> {
    if lines.is_empty() {
        return Ok(());
    }
    let existing = if path.exists() {
        std::fs::read_to_string(path)?
    } else {
        String::new()
    };
    let ending = line_ending(&existing);
    let sep = if existing.is_empty() || existing.ends_with('\n') {
        ""
    } else {
        ending
    };
    let mut f = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)?;
    write!(f, "{sep}{}", join_lines(lines, ending))?;
    Ok(())
}

/// The line ending `content` uses: CRLF if any line ends with it.
fn line_ending(content: &str) -> &'static str {
    if content.contains("\r\n") {
        "\r\n"
    } else {
        "\n"
    }
}

fn join_lines(lines: &[String], ending: &str) -> String {
    let mut out = String::new();
    for line in lines {
        out.push_str(line);
        out.push_str(ending);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.md");
        atomic_write(&path, b"buy milk").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "buy milk");
    }

    #[test]
    fn atomic_write_creates_parents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a/b/c/config.yaml");
        atomic_write(&path, b"data").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn write_if_missing_skips_existing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("existing.txt");
        std::fs::write(&path, b"original").unwrap();
        let written = write_if_missing(&path, b"new").unwrap();
        assert!(!written);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "original");
    }

    #[test]
    fn read_lines_of_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        assert!(read_lines(&dir.path().join("nope.md")).unwrap().is_empty());
    }

    #[test]
    fn write_lines_empty_truncates() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.md");
        std::fs::write(&path, "one\ntwo\n").unwrap();
        write_lines(&path, &[]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }

    #[test]
    fn append_lines_adds_separator_when_missing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.md");
        std::fs::write(&path, "first").unwrap();
        append_lines(&path, &["second".to_string(), "third".to_string()]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "first\nsecond\nthird\n"
        );
    }

    #[test]
    fn append_lines_creates_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("new.md");
        append_lines(&path, &["only".to_string()]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "only\n");
    }

    #[test]
    fn write_lines_keeps_crlf() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.md");
        std::fs::write(&path, "one\r\ntwo\r\n").unwrap();
        write_lines(&path, &["two".to_string()]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "two\r\n");
    }

    #[test]
    fn append_lines_matches_crlf_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tickets.md");
        std::fs::write(&path, "one\r\ntwo").unwrap();
        append_lines(&path, &["three".to_string()]).unwrap();
        assert_eq!(
            std::fs::read_to_string(&path).unwrap(),
            "one\r\ntwo\r\nthree\r\n"
        );
    }
}
