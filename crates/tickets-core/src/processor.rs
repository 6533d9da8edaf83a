//! One processing cycle over the task file and its sync-conflict copies.
//!
//! Every non-blank line becomes a ticket unless an open ticket already
//! carries the line's content hash. Lines are removed from their file once
//! they are accounted for; anything the tracker failed on stays put for the
//! next cycle. Conflict copies are drained the same way, their leftovers are
//! appended to the task file and the copy is deleted.

use crate::config::Config;
use crate::conflict::find_conflict_files;
use crate::error::Result;
use crate::io;
use crate::jira::JiraClient;
use crate::secrets::JiraSecrets;
use crate::task_line::TaskLine;
use crate::tracker::{NewTicket, TicketRef, Tracker};
use chrono::Local;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// What happened to the lines of one file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileReport {
    pub path: PathBuf,
    /// Keys of tickets created from this file.
    pub created: Vec<String>,
    /// Keys of open tickets that already carried a line's hash.
    pub duplicates: Vec<String>,
    /// Lines identical to one already handled earlier in the cycle.
    pub repeated: usize,
    pub blank: usize,
    /// Lines left in place for the next cycle.
    pub kept: usize,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<String>,
}

impl FileReport {
    fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ..Self::default()
        }
    }

    /// Lines removed from the file this cycle.
    pub fn consumed(&self) -> usize {
        self.created.len() + self.duplicates.len() + self.repeated + self.blank
    }
}

/// Outcome of a whole cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleReport {
    pub task_file: PathBuf,
    pub task_file_missing: bool,
    pub files: Vec<FileReport>,
    /// Conflict copies merged and deleted.
    pub conflicts_resolved: usize,
    /// Set when the tracker became unreachable and the cycle stopped early.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub halted: Option<String>,
}

impl CycleReport {
    pub fn created(&self) -> usize {
        self.files.iter().map(|f| f.created.len()).sum()
    }

    pub fn duplicates(&self) -> usize {
        self.files.iter().map(|f| f.duplicates.len()).sum()
    }

    pub fn kept(&self) -> usize {
        self.files.iter().map(|f| f.kept).sum()
    }

    /// Tasks accounted for: created or matched to an open ticket.
    pub fn processed(&self) -> usize {
        self.files
            .iter()
            .map(|f| f.created.len() + f.duplicates.len() + f.repeated)
            .sum()
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

/// Run one cycle for the project at `root` against Jira.
///
/// Config and secrets are re-read every time so edits apply on the next
/// cycle without a restart.
pub fn process_project(root: &Path) -> Result<CycleReport> {
    let config = Config::load(root)?;
    let secrets = JiraSecrets::load(&config.secrets_path(root))?;
    let client = JiraClient::new(
        &secrets,
        &config.tracker.issue_type,
        Duration::from_secs(config.tracker.timeout_secs),
    )?;
    process_file(&config.task_file_path(root), &client)
}

/// Run one cycle over `task_file` and any sync-conflict copies beside it.
pub fn process_file<T: Tracker>(task_file: &Path, tracker: T) -> Result<CycleReport> {
    Processor::new(tracker).run(task_file)
}

/// A line waiting to be turned into a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingLine {
    pub path: PathBuf,
    #[serde(flatten)]
    pub line: TaskLine,
}

/// Parse the task file and its conflict copies without touching the tracker
/// or the files.
pub fn preview(task_file: &Path) -> Result<Vec<PendingLine>> {
    let mut sources = vec![task_file.to_path_buf()];
    sources.extend(find_conflict_files(task_file)?);

    let mut pending = Vec::new();
    for path in sources {
        for raw in io::read_lines(&path)? {
            if let Some(line) = TaskLine::parse(&raw) {
                pending.push(PendingLine {
                    path: path.clone(),
                    line,
                });
            }
        }
    }
    Ok(pending)
}

enum Outcome {
    Blank,
    Repeated,
    Duplicate(TicketRef),
    Created(TicketRef),
    Kept(Option<String>),
}

struct Processor<T> {
    tracker: T,
    seen: HashSet<String>,
    halted: Option<String>,
}

impl<T: Tracker> Processor<T> {
    fn new(tracker: T) -> Self {
        Self {
            tracker,
            seen: HashSet::new(),
            halted: None,
        }
    }

    fn run(mut self, task_file: &Path) -> Result<CycleReport> {
        let mut report = CycleReport {
            task_file: task_file.to_path_buf(),
            ..CycleReport::default()
        };

        if !task_file.is_file() {
            tracing::warn!("task file {} not found", task_file.display());
            report.task_file_missing = true;
            return Ok(report);
        }

        tracing::info!("processing task file {}", task_file.display());
        let (file_report, leftovers) = self.drain(task_file)?;
        if file_report.consumed() > 0 {
            io::write_lines(task_file, &leftovers)?;
        }
        report.files.push(file_report);

        for conflict in find_conflict_files(task_file)? {
            tracing::info!("processing sync conflict file {}", conflict.display());
            let (file_report, leftovers) = self.drain(&conflict)?;
            report.files.push(file_report);

            if let Err(e) = merge_leftovers(task_file, &leftovers) {
                tracing::warn!(
                    "could not merge {} into {}: {e}; keeping conflict file",
                    conflict.display(),
                    task_file.display()
                );
                if let Err(e) = io::write_lines(&conflict, &leftovers) {
                    tracing::warn!("failed to rewrite {}: {e}", conflict.display());
                }
                continue;
            }
            match std::fs::remove_file(&conflict) {
                Ok(()) => {
                    tracing::info!("deleted sync conflict file {}", conflict.display());
                    report.conflicts_resolved += 1;
                }
                Err(e) => {
                    // Leftovers are already in the task file; a second pass
                    // over this copy would only find duplicates.
                    tracing::warn!("failed to delete {}: {e}", conflict.display());
                }
            }
        }

        report.halted = self.halted.take();
        tracing::info!(
            "cycle done: {} created, {} duplicate, {} kept",
            report.created(),
            report.duplicates(),
            report.kept()
        );
        Ok(report)
    }

    /// Handle every line of `path`. Returns the report and the file's
    /// current lines minus the ones consumed, so edits made while the cycle
    /// ran are preserved.
    fn drain(&mut self, path: &Path) -> Result<(FileReport, Vec<String>)> {
        let mut report = FileReport::new(path);
        let mut consumed: Vec<String> = Vec::new();

        for raw in io::read_lines(path)? {
            match self.handle_line(&raw) {
                Outcome::Blank => report.blank += 1,
                Outcome::Repeated => report.repeated += 1,
                Outcome::Duplicate(t) => report.duplicates.push(t.key),
                Outcome::Created(t) => report.created.push(t.key),
                Outcome::Kept(err) => {
                    report.kept += 1;
                    report.errors.extend(err);
                    continue;
                }
            }
            consumed.push(raw);
        }

        let leftovers = remove_consumed(io::read_lines(path)?, &consumed);
        Ok((report, leftovers))
    }

    fn handle_line(&mut self, raw: &str) -> Outcome {
        let Some(line) = TaskLine::parse(raw) else {
            return Outcome::Blank;
        };
        if self.seen.contains(&line.content_hash) {
            tracing::debug!("repeated line {} in this cycle", line.content_hash);
            return Outcome::Repeated;
        }
        if self.halted.is_some() {
            return Outcome::Kept(None);
        }

        match self.tracker.find_open_by_hash(&line.content_hash) {
            Ok(Some(existing)) => {
                tracing::info!(
                    "skipping duplicate content {} - open ticket exists: {}",
                    line.content_hash,
                    existing.key
                );
                self.seen.insert(line.content_hash);
                Outcome::Duplicate(existing)
            }
            Ok(None) => {
                let ticket = NewTicket::from_line(&line, Local::now());
                match self.tracker.create(&ticket) {
                    Ok(created) => {
                        let labels = if line.labels.is_empty() {
                            String::new()
                        } else {
                            format!(" with labels: {}", line.labels.join(", "))
                        };
                        tracing::info!(
                            "created {} for content hash {}: {}{labels}",
                            created.key,
                            line.content_hash,
                            line.summary
                        );
                        self.seen.insert(line.content_hash);
                        Outcome::Created(created)
                    }
                    Err(e) => self.fail(&line, e),
                }
            }
            Err(e) => self.fail(&line, e),
        }
    }

    fn fail(&mut self, line: &TaskLine, err: crate::TicketsError) -> Outcome {
        tracing::warn!("failed to create ticket for '{}': {err}", line.raw);
        let msg = format!("{}: {err}", line.content_hash);
        if err.is_unreachable() {
            tracing::warn!("tracker unavailable; leaving remaining lines for the next cycle");
            self.halted = Some(err.to_string());
        }
        Outcome::Kept(Some(msg))
    }
}

/// Append conflict leftovers to the task file, skipping content it already
/// holds. Returns the number of lines appended.
fn merge_leftovers(task_file: &Path, leftovers: &[String]) -> Result<usize> {
    let mut present: HashSet<String> = io::read_lines(task_file)?
        .iter()
        .filter_map(|raw| TaskLine::parse(raw))
        .map(|line| line.content_hash)
        .collect();
    let fresh: Vec<String> = leftovers
        .iter()
        .filter(|raw| TaskLine::parse(raw).is_some_and(|line| present.insert(line.content_hash)))
        .cloned()
        .collect();
    if fresh.len() < leftovers.len() {
        tracing::debug!(
            "{} conflict line(s) already pending in {}",
            leftovers.len() - fresh.len(),
            task_file.display()
        );
    }
    io::append_lines(task_file, &fresh)?;
    Ok(fresh.len())
}

/// `current` with one occurrence of each `consumed` line removed.
fn remove_consumed(current: Vec<String>, consumed: &[String]) -> Vec<String> {
    let mut pending: HashMap<&str, usize> = HashMap::new();
    for line in consumed {
        *pending.entry(line.as_str()).or_insert(0) += 1;
    }
    let mut out = Vec::with_capacity(current.len());
    for line in current {
        if let Some(n) = pending.get_mut(line.as_str()) {
            if *n > 0 {
                *n -= 1;
                continue;
            }
        }
        out.push(line);
    }
    out
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
