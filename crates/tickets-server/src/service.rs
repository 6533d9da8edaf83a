//! The polling scheduler and the status it exposes.
//!
//! One cycle runs at a time. The scheduler runs a cycle, sleeps for the
//! configured interval and repeats; a manual trigger starts a cycle straight
//! away unless one is already in flight.

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tickets_core::processor::CycleReport;
use tokio::sync::watch;

/// Runs one processing cycle. Called on a blocking thread.
pub type CycleFn = Arc<dyn Fn() -> tickets_core::Result<CycleReport> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Indicator {
    Idle,
    Processing,
}

/// Snapshot served by `GET /api/status`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub running: bool,
    pub processing: bool,
    pub indicator: Indicator,
    pub interval_secs: u64,
    pub cycles: u64,
    pub last_run: Option<DateTime<Local>>,
    pub last_error: Option<String>,
    pub last_report: Option<CycleReport>,
}

#[derive(Default)]
struct History {
    cycles: u64,
    last_run: Option<DateTime<Local>>,
    last_error: Option<String>,
    last_report: Option<CycleReport>,
}

struct Shared {
    cycle: CycleFn,
    running: AtomicBool,
    processing: AtomicBool,
    history: Mutex<History>,
    interval: watch::Sender<Duration>,
    shutdown: watch::Sender<bool>,
}

/// Cheap-to-clone handle to the scheduler state.
#[derive(Clone)]
pub struct ServiceHandle {
    shared: Arc<Shared>,
}

impl ServiceHandle {
    pub fn new(cycle: CycleFn, interval: Duration) -> Self {
        let (interval, _) = watch::channel(interval);
        let (shutdown, _) = watch::channel(false);
        Self {
            shared: Arc::new(Shared {
                cycle,
                running: AtomicBool::new(false),
                processing: AtomicBool::new(false),
                history: Mutex::new(History::default()),
                interval,
                shutdown,
            }),
        }
    }

    pub fn status(&self) -> StatusSnapshot {
        let processing = self.is_processing();
        let history = self
            .shared
            .history
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        StatusSnapshot {
            running: self.shared.running.load(Ordering::SeqCst),
            processing,
            indicator: if processing {
                Indicator::Processing
            } else {
                Indicator::Idle
            },
            interval_secs: self.interval().as_secs(),
            cycles: history.cycles,
            last_run: history.last_run,
            last_error: history.last_error.clone(),
            last_report: history.last_report.clone(),
        }
    }

    pub fn is_processing(&self) -> bool {
        self.shared.processing.load(Ordering::SeqCst)
    }

    pub fn interval(&self) -> Duration {
        *self.shared.interval.borrow()
    }

    /// Change the polling interval. The pending sleep restarts with the new
    /// value.
    pub fn set_interval(&self, interval: Duration) {
        tracing::info!("polling interval set to {}s", interval.as_secs());
        self.shared.interval.send_replace(interval);
    }

    /// Start a cycle now on a background task. Returns false if one is
    /// already running.
    pub fn trigger(&self) -> bool {
        if !self.try_begin() {
            return false;
        }
        let this = self.clone();
        tokio::spawn(async move { this.execute().await });
        true
    }

    /// Run one cycle to completion. Returns false without doing anything if
    /// a cycle is already running.
    pub async fn run_cycle(&self) -> bool {
        if !self.try_begin() {
            tracing::debug!("cycle already running; skipping");
            return false;
        }
        self.execute().await;
        true
    }

    pub fn shutdown(&self) {
        tracing::info!("shutdown requested");
        self.shared.shutdown.send_replace(true);
    }

    pub fn is_shutdown(&self) -> bool {
        *self.shared.shutdown.borrow()
    }

    /// Resolves once `shutdown` has been called.
    pub async fn wait_shutdown(&self) {
        let mut rx = self.shared.shutdown.subscribe();
        let _ = rx.wait_for(|stop| *stop).await;
    }

    /// Scheduler loop: cycle, sleep, repeat until shutdown.
    pub async fn run(&self) {
        self.shared.running.store(true, Ordering::SeqCst);
        let mut interval_rx = self.shared.interval.subscribe();

        'outer: while !self.is_shutdown() {
            self.run_cycle().await;

            loop {
                let interval = *interval_rx.borrow_and_update();
                tokio::select! {
                    _ = tokio::time::sleep(interval) => break,
                    changed = interval_rx.changed() => {
                        if changed.is_err() {
                            break 'outer;
                        }
                    }
                    _ = self.wait_shutdown() => break 'outer,
                }
            }
        }

        self.shared.running.store(false, Ordering::SeqCst);
        tracing::info!("scheduler stopped");
    }

    fn try_begin(&self) -> bool {
        self.shared
            .processing
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    async fn execute(&self) {
        let cycle = Arc::clone(&self.shared.cycle);
        let result = tokio::task::spawn_blocking(move || cycle()).await;

        {
            let mut history = self
                .shared
                .history
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            history.cycles += 1;
            history.last_run = Some(Local::now());
            match result {
                Ok(Ok(report)) => {
                    history.last_error = report.halted.clone();
                    history.last_report = Some(report);
                }
                Ok(Err(e)) => {
                    tracing::warn!("error processing tickets: {e}");
                    history.last_error = Some(e.to_string());
                }
                Err(e) => {
                    tracing::error!("processing cycle panicked: {e}");
                    history.last_error = Some(format!("cycle panicked: {e}"));
                }
            }
        }

        self.shared.processing.store(false, Ordering::SeqCst);
    }
}
