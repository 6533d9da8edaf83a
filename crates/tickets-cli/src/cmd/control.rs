//! Talk to a running `tickets run` through its control server.

use crate::output::print_json;
use anyhow::{anyhow, bail};
use std::path::Path;
use tickets_core::daemon::{is_pid_alive, DaemonRecord};
use tickets_server::StatusSnapshot;

pub fn status(root: &Path, json: bool) -> anyhow::Result<()> {
    let url = daemon_url(root)?;
    let value = send(ureq::get(&format!("{url}/api/status")), None)?;
    if json {
        return print_json(&value);
    }
    print_status(&serde_json::from_value(value)?);
    Ok(())
}

pub fn trigger(root: &Path, json: bool) -> anyhow::Result<()> {
    let url = daemon_url(root)?;
    let value = send(ureq::post(&format!("{url}/api/process")), None)?;
    if json {
        return print_json(&value);
    }
    println!("Processing started.");
    Ok(())
}

pub fn interval(root: &Path, seconds: u64, json: bool) -> anyhow::Result<()> {
    if seconds == 0 {
        bail!("interval must be greater than zero");
    }
    let url = daemon_url(root)?;
    let value = send(
        ureq::put(&format!("{url}/api/interval")),
        Some(serde_json::json!({ "seconds": seconds })),
    )?;
    if json {
        return print_json(&value);
    }
    println!("Polling every {seconds}s.");
    Ok(())
}

pub fn stop(root: &Path, json: bool) -> anyhow::Result<()> {
    let url = daemon_url(root)?;
    let value = send(ureq::post(&format!("{url}/api/shutdown")), None)?;
    if json {
        return print_json(&value);
    }
    println!("Stopping tickets daemon.");
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn daemon_url(root: &Path) -> anyhow::Result<String> {
    let record = DaemonRecord::read(root)?
        .ok_or_else(|| anyhow!("tickets is not running (start it with `tickets run`)"))?;
    if !is_pid_alive(record.pid) {
        let _ = record.remove();
        bail!("tickets is not running (stale record removed)");
    }
    Ok(record.url)
}

fn send(req: ureq::Request, body: Option<serde_json::Value>) -> anyhow::Result<serde_json::Value> {
    let result = match body {
        Some(body) => req.send_json(body),
        None => req.call(),
    };
    match result {
        Ok(resp) => Ok(resp.into_json()?),
        Err(ureq::Error::Status(code, resp)) => {
            let body: serde_json::Value = resp.into_json().unwrap_or_default();
            let msg = body["error"].as_str().unwrap_or("request failed").to_string();
            Err(anyhow!("daemon returned {code}: {msg}"))
        }
        Err(e) => Err(anyhow!("failed to reach tickets daemon: {e}")),
    }
}

fn print_status(status: &StatusSnapshot) {
    let state = if status.processing { "processing" } else { "idle" };
    let last_run = status
        .last_run
        .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| "never".to_string());

    println!("State:     {state}");
    println!("Interval:  {}s", status.interval_secs);
    println!("Cycles:    {}", status.cycles);
    println!("Last run:  {last_run}");
    if let Some(report) = &status.last_report {
        println!(
            "Last cycle: {} created, {} duplicate, {} kept",
            report.created(),
            report.duplicates(),
            report.kept()
        );
    }
    if let Some(err) = &status.last_error {
        println!("Last error: {err}");
    }
}
