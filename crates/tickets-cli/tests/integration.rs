#![allow(deprecated)]
use assert_cmd::Command;
use mockito::Matcher;
use predicates::prelude::*;
use std::time::{Duration, Instant};
use tempfile::TempDir;

fn tickets(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("tickets").unwrap();
    cmd.current_dir(dir.path())
        .env("TICKETS_ROOT", dir.path())
        .env_remove("JIRA_SERVER")
        .env_remove("JIRA_EMAIL")
        .env_remove("JIRA_API_TOKEN")
        .env_remove("JIRA_PROJECT");
    cmd
}

fn with_jira(cmd: &mut Command, server: &str) {
    cmd.env("JIRA_SERVER", server)
        .env("JIRA_EMAIL", "me@acme.io")
        .env("JIRA_API_TOKEN", "secret-token")
        .env("JIRA_PROJECT", "OPS");
}

fn init_project(dir: &TempDir) {
    tickets(dir).arg("init").assert().success();
}

fn write_tasks(dir: &TempDir, content: &str) {
    std::fs::write(dir.path().join("tickets.md"), content).unwrap();
}

fn read_tasks(dir: &TempDir) -> String {
    std::fs::read_to_string(dir.path().join("tickets.md")).unwrap()
}

// ---------------------------------------------------------------------------
// tickets init
// ---------------------------------------------------------------------------

#[test]
fn init_creates_config_secrets_and_task_file() {
    let dir = TempDir::new().unwrap();
    tickets(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("created: .tickets/config.yaml"));

    assert!(dir.path().join(".tickets/config.yaml").exists());
    assert!(dir.path().join(".tickets/secrets.json").exists());
    assert!(dir.path().join("tickets.md").exists());
}

#[test]
fn init_is_idempotent_and_keeps_tasks() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_tasks(&dir, "Keep me\n");

    tickets(&dir)
        .arg("init")
        .assert()
        .success()
        .stdout(predicate::str::contains("exists:  .tickets/config.yaml"));
    assert_eq!(read_tasks(&dir), "Keep me\n");
}

#[test]
fn init_honors_custom_task_file() {
    let dir = TempDir::new().unwrap();
    tickets(&dir)
        .args(["init", "--task-file", "inbox.txt"])
        .assert()
        .success();

    assert!(dir.path().join("inbox.txt").exists());
    let config = std::fs::read_to_string(dir.path().join(".tickets/config.yaml")).unwrap();
    assert!(config.contains("inbox.txt"));
}

// ---------------------------------------------------------------------------
// tickets config
// ---------------------------------------------------------------------------

#[test]
fn config_validate_passes_after_init() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    tickets(&dir)
        .args(["config", "validate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Config is valid"));
}

#[test]
fn config_validate_fails_on_zero_interval() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    std::fs::write(
        dir.path().join(".tickets/config.yaml"),
        "task_file: tickets.md\npoll:\n  interval_secs: 0\n",
    )
    .unwrap();

    tickets(&dir)
        .args(["config", "validate"])
        .assert()
        .failure()
        .stdout(predicate::str::contains("[error]"))
        .stderr(predicate::str::contains("config validation found errors"));
}

#[test]
fn config_show_json() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    let out = tickets(&dir)
        .args(["--json", "config", "show"])
        .output()
        .unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["task_file"], "tickets.md");
    assert_eq!(value["poll"]["interval_secs"], 300);
}

#[test]
fn commands_fail_before_init() {
    let dir = TempDir::new().unwrap();
    tickets(&dir)
        .arg("preview")
        .assert()
        .failure()
        .stderr(predicate::str::contains("tickets init"));
}

// ---------------------------------------------------------------------------
// tickets preview
// ---------------------------------------------------------------------------

#[test]
fn preview_lists_pending_lines_without_changing_files() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_tasks(&dir, "Book dentist #health\n\n");
    std::fs::write(
        dir.path().join("tickets.sync-conflict-20240101-120000-ABCDEFG.md"),
        "Renew passport #admin\n",
    )
    .unwrap();

    let out = tickets(&dir).args(["--json", "preview"]).output().unwrap();
    assert!(out.status.success());
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    let pending = value["pending"].as_array().unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0]["summary"], "Book dentist");
    assert_eq!(pending[1]["labels"], serde_json::json!(["admin"]));

    assert_eq!(read_tasks(&dir), "Book dentist #health\n\n");
}

#[test]
fn preview_empty_file() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    tickets(&dir)
        .arg("preview")
        .assert()
        .success()
        .stdout(predicate::str::contains("Nothing pending"));
}

// ---------------------------------------------------------------------------
// tickets process
// ---------------------------------------------------------------------------

#[test]
fn process_creates_tickets_and_empties_file() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_tasks(&dir, "Rotate API keys #security\nWater plants\n");

    let mut server = mockito::Server::new();
    let search = server
        .mock("GET", "/rest/api/2/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"total":0,"issues":[]}"#)
        .expect(2)
        .create();
    let create = server
        .mock("POST", "/rest/api/2/issue")
        .with_status(201)
        .with_body(r#"{"id":"1","key":"OPS-1"}"#)
        .expect(2)
        .create();

    let mut cmd = tickets(&dir);
    with_jira(&mut cmd, &server.url());
    cmd.arg("process")
        .assert()
        .success()
        .stdout(predicate::str::contains("Created: OPS-1, OPS-1"));

    search.assert();
    create.assert();
    assert!(read_tasks(&dir).trim().is_empty());
}

#[test]
fn process_skips_lines_with_open_ticket() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_tasks(&dir, "Already filed\n");

    let mut server = mockito::Server::new();
    let _search = server
        .mock("GET", "/rest/api/2/search")
        .match_query(Matcher::Any)
        .with_status(200)
        .with_body(r#"{"total":1,"issues":[{"key":"OPS-3","fields":{"description":"Content-Hash: b6145a7b731a","status":{"name":"To Do"}}}]}"#)
        .create();
    let create = server
        .mock("POST", "/rest/api/2/issue")
        .expect(0)
        .create();

    let mut cmd = tickets(&dir);
    with_jira(&mut cmd, &server.url());
    let out = cmd.args(["--json", "process"]).output().unwrap();
    assert!(out.status.success());

    let report: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(report["files"][0]["duplicates"], serde_json::json!(["OPS-3"]));
    create.assert();
    assert!(read_tasks(&dir).trim().is_empty());
}

#[test]
fn process_keeps_lines_when_tracker_unreachable() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_tasks(&dir, "First\nSecond\n");

    let mut cmd = tickets(&dir);
    with_jira(&mut cmd, "http://127.0.0.1:1");
    cmd.arg("process")
        .assert()
        .failure()
        .stderr(predicate::str::contains("cycle stopped early"));

    assert_eq!(read_tasks(&dir), "First\nSecond\n");
}

#[test]
fn process_without_credentials_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    write_tasks(&dir, "Something\n");

    tickets(&dir)
        .arg("process")
        .assert()
        .failure()
        .stderr(predicate::str::contains("api_token"));
    assert_eq!(read_tasks(&dir), "Something\n");
}

// ---------------------------------------------------------------------------
// daemon control
// ---------------------------------------------------------------------------

#[test]
fn status_without_daemon_fails() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    tickets(&dir)
        .arg("status")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not running"));
}

#[test]
fn interval_zero_is_rejected() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);
    tickets(&dir)
        .args(["interval", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("greater than zero"));
}

#[test]
fn run_serves_control_surface_until_stopped() {
    let dir = TempDir::new().unwrap();
    init_project(&dir);

    let mut child = std::process::Command::new(assert_cmd::cargo::cargo_bin("tickets"))
        .args(["run", "--port", "0", "--interval", "3600"])
        .env("TICKETS_ROOT", dir.path())
        .env_remove("JIRA_SERVER")
        .env_remove("JIRA_EMAIL")
        .env_remove("JIRA_API_TOKEN")
        .env_remove("JIRA_PROJECT")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .spawn()
        .unwrap();

    let record = dir.path().join(".tickets/daemon.yaml");
    let deadline = Instant::now() + Duration::from_secs(10);
    while !record.exists() && Instant::now() < deadline {
        std::thread::sleep(Duration::from_millis(50));
    }
    assert!(record.exists(), "daemon record was not written");

    tickets(&dir)
        .args(["interval", "120"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Polling every 120s"));

    let out = tickets(&dir).args(["--json", "status"]).output().unwrap();
    assert!(out.status.success());
    let status: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(status["interval_secs"], 120);
    assert_eq!(status["running"], true);

    tickets(&dir).arg("stop").assert().success();

    let deadline = Instant::now() + Duration::from_secs(10);
    let exit = loop {
        if let Some(exit) = child.try_wait().unwrap() {
            break Some(exit);
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            break None;
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert!(exit.is_some_and(|s| s.success()), "daemon did not exit cleanly");
    assert!(!record.exists());
}
