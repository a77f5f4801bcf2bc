//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against an isolated data
//! directory and verify outputs.

use std::path::Path;
use std::process::Command;

use tempfile::TempDir;

/// Run a CLI command against the given data dir; returns (stdout, stderr, code).
fn run_cli(data_dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "nightshift-cli", "--quiet", "--"])
        .args(args)
        .env("NIGHTSHIFT_DATA_DIR", data_dir)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn blocker_add_list_remove_roundtrip() {
    let dir = TempDir::new().unwrap();

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &[
            "blocker", "add", "Night", "--start", "22:00", "--end", "06:30", "--days", "mon,tue",
            "--app", "com.example.doomscroll",
        ],
    );
    assert_eq!(code, 0, "blocker add failed: {stderr}");
    let outcome: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let id = outcome["schedule"]["id"].as_str().unwrap().to_string();

    let (stdout, stderr, code) = run_cli(dir.path(), &["blocker", "list"]);
    assert_eq!(code, 0, "blocker list failed: {stderr}");
    let schedules: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(schedules.as_array().unwrap().len(), 1);
    assert_eq!(schedules[0]["name"], "Night");

    let (_, stderr, code) = run_cli(dir.path(), &["blocker", "remove", &id]);
    assert_eq!(code, 0, "blocker remove failed: {stderr}");

    let (stdout, _, code) = run_cli(dir.path(), &["blocker", "list"]);
    assert_eq!(code, 0);
    let schedules: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(schedules.as_array().unwrap().is_empty());
}

#[test]
fn blocker_remove_unknown_id_fails() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["blocker", "remove", "no-such-id"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}

#[test]
fn snooze_roundtrip() {
    let dir = TempDir::new().unwrap();

    let (stdout, _, code) = run_cli(
        dir.path(),
        &["blocker", "add", "Night", "--start", "22:00", "--end", "06:30"],
    );
    assert_eq!(code, 0);
    let outcome: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let id = outcome["schedule"]["id"].as_str().unwrap().to_string();

    let (_, stderr, code) = run_cli(dir.path(), &["snooze", "start", &id, "--minutes", "45"]);
    assert_eq!(code, 0, "snooze start failed: {stderr}");

    let (stdout, _, code) = run_cli(dir.path(), &["snooze", "status"]);
    assert_eq!(code, 0);
    let status: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    // Readback is within seconds of now + 45 minutes.
    let remaining = status["remaining_secs"].as_i64().unwrap();
    assert!(remaining > 44 * 60 && remaining <= 45 * 60, "remaining: {remaining}");

    let (_, _, code) = run_cli(dir.path(), &["snooze", "end"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(dir.path(), &["snooze", "status"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("no snooze active"));
}

#[test]
fn sleep_settings_roundtrip() {
    let dir = TempDir::new().unwrap();

    let (_, stderr, code) = run_cli(
        dir.path(),
        &["sleep", "set", "--bed", "23:00", "--wake", "06:45"],
    );
    assert_eq!(code, 0, "sleep set failed: {stderr}");

    let (_, _, code) = run_cli(dir.path(), &["sleep", "enable"]);
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(dir.path(), &["sleep", "show"]);
    assert_eq!(code, 0);
    let settings: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(settings["enabled"], true);
    // 23:00 = 1380 minutes.
    assert_eq!(settings["times"][0]["bed"], 1380);
}

#[test]
fn config_get_set() {
    let dir = TempDir::new().unwrap();

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "probe.timeout_secs"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "5");

    let (_, _, code) = run_cli(
        dir.path(),
        &["config", "set", "bedtime.reminder_cadence_min", "10"],
    );
    assert_eq!(code, 0);

    let (stdout, _, code) = run_cli(dir.path(), &["config", "get", "bedtime.reminder_cadence_min"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "10");

    let (_, _, code) = run_cli(dir.path(), &["config", "get", "no.such.key"]);
    assert_eq!(code, 1);
}

#[test]
fn check_runs_offline() {
    let dir = TempDir::new().unwrap();

    // Point the probe at a dead port so the check is fast and offline.
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "probe.url", "http://127.0.0.1:1/"]);
    assert_eq!(code, 0);

    let (stdout, stderr, code) = run_cli(dir.path(), &["check"]);
    assert_eq!(code, 0, "check failed: {stderr}");
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["bedtime"], false);
}

#[test]
fn watch_supports_bounded_iterations() {
    let dir = TempDir::new().unwrap();
    let (_, _, code) = run_cli(dir.path(), &["config", "set", "probe.url", "http://127.0.0.1:1/"]);
    assert_eq!(code, 0);

    let (stdout, stderr, code) = run_cli(dir.path(), &["watch", "--iterations", "1"]);
    assert_eq!(code, 0, "watch failed: {stderr}");
    let round: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(round["round"], 0);
}

#[test]
fn streak_record_and_show() {
    let dir = TempDir::new().unwrap();

    let (stdout, stderr, code) = run_cli(
        dir.path(),
        &["streak", "record", "on-time", "--date", "2025-06-02"],
    );
    assert_eq!(code, 0, "streak record failed: {stderr}");
    let state: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(state["current"], 1);

    // Same night twice is a no-op.
    let (stdout, _, code) = run_cli(
        dir.path(),
        &["streak", "record", "on-time", "--date", "2025-06-02"],
    );
    assert_eq!(code, 0);
    let state: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(state["current"], 1);

    let (stdout, _, code) = run_cli(dir.path(), &["streak", "show"]);
    assert_eq!(code, 0);
    let state: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(state["best"], 1);
}

#[test]
fn stats_record_and_report() {
    let dir = TempDir::new().unwrap();

    let (_, stderr, code) = run_cli(
        dir.path(),
        &["stats", "record", "--date", "2025-06-02", "--alerted", "--quiet"],
    );
    assert_eq!(code, 0, "stats record failed: {stderr}");

    let (stdout, _, code) = run_cli(dir.path(), &["stats", "report"]);
    assert_eq!(code, 0);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["stats"]["total_nights"], 1);
    assert_eq!(report["stats"]["on_time"], 1);
}
