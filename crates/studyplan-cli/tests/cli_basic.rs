//! Basic CLI E2E tests.
//!
//! Tests invoke the built binary with an isolated config directory and
//! verify outputs.

use std::io::{BufRead, BufReader};
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use std::time::{Duration, Instant};

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(config_dir: &Path, args: &[&str]) -> (i32, String, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_studyplan-cli"))
        .args(args)
        .env("STUDYPLAN_CONFIG_DIR", config_dir)
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

const WEEK_REQUEST: &str = r#"{
    "period_start": "2024-01-01",
    "period_end": "2024-01-07",
    "blocks": [
        {"day_of_week": 1, "start_time": "18:00", "end_time": "20:00"},
        {"day_of_week": 2, "start_time": "18:00", "end_time": "20:00"},
        {"day_of_week": 3, "start_time": "18:00", "end_time": "20:00"},
        {"day_of_week": 4, "start_time": "18:00", "end_time": "20:00"},
        {"day_of_week": 5, "start_time": "18:00", "end_time": "20:00"}
    ],
    "exclusions": [{"date": "2024-01-03", "type": "vacation"}],
    "academy_schedules": [
        {"day_of_week": 1, "start_time": "18:00", "end_time": "19:00", "label": "tutoring"}
    ],
    "scheduler_options": {"review_cadence": 1000}
}"#;

fn write_request(dir: &Path, name: &str, body: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_compute_json() {
    let dir = tempfile::tempdir().unwrap();
    let request = write_request(dir.path(), "week.json", WEEK_REQUEST);

    let (code, stdout, stderr) = run_cli(dir.path(), &["compute", &request, "--json"]);
    assert_eq!(code, 0, "compute failed: {stderr}");

    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let days = result["daily_schedule"].as_array().unwrap();
    assert_eq!(days.len(), 7);
    assert_eq!(days[0]["time_slots"][0]["type"], "academy");
    assert_eq!(days[0]["time_slots"][1]["type"], "study");
    assert_eq!(days[2]["day_type"], "vacation");
    assert_eq!(result["summary"]["total_study_hours"], 7.0);
    assert_eq!(result["summary"]["total_exclusion_days"]["vacation"], 1);
}

#[test]
fn test_compute_table_uses_configured_locale() {
    let dir = tempfile::tempdir().unwrap();
    let request = write_request(dir.path(), "week.json", WEEK_REQUEST);

    let (code, stdout, _) = run_cli(dir.path(), &["compute", &request]);
    assert_eq!(code, 0);
    assert!(stdout.contains("2024-01-01"));
    assert!(stdout.contains("Vacation"));
    assert!(stdout.contains("18:00-19:00 Academy (tutoring)"));

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "display.locale", "ko"]);
    assert_eq!(code, 0);
    let (code, stdout, _) = run_cli(dir.path(), &["compute", &request]);
    assert_eq!(code, 0);
    assert!(stdout.contains("휴가"));
    assert!(stdout.contains("학원일정"));
}

#[test]
fn test_compute_resolves_block_set_and_writes_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let request = write_request(
        dir.path(),
        "request.json",
        r#"{"period_start": "2024-01-01", "period_end": "2024-01-02", "block_set_id": "evenings"}"#,
    );
    let sets = write_request(
        dir.path(),
        "sets.json",
        r#"[{"id": "evenings", "name": "Evenings", "blocks": [
            {"day_of_week": 1, "start_time": "19:00", "end_time": "21:00"}
        ]}]"#,
    );
    let snapshots = dir.path().join("snapshots");
    let snapshots_arg = snapshots.to_string_lossy().to_string();

    let (code, stdout, stderr) = run_cli(
        dir.path(),
        &[
            "compute",
            &request,
            "--block-sets",
            &sets,
            "--json",
            "--snapshot",
            &snapshots_arg,
            "--plan-id",
            "plan-7",
        ],
    );
    assert_eq!(code, 0, "compute failed: {stderr}");
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["summary"]["total_study_hours"], 2.0);

    let stored = std::fs::read_to_string(snapshots.join("plan-7.json")).unwrap();
    let stored: serde_json::Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored, result);
}

#[test]
fn test_compute_missing_template_fails() {
    let dir = tempfile::tempdir().unwrap();
    let request = write_request(
        dir.path(),
        "request.json",
        r#"{"period_start": "2024-01-01", "period_end": "2024-01-07"}"#,
    );

    let (code, _, stderr) = run_cli(dir.path(), &["compute", &request]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
    assert!(stderr.contains("No weekly template"));
}

#[test]
fn test_compute_template_mode_uses_config_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let request = write_request(
        dir.path(),
        "request.json",
        r#"{"period_start": "2024-01-01", "period_end": "2024-01-06", "is_template_mode": true}"#,
    );
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "scheduler.review_cadence", "3"]);
    assert_eq!(code, 0);

    let (code, stdout, _) = run_cli(dir.path(), &["compute", &request, "--json"]);
    assert_eq!(code, 0);
    let result: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(result["summary"]["total_review_days"], 2);
    assert_eq!(result["summary"]["total_study_days"], 4);
}

#[test]
fn test_compute_watch_recomputes_on_change() {
    let dir = tempfile::tempdir().unwrap();
    let request = write_request(dir.path(), "week.json", WEEK_REQUEST);
    let (code, _, _) = run_cli(dir.path(), &["config", "set", "debounce.quiet_period_ms", "50"]);
    assert_eq!(code, 0);

    let mut child = Command::new(env!("CARGO_BIN_EXE_studyplan-cli"))
        .args(["compute", &request, "--watch", "--max-updates", "2"])
        .env("STUDYPLAN_CONFIG_DIR", dir.path())
        .env_remove("RUST_LOG")
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("Failed to spawn CLI");

    let stdout = child.stdout.take().unwrap();
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in BufReader::new(stdout).lines().map_while(Result::ok) {
            if tx.send(line).is_err() {
                break;
            }
        }
    });

    let mut lines = Vec::new();
    let deadline = Instant::now() + Duration::from_secs(30);
    while !lines.iter().any(|l: &String| l.starts_with("Period:")) {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match rx.recv_timeout(remaining) {
            Ok(line) => lines.push(line),
            Err(_) => {
                let _ = child.kill();
                panic!("no first outcome, got {lines:?}");
            }
        }
    }

    std::fs::write(&request, WEEK_REQUEST.replace("2024-01-07", "2024-01-03")).unwrap();

    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            let _ = child.kill();
            panic!("watch did not stop after two updates");
        }
        std::thread::sleep(Duration::from_millis(50));
    };
    assert!(status.success());
    lines.extend(rx.iter());

    assert!(lines.iter().any(|l| l.starts_with("== generation 1")));
    assert!(lines.iter().any(|l| l.starts_with("== generation 2")));
    assert!(lines.contains(&"Period: 2024-01-01 .. 2024-01-07 (7 days)".to_string()));
    assert!(lines.contains(&"Period: 2024-01-01 .. 2024-01-03 (3 days)".to_string()));
}

#[test]
fn test_template_show() {
    let dir = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(dir.path(), &["template", "show"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("standard@1"));
    assert!(stdout.contains("10:00-12:00, 13:00-19:00"));

    let (code, stdout, _) = run_cli(dir.path(), &["template", "show", "--json"]);
    assert_eq!(code, 0);
    let json: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(json["blocks"].as_array().unwrap().len(), 14);
}

#[test]
fn test_config_get_set_reset() {
    let dir = tempfile::tempdir().unwrap();

    let (code, stdout, _) = run_cli(dir.path(), &["config", "get", "cache.policy"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "lru");

    let (code, _, _) = run_cli(dir.path(), &["config", "set", "cache.policy", "latest"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "cache.policy"]);
    assert_eq!(stdout.trim(), "latest");

    let (code, stdout, _) = run_cli(dir.path(), &["config", "list"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("cache.policy = latest"));
    assert!(stdout.contains("scheduler.self_study_window = none"));

    let (code, _, _) = run_cli(dir.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(dir.path(), &["config", "get", "cache.policy"]);
    assert_eq!(stdout.trim(), "lru");
}

#[test]
fn test_config_rejects_bad_input() {
    let dir = tempfile::tempdir().unwrap();

    let (code, _, stderr) = run_cli(dir.path(), &["config", "get", "nope.nothing"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown config key"));

    let (code, _, stderr) = run_cli(dir.path(), &["config", "set", "display.locale", "fr"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"));
}
