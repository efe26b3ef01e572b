use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn slots() -> Command {
    Command::cargo_bin("slots").unwrap()
}

fn json_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).unwrap()
}

const MONDAY_SCHEDULE: &str =
    r#"{"monday":[{"start":"09:00","end":"13:00"},{"start":"14:00","end":"18:00"}]}"#;

#[test]
fn test_plan_quarter_hour_slots() {
    let schedule = json_file(MONDAY_SCHEDULE);
    let output = slots()
        .args(["plan", "--date", "2026-03-16", "--slot-minutes", "15"])
        .args(["--now", "2026-03-16T07:00:00Z", "--schedule"])
        .arg(schedule.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let slots = stdout_json(&output);
    let slots = slots.as_array().unwrap();
    assert_eq!(slots.len(), 32);
    assert_eq!(slots[0]["start"], "2026-03-16T09:00:00Z");
    assert_eq!(slots[31]["end"], "2026-03-16T18:00:00Z");
    assert!(slots.iter().all(|s| s["is_available"] == true));
}

#[test]
fn test_plan_marks_booked_slots() {
    let schedule = json_file(MONDAY_SCHEDULE);
    let appointments = json_file(
        r#"[{"start":"2026-03-16T10:00:00Z","end":"2026-03-16T10:30:00Z","status":"confirmed"}]"#,
    );
    let output = slots()
        .args(["plan", "--date", "2026-03-16", "--slot-minutes", "15"])
        .args(["--now", "2026-03-16T07:00:00Z", "--schedule"])
        .arg(schedule.path())
        .arg("--appointments")
        .arg(appointments.path())
        .output()
        .unwrap();
    assert!(output.status.success());

    let slots = stdout_json(&output);
    let taken: Vec<&str> = slots
        .as_array()
        .unwrap()
        .iter()
        .filter(|s| s["is_available"] == false)
        .map(|s| s["start"].as_str().unwrap())
        .collect();
    assert_eq!(taken, ["2026-03-16T10:00:00Z", "2026-03-16T10:15:00Z"]);
}

#[test]
fn test_plan_schedule_from_stdin_and_grouping() {
    let output = slots()
        .args(["plan", "--date", "2026-03-16", "--schedule", "-", "--group"])
        .args(["--now", "2026-03-16T07:00:00Z"])
        .write_stdin(MONDAY_SCHEDULE)
        .output()
        .unwrap();
    assert!(output.status.success());

    let groups = stdout_json(&output);
    let hours: Vec<u64> = groups
        .as_array()
        .unwrap()
        .iter()
        .map(|g| g["hour"].as_u64().unwrap())
        .collect();
    assert_eq!(hours, [9, 10, 11, 12, 14, 15, 16, 17]);
}

#[test]
fn test_plan_default_window_on_friday() {
    let output = slots()
        .args(["plan", "--date", "2026-03-20", "--now", "2026-03-20T07:00:00Z"])
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(stdout_json(&output).as_array().unwrap().len(), 14);
}

#[test]
fn test_plan_weekend_is_empty() {
    slots()
        .args(["plan", "--date", "2026-03-21", "--now", "2026-03-16T07:00:00Z"])
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"));
}

#[test]
fn test_plan_bad_schedule_falls_back_to_empty() {
    let schedule = json_file(r#"{"monday":[{"start":"9am","end":"13:00"}]}"#);
    slots()
        .args(["plan", "--date", "2026-03-16", "--schedule"])
        .arg(schedule.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[]"))
        .stderr(predicate::str::contains("no availability shown"));
}

#[test]
fn test_plan_bad_schedule_strict_fails() {
    let schedule = json_file(r#"{"monday":[{"start":"9am","end":"13:00"}]}"#);
    slots()
        .args(["plan", "--strict", "--date", "2026-03-16", "--schedule"])
        .arg(schedule.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid format"));
}

#[test]
fn test_invalid_slot_minutes_rejected() {
    slots()
        .args(["plan", "--date", "2026-03-16", "--slot-minutes", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid configuration"));
}

#[test]
fn test_invalid_timezone_rejected() {
    slots()
        .args(["day", "--date", "2026-03-16", "--timezone", "Mars/Base"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown timezone"));
}

#[test]
fn test_expand_schedule() {
    let schedule = json_file(r#"{"tuesday":[{"start":"09:00","end":"10:00"}]}"#);
    let output = slots()
        .arg("expand")
        .arg("--schedule")
        .arg(schedule.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({"tuesday": ["09:00", "09:30"]})
    );
}

#[test]
fn test_compress_blocks_from_stdin() {
    let output = slots()
        .args(["compress", "--blocks", "-"])
        .write_stdin(r#"{"thursday":["09:00","10:00"],"wednesday":["09:00","09:30","10:00"]}"#)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({
            "wednesday": [{"start": "09:00", "end": "10:30"}],
            "thursday": [
                {"start": "09:00", "end": "09:30"},
                {"start": "10:00", "end": "10:30"}
            ]
        })
    );
}

#[test]
fn test_compress_rejects_off_grid_block() {
    slots()
        .args(["compress", "--blocks", "-"])
        .write_stdin(r#"{"monday":["09:10"]}"#)
        .assert()
        .failure()
        .stderr(predicate::str::contains("not on the 30-minute grid"));
}

#[test]
fn test_config_file_sets_block_size() {
    let config = json_file(r#"{"block_minutes":60}"#);
    let schedule = json_file(r#"{"monday":[{"start":"09:00","end":"11:00"}]}"#);
    let output = slots()
        .arg("--config")
        .arg(config.path())
        .arg("expand")
        .arg("--schedule")
        .arg(schedule.path())
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(
        stdout_json(&output),
        serde_json::json!({"monday": ["09:00", "10:00"]})
    );
}

#[test]
fn test_day_status() {
    slots()
        .args(["day", "--date", "2026-03-22"])
        .assert()
        .success()
        .stdout(predicate::str::contains("weekend"));

    let schedule = json_file(MONDAY_SCHEDULE);
    slots()
        .args(["day", "--date", "2026-03-17", "--schedule"])
        .arg(schedule.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("no_hours"));

    slots()
        .args(["day", "--date", "2026-03-16", "--schedule"])
        .arg(schedule.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("monday"));
}
