//! Basic CLI E2E tests.
//!
//! Tests run the built binary against a throwaway data directory and verify
//! outputs.

use std::path::Path;
use std::process::Command;
use std::time::Duration;

use liftoff_core::Database;
use serde_json::Value;

/// Run a CLI command with `home` as the data directory.
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_liftoff-cli"))
        .args(args)
        .env("LIFTOFF_HOME", home)
        .env_remove("LIFTOFF_REWARDS_TOKEN")
        .env_remove("LIFTOFF_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(home: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(home, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    stdout
}

/// Commands print one or more pretty-printed JSON documents.
fn json_documents(stdout: &str) -> Vec<Value> {
    serde_json::Deserializer::from_str(stdout)
        .into_iter::<Value>()
        .collect::<Result<_, _>>()
        .expect("stdout is not a JSON stream")
}

fn last_json(stdout: &str) -> Value {
    json_documents(stdout).pop().expect("no JSON output")
}

fn write_plan(home: &Path, body: &str) -> String {
    let path = home.join("plan.toml");
    std::fs::write(&path, body).unwrap();
    path.to_string_lossy().into_owned()
}

/// Rewrite the stored active session in place.
fn edit_stored_session(home: &Path, edit: impl FnOnce(&mut Value)) {
    let db = Database::open_at(&home.join("liftoff.db")).unwrap();
    let raw = db.kv_get("active_session").unwrap().expect("no stored session");
    let mut session: Value = serde_json::from_str(&raw).unwrap();
    edit(&mut session);
    db.kv_set("active_session", &session.to_string()).unwrap();
}

/// Start a session from `plan` and walk it to completion. Returns the
/// session id.
fn complete_session(home: &Path, plan: &str) -> String {
    let started = json_documents(&run_ok(home, &["session", "start", "--plan", plan]));
    for _ in 0..3 {
        run_ok(home, &["session", "advance"]);
        run_ok(home, &["session", "skip-rest"]);
    }
    started[0]["session_id"].as_str().unwrap().to_string()
}

const TWO_EXERCISE_PLAN: &str = r#"
workout_id = "w-cli"

[[exercises]]
id = "a"
target_sets = 2

[exercises.exercise]
id = "ex-row"
name = "Row"

[[exercises]]
id = "b"

[exercises.exercise]
id = "ex-dip"
name = "Dip"
"#;

#[test]
fn test_plan_sample_and_show() {
    let home = tempfile::tempdir().unwrap();
    let sample = run_ok(home.path(), &["plan", "sample"]);
    assert!(sample.contains("workout_id = \"sample-full-body\""));

    let shown = last_json(&run_ok(home.path(), &["plan", "show"]));
    assert_eq!(shown["total_exercises"], 3);
    assert_eq!(shown["total_sets"], 6);
}

#[test]
fn test_plan_show_rejects_empty_plan() {
    let home = tempfile::tempdir().unwrap();
    let plan = write_plan(home.path(), "workout_id = \"w\"\nexercises = []\n");
    let (_, stderr, code) = run_cli(home.path(), &["plan", "show", &plan]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Empty collection"), "stderr: {stderr}");

    // An unreadable session can still be thrown away.
    run_ok(home.path(), &["session", "abandon"]);
    let (_, stderr, _) = run_cli(home.path(), &["session", "status"]);
    assert!(stderr.contains("no active session"));
}

#[test]
fn test_commands_require_active_session() {
    let home = tempfile::tempdir().unwrap();
    let (_, stderr, code) = run_cli(home.path(), &["session", "advance"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no active session"));
}

#[test]
fn test_session_walkthrough() {
    let home = tempfile::tempdir().unwrap();
    let plan = write_plan(home.path(), TWO_EXERCISE_PLAN);

    let started = json_documents(&run_ok(home.path(), &["session", "start", "--plan", &plan]));
    assert_eq!(started[0]["type"], "session_started");
    assert_eq!(started[0]["total_sets"], 3);

    // A second start without --force is refused.
    let (_, _, code) = run_cli(home.path(), &["session", "start", "--plan", &plan]);
    assert_ne!(code, 0);

    let ignored = last_json(&run_ok(home.path(), &["session", "retreat"]));
    assert_eq!(ignored["type"], "state_snapshot");
    assert_eq!(ignored["state"]["set_number"], 1);

    let rest = last_json(&run_ok(home.path(), &["session", "advance"]));
    assert_eq!(rest["type"], "rest_started");
    assert_eq!(rest["set_number"], 2);

    let status = last_json(&run_ok(home.path(), &["session", "status"]));
    assert_eq!(status["phase"], "resting");

    // Advancing while resting is ignored.
    let ignored = last_json(&run_ok(home.path(), &["session", "advance"]));
    assert_eq!(ignored["type"], "state_snapshot");

    let skipped = last_json(&run_ok(home.path(), &["session", "skip-rest"]));
    assert_eq!(skipped["type"], "rest_skipped");

    run_ok(home.path(), &["session", "advance"]);
    run_ok(home.path(), &["session", "skip-rest"]);
    let done = last_json(&run_ok(home.path(), &["session", "advance"]));
    assert_eq!(done["type"], "session_completed");
    assert_eq!(done["report"]["total_completed_sets"], 3);
    assert_eq!(done["report"]["reference_id"], "w-cli");

    // No endpoint configured: submission fails, session stays complete.
    let (_, stderr, code) = run_cli(home.path(), &["session", "submit"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("rewards.endpoint"), "stderr: {stderr}");
    let status = last_json(&run_ok(home.path(), &["session", "status"]));
    assert_eq!(status["phase"], "complete");

    let ended = last_json(&run_ok(home.path(), &["session", "abandon"]));
    assert_eq!(ended["type"], "session_ended");
    assert_eq!(ended["completed"], true);
}

#[test]
fn test_submit_records_history() {
    let home = tempfile::tempdir().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/rewards")
        .with_status(200)
        .with_body(
            r#"{"success":true,"data":{"pointsGained":15,"newLevel":1,"newAchievements":[],"newBadges":["First Workout"]}}"#,
        )
        .expect(1)
        .create();

    let endpoint = format!("{}/rewards", server.url());
    run_ok(home.path(), &["config", "set", "rewards.endpoint", &endpoint]);

    let plan = write_plan(home.path(), TWO_EXERCISE_PLAN);
    run_ok(home.path(), &["session", "start", "--plan", &plan]);
    for _ in 0..3 {
        run_ok(home.path(), &["session", "advance"]);
        run_ok(home.path(), &["session", "skip-rest"]);
    }

    let message = run_ok(home.path(), &["session", "submit"]);
    assert!(message.starts_with("Workout Complete!"));
    assert!(message.contains("You earned 15 points!"));
    assert!(message.contains("New Badges: First Workout"));
    assert!(!message.contains("Achievements"));
    mock.assert();

    // The acknowledged session is gone; rewards cannot be claimed twice.
    let (_, _, code) = run_cli(home.path(), &["session", "submit"]);
    assert_ne!(code, 0);

    let stats = last_json(&run_ok(home.path(), &["history", "stats"]));
    assert_eq!(stats["total_workouts"], 1);
    assert_eq!(stats["total_sets"], 3);
    assert_eq!(stats["current_level"], 1);
}

#[test]
fn test_config_get_set() {
    let home = tempfile::tempdir().unwrap();
    assert_eq!(run_ok(home.path(), &["config", "get", "rewards.max_attempts"]).trim(), "3");
    run_ok(home.path(), &["config", "set", "rewards.max_attempts", "5"]);
    assert_eq!(run_ok(home.path(), &["config", "get", "rewards.max_attempts"]).trim(), "5");

    let (_, _, code) = run_cli(home.path(), &["config", "set", "rewards.bogus", "1"]);
    assert_ne!(code, 0);
    let (_, _, code) = run_cli(home.path(), &["config", "set", "rest.sample_interval_ms", "0"]);
    assert_ne!(code, 0);
}

#[test]
fn test_submit_refused_while_another_claim_is_pending() {
    let home = tempfile::tempdir().unwrap();
    let mut server = mockito::Server::new();
    let mock = server
        .mock("POST", "/rewards")
        .with_status(200)
        .with_body(r#"{"success":true,"data":{"pointsGained":5,"newLevel":2}}"#)
        .expect(1)
        .create();
    let endpoint = format!("{}/rewards", server.url());
    run_ok(home.path(), &["config", "set", "rewards.endpoint", &endpoint]);

    let plan = write_plan(home.path(), TWO_EXERCISE_PLAN);
    let session_id = complete_session(home.path(), &plan);

    // Another process is mid-request for this session.
    let db = Database::open_at(&home.path().join("liftoff.db")).unwrap();
    let now_ms = chrono::Utc::now().timestamp_millis() as u64;
    assert!(db
        .claim_submission(session_id.parse().unwrap(), now_ms, Duration::from_secs(60))
        .unwrap());

    let (_, stderr, code) = run_cli(home.path(), &["session", "submit"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("already in flight"), "stderr: {stderr}");
    let status = last_json(&run_ok(home.path(), &["session", "status"]));
    assert_eq!(status["phase"], "complete");

    db.release_submission(session_id.parse().unwrap()).unwrap();
    let message = run_ok(home.path(), &["session", "submit"]);
    assert!(message.starts_with("Workout Complete!"));
    mock.assert();
}

#[test]
fn test_submit_finishes_rewarded_but_unrecorded_session() {
    let home = tempfile::tempdir().unwrap();
    let plan = write_plan(home.path(), TWO_EXERCISE_PLAN);
    complete_session(home.path(), &plan);

    // The service granted rewards but recording the workout failed.
    edit_stored_session(home.path(), |session| {
        session["latch"]["accepted"] = serde_json::json!({
            "points_gained": 20,
            "new_level": 3,
            "new_achievements": ["Consistency"],
            "new_badges": []
        });
    });

    // No endpoint is configured, so any request would fail.
    let message = run_ok(home.path(), &["session", "submit"]);
    assert!(message.contains("You earned 20 points!"), "stdout: {message}");
    assert!(message.contains("New Achievements: Consistency"));

    let stats = last_json(&run_ok(home.path(), &["history", "stats"]));
    assert_eq!(stats["total_workouts"], 1);
    assert_eq!(stats["current_level"], 3);
    let (_, stderr, code) = run_cli(home.path(), &["session", "status"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("no active session"));
}

#[test]
fn test_rest_ends_when_stdin_closes() {
    let home = tempfile::tempdir().unwrap();
    let plan = write_plan(home.path(), TWO_EXERCISE_PLAN);
    run_ok(home.path(), &["session", "start", "--plan", &plan]);
    run_ok(home.path(), &["session", "advance"]);

    let (stdout, stderr, code) = run_cli(home.path(), &["session", "rest"]);
    assert_eq!(code, 0, "stderr: {stderr}");
    assert!(stderr.contains("stdin closed"), "stderr: {stderr}");
    // Rest samples are plain text; the closing event is JSON.
    assert!(stdout.contains("\"type\": \"rest_skipped\""), "stdout: {stdout}");

    let status = last_json(&run_ok(home.path(), &["session", "status"]));
    assert_eq!(status["phase"], "active");
}

#[test]
fn test_stored_session_is_validated_on_load() {
    let home = tempfile::tempdir().unwrap();
    let plan = write_plan(home.path(), TWO_EXERCISE_PLAN);
    run_ok(home.path(), &["session", "start", "--plan", &plan]);

    edit_stored_session(home.path(), |session| {
        session["state"]["exercise_index"] = 9.into();
    });

    let (_, stderr, code) = run_cli(home.path(), &["session", "advance"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("stored session is invalid"), "stderr: {stderr}");

    edit_stored_session(home.path(), |session| {
        session["plan"]["exercises"] = serde_json::json!([]);
    });
    let (_, stderr, code) = run_cli(home.path(), &["session", "status"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Empty collection"), "stderr: {stderr}");

    // An unreadable session can still be thrown away.
    run_ok(home.path(), &["session", "abandon"]);
    let (_, stderr, _) = run_cli(home.path(), &["session", "status"]);
    assert!(stderr.contains("no active session"));
}
