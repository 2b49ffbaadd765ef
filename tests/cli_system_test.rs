//! Integration tests for system administration, status, config, and the
//! action log.

use predicates::prelude::*;

mod common;
use common::TestEnv;

// === Status ===

#[test]
fn test_status_counts_entities() {
    let env = TestEnv::init();

    env.mt_json(&["task", "create", "One"]);
    env.mt_json(&["task", "create", "Two"]);
    env.mt_json(&["project", "create", "Web"]);
    env.mt_json(&["user", "add", "alice"]);

    let status = env.mt_json(&["status"]);
    assert_eq!(status["tasks"], 2);
    assert_eq!(status["projects"], 1);
    assert_eq!(status["users"], 1);
    assert_eq!(status["sprints"], 0);
    assert_eq!(status["templates"], 0);
}

#[test]
fn test_bare_mt_defaults_to_status() {
    let env = TestEnv::init();

    env.mt()
        .assert()
        .success()
        .stdout(predicate::str::contains("\"tasks\":0"));
}

#[test]
fn test_status_reports_active_sprints() {
    let env = TestEnv::init();

    let sprint = env.mt_json(&[
        "sprint", "create", "Now", "--start", "2024-01-01", "--end", "2024-01-14",
    ])["id"]
        .as_str()
        .unwrap()
        .to_string();
    env.mt_json(&["sprint", "activate", &sprint]);

    env.mt()
        .args(["status", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Active sprints: Now"));
}

// === Compact ===

#[test]
fn test_compact_drops_superseded_lines() {
    let env = TestEnv::init();

    let id = env.mt_json(&["task", "create", "Churn"])["id"]
        .as_str()
        .unwrap()
        .to_string();
    env.mt_json(&["task", "update", &id, "--status", "in-progress"]);
    env.mt_json(&["task", "update", &id, "--status", "done"]);

    let doomed = env.mt_json(&["task", "create", "Gone"])["id"]
        .as_str()
        .unwrap()
        .to_string();
    env.mt_json(&["task", "delete", &doomed]);

    let compacted = env.mt_json(&["system", "compact"]);
    // Two superseded versions of the first task, plus the deleted task's
    // create line and its tombstone.
    assert_eq!(compacted["lines_dropped"], 4);

    // Live data survives compaction.
    let listed = env.mt_json(&["task", "list"]);
    assert_eq!(listed["count"], 1);
    let shown = env.mt_json(&["task", "show", &id]);
    assert_eq!(shown["status"], "completed");

    // Nothing left to drop on a second pass.
    let again = env.mt_json(&["system", "compact"]);
    assert_eq!(again["lines_dropped"], 0);
}

// === Build info ===

#[test]
fn test_build_info() {
    let env = TestEnv::new();

    env.mt()
        .args(["system", "build-info"])
        .assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// === Config ===

#[test]
fn test_config_set_get_list() {
    let env = TestEnv::init();

    env.mt_json(&["config", "set", "horizon_days", "45"]);
    let got = env.mt_json(&["config", "get", "horizon_days"]);
    assert_eq!(got["value"], "45");

    env.mt_json(&["config", "set", "action_log_sanitize", "false"]);
    let listed = env.mt_json(&["config", "list"]);
    assert_eq!(listed["entries"].as_array().unwrap().len(), 2);
}

#[test]
fn test_config_get_unset_key() {
    let env = TestEnv::init();

    env.mt()
        .args(["config", "get", "horizon_days", "-H"])
        .assert()
        .success()
        .stdout(predicate::str::contains("not set"));
}

#[test]
fn test_config_rejects_unknown_key() {
    let env = TestEnv::init();

    env.mt()
        .args(["config", "set", "theme", "dark"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config key"));

    env.mt()
        .args(["config", "get", "theme"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown config key"));
}

#[test]
fn test_config_validates_values() {
    let env = TestEnv::init();

    env.mt()
        .args(["config", "set", "horizon_days", "soon"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("positive integer"));

    env.mt()
        .args(["config", "set", "action_log_enabled", "maybe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("must be true or false"));
}

#[test]
fn test_config_last_write_wins() {
    let env = TestEnv::init();

    env.mt_json(&["config", "set", "horizon_days", "30"]);
    env.mt_json(&["config", "set", "horizon_days", "60"]);
    let got = env.mt_json(&["config", "get", "horizon_days"]);
    assert_eq!(got["value"], "60");
}

// === Action log ===

#[test]
fn test_action_log_records_commands() {
    let env = TestEnv::init();

    env.mt_json(&["task", "create", "Logged"]);

    let log_path = env.data_path().join("action.log");
    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.contains("\"command\":\"task create\""));
    assert!(contents.contains("\"success\":true"));

    // Failures are logged too.
    env.mt().args(["task", "show", "bogus"]).assert().failure();
    let contents = std::fs::read_to_string(&log_path).unwrap();
    assert!(contents.contains("\"success\":false"));
}

#[test]
fn test_action_log_can_be_disabled() {
    let env = TestEnv::init();

    env.mt_json(&["config", "set", "action_log_enabled", "false"]);
    let log_path = env.data_path().join("action.log");
    let lines_before = std::fs::read_to_string(&log_path)
        .map(|c| c.lines().count())
        .unwrap_or(0);

    env.mt_json(&["task", "create", "Unlogged"]);

    let lines_after = std::fs::read_to_string(&log_path)
        .map(|c| c.lines().count())
        .unwrap_or(0);
    assert_eq!(lines_before, lines_after);
}
