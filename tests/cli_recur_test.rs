//! Integration tests for recurring-task templates and the horizon sweep.
//!
//! Templates are created with past or far-future start dates so the
//! outcomes are deterministic regardless of when the tests run.

use predicates::prelude::*;

mod common;
use common::TestEnv;

#[test]
fn test_recurring_requires_start_date() {
    let env = TestEnv::init();

    env.mt()
        .args(["task", "create", "No anchor", "--recur", "daily"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("require a start date"));
}

#[test]
fn test_recurring_rejects_bad_frequency() {
    let env = TestEnv::init();

    env.mt()
        .args([
            "task",
            "create",
            "Sometimes",
            "--start",
            "2024-01-01",
            "--recur",
            "fortnightly",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid frequency"));
}

#[test]
fn test_recurring_rejects_bad_weekday() {
    let env = TestEnv::init();

    env.mt()
        .args([
            "task",
            "create",
            "Weekly",
            "--start",
            "2024-01-01",
            "--recur",
            "weekly",
            "--day",
            "7",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("0 (Sunday) through 6"));
}

#[test]
fn test_sweep_caps_unbounded_past_template() {
    let env = TestEnv::init();

    // A daily template anchored far in the past hits the built-in cap of
    // 100 instances, whatever today is.
    env.mt_json(&[
        "task", "create", "Standup", "--start", "2024-01-01", "--recur", "daily",
    ]);

    let report = env.mt_json(&["recur", "sweep"]);
    assert_eq!(report["templates_scanned"], 1);
    assert_eq!(report["instances_created"], 100);

    // Template plus its instances.
    let tasks = env.mt_json(&["task", "list"]);
    assert_eq!(tasks["count"], 101);
}

#[test]
fn test_sweep_is_idempotent() {
    let env = TestEnv::init();

    env.mt_json(&[
        "task",
        "create",
        "Weekly sync",
        "--start",
        "2024-01-07",
        "--recur",
        "weekly",
        "--day",
        "1",
        "--day",
        "3",
        "--recur-count",
        "5",
    ]);

    let first = env.mt_json(&["recur", "sweep"]);
    assert_eq!(first["instances_created"], 5);

    let second = env.mt_json(&["recur", "sweep"]);
    assert_eq!(second["instances_created"], 0);

    let tasks = env.mt_json(&["task", "list"]);
    assert_eq!(tasks["count"], 6);
}

#[test]
fn test_sweep_honors_recurrence_end_date() {
    let env = TestEnv::init();

    // Daily from Jan 1 through Jan 5: instances on the 2nd through 5th.
    env.mt_json(&[
        "task",
        "create",
        "Short series",
        "--start",
        "2024-01-01",
        "--recur",
        "daily",
        "--recur-until",
        "2024-01-05",
    ]);

    let report = env.mt_json(&["recur", "sweep"]);
    assert_eq!(report["instances_created"], 4);
}

#[test]
fn test_instances_reference_their_template() {
    let env = TestEnv::init();

    let template = env.mt_json(&[
        "task",
        "create",
        "Monthly invoice",
        "--start",
        "2024-01-15",
        "--recur",
        "monthly",
        "--recur-count",
        "2",
    ]);
    let template_id = template["id"].as_str().unwrap();

    env.mt_json(&["recur", "sweep"]);

    let listed = env.mt_json(&["task", "list"]);
    let instances: Vec<&serde_json::Value> = listed["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .filter(|t| t["id"] != template_id)
        .collect();
    assert_eq!(instances.len(), 2);
    assert_eq!(instances[0]["start_date"], "2024-02-15");
    assert_eq!(instances[1]["start_date"], "2024-03-15");
    for instance in instances {
        assert_eq!(instance["is_recurring"], false);
        let shown = env.mt_json(&["task", "show", instance["id"].as_str().unwrap()]);
        assert_eq!(shown["parent_task_id"], template_id);
    }
}

#[test]
fn test_template_listing_and_show() {
    let env = TestEnv::init();

    let template = env.mt_json(&[
        "task",
        "create",
        "Weekly report",
        "--start",
        "2024-01-01",
        "--recur",
        "weekly",
        "--recur-count",
        "3",
    ]);
    let template_id = template["id"].as_str().unwrap();
    env.mt_json(&["task", "create", "Plain task"]);
    env.mt_json(&["recur", "sweep"]);

    let templates = env.mt_json(&["task", "list", "--templates"]);
    assert_eq!(templates["count"], 1);
    assert_eq!(templates["tasks"][0]["id"], template_id);

    let shown = env.mt_json(&["task", "show", template_id]);
    assert_eq!(shown["instance_count"], 3);
}

#[test]
fn test_sweep_skips_templates_beyond_horizon() {
    let env = TestEnv::init();

    env.mt_json(&[
        "task",
        "create",
        "Far future",
        "--start",
        "2099-01-01",
        "--recur",
        "daily",
    ]);

    let report = env.mt_json(&["recur", "sweep", "--horizon", "30"]);
    assert_eq!(report["instances_created"], 0);
    assert_eq!(report["templates_skipped"], 1);
}

#[test]
fn test_sweep_horizon_flag_must_be_positive() {
    let env = TestEnv::init();

    env.mt()
        .args(["recur", "sweep", "--horizon", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("horizon must be positive"));
}

#[test]
fn test_sweep_uses_configured_horizon() {
    let env = TestEnv::init();

    env.mt_json(&["config", "set", "horizon_days", "30"]);
    env.mt_json(&[
        "task",
        "create",
        "Beyond the window",
        "--start",
        "2099-01-01",
        "--recur",
        "weekly",
    ]);

    // The configured 30-day horizon still excludes a 2099 template.
    let report = env.mt_json(&["recur", "sweep"]);
    assert_eq!(report["templates_skipped"], 1);
    assert_eq!(report["instances_created"], 0);
}

#[test]
fn test_subtasks_copied_to_instances_unchecked() {
    let env = TestEnv::init();

    let template = env.mt_json(&[
        "task",
        "create",
        "Release checklist",
        "--start",
        "2024-01-01",
        "--recur",
        "monthly",
        "--recur-count",
        "1",
    ]);
    let template_id = template["id"].as_str().unwrap().to_string();

    let added = env.mt_json(&["subtask", "add", &template_id, "tag the build"]);
    let template_subtask_id = added["subtask"]["id"].as_str().unwrap().to_string();
    // Check it off on the template; instances still start unchecked.
    env.mt_json(&["subtask", "toggle", &template_id, &template_subtask_id]);

    env.mt_json(&["recur", "sweep"]);

    let listed = env.mt_json(&["task", "list"]);
    let instance_id = listed["tasks"]
        .as_array()
        .unwrap()
        .iter()
        .find(|t| t["id"] != template_id.as_str())
        .unwrap()["id"]
        .as_str()
        .unwrap()
        .to_string();

    let instance = env.mt_json(&["task", "show", &instance_id]);
    assert_eq!(instance["subtasks"][0]["text"], "tag the build");
    assert_eq!(instance["subtasks"][0]["completed"], false);
    assert_ne!(instance["subtasks"][0]["id"], template_subtask_id.as_str());
}
