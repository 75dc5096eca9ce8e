//! End-to-end tests for the shuffle binary

use assert_cmd::Command;
use predicates::prelude::*;
use shuffle_test_utils::fixtures::{rules_path, trace_path};
use std::fs;
use tempfile::TempDir;

/// Get a Command for the shuffle binary
fn shuffle_cmd() -> Command {
    let mut cmd = Command::cargo_bin("shuffle").expect("Failed to find shuffle binary");
    cmd.env_remove("SHUFFLE_RULES").env("RUST_LOG", "warn");
    cmd
}

fn write_file(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

// ============================================================================
// General
// ============================================================================

#[test]
fn test_help_lists_commands() {
    shuffle_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("replay"))
        .stdout(predicate::str::contains("scenarios"))
        .stdout(predicate::str::contains("check"));
}

#[test]
fn test_no_command_shows_hint() {
    shuffle_cmd()
        .assert()
        .success()
        .stdout(predicate::str::contains("shuffle --help"));
}

// ============================================================================
// replay Command Tests
// ============================================================================

#[test]
fn test_replay_word_save() {
    shuffle_cmd()
        .arg("replay")
        .arg(trace_path("word2003"))
        .assert()
        .success()
        .stdout(predicate::str::contains("word 2003 save"))
        .stdout(predicate::str::contains("compound"))
        .stdout(predicate::str::contains("all 3 expectations met"));
}

#[test]
fn test_replay_json() {
    let output = shuffle_cmd()
        .args(["replay", "--json"])
        .arg(trace_path("word2007"))
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["name"], "word 2007 save");
    assert_eq!(report["failures"].as_array().map(Vec::len), Some(0));
    assert_eq!(report["steps"].as_array().map(Vec::len), Some(6));
}

#[test]
fn test_replay_with_literal_rules_fails_expectations() {
    let dir = TempDir::new().unwrap();
    let rules = write_file(&dir, "rules.toml", "[[scenario]]\nkind = \"default\"\n");

    shuffle_cmd()
        .arg("replay")
        .arg(trace_path("word2003"))
        .arg("--rules")
        .arg(&rules)
        .assert()
        .failure()
        .stdout(predicate::str::contains("is not the seeded node"))
        .stderr(predicate::str::contains("expectation(s) not met"));
}

#[test]
fn test_replay_missing_trace() {
    shuffle_cmd()
        .args(["replay", "/nonexistent/trace.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Trace not found"));
}

// ============================================================================
// scenarios Command Tests
// ============================================================================

#[test]
fn test_scenarios_lists_shipped_rules() {
    shuffle_cmd()
        .arg("scenarios")
        .assert()
        .success()
        .stdout(predicate::str::contains("shipped rules"))
        .stdout(predicate::str::contains("create-shuffle"))
        .stdout(predicate::str::contains("locked-delete-shuffle"));
}

#[test]
fn test_scenarios_json() {
    let output = shuffle_cmd().args(["scenarios", "--json"]).output().unwrap();
    assert!(output.status.success());

    let rows: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let rows = rows.as_array().unwrap();
    assert_eq!(rows.len(), 12);
    assert_eq!(rows[0]["kind"], "delete-restore");
    assert_eq!(rows[0]["timeout_secs"], 5);
    assert_eq!(rows[11]["kind"], "default");
    assert_eq!(rows[11]["ranking"], "low");
}

#[test]
fn test_scenarios_marks_disabled_entries() {
    let dir = TempDir::new().unwrap();
    let rules = write_file(
        &dir,
        "rules.toml",
        "[[scenario]]\nkind = \"rename-shuffle\"\npattern = '.*~'\nenabled = false\n",
    );

    shuffle_cmd()
        .arg("scenarios")
        .arg("--rules")
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("(disabled)"));
}

// ============================================================================
// check Command Tests
// ============================================================================

#[test]
fn test_check_shipped_rules_file() {
    shuffle_cmd()
        .arg("check")
        .arg(rules_path("default"))
        .assert()
        .success()
        .stdout(predicate::str::contains("valid"))
        .stdout(predicate::str::contains("12 scenarios"));
}

#[test]
fn test_check_invalid_pattern() {
    let dir = TempDir::new().unwrap();
    let rules = write_file(
        &dir,
        "rules.toml",
        "[[scenario]]\nkind = \"create-shuffle\"\npattern = '~WRD(.*'\n",
    );

    shuffle_cmd()
        .arg("check")
        .arg(&rules)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid pattern for create-shuffle"));
}

#[test]
fn test_check_unknown_kind() {
    let dir = TempDir::new().unwrap();
    let rules = write_file(&dir, "rules.toml", "[[scenario]]\nkind = \"autosave\"\n");

    shuffle_cmd()
        .arg("check")
        .arg(&rules)
        .assert()
        .failure()
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_check_nothing_enabled() {
    let dir = TempDir::new().unwrap();
    let rules = write_file(&dir, "rules.toml", "[session]\ncapacity = 8\n");

    shuffle_cmd()
        .arg("check")
        .arg(&rules)
        .assert()
        .failure()
        .stderr(predicate::str::contains("enables no scenarios"));
}

#[test]
fn test_check_missing_file() {
    shuffle_cmd()
        .args(["check", "/nonexistent/rules.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Rules not found"));
}

// ============================================================================
// default-rules Command Tests
// ============================================================================

#[test]
fn test_default_rules_round_trip_through_check() {
    let output = shuffle_cmd().arg("default-rules").output().unwrap();
    assert!(output.status.success());

    let dir = TempDir::new().unwrap();
    let rules = write_file(&dir, "rules.toml", &String::from_utf8(output.stdout).unwrap());
    shuffle_cmd()
        .arg("check")
        .arg(&rules)
        .assert()
        .success()
        .stdout(predicate::str::contains("12 scenarios"));
}
