//! End-to-end CLI integration tests
//!
//! These tests use assert_cmd to run the deposit-workflow binary against
//! record files in a temporary directory and the in-memory backend.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs::write;
use std::path::PathBuf;
use std::process::Command;
use tempfile::TempDir;

/// Helper for setting up CLI test environment
pub struct CliTestEnvironment {
    pub temp_dir: TempDir,
}

impl CliTestEnvironment {
    pub fn new() -> Result<Self, Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        // keep stdout free of anything but the command output
        write(
            temp_dir.path().join("deposit-workflow.toml"),
            "[observability]\nlog_level = \"error\"\njson_logs = true\n",
        )?;
        Ok(Self { temp_dir })
    }

    pub fn record_file(&self, name: &str, json: &str) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let path = self.temp_dir.path().join(name);
        write(&path, json)?;
        Ok(path)
    }

    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("deposit-workflow").unwrap();
        cmd.current_dir(self.temp_dir.path())
            .env_remove("RUST_LOG");
        cmd
    }
}

fn stdout_json(output: &std::process::Output) -> serde_json::Value {
    serde_json::from_slice(&output.stdout).expect("stdout is a single JSON document")
}

#[test]
fn test_help_lists_commands() {
    let env = CliTestEnvironment::new().unwrap();
    env.command()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("derive"))
        .stdout(predicate::str::contains("simulate"));
}

#[test]
fn test_derive_draft_with_selected_community() {
    let env = CliTestEnvironment::new().unwrap();
    let record = env
        .record_file("draft.json", r#"{"status": "draft", "parent": {}}"#)
        .unwrap();

    let output = env
        .command()
        .args(["derive", "--record"])
        .arg(&record)
        .args(["--community", "abc"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["actions"]["should_update_review"], true);
    assert_eq!(json["actions"]["should_delete_review"], false);
    assert_eq!(json["ui"]["show_submit_for_review_button"], true);
    assert_eq!(json["ui"]["disable_submit_for_review_button"], false);
}

#[test]
fn test_derive_rejects_conflicting_selection() {
    let env = CliTestEnvironment::new().unwrap();
    let record = env.record_file("draft.json", r#"{"status": "draft"}"#).unwrap();

    env.command()
        .args(["derive", "--record"])
        .arg(&record)
        .args(["--community", "abc", "--deselect"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("cannot be used with"));
}

#[test]
fn test_derive_reports_unreadable_record() {
    let env = CliTestEnvironment::new().unwrap();
    env.command()
        .args(["derive", "--record", "missing.json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read record file"));
}

#[test]
fn test_simulate_publish_with_review() {
    let env = CliTestEnvironment::new().unwrap();
    let record = env
        .record_file(
            "draft.json",
            r#"{"id": "r1", "status": "draft_with_review",
                "parent": {"review": {"receiver": {"community": "c1"}}}}"#,
        )
        .unwrap();

    let output = env
        .command()
        .args(["simulate", "publish", "--record"])
        .arg(&record)
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["outcome"]["status"], "ok");
    assert_eq!(json["outcome"]["data"]["status"], "published");
    assert_eq!(json["phase"], "Succeeded");
    assert_eq!(
        json["navigation"],
        serde_json::json!([{"kind": "navigated", "url": "/records/r1"}])
    );
}

#[test]
fn test_simulate_injected_save_failure() {
    let env = CliTestEnvironment::new().unwrap();

    let output = env
        .command()
        .args(["simulate", "save", "--community", "c1", "--fail", "save"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["outcome"]["status"], "error");
    assert_eq!(json["phase"], "PersistFailed");
    assert_eq!(json["calls"].as_array().map(Vec::len), Some(1));
    assert_eq!(json["editor"]["action_state"]["phase"], "failed");
}

#[test]
fn test_simulate_validation_errors() {
    let env = CliTestEnvironment::new().unwrap();

    let output = env
        .command()
        .args([
            "simulate",
            "save",
            "--validation-error",
            "metadata.title=Missing data.",
        ])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json = stdout_json(&output);
    assert_eq!(json["phase"], "ValidationFailed");
    assert_eq!(json["editor"]["errors"][0]["field"], "metadata.title");
    assert_eq!(json["outcome"]["saved_record"]["id"], "rec-00001");
}

#[test]
fn test_simulate_rejects_unknown_failure_point() {
    let env = CliTestEnvironment::new().unwrap();
    env.command()
        .args(["simulate", "save", "--fail", "teleport"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unknown backend operation 'teleport'"));
}
