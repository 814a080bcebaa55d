//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run and verify exit behavior.
//! Nothing here touches the network: parameter validation must reject
//! bad invocations before any request is made.

use std::process::Command;

/// Run a CLI command and return output.
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "focusdeck-cli", "--"])
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

#[test]
fn test_help() {
    let (stdout, _, code) = run_cli(&["--help"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("focus"));
    assert!(stdout.contains("projects"));
}

#[test]
fn test_version() {
    let (_, _, code) = run_cli(&["--version"]);
    assert_eq!(code, 0);
}

#[test]
fn test_unknown_command_fails() {
    let (_, _, code) = run_cli(&["frobnicate"]);
    assert_ne!(code, 0);
}

#[test]
fn test_focus_rejects_unknown_energy() {
    let (_, stderr, code) = run_cli(&["focus", "--energy", "social"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("energy"), "stderr was: {stderr}");
}

#[test]
fn test_focus_rejects_unknown_mode() {
    let (_, stderr, code) = run_cli(&["focus", "--mode", "panic"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("mode"), "stderr was: {stderr}");
}

#[test]
fn test_focus_rejects_out_of_range_count() {
    let (_, stderr, code) = run_cli(&["focus", "--max-tasks", "0"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("max_tasks"), "stderr was: {stderr}");
}

#[test]
fn test_task_bulk_requires_a_field() {
    let (_, stderr, code) = run_cli(&["task", "bulk", "--ids", "1,2"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("--done") || stderr.contains("--priority"));
}
