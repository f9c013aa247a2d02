//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against the dev config
//! directory. Commands that need a live backend are covered by the core
//! crate's mocked integration tests; only the local surface is exercised
//! here.

use std::process::Command;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-p", "herald-cli", "--"])
        .args(args)
        .env("HERALD_ENV", "dev")
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
    assert_eq!(code, 0, "Help failed");
    assert!(stdout.contains("Herald reminder daemon and CLI"));
    assert!(stdout.contains("run"));
    assert!(stdout.contains("config"));
}

#[test]
fn test_version() {
    let (stdout, _, code) = run_cli(&["--version"]);
    assert_eq!(code, 0, "Version failed");
    assert!(stdout.contains("herald"));
}

#[test]
fn test_config_list() {
    let (stdout, _, code) = run_cli(&["config", "list"]);
    assert_eq!(code, 0, "Config list failed");
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout).expect("config list should print JSON");
    assert!(parsed.get("api").is_some());
    assert!(parsed.get("digests").is_some());
}

#[test]
fn test_config_get() {
    let (stdout, _, code) = run_cli(&["config", "get", "api.base_url"]);
    assert_eq!(code, 0, "Config get failed");
    assert!(!stdout.trim().is_empty());
}

#[test]
fn test_config_set_roundtrip() {
    let (stdout, _, code) = run_cli(&["config", "set", "digests.weekly_review_hour", "20"]);
    assert_eq!(code, 0, "Config set failed");
    assert!(stdout.contains("ok"));

    let (stdout, _, code) = run_cli(&["config", "get", "digests.weekly_review_hour"]);
    assert_eq!(code, 0, "Config get after set failed");
    assert_eq!(stdout.trim(), "20");

    let (_, _, code) = run_cli(&["config", "set", "digests.weekly_review_hour", "19"]);
    assert_eq!(code, 0, "Config restore failed");
}

#[test]
fn test_config_get_unknown_key_fails() {
    let (_, stderr, code) = run_cli(&["config", "get", "no.such.key"]);
    assert_ne!(code, 0, "Unknown key unexpectedly succeeded");
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_set_invalid_value_fails() {
    let (_, stderr, code) = run_cli(&["config", "set", "digests.daily_digest_hour", "noon"]);
    assert_ne!(code, 0, "Invalid value unexpectedly succeeded");
    assert!(stderr.contains("error:"));
}

#[test]
fn test_reminder_requires_subcommand() {
    let (_, _, code) = run_cli(&["reminder"]);
    assert_ne!(code, 0, "Bare reminder command unexpectedly succeeded");
}

#[test]
fn test_prefs_quiet_rejects_malformed_time() {
    let (_, stderr, code) = run_cli(&["prefs", "quiet", "22:00", "late"]);
    assert_ne!(code, 0, "Malformed quiet window unexpectedly succeeded");
    assert!(stderr.contains("error:"));
}
