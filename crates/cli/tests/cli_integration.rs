//! CLI integration tests.
//!
//! Uses `assert_cmd` to spawn the `vault` binary and verify exit codes,
//! stdout content, and stderr content. Each test runs in a fresh temporary
//! directory so a stray `vault.toml` cannot leak in.

use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::TempDir;

/// Helper: create a Command for the `vault` binary, rooted at `dir`.
fn vault(dir: &TempDir) -> Command {
    let mut cmd = cargo_bin_cmd!("vault");
    cmd.current_dir(dir.path());
    cmd.env_remove("RUST_LOG");
    cmd
}

// ──────────────────────────────────────────────
// 1. Help and version
// ──────────────────────────────────────────────

#[test]
fn help_exits_0_with_description() {
    let dir = TempDir::new().unwrap();
    vault(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "Encrypted research vault workflow driver",
        ));
}

#[test]
fn version_exits_0() {
    let dir = TempDir::new().unwrap();
    vault(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("vault"));
}

// ──────────────────────────────────────────────
// 2. Demo
// ──────────────────────────────────────────────

#[test]
fn demo_runs_the_full_workflow() {
    let dir = TempDir::new().unwrap();
    vault(&dir)
        .args(["demo", "--name", "Trial A", "--value", "42", "--confidence", "8"])
        .assert()
        .success()
        .stdout(predicate::str::contains("decrypted research-"))
        .stdout(predicate::str::contains("42 (verified)"))
        .stdout(predicate::str::contains("total 1  verified 1"));
}

#[test]
fn demo_json_prints_snapshot() {
    let dir = TempDir::new().unwrap();
    let output = vault(&dir)
        .args(["--output", "json", "demo"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let snapshot: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(snapshot["phase"], "ready");
    assert_eq!(snapshot["records"][0]["name"], "Trial A");
    assert_eq!(snapshot["records"][0]["is_verified"], true);
    assert_eq!(snapshot["records"][0]["decrypted_value"], 42);
    assert_eq!(snapshot["stats"]["verified"], 1);
}

#[test]
fn demo_with_out_of_range_confidence_fails() {
    let dir = TempDir::new().unwrap();
    vault(&dir)
        .args(["demo", "--confidence", "11"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "upload failed: confidence score must be an integer from 1 to 10",
        ));
}

#[test]
fn demo_with_empty_name_fails() {
    let dir = TempDir::new().unwrap();
    vault(&dir)
        .args(["demo", "--name", "  "])
        .assert()
        .failure()
        .stderr(predicate::str::contains("research name is required"));
}

// ──────────────────────────────────────────────
// 3. Configuration
// ──────────────────────────────────────────────

#[test]
fn missing_explicit_config_fails() {
    let dir = TempDir::new().unwrap();
    vault(&dir)
        .args(["--config", "nope.toml", "demo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Config not found"));
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("vault.toml"), "[workflow]\nhistory_capacity = 0\n").unwrap();
    vault(&dir)
        .arg("demo")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid config"));
}

#[test]
fn config_file_sets_wallet_and_prefix() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("vault.toml"),
        r#"
[workflow]
record_id_prefix = "lab"

[chain]
wallet_address = "0x3333333333333333333333333333333333333333"
"#,
    )
    .unwrap();
    vault(&dir)
        .arg("demo")
        .assert()
        .success()
        .stdout(predicate::str::contains(
            "connected 0x3333333333333333333333333333333333333333",
        ))
        .stdout(predicate::str::contains("uploaded lab-"));
}

#[test]
fn json_logs_go_to_stderr() {
    let dir = TempDir::new().unwrap();
    vault(&dir)
        .args(["--log-level", "info", "--log-json", "demo"])
        .assert()
        .success()
        .stderr(predicate::str::contains("\"demo complete\""))
        .stdout(predicate::str::contains("demo complete").not());
}

// ──────────────────────────────────────────────
// 4. Shell
// ──────────────────────────────────────────────

#[test]
fn shell_session_over_stdin() {
    let dir = TempDir::new().unwrap();
    vault(&dir)
        .arg("shell")
        .write_stdin("connect\nupload Trial 42 8 pilot\nlist\nstats\nhistory\nquit\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("session: Ready"))
        .stdout(predicate::str::contains("[ok] research data uploaded"))
        .stdout(predicate::str::contains("confidence 8/10  value encrypted"))
        .stdout(predicate::str::contains("total 1  verified 0  avg confidence 8.0"))
        .stdout(predicate::str::contains("uploaded research data: Trial"));
}

#[test]
fn shell_refuses_work_before_connect() {
    let dir = TempDir::new().unwrap();
    vault(&dir)
        .arg("shell")
        .write_stdin("refresh\ndecrypt research-1-00\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("[error] please connect wallet first"));
}

#[test]
fn shell_ends_at_eof() {
    let dir = TempDir::new().unwrap();
    vault(&dir)
        .arg("shell")
        .write_stdin("help\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("decrypt <id>"));
}
