mod common;

use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

/// Command isolated from the user's store, config and credentials
fn cemtras(tmp: &TempDir) -> Command {
    cemtras_with_config(tmp, &tmp.path().join("missing.yaml"))
}

fn cemtras_with_config(tmp: &TempDir, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("cemtras").unwrap();
    cmd.env_remove("GEMINI_API_KEY")
        .env_remove("CEMTRAS_GEMINI_API_KEY")
        .env_remove("CEMTRAS_STORAGE_PATH")
        .env_remove("CEMTRAS_DEFAULT_ROLE")
        .env("NO_COLOR", "1")
        .arg("--config")
        .arg(config)
        .arg("--storage-path")
        .arg(tmp.path().join("store"));
    cmd
}

#[test]
fn test_roles_lists_every_persona() {
    let tmp = TempDir::new().unwrap();
    cemtras(&tmp)
        .arg("roles")
        .assert()
        .success()
        .stdout(predicate::str::contains("operations"))
        .stdout(predicate::str::contains("general"));
}

#[test]
fn test_login_rejects_short_name() {
    let tmp = TempDir::new().unwrap();
    cemtras(&tmp)
        .args(["login", " J "])
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Name must be at least 2 characters long",
        ));
}

#[test]
fn test_login_whoami_logout() {
    let tmp = TempDir::new().unwrap();
    cemtras(&tmp)
        .args(["login", "  Jo  "])
        .assert()
        .success()
        .stdout(predicate::str::contains("Signed in as Jo"));

    cemtras(&tmp)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Jo"));

    cemtras(&tmp).arg("logout").assert().success();

    cemtras(&tmp)
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Not signed in"));
}

#[test]
fn test_history_list_empty() {
    let tmp = TempDir::new().unwrap();
    cemtras(&tmp)
        .args(["history", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No conversation history found."));
}

#[test]
fn test_history_show_unknown_id_fails() {
    let tmp = TempDir::new().unwrap();
    cemtras(&tmp)
        .args(["history", "show", "deadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("No conversation matches 'deadbeef'"));
}

#[test]
fn test_ask_without_key_reports_configuration() {
    let tmp = TempDir::new().unwrap();
    cemtras(&tmp)
        .args(["ask", "Why is the kiln shell hot?"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("GEMINI_API_KEY is not configured"));
}

#[test]
fn test_invalid_config_file_fails() {
    let tmp = TempDir::new().unwrap();
    let (_config_dir, config) = common::temp_config_file("provider:\n  timeout_seconds: 0\n");

    cemtras_with_config(&tmp, &config)
        .arg("roles")
        .assert()
        .failure()
        .stderr(predicate::str::contains("timeout_seconds"));
}
