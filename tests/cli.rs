// ABOUTME: Integration tests for the krouo CLI commands.
// ABOUTME: Validates --help output and init command behavior.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;

fn krouo_cmd() -> Command {
    Command::new(assert_cmd::cargo::cargo_bin!("krouo"))
}

#[test]
fn help_shows_commands() {
    krouo_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("knock"))
        .stdout(predicate::str::contains("run"));
}

#[test]
fn init_creates_config_file() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("krouo.yml");

    krouo_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .success();

    assert!(config_path.exists(), "krouo.yml should be created");
    let content = fs::read_to_string(&config_path).unwrap();
    assert!(
        content.contains("knock_sequence:"),
        "Config should have a knock_sequence field"
    );
}

#[test]
fn init_refuses_to_overwrite_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("krouo.yml");

    fs::write(&config_path, "existing: config").unwrap();

    krouo_cmd()
        .current_dir(temp_dir.path())
        .arg("init")
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn init_force_overwrites_existing_config() {
    let temp_dir = tempfile::tempdir().unwrap();
    let config_path = temp_dir.path().join("krouo.yml");

    fs::write(&config_path, "existing: config").unwrap();

    krouo_cmd()
        .current_dir(temp_dir.path())
        .args(["init", "--force"])
        .assert()
        .success();

    let content = fs::read_to_string(&config_path).unwrap();
    assert!(content.contains("targets:"));
}

#[test]
fn knock_without_config_fails() {
    let temp_dir = tempfile::tempdir().unwrap();

    krouo_cmd()
        .current_dir(temp_dir.path())
        .arg("knock")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not found"));
}
