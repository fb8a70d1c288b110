//! CLI integration tests for the load command.

use std::fs;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn rekindle() -> Command {
    Command::cargo_bin("rekindle").unwrap()
}

#[test]
fn test_load_prints_dependency_closure() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("main.txt"), "require('lib.txt')").unwrap();
    fs::write(temp.path().join("lib.txt"), "leaf").unwrap();

    rekindle()
        .args(["load", "main.txt", "--root"])
        .arg(temp.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("lib.txt"))
        .stdout(predicate::str::contains("Loaded"));
}

#[test]
fn test_load_missing_module_fails() {
    let temp = TempDir::new().unwrap();

    rekindle()
        .args(["load", "absent.txt", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Module not found"));
}

#[test]
fn test_load_reports_cycles() {
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join("a.txt"), "require('b.txt')").unwrap();
    fs::write(temp.path().join("b.txt"), "require('a.txt')").unwrap();

    rekindle()
        .args(["load", "a.txt", "--root"])
        .arg(temp.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("Dependency cycle"));
}

#[test]
fn test_load_missing_root_fails() {
    rekindle()
        .args(["load", "main.txt", "--root", "/definitely/not/here"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Script root not found"));
}
