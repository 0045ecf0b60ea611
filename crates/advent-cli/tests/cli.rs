use assert_cmd::Command;
use predicates::prelude::*;

fn advent() -> Command {
    Command::cargo_bin("advent").unwrap()
}

#[test]
fn guesses_on_fresh_store_reports_empty_history() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");

    advent()
        .args(["guesses", "--part", "a", "--year", "2015", "--day", "1"])
        .args(["--db", db.to_str().unwrap()])
        .args(["--session", "test-token"])
        .assert()
        .success()
        .stdout(predicate::str::contains("no guesses recorded"));
}

#[test]
fn invalid_part_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");

    advent()
        .args(["guesses", "--part", "c", "--year", "2015", "--day", "1"])
        .args(["--db", db.to_str().unwrap()])
        .args(["--session", "test-token"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("invalid part"));
}

#[test]
fn missing_session_is_a_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("store.db");

    advent()
        .args(["guesses", "--year", "2015", "--day", "1"])
        .args(["--db", db.to_str().unwrap()])
        .env_remove("AOC_SESSION")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("AOC_SESSION"));
}

#[test]
fn check_and_example_are_mutually_exclusive() {
    advent()
        .args(["run", "--solver-cmd", "true", "--example", "--check"])
        .args(["--session", "test-token", "--year", "2015", "--day", "1"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--example"));
}
