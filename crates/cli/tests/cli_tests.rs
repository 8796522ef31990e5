use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_cli_help() {
    let mut cmd = Command::cargo_bin("sqlagent").unwrap();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Natural-language SQL assistant"));
}

#[test]
fn test_cli_ask_help() {
    let mut cmd = Command::cargo_bin("sqlagent").unwrap();
    cmd.arg("ask").arg("--help").assert().success().stdout(predicate::str::contains("request"));
}

#[test]
fn test_missing_api_key_is_reported() {
    let mut cmd = Command::cargo_bin("sqlagent").unwrap();
    cmd.env_remove("SQLAGENT_API_KEY")
        .arg("ask")
        .arg("hello")
        .assert()
        .failure()
        .stderr(predicate::str::contains("SQLAGENT_API_KEY"));
}
