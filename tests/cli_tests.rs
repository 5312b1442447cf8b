//! CLI integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Binary with config and runtime dirs pointed into `home`
fn pasteboard(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pasteboard").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_RUNTIME_DIR", home.path().join("run"))
        .env_remove("PASTEBOARD_SOCKET")
        .env_remove("PASTEBOARD_LOG");
    cmd
}

#[test]
fn help_output() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("clipboard"))
        .stdout(predicate::str::contains("daemon"))
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("dump"))
        .stdout(predicate::str::contains("--socket"));
}

#[test]
fn version_output() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("pasteboard"))
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn config_path_command() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .args(["config", "path"])
        .assert()
        .success()
        .stdout(predicate::str::contains("pasteboard"))
        .stdout(predicate::str::contains("config.toml"));
}

#[test]
fn config_help() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .args(["config", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init"))
        .stdout(predicate::str::contains("set"))
        .stdout(predicate::str::contains("get"))
        .stdout(predicate::str::contains("list"))
        .stdout(predicate::str::contains("path"));
}

#[test]
fn config_set_then_get() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .args(["config", "set", "history_size", "25"])
        .assert()
        .success();

    pasteboard(&home)
        .args(["config", "get", "history_size"])
        .assert()
        .success()
        .stdout("25\n");

    pasteboard(&home)
        .args(["config", "get", "socket_path"])
        .assert()
        .success()
        .stdout("(not set)\n");
}

#[test]
fn config_retry_interval_is_normalized() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .args(["config", "set", "init_retry_interval", "90s"])
        .assert()
        .success();

    pasteboard(&home)
        .args(["config", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("init_retry_interval"))
        .stdout(predicate::str::contains("1m30s"));
}

#[test]
fn config_init_twice_fails() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home).args(["config", "init"]).assert().success();
    pasteboard(&home)
        .args(["config", "init"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("already exists"));
}

#[test]
fn set_requires_a_payload() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .arg("set")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("--text"));
}

#[test]
fn set_accepts_one_payload_only() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .args(["set", "--text", "a", "--html", "<b>a</b>"])
        .assert()
        .code(2);
}

#[test]
fn param_requires_want() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .args(["set", "--text", "a", "--param", "k=v"])
        .assert()
        .code(2);
}

#[test]
fn dump_requires_a_section() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home).arg("dump").assert().code(2);
}
