//! Error scenario integration tests

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn pasteboard(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("pasteboard").unwrap();
    cmd.env("XDG_CONFIG_HOME", home.path().join("config"))
        .env("XDG_RUNTIME_DIR", home.path().join("run"))
        .env_remove("PASTEBOARD_SOCKET")
        .env_remove("PASTEBOARD_LOG");
    cmd
}

#[test]
fn config_get_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .args(["config", "get", "unknown_key"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .args(["config", "set", "api_key", "x"])
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Unknown key"));
}

#[test]
fn config_set_rejects_invalid_values() {
    let home = tempfile::tempdir().unwrap();
    for (key, value) in [
        ("history_size", "0"),
        ("uids_per_session", "many"),
        ("init_retry_interval", "0s"),
        ("socket_path", "relative.sock"),
        ("log_level", "pasteboard=loud"),
    ] {
        pasteboard(&home)
            .args(["config", "set", key, value])
            .assert()
            .code(2)
            .stderr(predicate::str::contains(key));
    }
}

#[test]
fn broken_config_file_falls_back_to_defaults() {
    let home = tempfile::tempdir().unwrap();
    let dir = home.path().join("config").join("pasteboard");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "history_size = [").unwrap();

    // Client commands still run on defaults
    pasteboard(&home)
        .arg("has")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unavailable"));
}

#[test]
fn client_commands_without_daemon() {
    let home = tempfile::tempdir().unwrap();
    let socket = home.path().join("missing.sock");
    let socket = socket.to_str().unwrap();

    for args in [
        vec!["get"],
        vec!["has"],
        vec!["clear"],
        vec!["set", "--text", "hello"],
        vec!["dump", "--data"],
    ] {
        pasteboard(&home)
            .args(["--socket", socket])
            .args(&args)
            .assert()
            .code(1)
            .stderr(predicate::str::contains("unavailable"))
            .stderr(predicate::str::contains("missing.sock"));
    }
}

#[test]
fn watch_without_daemon() {
    let home = tempfile::tempdir().unwrap();
    pasteboard(&home)
        .env("PASTEBOARD_SOCKET", home.path().join("gone.sock"))
        .arg("watch")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Could not subscribe"));
}
