//! CLI Integration Tests
//!
//! These tests run the `p2pchat` binary and check its wiring to the core
//! library: argument parsing, environment fallbacks, and fatal errors.

use std::net::TcpListener;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn cli_cmd() -> Command {
    let mut cmd = Command::cargo_bin("p2pchat").expect("Failed to find p2pchat binary");
    for var in ["ADDR", "MYNAMEIS", "HTTP_ADDR", "DIRECTORY_URL", "BOOTSTRAP_ADDRS", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

/// A loopback port with nothing listening on it
fn free_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

#[test]
fn test_help_lists_subcommands() {
    cli_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("directory"))
        .stdout(predicate::str::contains("node"));
}

#[test]
fn test_node_help_shows_env_fallbacks() {
    cli_cmd()
        .args(["node", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("MYNAMEIS"))
        .stdout(predicate::str::contains("DIRECTORY_URL"))
        .stdout(predicate::str::contains("BOOTSTRAP_ADDRS"));
}

#[test]
fn test_unknown_subcommand_fails() {
    cli_cmd().arg("relay").assert().failure();
}

#[test]
fn test_invalid_bind_address_fails() {
    cli_cmd()
        .args(["directory", "--bind", "not-an-address"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid value"));
}

#[test]
fn test_node_exits_when_directory_unreachable() {
    let directory = format!("http://127.0.0.1:{}", free_port());
    let http_addr = format!("127.0.0.1:{}", free_port());

    cli_cmd()
        .args(["node", "--username", "alice", "--no-relay"])
        .args(["--directory-url", &directory, "--http-addr", &http_addr])
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Could not register with directory"));
}

#[test]
fn test_node_reads_username_from_env() {
    let directory = format!("http://127.0.0.1:{}", free_port());
    let http_addr = format!("127.0.0.1:{}", free_port());
    let logs = TempDir::new().unwrap();

    cli_cmd()
        .env("MYNAMEIS", "carol")
        .env("DIRECTORY_URL", &directory)
        .env("HTTP_ADDR", &http_addr)
        .args(["-v", "node", "--no-relay", "--log-dir"])
        .arg(logs.path())
        .timeout(std::time::Duration::from_secs(30))
        .assert()
        .failure();

    // The JSONL file is named after the username taken from the environment
    let raw = logs.path().join("raw");
    let names: Vec<String> = std::fs::read_dir(&raw)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert!(names.iter().any(|n| n.ends_with("_carol.jsonl")), "{names:?}");
}
