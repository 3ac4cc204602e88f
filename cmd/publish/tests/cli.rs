//! Exit-status tests for the mqforward-publish binary.

use std::process::Command;
use std::time::{Duration, Instant};

fn bin(home: &tempfile::TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_mqforward-publish"));
    // Keep the user's ~/.mqforward/config.yaml out of the test.
    cmd.env("HOME", home.path()).env_remove("RUST_LOG");
    cmd
}

fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port()
}

#[test]
fn encode_prints_reference_hex() {
    let home = tempfile::tempdir().unwrap();
    let out = bin(&home).arg("encode").output().unwrap();

    assert!(out.status.success());
    assert_eq!(String::from_utf8_lossy(&out.stdout).trim(), "82a1610aa162cb4024000000000000");
}

#[test]
fn decode_prints_fields_as_json() {
    let home = tempfile::tempdir().unwrap();
    let out = bin(&home)
        .args(["decode", "--json", "82a1610aa162cb4024000000000000"])
        .output()
        .unwrap();

    assert!(out.status.success());
    let fields: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(fields["a"], serde_json::json!(10));
    assert_eq!(fields["b"], serde_json::json!(10.0));
}

#[test]
fn decode_garbage_exits_non_zero() {
    let home = tempfile::tempdir().unwrap();
    let out = bin(&home).args(["decode", "68656c6c6f"]).output().unwrap();

    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("unrecognized"));
}

#[test]
fn unreachable_broker_exits_non_zero() {
    let home = tempfile::tempdir().unwrap();
    let port = free_port().to_string();

    let start = Instant::now();
    let out = bin(&home)
        .args(["publish", "--host", "127.0.0.1", "--port", &port, "--connect-timeout-secs", "2"])
        .output()
        .unwrap();

    assert!(!out.status.success());
    assert!(start.elapsed() < Duration::from_secs(5));
}

#[test]
fn missing_explicit_config_exits_non_zero() {
    let home = tempfile::tempdir().unwrap();
    let missing = home.path().join("nope.yaml");

    let out = bin(&home)
        .args(["--config", missing.to_str().unwrap(), "encode"])
        .output()
        .unwrap();

    assert!(!out.status.success());
}
