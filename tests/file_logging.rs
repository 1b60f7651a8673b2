//! The binary flushes its rolling log file before exiting

#![cfg(feature = "audio")]

use std::process::Command;

use assert_fs::prelude::*;
use assert_fs::TempDir;

const CONFIG: &str = r#"
[discovery]
strategy = "bundled"

[logging]
level = "debug"
file = true
directory = "logs"
"#;

/// Concatenated contents of every file in the log directory
fn read_logs(temp: &TempDir) -> String {
    let mut contents = String::new();
    for entry in std::fs::read_dir(temp.child("logs").path()).unwrap() {
        contents.push_str(&std::fs::read_to_string(entry.unwrap().path()).unwrap());
    }
    contents
}

#[test]
fn log_file_keeps_final_lines() {
    let temp = TempDir::new().unwrap();
    temp.child("semantics.toml").write_str(CONFIG).unwrap();
    temp.child("a.wav").write_str("dummy").unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_semantics"))
        .current_dir(temp.path())
        .env_remove("RUST_LOG")
        .args(["-i", "a.wav", "-o", "out", "--transcribe"])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(0));

    let logs = read_logs(&temp);
    assert!(logs.contains("Running audio operations"), "{logs}");
    assert!(logs.contains("Exiting with status 0"), "{logs}");
}

#[test]
fn log_file_is_flushed_on_error_exit() {
    let temp = TempDir::new().unwrap();
    temp.child("semantics.toml").write_str(CONFIG).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_semantics"))
        .current_dir(temp.path())
        .env_remove("RUST_LOG")
        .args(["-i", "missing.wav", "-o", "out", "--transcribe"])
        .status()
        .unwrap();
    assert_eq!(status.code(), Some(1));

    assert!(read_logs(&temp).contains("Exiting with status 1"));
}
