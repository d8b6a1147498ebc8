//! Integration tests for the `skycast` binary.
//!
//! Each test runs the binary in a scratch directory with a scrubbed
//! environment and a private SQLite file.

use std::path::Path;
use std::process::{Command, Output};

const SCRUBBED: &[&str] = &[
    "TELEGRAM_BOT_TOKEN",
    "VLLM_BASE_URL",
    "VLLM_MODEL",
    "VLLM_API_KEY",
    "DEFAULT_LANG",
    "SUPPORTED_LANGS",
    "ENABLE_LANG_DETECTION",
    "LANG_MIN_DETECT_CHARS",
    "ALWAYS_REPLY_OK",
    "SKYCAST_DB_PATH",
    "RUST_LOG",
];

fn skycast(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_skycast"));
    cmd.current_dir(dir).args(args);
    for name in SCRUBBED {
        cmd.env_remove(name);
    }
    cmd.env("SKYCAST_DB_PATH", dir.join("data").join("test.db"));
    for (name, value) in env {
        cmd.env(name, value);
    }
    cmd.output().unwrap()
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).trim().to_owned()
}

#[test]
fn detect_prints_language() {
    let dir = tempfile::tempdir().unwrap();
    let out = skycast(dir.path(), &["lang", "detect", "Thời tiết hôm nay thế nào?"], &[]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "vi");

    let out = skycast(dir.path(), &["lang", "detect", "12345"], &[]);
    assert_eq!(stdout(&out), "(no match)");
}

#[test]
fn set_then_get_persists() {
    let dir = tempfile::tempdir().unwrap();

    let out = skycast(dir.path(), &["lang", "set", "u1", " VI "], &[]);
    assert!(out.status.success());
    assert_eq!(stdout(&out), "u1: vi");

    let out = skycast(dir.path(), &["lang", "get", "u1"], &[]);
    assert_eq!(stdout(&out), "vi");
    assert!(dir.path().join("data").join("test.db").exists());

    let out = skycast(dir.path(), &["lang", "clear", "u1"], &[]);
    assert!(out.status.success());
    let out = skycast(dir.path(), &["lang", "get", "u1"], &[]);
    assert_eq!(stdout(&out), "(none)");
}

#[test]
fn unsupported_language_fails() {
    let dir = tempfile::tempdir().unwrap();
    let out = skycast(dir.path(), &["lang", "set", "u1", "fr"], &[]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Unsupported language: fr"));
}

#[test]
fn resolve_detects_then_reads_stored() {
    let dir = tempfile::tempdir().unwrap();
    let env = [("ENABLE_LANG_DETECTION", "1")];

    let out = skycast(
        dir.path(),
        &["lang", "resolve", "u2", "--text", "Cho tôi biết thời tiết"],
        &env,
    );
    assert_eq!(stdout(&out), "vi (detected)");

    let out = skycast(dir.path(), &["lang", "resolve", "u2"], &env);
    assert_eq!(stdout(&out), "vi (stored)");

    let out = skycast(dir.path(), &["lang", "resolve", "u3", "--text", "hola"], &env);
    assert_eq!(stdout(&out), "en (default)");
}

#[test]
fn list_marks_default() {
    let dir = tempfile::tempdir().unwrap();
    let out = skycast(
        dir.path(),
        &["lang", "list"],
        &[("DEFAULT_LANG", "vi"), ("SUPPORTED_LANGS", "en,vi")],
    );
    assert_eq!(stdout(&out), "en\nvi (default)");
}

#[test]
fn bot_requires_token() {
    let dir = tempfile::tempdir().unwrap();
    let out = skycast(dir.path(), &["bot"], &[("VLLM_BASE_URL", "http://127.0.0.1:9/v1")]);
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("TELEGRAM_BOT_TOKEN is required"));
}
