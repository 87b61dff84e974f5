// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `syncline config`: resolution order, overrides and validation.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;

#[test]
fn defaults_without_any_file() {
    let home = TempDir::new().unwrap();
    syncline(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("# source: built-in defaults"))
        .stdout(predicate::str::contains("stream_url = \"ws://localhost:8080\""))
        .stdout(predicate::str::contains("[reconnect]"));
}

#[test]
fn config_flag_is_used() {
    let home = TempDir::new().unwrap();
    let path = write_file(&home, "custom.toml", "stream_url = \"wss://flag.example.com\"\n");
    syncline(&home)
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("(--config)"))
        .stdout(predicate::str::contains("wss://flag.example.com"));
}

#[test]
fn env_var_is_used() {
    let home = TempDir::new().unwrap();
    let path = write_file(&home, "env.toml", "stream_url = \"wss://env.example.com\"\n");
    syncline(&home)
        .env("SYNCLINE_CONFIG", &path)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("($SYNCLINE_CONFIG)"))
        .stdout(predicate::str::contains("wss://env.example.com"));
}

#[test]
fn flag_wins_over_env_var() {
    let home = TempDir::new().unwrap();
    let flag = write_file(&home, "flag.toml", "stream_url = \"wss://flag.example.com\"\n");
    let env = write_file(&home, "env.toml", "stream_url = \"wss://env.example.com\"\n");
    syncline(&home)
        .env("SYNCLINE_CONFIG", &env)
        .arg("--config")
        .arg(&flag)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("wss://flag.example.com"))
        .stdout(predicate::str::contains("env.example.com").not());
}

#[cfg(target_os = "linux")]
#[test]
fn user_config_file_is_used() {
    let home = TempDir::new().unwrap();
    write_file(
        &home,
        "config/syncline/config.toml",
        "stream_url = \"wss://user.example.com\"\n",
    );
    syncline(&home)
        .arg("config")
        .assert()
        .success()
        .stdout(predicate::str::contains("wss://user.example.com"));
}

#[test]
fn url_flag_overrides_file() {
    let home = TempDir::new().unwrap();
    let path = write_file(&home, "custom.toml", "stream_url = \"wss://flag.example.com\"\n");
    syncline(&home)
        .arg("--config")
        .arg(&path)
        .args(["--url", "ws://127.0.0.1:9000", "config"])
        .assert()
        .success()
        .stdout(predicate::str::contains("stream_url = \"ws://127.0.0.1:9000\""));
}

#[test]
fn check_accepts_valid_config() {
    let home = TempDir::new().unwrap();
    syncline(&home)
        .args(["config", "--check"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("ok: built-in defaults"));
}

#[test]
fn check_rejects_invalid_reconnect() {
    let home = TempDir::new().unwrap();
    let path = write_file(&home, "bad.toml", "[reconnect]\nmultiplier = 0.5\n");
    syncline(&home)
        .arg("--config")
        .arg(&path)
        .args(["config", "--check"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: invalid reconnection config"));
}

#[test]
fn unparseable_file_fails() {
    let home = TempDir::new().unwrap();
    let path = write_file(&home, "broken.toml", "stream_url = [\n");
    syncline(&home)
        .arg("--config")
        .arg(&path)
        .arg("config")
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to parse config"));
}

#[test]
fn missing_explicit_file_fails() {
    let home = TempDir::new().unwrap();
    syncline(&home)
        .args(["--config", "/definitely/not/here.toml", "config"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"))
        .stderr(predicate::str::contains("hint:"));
}
