// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Help and usage output of the `syncline` binary.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;
use yare::parameterized;

#[test]
fn help_lists_commands_and_quickstart() {
    let home = TempDir::new().unwrap();
    syncline(&home)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("watch"))
        .stdout(predicate::str::contains("fetch"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("Get started:"));
}

#[test]
fn version_flag() {
    let home = TempDir::new().unwrap();
    syncline(&home)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("syncline "));
}

#[test]
fn no_command_is_a_usage_error() {
    let home = TempDir::new().unwrap();
    syncline(&home)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Usage:"));
}

#[parameterized(
    watch = { "watch" },
    fetch = { "fetch" },
    config = { "config" },
)]
fn command_supports_help_flag(cmd: &str) {
    let home = TempDir::new().unwrap();
    syncline(&home)
        .args([cmd, "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Usage:"));
}

#[test]
fn watch_help_documents_intents() {
    let home = TempDir::new().unwrap();
    syncline(&home)
        .args(["watch", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("JSON lines on stdin"))
        .stdout(predicate::str::contains("--once"));
}

#[test]
fn unknown_kind_fails_with_hint() {
    let home = TempDir::new().unwrap();
    syncline(&home)
        .args(["watch", "kanban", "b1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown resource kind: 'kanban'"));
}
