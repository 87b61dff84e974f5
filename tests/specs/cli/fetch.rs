// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `syncline fetch` against a local HTTP responder.

#![allow(clippy::unwrap_used)]

mod common;

use common::*;

#[test]
fn fetch_prints_normalized_snapshot() {
    let home = TempDir::new().unwrap();
    let body = r#"{"timestamp":"2026-01-02T03:04:05Z","seq":12,"data":{"tasks":[{"id":"T1","column":"backlog"}]}}"#;
    let (url, server) = serve_once("200 OK", body);

    let output = syncline(&home)
        .args(["--url", url.as_str(), "--token", "secret", "fetch", "board", "b1"])
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));

    let printed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(printed["kind"], "board");
    assert_eq!(printed["resource_id"], "b1");
    assert_eq!(printed["seq"], 12);
    assert_eq!(printed["resource"]["tasks"]["T1"]["column"], "backlog");

    let request = server.join().unwrap().to_lowercase();
    assert!(request.starts_with("get /resource/b1 "));
    assert!(request.contains("authorization: bearer secret"));
}

#[test]
fn token_from_environment() {
    let home = TempDir::new().unwrap();
    let body = r#"{"timestamp":"2026-01-02T03:04:05Z","data":{"messages":[]}}"#;
    let (url, server) = serve_once("200 OK", body);

    syncline(&home)
        .env("SYNCLINE_TOKEN", "from-env")
        .args(["--url", url.as_str(), "fetch", "transcript", "chat-1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"messages\": []"));

    let request = server.join().unwrap().to_lowercase();
    assert!(request.starts_with("get /resource/chat-1 "));
    assert!(request.contains("authorization: bearer from-env"));
}

#[test]
fn http_error_status_fails() {
    let home = TempDir::new().unwrap();
    let (url, server) = serve_once("404 Not Found", "{}");

    syncline(&home)
        .args(["--url", url.as_str(), "fetch", "board", "b1"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("error: fetch failed"));
    server.join().unwrap();
}

#[test]
fn invalid_resource_id_fails_before_any_request() {
    let home = TempDir::new().unwrap();
    syncline(&home)
        .args(["--url", "ws://127.0.0.1:9", "fetch", "board", "bad id"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid resource id"));
}
