// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use serde_json::json;
use similar_asserts::assert_eq;
use sl_core::{Board, BoardIntent, Task, Transcript, TranscriptIntent};

fn view(board: Board) -> SyncView<Board> {
    SyncView {
        resource: Arc::new(board),
        connection: ConnectionState::Connected,
        retry_attempt: 0,
        last_error: None,
        pending: 1,
        synced_at: None,
        generation: Generation::new(2),
        revision: 5,
    }
}

#[test]
fn view_line_shape() {
    let board: Board = [Task {
        id: "T1".to_string(),
        title: "Parser".to_string(),
        column: "doing".to_string(),
        assignee: None,
        updated_at: None,
    }]
    .into_iter()
    .collect();
    let view = view(board);

    let value = serde_json::to_value(ViewLine::new(&view)).unwrap();
    assert_eq!(
        value,
        json!({
            "connection": {"state": "connected"},
            "retry_attempt": 0,
            "pending": 1,
            "generation": 2,
            "revision": 5,
            "resource": {
                "tasks": {"T1": {"id": "T1", "title": "Parser", "column": "doing"}}
            }
        })
    );
}

#[test]
fn view_line_renders_last_error_as_text() {
    let mut view = view(Board::default());
    view.last_error = Some(SyncError::Server("quota exceeded".to_string()));

    let value = serde_json::to_value(ViewLine::new(&view)).unwrap();
    assert_eq!(value["last_error"], json!("server error: quota exceeded"));
}

#[test]
fn parse_board_intent() {
    let intent = parse_intent::<Board>(r#" {"type":"move","task_id":"T1","column":"done"} "#)
        .unwrap()
        .unwrap();
    assert_eq!(
        intent,
        BoardIntent::Move {
            task_id: "T1".to_string(),
            column: "done".to_string(),
        }
    );
}

#[test]
fn parse_transcript_intent() {
    let intent = parse_intent::<Transcript>(r#"{"type":"send","id":"m7","content":"hi"}"#)
        .unwrap()
        .unwrap();
    assert_eq!(
        intent,
        TranscriptIntent::Send {
            id: "m7".to_string(),
            content: "hi".to_string(),
        }
    );
}

#[test]
fn blank_lines_are_skipped() {
    assert!(parse_intent::<Board>("   ").unwrap().is_none());
}

#[test]
fn malformed_intent_is_an_error() {
    assert!(parse_intent::<Board>(r#"{"type":"fly"}"#).is_err());
    assert!(parse_intent::<Board>("not json").is_err());
}
