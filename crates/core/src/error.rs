// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for sl-core operations.

use thiserror::Error;

/// All possible errors that can occur in sl-core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid resource id: '{0}'\n  hint: ids are 1-128 characters of letters, digits, '-', '_', '.' or ':'")]
    InvalidResourceId(String),

    #[error("invalid reconnection config: {0}")]
    InvalidConfig(String),

    #[error("unknown resource kind: '{0}'\n  hint: valid kinds are: transcript, board, trace, interview")]
    UnknownKind(String),

    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("question not found: {0}")]
    QuestionNotFound(String),

    #[error("duplicate message id: {0}")]
    DuplicateMessage(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for sl-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
