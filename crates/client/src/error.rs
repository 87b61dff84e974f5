// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for sl-client.

use thiserror::Error;

/// Errors surfaced to the consumer as `last_error`.
///
/// Cloneable so every view snapshot can carry one.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("Maximum reconnection attempts reached")]
    RetryExhausted,

    #[error("{kind} failed: {reason}")]
    IntentFailed { kind: String, reason: String },

    #[error("{kind} rejected by server: {reason}")]
    IntentRejected { kind: String, reason: String },

    #[error("{kind} was not confirmed in time and was rolled back")]
    IntentTimedOut { kind: String },

    #[error("{0}")]
    Intent(String),

    #[error("snapshot fetch failed: {0}")]
    SnapshotFetch(String),

    #[error("server error: {0}")]
    Server(String),
}

/// Errors returned synchronously by the session API.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] sl_core::Error),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read config {path}: {source}")]
    ConfigIo {
        path: String,
        source: std::io::Error,
    },

    #[error("failed to parse config {path}: {source}")]
    ConfigParse {
        path: String,
        source: toml::de::Error,
    },

    #[error("session closed")]
    SessionClosed,

    #[error(transparent)]
    Intent(SyncError),
}

/// A specialized Result type for sl-client operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
