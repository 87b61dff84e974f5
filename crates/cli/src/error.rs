// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

use thiserror::Error;

/// All errors the `syncline` binary reports.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Client(#[from] sl_client::Error),

    #[error(transparent)]
    Core(#[from] sl_core::Error),

    #[error("config file not found: {0}\n  hint: check --config or $SYNCLINE_CONFIG")]
    ConfigNotFound(String),

    #[error("fetch failed: {0}")]
    Fetch(#[from] sl_client::FallbackError),

    #[error("invalid snapshot for {kind}: {source}")]
    Snapshot {
        kind: &'static str,
        source: serde_json::Error,
    },

    #[error("connection failed: {0}\n  hint: check --url and --token, then run the command again")]
    Connection(sl_client::SyncError),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A specialized Result type for syncline operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
