// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `syncline watch`: one session, view changes out, intents in.

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use sl_client::{Fallback, HttpFallback, SyncError, SyncHandle, SyncSession, SyncView, WebSocketTransport};
use sl_core::{ConnectionState, Generation, Resource};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

use crate::config::Resolved;
use crate::error::{Error, Result};

/// One line of `watch` output.
#[derive(Debug, Serialize)]
pub struct ViewLine<'a, R> {
    pub connection: &'a ConnectionState,
    pub retry_attempt: u32,
    pub pending: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub synced_at: Option<DateTime<Utc>>,
    pub generation: Generation,
    pub revision: u64,
    pub resource: &'a R,
}

impl<'a, R: Resource> ViewLine<'a, R> {
    pub fn new(view: &'a SyncView<R>) -> Self {
        ViewLine {
            connection: &view.connection,
            retry_attempt: view.retry_attempt,
            pending: view.pending,
            last_error: view.last_error.as_ref().map(ToString::to_string),
            synced_at: view.synced_at,
            generation: view.generation,
            revision: view.revision,
            resource: &view.resource,
        }
    }
}

/// Parses one stdin line. Blank lines yield `None`.
pub fn parse_intent<R: Resource>(line: &str) -> Result<Option<R::Intent>> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(line)?))
}

fn print_view<R: Resource>(view: &SyncView<R>) -> Result<()> {
    let line = serde_json::to_string(&ViewLine::new(view))?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{}", line)?;
    out.flush()?;
    Ok(())
}

async fn submit<R: Resource>(handle: &SyncHandle<R>, line: &str) {
    let intent = match parse_intent::<R>(line) {
        Ok(Some(intent)) => intent,
        Ok(None) => return,
        Err(e) => {
            warn!("ignoring intent: {}", e);
            return;
        }
    };
    match handle.dispatch_intent(intent).await {
        Ok(id) => info!("submitted {}", id),
        // Also reported through last_error
        Err(e) => warn!("intent failed: {}", e),
    }
}

/// Runs until interrupted, until the connection gives up, or with `once`
/// until the first snapshot has been applied.
pub async fn run<R: Resource>(id: &str, resolved: Resolved, once: bool) -> Result<()> {
    let fallback: Arc<dyn Fallback> = Arc::new(HttpFallback::new(&resolved.config)?);
    let session = SyncSession::<R>::spawn(
        id,
        resolved.config,
        WebSocketTransport::new(),
        Some(fallback),
    )?;
    let handle = session.handle();
    let mut views = handle.watch();
    info!("watching {} {}", R::KIND, id);

    print_view(&views.borrow_and_update().clone())?;
    handle.connect(resolved.credential)?;

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let outcome = loop {
        tokio::select! {
            changed = views.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let view = views.borrow_and_update().clone();
                print_view(&view)?;
                if view.connection == ConnectionState::Failed {
                    break Err(Error::Connection(
                        view.last_error.unwrap_or(SyncError::RetryExhausted),
                    ));
                }
                if once && view.synced_at.is_some() {
                    break Ok(());
                }
            }
            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) => submit(&handle, &line).await,
                Ok(None) => stdin_open = false,
                Err(e) => {
                    warn!("stdin closed: {}", e);
                    stdin_open = false;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted");
                break Ok(());
            }
        }
    };

    session.shutdown().await;
    outcome
}

#[cfg(test)]
#[path = "watch_tests.rs"]
mod tests;
