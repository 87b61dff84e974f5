// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

pub mod config;
pub mod fetch;
pub mod watch;

use sl_core::{Board, Interview, ResourceKind, Trace, Transcript};

use crate::config::Resolved;
use crate::error::Result;

/// Runs `watch` for the resource type named by `kind`.
pub async fn watch_kind(kind: ResourceKind, id: &str, resolved: Resolved, once: bool) -> Result<()> {
    match kind {
        ResourceKind::Transcript => watch::run::<Transcript>(id, resolved, once).await,
        ResourceKind::Board => watch::run::<Board>(id, resolved, once).await,
        ResourceKind::Trace => watch::run::<Trace>(id, resolved, once).await,
        ResourceKind::Interview => watch::run::<Interview>(id, resolved, once).await,
    }
}

/// Runs `fetch` for the resource type named by `kind`.
pub async fn fetch_kind(kind: ResourceKind, id: &str, resolved: Resolved) -> Result<()> {
    match kind {
        ResourceKind::Transcript => fetch::run::<Transcript>(id, resolved).await,
        ResourceKind::Board => fetch::run::<Board>(id, resolved).await,
        ResourceKind::Trace => fetch::run::<Trace>(id, resolved).await,
        ResourceKind::Interview => fetch::run::<Interview>(id, resolved).await,
    }
}
