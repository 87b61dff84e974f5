// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! `syncline fetch`: one snapshot over the HTTP fallback.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sl_client::{Fallback, HttpFallback};
use sl_core::{Resource, ResourceId};
use tracing::debug;

use crate::config::Resolved;
use crate::error::{Error, Result};

#[derive(Debug, Serialize)]
pub struct FetchOutput<R> {
    pub kind: &'static str,
    pub resource_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    pub resource: R,
}

pub async fn run<R: Resource>(id: &str, resolved: Resolved) -> Result<()> {
    let resource_id = ResourceId::new(id)?;
    resolved.config.validate()?;
    let fallback = HttpFallback::new(&resolved.config)?;
    debug!("fetching {} {}", R::KIND, resource_id);

    let snapshot = fallback
        .fetch_snapshot(&resource_id, resolved.credential.as_ref())
        .await?;
    let resource = R::from_snapshot(&snapshot.data).map_err(|source| Error::Snapshot {
        kind: R::KIND,
        source,
    })?;

    let output = FetchOutput {
        kind: R::KIND,
        resource_id: resource_id.to_string(),
        timestamp: snapshot.timestamp,
        seq: snapshot.seq,
        resource,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
