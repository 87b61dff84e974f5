// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Execution trace: a tree of nodes stored as a flat list with parent ids.
//!
//! The trace viewer is read-only, so [`TraceIntent`] has no variants.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{apply_list, decode_remove, decode_upsert, invert_list, Keyed, ListPatch};
use crate::error::Result;
use crate::resource::{Decoder, Planned, Resource};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    #[default]
    Pending,
    Running,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TraceNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub status: NodeStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub attributes: Value,
}

impl Keyed for TraceNode {
    fn key(&self) -> &str {
        &self.id
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trace {
    #[serde(default)]
    pub nodes: Vec<TraceNode>,
}

impl Trace {
    pub fn get(&self, id: &str) -> Option<&TraceNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes without a parent, or whose parent has not arrived yet.
    pub fn roots(&self) -> impl Iterator<Item = &TraceNode> + '_ {
        self.nodes.iter().filter(move |n| match &n.parent_id {
            Some(parent) => self.get(parent).is_none(),
            None => true,
        })
    }

    pub fn children<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a TraceNode> + 'a {
        self.nodes
            .iter()
            .filter(move |n| n.parent_id.as_deref() == Some(id))
    }
}

/// Traces accept no user actions.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub enum TraceIntent {}

impl Resource for Trace {
    type Patch = ListPatch<TraceNode>;
    type Intent = TraceIntent;

    const KIND: &'static str = "trace";

    fn routes() -> Vec<(&'static str, Decoder<Self::Patch>)> {
        let upsert: Decoder<Self::Patch> = decode_upsert;
        let remove: Decoder<Self::Patch> = decode_remove;
        vec![
            ("node_started", upsert),
            ("node_updated", upsert),
            ("node_completed", upsert),
            ("node_removed", remove),
        ]
    }

    fn apply(mut self, patch: &Self::Patch) -> Self {
        apply_list(&mut self.nodes, patch);
        self
    }

    fn invert(&self, patch: &Self::Patch) -> Self::Patch {
        invert_list(&self.nodes, patch)
    }

    fn plan(&self, intent: &Self::Intent) -> Result<Planned<Self::Patch>> {
        match *intent {}
    }
}

#[cfg(test)]
#[path = "trace_tests.rs"]
mod tests;
