// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! WebSocket protocol frames for client-server communication.
//!
//! The protocol is simple:
//! - Server pushes [`Envelope`](crate::event::Envelope)s, one per event
//! - Client sends [`ClientFrame`]s: pings, sync requests and intents
//!
//! Every client frame carries the envelope version in `v`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::id::ResourceId;
use crate::mutation::MutationId;

/// Version stamped on every outbound frame.
pub const ENVELOPE_VERSION: u32 = 1;

/// Reserved event types handled by the engine rather than by reducers.
pub mod event_types {
    /// Authoritative snapshot; replaces the resource.
    pub const FULL_SYNC: &str = "full_sync";
    /// Reply to a client ping.
    pub const PONG: &str = "pong";
    /// Server accepted the mutation named by `mutation_id`.
    pub const ACK: &str = "mutation_ack";
    /// Server refused the mutation named by `mutation_id`.
    pub const REJECTED: &str = "mutation_rejected";
    /// Server-side error report.
    pub const ERROR: &str = "error";
}

/// Outbound frame: `{"type": ..., "v": 1, ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientFrame {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "v", default = "default_version")]
    pub version: u32,
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

fn default_version() -> u32 {
    ENVELOPE_VERSION
}

impl ClientFrame {
    /// Creates a frame with no fields.
    pub fn new(kind: impl Into<String>) -> Self {
        ClientFrame {
            kind: kind.into(),
            version: ENVELOPE_VERSION,
            fields: Map::new(),
        }
    }

    /// Adds a field. `type` and `v` are reserved and ignored.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if key != "type" && key != "v" {
            self.fields.insert(key, value.into());
        }
        self
    }

    /// Keepalive probe.
    pub fn ping(id: u64) -> Self {
        ClientFrame::new("ping").with("id", id)
    }

    /// Asks the server for a `full_sync` of the resource.
    pub fn sync_request(resource_id: &ResourceId) -> Self {
        ClientFrame::new("sync_request").with("resource_id", resource_id.as_str())
    }

    /// Tags an intent frame with the mutation it carries.
    pub fn with_mutation(self, id: MutationId) -> Self {
        self.with("mutation_id", id.get())
    }

    /// Mutation id carried by this frame, if any.
    pub fn mutation_id(&self) -> Option<MutationId> {
        self.fields
            .get("mutation_id")
            .and_then(Value::as_u64)
            .map(MutationId::new)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Serializes the frame to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes a frame from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
