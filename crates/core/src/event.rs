// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Server-pushed events.
//!
//! Frames arrive as JSON [`Envelope`]s:
//!
//! ```json
//! {"event_type": "task_moved", "resource_id": "board-1",
//!  "timestamp": "2026-01-01T12:00:00Z", "data": {"id": "T1", "column": "done"},
//!  "seq": 42, "mutation_id": 7}
//! ```
//!
//! `seq` and `mutation_id` are optional. Once received, an envelope becomes an
//! immutable [`Event`] tagged with the [`Generation`] of the connection that
//! delivered it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::mutation::MutationId;

/// Tag identifying one successful connection. Strictly increasing per session.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Generation(u64);

impl Generation {
    pub const fn new(value: u64) -> Self {
        Generation(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Returns the following generation.
    pub fn next(self) -> Self {
        Generation(self.0.saturating_add(1))
    }
}

impl fmt::Display for Generation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wire format of an inbound event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub event_type: String,
    pub resource_id: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub data: Value,
    /// Per-resource sequence number, if the server provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seq: Option<u64>,
    /// Echo of the client mutation this event confirms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mutation_id: Option<MutationId>,
}

impl Envelope {
    /// Creates an envelope without sequence number or mutation echo.
    pub fn new(
        event_type: impl Into<String>,
        resource_id: impl Into<String>,
        timestamp: DateTime<Utc>,
        data: Value,
    ) -> Self {
        Envelope {
            event_type: event_type.into(),
            resource_id: resource_id.into(),
            timestamp,
            data,
            seq: None,
            mutation_id: None,
        }
    }

    pub fn with_seq(mut self, seq: u64) -> Self {
        self.seq = Some(seq);
        self
    }

    pub fn with_mutation(mut self, id: MutationId) -> Self {
        self.mutation_id = Some(id);
        self
    }

    /// Serializes the envelope to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserializes an envelope from JSON.
    pub fn from_json(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }
}

/// A received event. Immutable once constructed.
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    event_type: String,
    resource_id: String,
    payload: Value,
    server_timestamp: DateTime<Utc>,
    generation: Generation,
    seq: Option<u64>,
    mutation_id: Option<MutationId>,
}

impl Event {
    /// Tags a decoded envelope with the generation that received it.
    pub fn received(envelope: Envelope, generation: Generation) -> Self {
        Event {
            event_type: envelope.event_type,
            resource_id: envelope.resource_id,
            payload: envelope.data,
            server_timestamp: envelope.timestamp,
            generation,
            seq: envelope.seq,
            mutation_id: envelope.mutation_id,
        }
    }

    /// Decodes a text frame into an event.
    pub fn decode(text: &str, generation: Generation) -> Result<Self, serde_json::Error> {
        Envelope::from_json(text).map(|envelope| Event::received(envelope, generation))
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn resource_id(&self) -> &str {
        &self.resource_id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn server_timestamp(&self) -> DateTime<Utc> {
        self.server_timestamp
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn seq(&self) -> Option<u64> {
        self.seq
    }

    pub fn mutation_id(&self) -> Option<MutationId> {
        self.mutation_id
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
