// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Routes inbound frames to the store.
//!
//! Malformed, stale and foreign frames are logged and dropped; nothing here
//! ever closes the connection.

use chrono::{DateTime, Utc};
use sl_core::protocol::event_types;
use sl_core::{Applied, Event, Generation, MutationId, Resource, StateStore};
use tracing::{debug, warn};

/// Why a frame had no effect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DropReason {
    /// Delivered by a connection that has since been replaced.
    StaleGeneration,
    /// Addressed to another resource.
    ForeignResource,
    /// No reducer handles the event type.
    Unrouted,
    /// The event type is known but the payload did not decode.
    BadPayload(String),
    /// The frame is not a valid envelope.
    Malformed(String),
}

/// What the session must do after an event was dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    /// A reducer changed the resource.
    Applied {
        /// Pending mutation confirmed by this event.
        mutation_id: Option<MutationId>,
        /// The sequence number skipped ahead; a resync is needed.
        seq_gap: bool,
    },
    /// A `full_sync` replaced the resource.
    Replaced { synced_at: DateTime<Utc> },
    Ack(MutationId),
    Rejected {
        mutation_id: MutationId,
        reason: String,
    },
    ServerError(String),
    Pong,
    Dropped(DropReason),
}

/// Per-session routing state: the current generation and last applied `seq`.
#[derive(Debug, Clone, Default)]
pub struct EventDispatcher {
    generation: Generation,
    last_seq: Option<u64>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn last_seq(&self) -> Option<u64> {
        self.last_seq
    }

    /// A new connection opened. Events tagged with older generations are
    /// dropped from now on; sequence tracking restarts with the next snapshot.
    pub fn set_generation(&mut self, generation: Generation) {
        self.generation = generation;
        self.last_seq = None;
    }

    /// Decodes a text frame, tagging it with the current generation.
    pub fn decode(&self, text: &str) -> Result<Event, DropReason> {
        Event::decode(text, self.generation).map_err(|e| {
            warn!("dropping malformed frame: {}", e);
            DropReason::Malformed(e.to_string())
        })
    }

    /// Routes one event. Events are applied in the order they are given.
    pub fn dispatch<R: Resource>(&mut self, event: &Event, store: &mut StateStore<R>) -> Dispatch {
        if event.generation() < self.generation {
            debug!(
                "dropping {} from generation {} (current {})",
                event.event_type(),
                event.generation(),
                self.generation
            );
            return Dispatch::Dropped(DropReason::StaleGeneration);
        }
        if event.resource_id() != store.resource_id().as_str() {
            warn!(
                "dropping {} for resource '{}' (session is '{}')",
                event.event_type(),
                event.resource_id(),
                store.resource_id()
            );
            return Dispatch::Dropped(DropReason::ForeignResource);
        }

        match event.event_type() {
            event_types::PONG => Dispatch::Pong,
            event_types::ACK => match event.mutation_id() {
                Some(id) => Dispatch::Ack(id),
                None => bad_payload(event, "missing mutation_id"),
            },
            event_types::REJECTED => match event.mutation_id() {
                Some(id) => Dispatch::Rejected {
                    mutation_id: id,
                    reason: text_field(event, "reason").unwrap_or_else(|| "rejected".to_string()),
                },
                None => bad_payload(event, "missing mutation_id"),
            },
            event_types::ERROR => Dispatch::ServerError(
                text_field(event, "message").unwrap_or_else(|| event.payload().to_string()),
            ),
            _ => self.apply(event, store),
        }
    }

    fn apply<R: Resource>(&mut self, event: &Event, store: &mut StateStore<R>) -> Dispatch {
        match store.apply_event(event) {
            Applied::Patched => {
                let seq_gap = self.is_gap(event.seq());
                if seq_gap {
                    warn!(
                        "sequence gap before {} (last {:?}, got {:?})",
                        event.event_type(),
                        self.last_seq,
                        event.seq()
                    );
                }
                if let Some(seq) = event.seq() {
                    self.last_seq = Some(self.last_seq.map_or(seq, |last| last.max(seq)));
                }
                debug!("applied {} to {}", event.event_type(), store.resource_id());
                Dispatch::Applied {
                    mutation_id: event.mutation_id(),
                    seq_gap,
                }
            }
            Applied::Replaced { synced_at } => {
                self.last_seq = event.seq();
                debug!("replaced {} from snapshot at {}", store.resource_id(), synced_at);
                Dispatch::Replaced { synced_at }
            }
            Applied::Ignored => {
                debug!("no reducer for {}", event.event_type());
                Dispatch::Dropped(DropReason::Unrouted)
            }
            Applied::Rejected(reason) => bad_payload(event, &reason),
        }
    }

    fn is_gap(&self, seq: Option<u64>) -> bool {
        match (self.last_seq, seq) {
            (Some(last), Some(seq)) => seq > last.saturating_add(1),
            _ => false,
        }
    }
}

fn text_field(event: &Event, key: &str) -> Option<String> {
    event
        .payload()
        .get(key)
        .and_then(|v| v.as_str())
        .map(str::to_string)
}

fn bad_payload(event: &Event, reason: &str) -> Dispatch {
    warn!("dropping {}: {}", event.event_type(), reason);
    Dispatch::Dropped(DropReason::BadPayload(reason.to_string()))
}

#[cfg(test)]
#[path = "dispatcher_tests.rs"]
mod tests;
