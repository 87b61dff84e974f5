// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Sole owner of a synchronized resource.
//!
//! Readers get `Arc` snapshots; every write goes through the store and bumps
//! its revision.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::event::Event;
use crate::id::ResourceId;
use crate::resource::{Planned, Reducer, Resource, Step};

/// Outcome of feeding an event to the store.
#[derive(Debug, Clone, PartialEq)]
pub enum Applied {
    /// A reducer changed the resource.
    Patched,
    /// A `full_sync` replaced the resource.
    Replaced { synced_at: DateTime<Utc> },
    /// No reducer handles the event type.
    Ignored,
    /// The payload did not decode; the resource is unchanged.
    Rejected(String),
}

#[derive(Debug)]
pub struct StateStore<R: Resource> {
    resource_id: ResourceId,
    state: Arc<R>,
    reducer: Reducer<R>,
    synced_at: Option<DateTime<Utc>>,
    revision: u64,
}

impl<R: Resource> StateStore<R> {
    /// Creates a store holding the empty resource.
    pub fn new(resource_id: ResourceId) -> Self {
        StateStore {
            resource_id,
            state: Arc::new(R::default()),
            reducer: Reducer::new(),
            synced_at: None,
            revision: 0,
        }
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn state(&self) -> &R {
        &self.state
    }

    /// Cheap read-only snapshot of the current resource.
    pub fn snapshot(&self) -> Arc<R> {
        Arc::clone(&self.state)
    }

    pub fn reducer(&self) -> &Reducer<R> {
        &self.reducer
    }

    /// Server timestamp of the last authoritative snapshot.
    pub fn synced_at(&self) -> Option<DateTime<Utc>> {
        self.synced_at
    }

    /// Number of writes so far.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Routes an event through the reducer.
    pub fn apply_event(&mut self, event: &Event) -> Applied {
        match self.reducer.decode(event) {
            Ok(Step::Patch(patch)) => {
                self.apply_patch(&patch);
                Applied::Patched
            }
            Ok(Step::Replace(next)) => {
                let at = event.server_timestamp();
                self.replace(next, at);
                Applied::Replaced { synced_at: at }
            }
            Ok(Step::Ignore) => Applied::Ignored,
            Err(e) => Applied::Rejected(e.to_string()),
        }
    }

    /// Applies a patch (server event, optimistic change or rollback).
    pub fn apply_patch(&mut self, patch: &R::Patch) {
        let current = std::mem::take(&mut self.state);
        self.state = Arc::new(Arc::unwrap_or_clone(current).apply(patch));
        self.revision += 1;
    }

    /// Atomically replaces the resource with an authoritative snapshot.
    pub fn replace(&mut self, state: R, synced_at: DateTime<Utc>) {
        self.state = Arc::new(state);
        self.synced_at = Some(synced_at);
        self.revision += 1;
    }

    /// Validates an intent against the current state.
    pub fn plan(&self, intent: &R::Intent) -> Result<Planned<R::Patch>> {
        self.state.plan(intent)
    }

    /// Patch undoing `patch` if applied now.
    pub fn invert(&self, patch: &R::Patch) -> R::Patch {
        self.state.invert(patch)
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
