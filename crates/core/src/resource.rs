// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The reducer contract shared by every synchronized resource kind.
//!
//! A [`Resource`] describes how server events decode into patches, how a
//! patch changes the resource, how to undo it, and how a user intent turns
//! into a patch plus an outbound frame. [`Reducer`] routes events by type
//! and exposes the pure `apply(state, event) -> state` function.

use std::collections::HashMap;
use std::fmt;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::Result;
use crate::event::Event;
use crate::protocol::{event_types, ClientFrame};

/// Decodes an event payload into a patch.
pub type Decoder<P> = fn(&Value) -> std::result::Result<P, serde_json::Error>;

/// A resource kept in sync with the server.
pub trait Resource:
    Clone + fmt::Debug + Default + PartialEq + Serialize + DeserializeOwned + Send + Sync + 'static
{
    /// A single change to the resource.
    type Patch: Clone + fmt::Debug + PartialEq + Send + Sync + 'static;
    /// A user action, planned locally before it reaches the server.
    type Intent: fmt::Debug + DeserializeOwned + Send + 'static;

    /// Lowercase kind name, e.g. `board`.
    const KIND: &'static str;

    /// Event types this resource handles and their payload decoders.
    fn routes() -> Vec<(&'static str, Decoder<Self::Patch>)>;

    /// Builds the resource from a `full_sync` payload.
    fn from_snapshot(data: &Value) -> std::result::Result<Self, serde_json::Error> {
        serde_json::from_value(data.clone())
    }

    /// Applies a patch. Patches that do not fit the state are no-ops.
    fn apply(self, patch: &Self::Patch) -> Self;

    /// Returns the patch that undoes `patch` when applied after it.
    ///
    /// Must satisfy `s.clone().apply(p).apply(&s.invert(p)) == s`.
    fn invert(&self, patch: &Self::Patch) -> Self::Patch;

    /// Validates an intent against the current state.
    fn plan(&self, intent: &Self::Intent) -> Result<Planned<Self::Patch>>;
}

/// A validated intent: the local change and the frame announcing it.
#[derive(Debug, Clone, PartialEq)]
pub struct Planned<P> {
    pub forward: P,
    pub frame: ClientFrame,
}

/// What an event means for the resource.
#[derive(Debug, Clone, PartialEq)]
pub enum Step<R: Resource> {
    /// Apply a single change.
    Patch(R::Patch),
    /// Replace the whole resource.
    Replace(R),
    /// No reducer is registered for the event type.
    Ignore,
}

/// Routes events to the decoder registered for their type.
pub struct Reducer<R: Resource> {
    routes: HashMap<&'static str, Decoder<R::Patch>>,
}

impl<R: Resource> Reducer<R> {
    pub fn new() -> Self {
        Reducer {
            routes: R::routes().into_iter().collect(),
        }
    }

    /// True if `event_type` is routed to this resource (including `full_sync`).
    pub fn handles(&self, event_type: &str) -> bool {
        event_type == event_types::FULL_SYNC || self.routes.contains_key(event_type)
    }

    /// Decodes an event without touching any state.
    pub fn decode(&self, event: &Event) -> Result<Step<R>> {
        if event.event_type() == event_types::FULL_SYNC {
            return Ok(Step::Replace(R::from_snapshot(event.payload())?));
        }
        match self.routes.get(event.event_type()) {
            Some(decode) => Ok(Step::Patch(decode(event.payload())?)),
            None => Ok(Step::Ignore),
        }
    }

    /// `apply(state, event) -> state`. A payload that fails to decode leaves
    /// the state untouched.
    pub fn apply(&self, state: R, event: &Event) -> R {
        match self.decode(event) {
            Ok(Step::Patch(patch)) => state.apply(&patch),
            Ok(Step::Replace(next)) => next,
            Ok(Step::Ignore) | Err(_) => state,
        }
    }
}

impl<R: Resource> Default for Reducer<R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<R: Resource> Clone for Reducer<R> {
    fn clone(&self) -> Self {
        Reducer {
            routes: self.routes.clone(),
        }
    }
}

impl<R: Resource> fmt::Debug for Reducer<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<&str> = self.routes.keys().copied().collect();
        types.sort_unstable();
        f.debug_struct("Reducer")
            .field("kind", &R::KIND)
            .field("routes", &types)
            .finish()
    }
}

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
