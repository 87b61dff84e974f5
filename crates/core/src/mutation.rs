// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bookkeeping for optimistic mutations.
//!
//! A mutation is applied locally before the server confirms it. The tracker
//! remembers the inverse patch of each unconfirmed mutation so it can be
//! rolled back on rejection, send failure or timeout.

use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::id::ResourceId;

/// Client-assigned mutation identifier, echoed by the server on confirmation.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MutationId(u64);

impl MutationId {
    pub const fn new(value: u64) -> Self {
        MutationId(value)
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for MutationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m{}", self.0)
    }
}

/// What the periodic sweep does with mutations that were never confirmed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StalePolicy {
    /// Forget the mutation and keep the local change.
    #[default]
    Discard,
    /// Undo the local change and report a timeout.
    Rollback,
}

/// An intent applied locally but not yet confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingMutation<P> {
    pub id: MutationId,
    pub submitted_at: Instant,
    /// Patch that undoes the optimistic change.
    pub inverse: P,
    pub resource_id: ResourceId,
    /// Outbound frame type, e.g. `move_task`.
    pub kind: String,
}

/// Pending mutations keyed by id, in submission order.
#[derive(Debug, Clone)]
pub struct MutationTracker<P> {
    pending: BTreeMap<MutationId, PendingMutation<P>>,
    next_id: u64,
    staleness: Duration,
    policy: StalePolicy,
}

impl<P> MutationTracker<P> {
    pub fn new(staleness: Duration, policy: StalePolicy) -> Self {
        MutationTracker {
            pending: BTreeMap::new(),
            next_id: 1,
            staleness,
            policy,
        }
    }

    /// Records a new pending mutation and returns its id.
    pub fn register(
        &mut self,
        resource_id: ResourceId,
        kind: impl Into<String>,
        inverse: P,
        now: Instant,
    ) -> MutationId {
        let id = MutationId(self.next_id);
        self.next_id += 1;
        self.pending.insert(
            id,
            PendingMutation {
                id,
                submitted_at: now,
                inverse,
                resource_id,
                kind: kind.into(),
            },
        );
        id
    }

    /// Removes a mutation (confirmed, rolled back or discarded).
    pub fn remove(&mut self, id: MutationId) -> Option<PendingMutation<P>> {
        self.pending.remove(&id)
    }

    /// Drops every pending mutation for `resource_id`, oldest first.
    pub fn clear_resource(&mut self, resource_id: &ResourceId) -> Vec<PendingMutation<P>> {
        let ids: Vec<MutationId> = self
            .pending
            .values()
            .filter(|m| &m.resource_id == resource_id)
            .map(|m| m.id)
            .collect();
        ids.into_iter()
            .filter_map(|id| self.pending.remove(&id))
            .collect()
    }

    /// Removes mutations older than the staleness window, newest first.
    ///
    /// Newest-first order lets the caller apply inverses directly when the
    /// policy is [`StalePolicy::Rollback`].
    pub fn sweep(&mut self, now: Instant) -> Vec<PendingMutation<P>> {
        let stale: Vec<MutationId> = self
            .pending
            .values()
            .filter(|m| now.saturating_duration_since(m.submitted_at) > self.staleness)
            .map(|m| m.id)
            .collect();
        stale
            .into_iter()
            .rev()
            .filter_map(|id| self.pending.remove(&id))
            .collect()
    }

    pub fn get(&self, id: MutationId) -> Option<&PendingMutation<P>> {
        self.pending.get(&id)
    }

    pub fn contains(&self, id: MutationId) -> bool {
        self.pending.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn policy(&self) -> StalePolicy {
        self.policy
    }

    pub fn staleness(&self) -> Duration {
        self.staleness
    }
}

#[cfg(test)]
#[path = "mutation_tests.rs"]
mod tests;
