// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The four resource kinds served by the dashboard.

mod board;
mod interview;
mod trace;
mod transcript;

pub use board::{Board, BoardIntent, BoardPatch, Task};
pub use interview::{Interview, InterviewIntent, InterviewPatch, InterviewStatus, Question};
pub use trace::{NodeStatus, Trace, TraceIntent, TraceNode};
pub use transcript::{Message, Transcript, TranscriptIntent};

use std::fmt;
use std::str::FromStr;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Error;

/// Resource kind names, as used on the command line and in logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Transcript,
    Board,
    Trace,
    Interview,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 4] = [
        ResourceKind::Transcript,
        ResourceKind::Board,
        ResourceKind::Trace,
        ResourceKind::Interview,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::Transcript => "transcript",
            ResourceKind::Board => "board",
            ResourceKind::Trace => "trace",
            ResourceKind::Interview => "interview",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::UnknownKind(s.to_string()))
    }
}

/// Items of a list resource are identified by a string key.
pub trait Keyed {
    fn key(&self) -> &str;
}

/// Change to an id-keyed list. Arrival order is preserved.
#[derive(Debug, Clone, PartialEq)]
pub enum ListPatch<T> {
    /// Overwrite the item with the same id in place, or append it.
    Upsert(T),
    /// Remove the item with this id.
    Remove { id: String },
    /// Put the item back at `index`; used to undo a removal.
    InsertAt { index: usize, item: T },
}

#[derive(Deserialize)]
struct Removal {
    #[serde(alias = "task_id", alias = "node_id", alias = "message_id")]
    id: String,
}

/// Decoder for payloads that carry a whole item.
pub(crate) fn decode_upsert<T: DeserializeOwned>(
    data: &Value,
) -> Result<ListPatch<T>, serde_json::Error> {
    T::deserialize(data).map(ListPatch::Upsert)
}

/// Decoder for payloads that carry only an id.
pub(crate) fn decode_remove<T>(data: &Value) -> Result<ListPatch<T>, serde_json::Error> {
    Removal::deserialize(data).map(|r| ListPatch::Remove { id: r.id })
}

pub(crate) fn apply_list<T: Keyed + Clone>(items: &mut Vec<T>, patch: &ListPatch<T>) {
    match patch {
        ListPatch::Upsert(item) => match position(items, item.key()) {
            Some(i) => items[i] = item.clone(),
            None => items.push(item.clone()),
        },
        ListPatch::Remove { id } => {
            if let Some(i) = position(items, id) {
                items.remove(i);
            }
        }
        ListPatch::InsertAt { index, item } => match position(items, item.key()) {
            Some(i) => items[i] = item.clone(),
            None => items.insert((*index).min(items.len()), item.clone()),
        },
    }
}

pub(crate) fn invert_list<T: Keyed + Clone>(items: &[T], patch: &ListPatch<T>) -> ListPatch<T> {
    match patch {
        ListPatch::Upsert(item) | ListPatch::InsertAt { item, .. } => {
            match position(items, item.key()) {
                Some(i) => ListPatch::Upsert(items[i].clone()),
                None => ListPatch::Remove {
                    id: item.key().to_string(),
                },
            }
        }
        ListPatch::Remove { id } => match position(items, id) {
            Some(i) => ListPatch::InsertAt {
                index: i,
                item: items[i].clone(),
            },
            None => ListPatch::Remove { id: id.clone() },
        },
    }
}

fn position<T: Keyed>(items: &[T], id: &str) -> Option<usize> {
    items.iter().position(|item| item.key() == id)
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
