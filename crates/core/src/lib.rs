// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sl-core: Pure building blocks for the syncline client.
//!
//! Nothing in this crate performs I/O. It provides the data model, the
//! reconnection policy and connection state machine, the reducer contract
//! (`apply(state, event) -> state`) for each synchronized resource kind,
//! and the bookkeeping for optimistic mutations. The async driver lives in
//! `sl-client`.

pub mod backoff;
pub mod connection;
pub mod error;
pub mod event;
pub mod id;
pub mod mutation;
pub mod protocol;
pub mod resource;
pub mod resources;
pub mod store;

pub use backoff::{ReconnectionConfig, ReconnectionPolicy};
pub use connection::{CloseKind, ConnectionMachine, ConnectionState, Next};
pub use error::{Error, Result};
pub use event::{Envelope, Event, Generation};
pub use id::ResourceId;
pub use mutation::{MutationId, MutationTracker, PendingMutation, StalePolicy};
pub use protocol::ClientFrame;
pub use resource::{Planned, Reducer, Resource, Step};
pub use resources::{
    Board, BoardIntent, BoardPatch, Interview, InterviewIntent, InterviewPatch, InterviewStatus,
    ListPatch, Message, NodeStatus, Question, ResourceKind, Task, Trace, TraceIntent, TraceNode,
    Transcript, TranscriptIntent,
};
pub use store::{Applied, StateStore};
