// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! sl-client: Async driver for synchronized resources.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐ commands ┌──────────────────────────────┐  frames  ┌───────────┐
//! │ SyncHandle  │─────────►│ session actor                │◄────────►│ Transport │
//! │ (consumer)  │◄─────────│  ConnectionMachine           │          │ (trait)   │
//! └─────────────┘  views   │  EventDispatcher → StateStore│          └───────────┘
//!                          │  MutationTracker             │   HTTP   ┌───────────┐
//!                          │  ResyncCoordinator           │◄────────►│ Fallback  │
//!                          └──────────────────────────────┘          └───────────┘
//! ```
//!
//! One task per session owns all mutable state. Consumers talk to it through
//! a cloneable [`SyncHandle`] and observe it through [`SyncView`] snapshots.

pub mod config;
pub mod credential;
pub mod dispatcher;
pub mod error;
pub mod fallback;
pub mod resync;
pub mod session;
pub mod transport;

pub use config::{OfflinePolicy, SyncConfig};
pub use credential::Credential;
pub use dispatcher::{Dispatch, DropReason, EventDispatcher};
pub use error::{Error, Result, SyncError};
pub use fallback::{Fallback, FallbackError, HttpFallback, Snapshot};
pub use resync::{ResyncCoordinator, ResyncReason, Route, Ticket};
pub use session::{SyncHandle, SyncSession, SyncView, Transition};
pub use transport::{
    FrameSink, FrameStream, Inbound, Transport, TransportError, WebSocketTransport,
};

#[cfg(test)]
mod test_helpers;
