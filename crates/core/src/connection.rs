// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Connection lifecycle state machine.
//!
//! ```text
//!                connect            open
//! Disconnected ──────────► Connecting ─────► Connected
//!      ▲                    ▲     │              │
//!      │ clean close        │     │ abnormal     │ abnormal close / error
//!      └────────────────────┼─────┴──────────────┤
//!                           │ timer              ▼
//!                           └──────────── Reconnecting { attempt } ──► Failed
//!                                           (attempt < max)         (budget spent)
//! ```
//!
//! The machine performs no I/O. Each input returns a [`Next`] telling the
//! driver what to do (open a socket, schedule a retry, give up).

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::backoff::ReconnectionPolicy;
use crate::event::Generation;

/// Observable state of a duplex connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ConnectionState {
    /// No connection and none scheduled.
    Disconnected,
    /// A connection attempt is in flight.
    Connecting,
    /// The connection is open.
    Connected,
    /// Waiting for the backoff delay before retry number `attempt`.
    Reconnecting {
        /// Retry number, starting at 1.
        attempt: u32,
        /// When the retry fires.
        resume_at: DateTime<Utc>,
    },
    /// The retry budget is exhausted; only a manual connect leaves this state.
    Failed,
}

impl ConnectionState {
    /// Short lowercase name, used in logs and status output.
    pub fn name(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Reconnecting { .. } => "reconnecting",
            ConnectionState::Failed => "failed",
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }

    /// Retry number while reconnecting, 0 otherwise.
    pub fn retry_attempt(&self) -> u32 {
        match self {
            ConnectionState::Reconnecting { attempt, .. } => *attempt,
            _ => 0,
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConnectionState::Reconnecting { attempt, .. } => {
                write!(f, "reconnecting (attempt {})", attempt)
            }
            other => f.write_str(other.name()),
        }
    }
}

/// How a connection ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseKind {
    /// Normal or going-away close: the peer meant it, do not retry.
    Clean,
    /// Refused, reset, protocol error, missed heartbeat, ...
    Abnormal,
}

/// Action the driver must take after feeding an input to the machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next {
    /// Nothing to do.
    Stay,
    /// Start a connection attempt now.
    Open,
    /// Schedule a connection attempt after `delay`.
    Retry { attempt: u32, delay: Duration },
    /// The retry budget is spent; the machine is now `Failed`.
    GiveUp,
}

/// Connection lifecycle state machine driven by [`ReconnectionPolicy`].
#[derive(Debug, Clone)]
pub struct ConnectionMachine {
    state: ConnectionState,
    attempt: u32,
    generation: Generation,
    policy: ReconnectionPolicy,
}

impl ConnectionMachine {
    /// Creates a disconnected machine.
    pub fn new(policy: ReconnectionPolicy) -> Self {
        ConnectionMachine {
            state: ConnectionState::Disconnected,
            attempt: 0,
            generation: Generation::default(),
            policy,
        }
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    /// Number of retries made since the last successful open.
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Generation of the most recent successful open.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    pub fn policy(&self) -> &ReconnectionPolicy {
        &self.policy
    }

    /// Explicit connect request.
    ///
    /// From `Failed` the retry budget starts over. A connect while a retry is
    /// scheduled skips the rest of the wait but keeps the attempt count.
    pub fn connect(&mut self) -> Next {
        match self.state {
            ConnectionState::Disconnected | ConnectionState::Failed => {
                self.attempt = 0;
                self.state = ConnectionState::Connecting;
                Next::Open
            }
            ConnectionState::Reconnecting { .. } => {
                self.state = ConnectionState::Connecting;
                Next::Open
            }
            ConnectionState::Connecting | ConnectionState::Connected => Next::Stay,
        }
    }

    /// The in-flight attempt succeeded.
    ///
    /// Returns the new generation, or `None` if no attempt was in flight (the
    /// caller must then discard the connection).
    pub fn opened(&mut self) -> Option<Generation> {
        if self.state != ConnectionState::Connecting {
            return None;
        }
        self.state = ConnectionState::Connected;
        self.attempt = 0;
        self.generation = self.generation.next();
        Some(self.generation)
    }

    /// The connection (or the attempt) ended.
    pub fn closed(&mut self, kind: CloseKind, now: DateTime<Utc>) -> Next {
        if !matches!(
            self.state,
            ConnectionState::Connecting | ConnectionState::Connected
        ) {
            return Next::Stay;
        }

        match kind {
            CloseKind::Clean => {
                self.state = ConnectionState::Disconnected;
                self.attempt = 0;
                Next::Stay
            }
            CloseKind::Abnormal if self.policy.allows(self.attempt) => {
                let delay = self.policy.delay(self.attempt);
                self.attempt += 1;
                let resume_at = chrono::Duration::from_std(delay)
                    .ok()
                    .and_then(|d| now.checked_add_signed(d))
                    .unwrap_or(now);
                self.state = ConnectionState::Reconnecting {
                    attempt: self.attempt,
                    resume_at,
                };
                Next::Retry {
                    attempt: self.attempt,
                    delay,
                }
            }
            CloseKind::Abnormal => {
                self.state = ConnectionState::Failed;
                Next::GiveUp
            }
        }
    }

    /// The backoff delay elapsed.
    pub fn retry_due(&mut self) -> Next {
        match self.state {
            ConnectionState::Reconnecting { .. } => {
                self.state = ConnectionState::Connecting;
                Next::Open
            }
            _ => Next::Stay,
        }
    }

    /// Explicit disconnect. Idempotent; returns true if the state changed.
    pub fn disconnect(&mut self) -> bool {
        self.attempt = 0;
        if self.state == ConnectionState::Disconnected {
            return false;
        }
        self.state = ConnectionState::Disconnected;
        true
    }
}

#[cfg(test)]
#[path = "connection_tests.rs"]
mod tests;
