// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Bookkeeping for authoritative resynchronization.
//!
//! Each request gets a [`Ticket`]; a newer request supersedes the older one,
//! and only the outstanding ticket may complete. While connected a request
//! goes over the stream (`sync_request`, answered by `full_sync`); if that
//! cannot be sent or no answer arrives before the deadline, it falls back to
//! a fetch.

use std::fmt;
use std::time::Duration;

use tokio::time::Instant;

/// Identifies one resync request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Ticket(u64);

impl fmt::Display for Ticket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Why a resync was requested.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResyncReason {
    /// First `connect()` of the session.
    Initial,
    /// A connection (re)opened.
    Connected,
    /// The consumer asked for fresh state.
    UserRefresh,
    /// The event sequence skipped ahead.
    SequenceGap,
}

/// How the snapshot is being obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// `sync_request` sent over the stream.
    Stream,
    /// HTTP `GET /resource/{id}`.
    Fetch,
}

#[derive(Debug, Clone)]
struct Outstanding {
    ticket: Ticket,
    reason: ResyncReason,
    route: Route,
    deadline: Option<Instant>,
}

#[derive(Debug, Clone)]
pub struct ResyncCoordinator {
    next: u64,
    timeout: Duration,
    outstanding: Option<Outstanding>,
}

impl ResyncCoordinator {
    /// `timeout` bounds the wait for a `full_sync` over the stream.
    pub fn new(timeout: Duration) -> Self {
        ResyncCoordinator {
            next: 1,
            timeout,
            outstanding: None,
        }
    }

    /// Starts a new request, superseding any outstanding one.
    pub fn request(&mut self, reason: ResyncReason, connected: bool, now: Instant) -> (Ticket, Route) {
        let ticket = Ticket(self.next);
        self.next += 1;
        let (route, deadline) = if connected {
            (Route::Stream, Some(now + self.timeout))
        } else {
            (Route::Fetch, None)
        };
        self.outstanding = Some(Outstanding {
            ticket,
            reason,
            route,
            deadline,
        });
        (ticket, route)
    }

    /// Switches an outstanding stream request to a fetch.
    ///
    /// Returns the ticket to fetch with, or `None` if nothing was waiting on
    /// the stream.
    pub fn fallback(&mut self) -> Option<Ticket> {
        match &mut self.outstanding {
            Some(o) if o.route == Route::Stream => {
                o.route = Route::Fetch;
                o.deadline = None;
                Some(o.ticket)
            }
            _ => None,
        }
    }

    /// When the stream request times out.
    pub fn deadline(&self) -> Option<Instant> {
        self.outstanding.as_ref().and_then(|o| o.deadline)
    }

    /// A `full_sync` arrived over the stream. It satisfies whatever request
    /// is outstanding, including an in-flight fetch.
    pub fn on_snapshot_event(&mut self) -> Option<Ticket> {
        self.outstanding.take().map(|o| o.ticket)
    }

    /// A fetch completed. True if its ticket is still the outstanding one,
    /// in which case the request is finished.
    pub fn accept_fetch(&mut self, ticket: Ticket) -> bool {
        match &self.outstanding {
            Some(o) if o.ticket == ticket && o.route == Route::Fetch => {
                self.outstanding = None;
                true
            }
            _ => false,
        }
    }

    /// Abandons the outstanding request.
    pub fn cancel(&mut self) {
        self.outstanding = None;
    }

    pub fn outstanding(&self) -> Option<(Ticket, ResyncReason, Route)> {
        self.outstanding
            .as_ref()
            .map(|o| (o.ticket, o.reason, o.route))
    }

    pub fn is_pending(&self) -> bool {
        self.outstanding.is_some()
    }
}

#[cfg(test)]
#[path = "resync_tests.rs"]
mod tests;
