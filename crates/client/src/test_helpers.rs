// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers: an in-memory transport and fallback.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use reqwest::Url;
use serde_json::Value;
use sl_core::{ClientFrame, CloseKind, Envelope, ResourceId};
use tokio::sync::mpsc;

use crate::credential::Credential;
use crate::fallback::{Fallback, FallbackError, Snapshot};
use crate::transport::{
    BoxFuture, FrameSink, FrameStream, Inbound, Transport, TransportError, TransportResult,
};

#[derive(Default)]
struct MockState {
    refuse: u32,
    refuse_all: bool,
    connect_delay: Option<Duration>,
    attempts: u32,
    urls: Vec<String>,
    peers: Vec<MockPeer>,
    sent: Vec<String>,
    fail_sends: bool,
    closes: u32,
}

/// Mock transport for testing without real sockets.
#[derive(Clone, Default)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Refuse the next `n` connection attempts.
    pub fn refuse_next(&self, n: u32) {
        self.state.lock().unwrap().refuse = n;
    }

    /// Refuse every connection attempt until turned off.
    pub fn refuse_all(&self, refuse: bool) {
        self.state.lock().unwrap().refuse_all = refuse;
    }

    /// Delay each connection attempt.
    pub fn connect_delay(&self, delay: Duration) {
        self.state.lock().unwrap().connect_delay = Some(delay);
    }

    /// Make every send fail.
    pub fn fail_sends(&self, fail: bool) {
        self.state.lock().unwrap().fail_sends = fail;
    }

    pub fn attempts(&self) -> u32 {
        self.state.lock().unwrap().attempts
    }

    pub fn urls(&self) -> Vec<String> {
        self.state.lock().unwrap().urls.clone()
    }

    /// Server side of the `n`th successful connection.
    pub fn peer(&self, n: usize) -> MockPeer {
        self.state.lock().unwrap().peers[n].clone()
    }

    pub fn peer_count(&self) -> usize {
        self.state.lock().unwrap().peers.len()
    }

    /// Every text frame sent so far, on any connection.
    pub fn sent(&self) -> Vec<String> {
        self.state.lock().unwrap().sent.clone()
    }

    /// Sent frames decoded as client frames.
    pub fn sent_frames(&self) -> Vec<ClientFrame> {
        self.sent()
            .iter()
            .map(|s| ClientFrame::from_json(s).unwrap())
            .collect()
    }

    /// Sent frames of one type.
    pub fn sent_of(&self, kind: &str) -> Vec<ClientFrame> {
        self.sent_frames()
            .into_iter()
            .filter(|f| f.kind == kind)
            .collect()
    }

    /// Number of clean closes initiated by the client.
    pub fn closes(&self) -> u32 {
        self.state.lock().unwrap().closes
    }
}

/// Server end of a mock connection.
#[derive(Clone)]
pub struct MockPeer {
    tx: mpsc::UnboundedSender<TransportResult<Inbound>>,
}

impl MockPeer {
    pub fn push_text(&self, text: &str) {
        let _ = self.tx.send(Ok(Inbound::Text(text.to_string())));
    }

    pub fn push(&self, envelope: &Envelope) {
        self.push_text(&envelope.to_json().unwrap());
    }

    pub fn heartbeat(&self) {
        let _ = self.tx.send(Ok(Inbound::Heartbeat));
    }

    pub fn close(&self, kind: CloseKind) {
        let _ = self.tx.send(Ok(Inbound::Closed(kind)));
    }

    pub fn fail(&self, reason: &str) {
        let _ = self
            .tx
            .send(Err(TransportError::ReceiveFailed(reason.to_string())));
    }
}

pub struct MockSink {
    state: Arc<Mutex<MockState>>,
}

pub struct MockStream {
    rx: mpsc::UnboundedReceiver<TransportResult<Inbound>>,
}

impl Transport for MockTransport {
    type Sink = MockSink;
    type Stream = MockStream;

    fn connect(&self, url: &Url) -> BoxFuture<'static, TransportResult<(MockSink, MockStream)>> {
        let state = Arc::clone(&self.state);
        let url = url.to_string();
        Box::pin(async move {
            let delay = state.lock().unwrap().connect_delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }

            let mut guard = state.lock().unwrap();
            guard.attempts += 1;
            guard.urls.push(url);
            if guard.refuse_all {
                return Err(TransportError::ConnectionFailed("refused".into()));
            }
            if guard.refuse > 0 {
                guard.refuse -= 1;
                return Err(TransportError::ConnectionFailed("refused".into()));
            }

            let (tx, rx) = mpsc::unbounded_channel();
            guard.peers.push(MockPeer { tx });
            drop(guard);
            Ok((MockSink { state }, MockStream { rx }))
        })
    }
}

impl FrameSink for MockSink {
    fn send(&mut self, text: String) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            let mut guard = self.state.lock().unwrap();
            if guard.fail_sends {
                return Err(TransportError::SendFailed("broken pipe".into()));
            }
            guard.sent.push(text);
            Ok(())
        })
    }

    fn close(&mut self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.state.lock().unwrap().closes += 1;
            Ok(())
        })
    }
}

impl FrameStream for MockStream {
    fn next_frame(&mut self) -> BoxFuture<'_, TransportResult<Inbound>> {
        Box::pin(async move {
            match self.rx.recv().await {
                Some(frame) => frame,
                None => Ok(Inbound::Closed(CloseKind::Abnormal)),
            }
        })
    }
}

#[derive(Default)]
struct FallbackState {
    snapshots: VecDeque<Result<Snapshot, FallbackError>>,
    fetches: u32,
    posts: Vec<Value>,
    fail_posts: bool,
    fetch_delay: Option<Duration>,
}

/// In-memory request/response fallback.
#[derive(Clone, Default)]
pub struct MockFallback {
    state: Arc<Mutex<FallbackState>>,
}

impl MockFallback {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next fetch.
    pub fn respond(&self, result: Result<Snapshot, FallbackError>) {
        self.state.lock().unwrap().snapshots.push_back(result);
    }

    pub fn fetch_delay(&self, delay: Duration) {
        self.state.lock().unwrap().fetch_delay = Some(delay);
    }

    pub fn fail_posts(&self, fail: bool) {
        self.state.lock().unwrap().fail_posts = fail;
    }

    pub fn fetches(&self) -> u32 {
        self.state.lock().unwrap().fetches
    }

    pub fn posts(&self) -> Vec<Value> {
        self.state.lock().unwrap().posts.clone()
    }
}

impl Fallback for MockFallback {
    fn fetch_snapshot(
        &self,
        _resource_id: &ResourceId,
        _credential: Option<&Credential>,
    ) -> BoxFuture<'static, Result<Snapshot, FallbackError>> {
        let state = Arc::clone(&self.state);
        Box::pin(async move {
            let delay = state.lock().unwrap().fetch_delay;
            if let Some(delay) = delay {
                tokio::time::sleep(delay).await;
            }
            let mut guard = state.lock().unwrap();
            guard.fetches += 1;
            guard
                .snapshots
                .pop_front()
                .unwrap_or_else(|| Err(FallbackError::Status(404)))
        })
    }

    fn post_mutation(
        &self,
        _resource_id: &ResourceId,
        _credential: Option<&Credential>,
        frame: &ClientFrame,
    ) -> BoxFuture<'static, Result<(), FallbackError>> {
        let state = Arc::clone(&self.state);
        let body = serde_json::to_value(frame).unwrap();
        Box::pin(async move {
            let mut guard = state.lock().unwrap();
            if guard.fail_posts {
                return Err(FallbackError::Status(500));
            }
            guard.posts.push(body);
            Ok(())
        })
    }
}
