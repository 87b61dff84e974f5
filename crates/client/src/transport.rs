// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Transport abstraction for WebSocket communication.
//!
//! Provides a trait-based transport layer that enables:
//! - Real WebSocket connections for production
//! - Mock transports for unit testing
//!
//! A connection is split into a write half ([`FrameSink`]), owned by the
//! session actor, and a read half ([`FrameStream`]), owned by a reader task.

use std::future::Future;
use std::pin::Pin;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use reqwest::Url;
use sl_core::CloseKind;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};

/// Error type for transport operations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Connection failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// Connection closed unexpectedly.
    #[error("connection closed")]
    ConnectionClosed,

    /// Send failed.
    #[error("send failed: {0}")]
    SendFailed(String),

    /// Receive failed.
    #[error("receive failed: {0}")]
    ReceiveFailed(String),
}

/// Result type for transport operations.
pub type TransportResult<T> = Result<T, TransportError>;

/// Boxed future returned by transport methods.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// A frame read from the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A text frame carrying an event envelope.
    Text(String),
    /// A protocol-level ping or pong; counts as liveness.
    Heartbeat,
    /// The peer closed the connection.
    Closed(CloseKind),
}

/// Write half of a connection.
pub trait FrameSink: Send + 'static {
    /// Send a text frame and flush it.
    fn send(&mut self, text: String) -> BoxFuture<'_, TransportResult<()>>;

    /// Close the connection with a normal close code.
    fn close(&mut self) -> BoxFuture<'_, TransportResult<()>>;
}

/// Read half of a connection.
pub trait FrameStream: Send + 'static {
    /// Wait for the next frame.
    fn next_frame(&mut self) -> BoxFuture<'_, TransportResult<Inbound>>;
}

/// Opens duplex connections.
///
/// This trait abstracts over the actual transport mechanism, allowing
/// for easy testing with mock implementations.
pub trait Transport: Send + Sync + 'static {
    type Sink: FrameSink;
    type Stream: FrameStream;

    /// Connect to a remote server. The returned future owns everything it
    /// needs so it can run on a spawned task.
    fn connect(&self, url: &Url) -> BoxFuture<'static, TransportResult<(Self::Sink, Self::Stream)>>;
}

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket transport implementation using tokio-tungstenite.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebSocketTransport;

impl WebSocketTransport {
    /// Create a new WebSocket transport.
    pub fn new() -> Self {
        WebSocketTransport
    }
}

/// Write half of a WebSocket connection.
pub struct WebSocketSink(SplitSink<WsStream, Message>);

/// Read half of a WebSocket connection.
pub struct WebSocketSource(SplitStream<WsStream>);

impl Transport for WebSocketTransport {
    type Sink = WebSocketSink;
    type Stream = WebSocketSource;

    fn connect(&self, url: &Url) -> BoxFuture<'static, TransportResult<(Self::Sink, Self::Stream)>> {
        let url = url.to_string();
        Box::pin(async move {
            let (ws_stream, _) = tokio_tungstenite::connect_async(url.as_str())
                .await
                .map_err(|e| TransportError::ConnectionFailed(e.to_string()))?;

            let (sink, stream) = ws_stream.split();
            Ok((WebSocketSink(sink), WebSocketSource(stream)))
        })
    }
}

impl FrameSink for WebSocketSink {
    fn send(&mut self, text: String) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            self.0
                .send(Message::Text(text.into()))
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))?;

            // Flush so a broken connection shows up here, not on the next read
            self.0
                .flush()
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        })
    }

    fn close(&mut self) -> BoxFuture<'_, TransportResult<()>> {
        Box::pin(async move {
            let frame = CloseFrame {
                code: CloseCode::Normal,
                reason: "".into(),
            };
            let _ = self.0.send(Message::Close(Some(frame))).await;
            self.0
                .close()
                .await
                .map_err(|e| TransportError::SendFailed(e.to_string()))
        })
    }
}

impl FrameStream for WebSocketSource {
    fn next_frame(&mut self) -> BoxFuture<'_, TransportResult<Inbound>> {
        Box::pin(async move {
            loop {
                match self.0.next().await {
                    Some(Ok(Message::Text(text))) => {
                        return Ok(Inbound::Text(text.as_str().to_string()));
                    }
                    Some(Ok(Message::Close(frame))) => {
                        let code = frame.map(|f| f.code);
                        return Ok(Inbound::Closed(close_kind(code)));
                    }
                    Some(Ok(Message::Ping(_))) | Some(Ok(Message::Pong(_))) => {
                        return Ok(Inbound::Heartbeat);
                    }
                    Some(Ok(_)) => {
                        // Binary and raw frames are not part of the protocol
                        continue;
                    }
                    Some(Err(e)) => {
                        return Err(TransportError::ReceiveFailed(e.to_string()));
                    }
                    None => {
                        return Ok(Inbound::Closed(CloseKind::Abnormal));
                    }
                }
            }
        })
    }
}

/// Normal (1000) and going-away (1001) closes are deliberate; anything else
/// is a failure worth retrying.
pub(crate) fn close_kind(code: Option<CloseCode>) -> CloseKind {
    match code {
        Some(CloseCode::Normal) | Some(CloseCode::Away) => CloseKind::Clean,
        _ => CloseKind::Abnormal,
    }
}

#[cfg(test)]
#[path = "transport_tests.rs"]
mod tests;
