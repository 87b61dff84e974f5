// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! The session actor.
//!
//! One task per session owns the connection machine, the store, the
//! mutation tracker, the dispatcher, the resync coordinator and the write
//! half of the active connection. Its inputs are consumer commands, internal
//! notifications (frames from the reader task, connect results, fallback
//! results) and deadlines, all multiplexed with `tokio::select!`:
//!
//! ```text
//!  SyncHandle ──commands──►┐
//!  reader task ──frames───►├──► engine ──► watch<SyncView>, broadcast<Transition>
//!  connect/fetch tasks ───►┘      ▲
//!  deadlines (retry, ping, pong, resync, sweep) ┘
//! ```
//!
//! Timers are plain deadlines owned by the engine, so nothing fires once the
//! actor has exited.

use std::collections::VecDeque;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use sl_core::protocol::event_types;
use sl_core::{
    ClientFrame, CloseKind, ConnectionMachine, ConnectionState, Envelope, Event, Generation,
    MutationId, MutationTracker, Next, ReconnectionPolicy, Resource, ResourceId, StalePolicy,
    StateStore,
};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::{OfflinePolicy, SyncConfig};
use crate::credential::Credential;
use crate::dispatcher::{Dispatch, DropReason, EventDispatcher};
use crate::error::{Error, Result, SyncError};
use crate::fallback::{Fallback, FallbackError, Snapshot};
use crate::resync::{ResyncCoordinator, ResyncReason, Route, Ticket};
use crate::transport::{FrameSink, FrameStream, Inbound, Transport, TransportError, TransportResult};

/// A connection state change.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition {
    pub from: ConnectionState,
    pub to: ConnectionState,
}

/// What consumers see. Cheap to clone; `resource` is shared.
#[derive(Debug, Clone)]
pub struct SyncView<R> {
    pub resource: Arc<R>,
    pub connection: ConnectionState,
    /// Retry number while reconnecting, 0 otherwise.
    pub retry_attempt: u32,
    pub last_error: Option<SyncError>,
    /// Number of unconfirmed optimistic mutations.
    pub pending: usize,
    /// Server timestamp of the last authoritative snapshot.
    pub synced_at: Option<DateTime<Utc>>,
    pub generation: Generation,
    /// Incremented on every write to the resource.
    pub revision: u64,
}

enum Command<R: Resource> {
    Connect(Option<Credential>),
    Disconnect,
    Intent {
        intent: R::Intent,
        reply: oneshot::Sender<std::result::Result<MutationId, SyncError>>,
    },
    ForceResync,
    RefreshCredential(Credential),
    DismissError,
}

enum Internal<T: Transport> {
    Opened {
        attempt: u64,
        result: TransportResult<(T::Sink, T::Stream)>,
    },
    Frame {
        generation: Generation,
        inbound: Inbound,
    },
    ReadFailed {
        generation: Generation,
        error: String,
    },
    SnapshotFetched {
        ticket: Ticket,
        result: std::result::Result<Snapshot, FallbackError>,
    },
    MutationPosted {
        id: MutationId,
        result: std::result::Result<(), FallbackError>,
    },
}

/// Owns a running session. Dropping it stops the actor.
pub struct SyncSession<R: Resource> {
    handle: SyncHandle<R>,
    shutdown: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<R: Resource> SyncSession<R> {
    /// Validates the configuration and starts the actor on the current tokio
    /// runtime. The session starts disconnected.
    pub fn spawn<T: Transport>(
        resource_id: &str,
        config: SyncConfig,
        transport: T,
        fallback: Option<Arc<dyn Fallback>>,
    ) -> Result<Self> {
        let resource_id = ResourceId::new(resource_id)?;
        config.validate()?;
        if config.offline_policy == OfflinePolicy::PostFallback && fallback.is_none() {
            return Err(Error::Config(
                "offline_policy = \"post_fallback\" requires a fallback endpoint".to_string(),
            ));
        }
        let policy = ReconnectionPolicy::new(config.reconnect)?;

        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        let (transition_tx, _) = broadcast::channel(64);
        let shutdown = CancellationToken::new();

        let store = StateStore::new(resource_id.clone());
        let machine = ConnectionMachine::new(policy);
        let initial = SyncView {
            resource: store.snapshot(),
            connection: machine.state().clone(),
            retry_attempt: 0,
            last_error: None,
            pending: 0,
            synced_at: None,
            generation: machine.generation(),
            revision: 0,
        };
        let (view_tx, view_rx) = watch::channel(initial);

        let engine = Engine {
            tracker: MutationTracker::new(config.staleness(), config.stale_policy),
            resync: ResyncCoordinator::new(config.snapshot_timeout()),
            next_sweep: Instant::now() + config.sweep_interval(),
            resource_id,
            config,
            transport: Arc::new(transport),
            fallback,
            credential: None,
            machine,
            store,
            dispatcher: EventDispatcher::new(),
            link: None,
            queue: VecDeque::new(),
            last_error: None,
            attempt_seq: 0,
            loaded: false,
            reconnect_at: None,
            next_ping: None,
            pong_deadline: None,
            ping_id: 0,
            internal_tx,
            view_tx,
            transitions: transition_tx.clone(),
            shutdown: shutdown.clone(),
        };
        let task = tokio::spawn(engine.run(command_rx, internal_rx));

        Ok(SyncSession {
            handle: SyncHandle {
                commands: command_tx,
                view: view_rx,
                transitions: transition_tx,
            },
            shutdown,
            task: Some(task),
        })
    }

    pub fn handle(&self) -> SyncHandle<R> {
        self.handle.clone()
    }

    /// Closes the connection cleanly and waits for the actor to exit.
    pub async fn shutdown(mut self) {
        self.shutdown.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl<R: Resource> Drop for SyncSession<R> {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Cloneable consumer surface of a session.
pub struct SyncHandle<R: Resource> {
    commands: mpsc::UnboundedSender<Command<R>>,
    view: watch::Receiver<SyncView<R>>,
    transitions: broadcast::Sender<Transition>,
}

impl<R: Resource> Clone for SyncHandle<R> {
    fn clone(&self) -> Self {
        SyncHandle {
            commands: self.commands.clone(),
            view: self.view.clone(),
            transitions: self.transitions.clone(),
        }
    }
}

impl<R: Resource> SyncHandle<R> {
    fn send(&self, command: Command<R>) -> Result<()> {
        self.commands
            .send(command)
            .map_err(|_| Error::SessionClosed)
    }

    /// Opens the connection. A credential replaces the current one. From
    /// `Failed` this resets the retry budget and clears the error.
    pub fn connect(&self, credential: Option<Credential>) -> Result<()> {
        self.send(Command::Connect(credential))
    }

    /// Closes the connection and cancels any scheduled retry. Idempotent.
    pub fn disconnect(&self) -> Result<()> {
        self.send(Command::Disconnect)
    }

    /// Applies an intent optimistically.
    ///
    /// Resolves once the change is applied locally and registered as pending;
    /// transmission continues in the background. Planning failures are
    /// returned and also recorded as `last_error`.
    pub async fn dispatch_intent(&self, intent: R::Intent) -> Result<MutationId> {
        let (reply, rx) = oneshot::channel();
        self.send(Command::Intent { intent, reply })?;
        rx.await
            .map_err(|_| Error::SessionClosed)?
            .map_err(Error::Intent)
    }

    /// Requests an authoritative snapshot.
    pub fn force_resync(&self) -> Result<()> {
        self.send(Command::ForceResync)
    }

    /// Replaces the credential used for the next connection attempt.
    pub fn refresh_credential(&self, credential: Credential) -> Result<()> {
        self.send(Command::RefreshCredential(credential))
    }

    /// Clears `last_error`.
    pub fn dismiss_error(&self) -> Result<()> {
        self.send(Command::DismissError)
    }

    /// The latest view.
    pub fn view(&self) -> SyncView<R> {
        self.view.borrow().clone()
    }

    /// Receiver notified on every view change.
    pub fn watch(&self) -> watch::Receiver<SyncView<R>> {
        self.view.clone()
    }

    /// Stream of connection state changes from now on.
    pub fn transitions(&self) -> broadcast::Receiver<Transition> {
        self.transitions.subscribe()
    }
}

/// The active connection.
struct Link<S> {
    sink: S,
    generation: Generation,
    reader: CancellationToken,
}

struct Engine<R: Resource, T: Transport> {
    resource_id: ResourceId,
    config: SyncConfig,
    transport: Arc<T>,
    fallback: Option<Arc<dyn Fallback>>,
    credential: Option<Credential>,
    machine: ConnectionMachine,
    store: StateStore<R>,
    tracker: MutationTracker<R::Patch>,
    dispatcher: EventDispatcher,
    resync: ResyncCoordinator,
    link: Option<Link<T::Sink>>,
    /// Intent frames held while offline under [`OfflinePolicy::Queue`].
    queue: VecDeque<ClientFrame>,
    last_error: Option<SyncError>,
    /// Id of the connect attempt whose result is still wanted.
    attempt_seq: u64,
    /// Whether the initial load has been requested.
    loaded: bool,
    reconnect_at: Option<Instant>,
    next_ping: Option<Instant>,
    pong_deadline: Option<Instant>,
    next_sweep: Instant,
    ping_id: u64,
    internal_tx: mpsc::UnboundedSender<Internal<T>>,
    view_tx: watch::Sender<SyncView<R>>,
    transitions: broadcast::Sender<Transition>,
    shutdown: CancellationToken,
}

/// Sleeps until `deadline`, or forever if there is none.
async fn until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

impl<R: Resource, T: Transport> Engine<R, T> {
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command<R>>,
        mut internal: mpsc::UnboundedReceiver<Internal<T>>,
    ) {
        let shutdown = self.shutdown.clone();
        loop {
            let reconnect_at = self.reconnect_at;
            let pong_deadline = self.pong_deadline;
            let next_ping = self.next_ping;
            let resync_deadline = self.resync.deadline();
            let next_sweep = self.next_sweep;

            tokio::select! {
                biased;

                _ = shutdown.cancelled() => break,

                command = commands.recv() => match command {
                    Some(command) => self.on_command(command).await,
                    None => break,
                },

                Some(message) = internal.recv() => self.on_internal(message).await,

                _ = until(reconnect_at) => self.on_retry_due(),

                _ = until(pong_deadline) => {
                    warn!("no reply within heartbeat timeout, dropping connection");
                    self.connection_lost(CloseKind::Abnormal).await;
                }

                _ = until(next_ping) => self.send_ping().await,

                _ = until(resync_deadline) => {
                    if let Some(ticket) = self.resync.fallback() {
                        warn!("no full_sync within {:?}, fetching snapshot", self.config.snapshot_timeout());
                        self.start_fetch(ticket);
                    }
                }

                _ = sleep_until(next_sweep) => self.sweep(),
            }
        }
        self.teardown().await;
    }

    async fn on_command(&mut self, command: Command<R>) {
        match command {
            Command::Connect(credential) => self.connect(credential),
            Command::Disconnect => self.disconnect().await,
            Command::Intent { intent, reply } => match self.prepare_intent(intent) {
                Ok((id, frame)) => {
                    let _ = reply.send(Ok(id));
                    self.transmit(id, frame).await;
                }
                Err(e) => {
                    let _ = reply.send(Err(e));
                }
            },
            Command::ForceResync => {
                self.request_resync(ResyncReason::UserRefresh).await;
                self.publish();
            }
            Command::RefreshCredential(credential) => {
                debug!("credential refreshed");
                self.credential = Some(credential);
            }
            Command::DismissError => {
                self.last_error = None;
                self.publish();
            }
        }
    }

    async fn on_internal(&mut self, message: Internal<T>) {
        match message {
            Internal::Opened { attempt, result } => self.on_opened(attempt, result).await,
            Internal::Frame {
                generation,
                inbound,
            } => self.on_frame(generation, inbound).await,
            Internal::ReadFailed { generation, error } => {
                if self.is_current(generation) {
                    warn!("read failed: {}", error);
                    self.connection_lost(CloseKind::Abnormal).await;
                }
            }
            Internal::SnapshotFetched { ticket, result } => self.on_snapshot_fetched(ticket, result),
            Internal::MutationPosted { id, result } => {
                match result {
                    Ok(()) => {
                        debug!("mutation {} posted", id);
                        self.tracker.remove(id);
                    }
                    Err(e) => {
                        warn!("posting mutation {} failed: {}", id, e);
                        self.roll_back(id, |kind| SyncError::IntentFailed {
                            kind,
                            reason: e.to_string(),
                        });
                    }
                }
                self.publish();
            }
        }
    }

    // Connection lifecycle

    fn connect(&mut self, credential: Option<Credential>) {
        if let Some(credential) = credential {
            self.credential = Some(credential);
        }
        let from = self.machine.state().clone();
        if from == ConnectionState::Failed {
            self.last_error = None;
        }
        if !self.loaded {
            self.loaded = true;
            if self.fallback.is_some() {
                let (ticket, _) = self.resync.request(ResyncReason::Initial, false, Instant::now());
                self.start_fetch(ticket);
            }
        }
        if self.machine.connect() == Next::Open {
            self.reconnect_at = None;
            self.start_attempt();
        }
        self.transition(from);
    }

    /// Spawns a connection attempt; the result comes back as `Opened`.
    fn start_attempt(&mut self) {
        self.attempt_seq += 1;
        let attempt = self.attempt_seq;
        let url = match self
            .config
            .stream_url_for(&self.resource_id, self.credential.as_ref())
        {
            Ok(url) => url,
            Err(e) => {
                let _ = self.internal_tx.send(Internal::Opened {
                    attempt,
                    result: Err(TransportError::ConnectionFailed(e.to_string())),
                });
                return;
            }
        };
        debug!("connecting to {}{}", url.origin().ascii_serialization(), url.path());

        let connecting = self.transport.connect(&url);
        let limit = self.config.connect_timeout();
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = match limit {
                Some(limit) => tokio::time::timeout(limit, connecting)
                    .await
                    .unwrap_or_else(|_| {
                        Err(TransportError::ConnectionFailed(format!(
                            "handshake timed out after {}ms",
                            limit.as_millis()
                        )))
                    }),
                None => connecting.await,
            };
            let _ = tx.send(Internal::Opened { attempt, result });
        });
    }

    async fn on_opened(&mut self, attempt: u64, result: TransportResult<(T::Sink, T::Stream)>) {
        if attempt != self.attempt_seq || *self.machine.state() != ConnectionState::Connecting {
            if let Ok((mut sink, _)) = result {
                debug!("discarding superseded connection");
                tokio::spawn(async move {
                    let _ = sink.close().await;
                });
            }
            return;
        }

        let (sink, stream) = match result {
            Ok(halves) => halves,
            Err(e) => {
                warn!("connect failed: {}", e);
                self.connection_lost(CloseKind::Abnormal).await;
                return;
            }
        };

        let from = self.machine.state().clone();
        let Some(generation) = self.machine.opened() else {
            return;
        };
        self.dispatcher.set_generation(generation);

        let reader = self.shutdown.child_token();
        tokio::spawn(read_loop::<T>(
            stream,
            generation,
            self.internal_tx.clone(),
            reader.clone(),
        ));
        self.link = Some(Link {
            sink,
            generation,
            reader,
        });

        let now = Instant::now();
        self.next_ping = self.config.heartbeat_interval().map(|interval| now + interval);
        self.pong_deadline = None;
        info!("connected to {} (generation {})", self.resource_id, generation);
        self.transition(from);

        if self.flush_queue().await {
            self.request_resync(ResyncReason::Connected).await;
        }
        self.publish();
    }

    /// Drops the active connection after a failure or a peer close and lets
    /// the machine decide whether to retry.
    async fn connection_lost(&mut self, kind: CloseKind) {
        if let Some(link) = self.link.take() {
            link.reader.cancel();
            if kind == CloseKind::Clean {
                let mut sink = link.sink;
                let _ = sink.close().await;
            }
        }
        self.next_ping = None;
        self.pong_deadline = None;

        if let Some(ticket) = self.resync.fallback() {
            self.start_fetch(ticket);
        }

        let from = self.machine.state().clone();
        match self.machine.closed(kind, Utc::now()) {
            Next::Retry { attempt, delay } => {
                info!("connection lost, retry {} in {:?}", attempt, delay);
                self.reconnect_at = Some(Instant::now() + delay);
            }
            Next::GiveUp => {
                warn!("giving up after {} retries", self.machine.policy().max_attempts());
                self.last_error = Some(SyncError::RetryExhausted);
            }
            Next::Stay | Next::Open => {}
        }
        self.transition(from);
    }

    fn on_retry_due(&mut self) {
        self.reconnect_at = None;
        let from = self.machine.state().clone();
        if self.machine.retry_due() == Next::Open {
            self.start_attempt();
        }
        self.transition(from);
    }

    async fn disconnect(&mut self) {
        self.reconnect_at = None;
        // Any in-flight attempt is now superseded
        self.attempt_seq += 1;
        self.close_link().await;
        self.resync.cancel();

        let from = self.machine.state().clone();
        self.machine.disconnect();
        self.transition(from);
    }

    async fn close_link(&mut self) {
        if let Some(link) = self.link.take() {
            link.reader.cancel();
            let mut sink = link.sink;
            if let Err(e) = sink.close().await {
                debug!("close failed: {}", e);
            }
        }
        self.next_ping = None;
        self.pong_deadline = None;
    }

    async fn teardown(&mut self) {
        self.reconnect_at = None;
        self.attempt_seq += 1;
        self.close_link().await;
        self.resync.cancel();

        let from = self.machine.state().clone();
        self.machine.disconnect();
        self.transition(from);
        debug!("session for {} stopped", self.resource_id);
    }

    fn is_current(&self, generation: Generation) -> bool {
        self.link.as_ref().is_some_and(|l| l.generation == generation)
    }

    // Inbound

    async fn on_frame(&mut self, generation: Generation, inbound: Inbound) {
        if !self.is_current(generation) {
            debug!("ignoring frame from generation {}", generation);
            return;
        }
        self.pong_deadline = None;

        match inbound {
            Inbound::Heartbeat => {}
            Inbound::Closed(kind) => {
                info!("server closed the connection ({:?})", kind);
                self.connection_lost(kind).await;
            }
            Inbound::Text(text) => {
                if let Ok(event) = self.dispatcher.decode(&text) {
                    let outcome = self.dispatcher.dispatch(&event, &mut self.store);
                    self.on_dispatch(outcome).await;
                    self.publish();
                }
            }
        }
    }

    async fn on_dispatch(&mut self, outcome: Dispatch) {
        match outcome {
            Dispatch::Applied {
                mutation_id,
                seq_gap,
            } => {
                if let Some(id) = mutation_id {
                    self.confirm(id);
                }
                if seq_gap {
                    self.request_resync(ResyncReason::SequenceGap).await;
                }
            }
            Dispatch::Replaced { synced_at } => {
                if let Some(ticket) = self.resync.on_snapshot_event() {
                    debug!("resync {} satisfied by full_sync", ticket);
                }
                self.after_snapshot(synced_at);
            }
            Dispatch::Ack(id) => self.confirm(id),
            Dispatch::Rejected {
                mutation_id,
                reason,
            } => {
                warn!("mutation {} rejected: {}", mutation_id, reason);
                self.roll_back(mutation_id, |kind| SyncError::IntentRejected { kind, reason });
            }
            Dispatch::ServerError(message) => {
                warn!("server error: {}", message);
                self.last_error = Some(SyncError::Server(message));
            }
            Dispatch::Pong | Dispatch::Dropped(_) => {}
        }
    }

    fn on_snapshot_fetched(&mut self, ticket: Ticket, result: std::result::Result<Snapshot, FallbackError>) {
        if !self.resync.accept_fetch(ticket) {
            debug!("discarding superseded snapshot {}", ticket);
            return;
        }
        match result {
            Ok(snapshot) => {
                let mut envelope = Envelope::new(
                    event_types::FULL_SYNC,
                    self.resource_id.as_str(),
                    snapshot.timestamp,
                    snapshot.data,
                );
                envelope.seq = snapshot.seq;
                let event = Event::received(envelope, self.dispatcher.generation());
                match self.dispatcher.dispatch(&event, &mut self.store) {
                    Dispatch::Replaced { synced_at } => self.after_snapshot(synced_at),
                    Dispatch::Dropped(DropReason::BadPayload(reason)) => {
                        self.last_error = Some(SyncError::SnapshotFetch(reason));
                    }
                    other => debug!("unexpected snapshot outcome: {:?}", other),
                }
            }
            Err(e) => {
                warn!("snapshot fetch {} failed: {}", ticket, e);
                self.last_error = Some(SyncError::SnapshotFetch(e.to_string()));
            }
        }
        self.publish();
    }

    /// Authoritative state arrived: nothing pending can still be reconciled.
    fn after_snapshot(&mut self, synced_at: DateTime<Utc>) {
        let dropped = self.tracker.clear_resource(&self.resource_id);
        let queued = self.queue.len();
        self.queue.clear();
        if !dropped.is_empty() || queued > 0 {
            debug!(
                "snapshot at {} superseded {} pending mutations ({} queued)",
                synced_at,
                dropped.len(),
                queued
            );
        }
    }

    // Outbound

    fn prepare_intent(&mut self, intent: R::Intent) -> std::result::Result<(MutationId, ClientFrame), SyncError> {
        let planned = match self.store.plan(&intent) {
            Ok(planned) => planned,
            Err(e) => {
                let error = SyncError::Intent(e.to_string());
                self.last_error = Some(error.clone());
                self.publish();
                return Err(error);
            }
        };
        let inverse = self.store.invert(&planned.forward);
        self.store.apply_patch(&planned.forward);
        let id = self.tracker.register(
            self.resource_id.clone(),
            planned.frame.kind.clone(),
            inverse,
            Instant::now().into_std(),
        );
        self.publish();
        Ok((id, planned.frame.with_mutation(id)))
    }

    async fn transmit(&mut self, id: MutationId, frame: ClientFrame) {
        if self.link.is_some() {
            if let Err(e) = self.send_frame(&frame).await {
                warn!("sending {} failed: {}", frame.kind, e);
                self.roll_back(id, |kind| SyncError::IntentFailed {
                    kind,
                    reason: e.to_string(),
                });
                self.connection_lost(CloseKind::Abnormal).await;
            }
            self.publish();
            return;
        }

        match self.config.offline_policy {
            OfflinePolicy::KeepLocal => {
                debug!("offline, keeping {} locally", frame.kind);
                self.tracker.remove(id);
            }
            OfflinePolicy::Queue => {
                debug!("offline, queueing {}", frame.kind);
                self.queue.push_back(frame);
            }
            OfflinePolicy::PostFallback => match &self.fallback {
                Some(fallback) => {
                    let posting =
                        fallback.post_mutation(&self.resource_id, self.credential.as_ref(), &frame);
                    let tx = self.internal_tx.clone();
                    tokio::spawn(async move {
                        let result = posting.await;
                        let _ = tx.send(Internal::MutationPosted { id, result });
                    });
                }
                None => {
                    self.tracker.remove(id);
                }
            },
        }
        self.publish();
    }

    async fn send_frame(&mut self, frame: &ClientFrame) -> TransportResult<()> {
        let link = self.link.as_mut().ok_or(TransportError::ConnectionClosed)?;
        let text = frame
            .to_json()
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        link.sink.send(text).await
    }

    /// Sends queued intents in order. Returns false if the connection broke.
    async fn flush_queue(&mut self) -> bool {
        let mut flushed = 0;
        while let Some(frame) = self.queue.pop_front() {
            if let Err(e) = self.send_frame(&frame).await {
                warn!("flushing {} failed: {}", frame.kind, e);
                if let Some(id) = frame.mutation_id() {
                    self.roll_back(id, |kind| SyncError::IntentFailed {
                        kind,
                        reason: e.to_string(),
                    });
                }
                self.connection_lost(CloseKind::Abnormal).await;
                return false;
            }
            flushed += 1;
        }
        if flushed > 0 {
            info!("Flushed {} queued intents", flushed);
        }
        true
    }

    async fn send_ping(&mut self) {
        let now = Instant::now();
        self.next_ping = self.config.heartbeat_interval().map(|interval| now + interval);
        self.ping_id += 1;
        let frame = ClientFrame::ping(self.ping_id);
        match self.send_frame(&frame).await {
            Ok(()) => {
                if self.pong_deadline.is_none() {
                    self.pong_deadline = self.config.heartbeat_timeout().map(|t| now + t);
                }
            }
            Err(e) => {
                warn!("ping failed: {}", e);
                self.connection_lost(CloseKind::Abnormal).await;
            }
        }
    }

    async fn request_resync(&mut self, reason: ResyncReason) {
        let connected = self.link.is_some();
        let (ticket, route) = self.resync.request(reason, connected, Instant::now());
        debug!("resync {} ({:?}) via {:?}", ticket, reason, route);
        match route {
            Route::Stream => {
                let frame = ClientFrame::sync_request(&self.resource_id);
                if let Err(e) = self.send_frame(&frame).await {
                    warn!("sync_request failed: {}", e);
                    self.connection_lost(CloseKind::Abnormal).await;
                }
            }
            Route::Fetch => self.start_fetch(ticket),
        }
    }

    fn start_fetch(&mut self, ticket: Ticket) {
        let Some(fallback) = &self.fallback else {
            debug!("no fallback endpoint, resync {} abandoned", ticket);
            self.resync.cancel();
            return;
        };
        let fetching = fallback.fetch_snapshot(&self.resource_id, self.credential.as_ref());
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let result = fetching.await;
            let _ = tx.send(Internal::SnapshotFetched { ticket, result });
        });
    }

    // Mutation bookkeeping

    fn confirm(&mut self, id: MutationId) {
        if self.tracker.remove(id).is_some() {
            debug!("mutation {} confirmed", id);
        }
    }

    /// Undoes a pending mutation. Never silent: always sets `last_error`.
    fn roll_back(&mut self, id: MutationId, error: impl FnOnce(String) -> SyncError) {
        if let Some(pending) = self.tracker.remove(id) {
            self.store.apply_patch(&pending.inverse);
            self.queue.retain(|f| f.mutation_id() != Some(id));
            self.last_error = Some(error(pending.kind));
        }
    }

    fn sweep(&mut self) {
        let now = Instant::now();
        self.next_sweep = now + self.config.sweep_interval();
        let stale = self.tracker.sweep(now.into_std());
        if stale.is_empty() {
            return;
        }
        match self.tracker.policy() {
            StalePolicy::Discard => {
                debug!("discarding {} unconfirmed mutations", stale.len());
            }
            StalePolicy::Rollback => {
                for pending in stale {
                    warn!("mutation {} timed out, rolling back", pending.id);
                    self.store.apply_patch(&pending.inverse);
                    self.queue.retain(|f| f.mutation_id() != Some(pending.id));
                    self.last_error = Some(SyncError::IntentTimedOut { kind: pending.kind });
                }
            }
        }
        self.publish();
    }

    // Observers

    fn transition(&mut self, from: ConnectionState) {
        let to = self.machine.state().clone();
        if from != to {
            info!("{}: {} -> {}", self.resource_id, from, to);
            let _ = self.transitions.send(Transition { from, to });
        }
        self.publish();
    }

    fn publish(&self) {
        let connection = self.machine.state().clone();
        self.view_tx.send_replace(SyncView {
            resource: self.store.snapshot(),
            retry_attempt: connection.retry_attempt(),
            connection,
            last_error: self.last_error.clone(),
            pending: self.tracker.len(),
            synced_at: self.store.synced_at(),
            generation: self.machine.generation(),
            revision: self.store.revision(),
        });
    }
}

/// Reads frames until the connection ends or the token is cancelled.
async fn read_loop<T: Transport>(
    mut stream: T::Stream,
    generation: Generation,
    tx: mpsc::UnboundedSender<Internal<T>>,
    cancel: CancellationToken,
) {
    loop {
        let frame = tokio::select! {
            _ = cancel.cancelled() => return,
            frame = stream.next_frame() => frame,
        };
        match frame {
            Ok(inbound) => {
                let closed = matches!(inbound, Inbound::Closed(_));
                if tx.send(Internal::Frame { generation, inbound }).is_err() || closed {
                    return;
                }
            }
            Err(e) => {
                let _ = tx.send(Internal::ReadFailed {
                    generation,
                    error: e.to_string(),
                });
                return;
            }
        }
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
