// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Remote Connection Client
//!
//! One persistent channel to the remote peer, shared by every remote call.
//!
//! ## State machine
//!
//! ```text
//!  Disconnected ──connect──► Connecting ──ok──► Connected
//!       ▲                        │                  │
//!       │                       err              drop
//!       │                        ▼                  ▼
//!       └──────────────── Reconnecting(n, t) ◄── Disconnected
//!                                │
//!                      n > max_attempts
//!                                ▼
//!                              Failed   (manual reconnect only)
//! ```
//!
//! ## Correlation
//!
//! Every request gets a fresh UUID v4 `message_id` and a pending entry holding
//! a oneshot sender. Responses may arrive in any order; the reader task looks
//! the id up and completes exactly that call. Frames with unknown ids or that
//! fail to parse are logged and dropped without touching the connection.
//!
//! ## Locking
//!
//! Connection bookkeeping uses `parking_lot` mutexes accessed only from
//! synchronous helpers, so no guard is ever held across an `.await`.

use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::credentials::Credentials;
use super::frame::{Frame, FragmentPlacement, MessageType};
use super::policy::{ReconnectDecision, ReconnectPolicy};
use crate::errors::{DistributionError, DistributionResult};
use crate::observability::messages::connection::{
    ConnectFailed, Connected, ConnectionClosed, FrameDropped, PendingCallsSettled,
    ReconnectAbandoned, ReconnectScheduled,
};
use crate::observability::messages::StructuredLog;
use crate::registry::{PlacementEntry, PlacementRegistry};
use crate::traits::Connector;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    /// Waiting to make reconnect attempt `attempt`; `remaining` until it starts.
    Reconnecting { attempt: u32, remaining: Duration },
    /// Reconnect budget exhausted.
    Failed,
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        matches!(self, ConnectionState::Connected)
    }
}

impl Display for ConnectionState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => f.write_str("Disconnected"),
            ConnectionState::Connecting => f.write_str("Connecting"),
            ConnectionState::Connected => f.write_str("Connected"),
            ConnectionState::Reconnecting { attempt, remaining } => write!(
                f,
                "Reconnecting (attempt {}, {}s remaining)",
                attempt,
                remaining.as_secs_f32()
            ),
            ConnectionState::Failed => f.write_str("Failed"),
        }
    }
}

/// What happens to calls still waiting for a response when the channel closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PendingCallPolicy {
    /// Fail each call with [`DistributionError::ConnectionLost`].
    #[default]
    Fail,
    /// Leave each call unresolved forever. Later connections never match them.
    ///
    /// The parked response senders are kept for the life of the client, so
    /// memory grows by one entry per abandoned call. See
    /// [`ConnectionClient::abandoned_calls`].
    Abandon,
}

impl PendingCallPolicy {
    fn as_str(&self) -> &'static str {
        match self {
            PendingCallPolicy::Fail => "fail",
            PendingCallPolicy::Abandon => "abandon",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoint: String,
    pub reconnect: ReconnectPolicy,
    pub pending_calls: PendingCallPolicy,
    pub request_timeout: Option<Duration>,
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            reconnect: ReconnectPolicy::default(),
            pending_calls: PendingCallPolicy::default(),
            request_timeout: None,
        }
    }
}

type PendingSender = oneshot::Sender<DistributionResult<Value>>;

struct Link {
    generation: u64,
    outbound: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
}

struct ClientInner {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    registry: Arc<PlacementRegistry>,
    state: watch::Sender<ConnectionState>,
    link: Mutex<Option<Link>>,
    pending: Mutex<HashMap<String, PendingSender>>,
    abandoned: Mutex<Vec<PendingSender>>,
    credentials: Mutex<Credentials>,
    generation: AtomicU64,
    reconnect_epoch: AtomicU64,
    attempts: AtomicU32,
    closed: AtomicBool,
}

/// Cheap to clone; all clones share one connection.
#[derive(Clone)]
pub struct ConnectionClient {
    inner: Arc<ClientInner>,
}

impl std::fmt::Debug for ConnectionClient {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionClient")
            .field("endpoint", &self.inner.config.endpoint)
            .field("state", &self.state())
            .field("pending_calls", &self.pending_calls())
            .finish()
    }
}

impl ConnectionClient {
    /// Inbound `UpdateFragments` frames are applied to `registry`.
    pub fn new(
        config: ClientConfig,
        connector: Arc<dyn Connector>,
        registry: Arc<PlacementRegistry>,
    ) -> Self {
        let (state, _) = watch::channel(ConnectionState::Disconnected);
        Self {
            inner: Arc::new(ClientInner {
                config,
                connector,
                registry,
                state,
                link: Mutex::new(None),
                pending: Mutex::new(HashMap::new()),
                abandoned: Mutex::new(Vec::new()),
                credentials: Mutex::new(Credentials::anonymous()),
                generation: AtomicU64::new(0),
                reconnect_epoch: AtomicU64::new(0),
                attempts: AtomicU32::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.inner.config.endpoint
    }

    pub fn state(&self) -> ConnectionState {
        *self.inner.state.borrow()
    }

    pub fn is_connected(&self) -> bool {
        self.state().is_connected()
    }

    /// Observe state changes, including every reconnect countdown tick.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state.subscribe()
    }

    /// Calls parked by [`PendingCallPolicy::Abandon`]. Never decreases.
    pub fn abandoned_calls(&self) -> usize {
        self.inner.abandoned.lock().len()
    }

    pub fn pending_calls(&self) -> usize {
        self.inner.pending.lock().len()
    }

    /// Open the channel with `credentials`.
    ///
    /// Resets the reconnect budget and cancels any reconnect already scheduled.
    /// On failure the reconnection policy takes over and the error is returned.
    pub async fn connect(&self, credentials: Credentials) -> DistributionResult<()> {
        *self.inner.credentials.lock() = credentials;
        self.inner.closed.store(false, Ordering::SeqCst);
        self.inner.reconnect_epoch.fetch_add(1, Ordering::SeqCst);
        self.inner.attempts.store(0, Ordering::SeqCst);

        if self.is_connected() {
            return Ok(());
        }

        match self.inner.open().await {
            Ok(()) => Ok(()),
            Err(e) => {
                Arc::clone(&self.inner).schedule_reconnect();
                Err(e)
            }
        }
    }

    /// Reconnect with the credentials of the last `connect`. Valid in any
    /// state, including `Failed`.
    pub async fn reconnect(&self) -> DistributionResult<()> {
        let credentials = self.inner.credentials.lock().clone();
        self.connect(credentials).await
    }

    /// Send a request and wait for the response with the same correlation id.
    pub async fn send(&self, message_type: MessageType, data: Value) -> DistributionResult<Value> {
        let (message_id, response) = self.inner.register_call(message_type, data)?;

        let outcome = match self.inner.config.request_timeout {
            Some(limit) => match tokio::time::timeout(limit, response).await {
                Ok(outcome) => outcome,
                Err(_) => {
                    self.inner.pending.lock().remove(&message_id);
                    return Err(DistributionError::Timeout(limit));
                }
            },
            None => response.await,
        };

        outcome.map_err(|_| DistributionError::ConnectionLost(message_id))?
    }

    /// Send a frame without waiting for any response.
    pub fn notify(&self, message_type: MessageType, data: Value) -> DistributionResult<()> {
        let frame = Frame::new(Uuid::new_v4().to_string(), message_type, data).encode()?;
        self.inner.transmit(frame)
    }

    /// Orderly shutdown: no reconnect is scheduled afterwards.
    pub fn close(&self) {
        self.inner.closed.store(true, Ordering::SeqCst);
        self.inner.reconnect_epoch.fetch_add(1, Ordering::SeqCst);

        let link = self.inner.link.lock().take();
        if let Some(link) = link {
            link.cancel.cancel();
            info!(
                "{}",
                ConnectionClosed {
                    endpoint: &self.inner.config.endpoint,
                    pending_calls: self.pending_calls(),
                }
            );
        }
        self.inner.settle_pending();
        self.inner.state.send_replace(ConnectionState::Disconnected);
    }
}

impl ClientInner {
    async fn open(self: &Arc<Self>) -> DistributionResult<()> {
        self.state.send_replace(ConnectionState::Connecting);
        let credentials = self.credentials.lock().clone();

        let channel = match self.connector.connect(&self.config.endpoint, &credentials).await {
            Ok(channel) => channel,
            Err(e) => {
                warn!(
                    "{}",
                    ConnectFailed {
                        endpoint: &self.config.endpoint,
                        error: &e,
                    }
                );
                self.state.send_replace(ConnectionState::Disconnected);
                return Err(e);
            }
        };

        if self.closed.load(Ordering::SeqCst) {
            self.state.send_replace(ConnectionState::Disconnected);
            return Err(DistributionError::NotConnected);
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        let cancel = CancellationToken::new();
        *self.link.lock() = Some(Link {
            generation,
            outbound: channel.outbound,
            cancel: cancel.clone(),
        });
        self.attempts.store(0, Ordering::SeqCst);
        self.state.send_replace(ConnectionState::Connected);
        info!(
            "{}",
            Connected {
                endpoint: &self.config.endpoint,
                generation,
            }
        );

        tokio::spawn(Arc::clone(self).read_loop(generation, channel.inbound, cancel));
        Ok(())
    }

    async fn read_loop(
        self: Arc<Self>,
        generation: u64,
        mut inbound: mpsc::UnboundedReceiver<String>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                text = inbound.recv() => match text {
                    Some(text) => self.on_message(&text).await,
                    None => break,
                },
            }
        }
        self.on_close(generation);
    }

    async fn on_message(&self, text: &str) {
        let frame = match Frame::decode(text) {
            Ok(frame) => frame,
            Err(e) => {
                warn!(
                    "{}",
                    FrameDropped {
                        message_id: None,
                        reason: &format!("malformed frame: {}", e),
                    }
                );
                return;
            }
        };

        if frame.message_type.is_response() {
            self.resolve(frame);
            return;
        }

        match serde_json::from_value::<Vec<FragmentPlacement>>(frame.data) {
            Ok(placements) => {
                let entries: Vec<PlacementEntry> = placements.into_iter().map(Into::into).collect();
                self.registry.apply_remote_update(entries).await;
            }
            Err(e) => warn!(
                "{}",
                FrameDropped {
                    message_id: Some(&frame.message_id),
                    reason: &format!("invalid placement update: {}", e),
                }
            ),
        }
    }

    fn resolve(&self, frame: Frame) {
        let sender = self.pending.lock().remove(&frame.message_id);
        let Some(sender) = sender else {
            debug!(
                "{}",
                FrameDropped {
                    message_id: Some(&frame.message_id),
                    reason: "no pending call with this id",
                }
            );
            return;
        };

        let outcome = match frame.error {
            Some(error) => Err(DistributionError::RemoteFault(error)),
            None => Ok(frame.data),
        };
        // Receiver gone means the caller timed out.
        let _ = sender.send(outcome);
    }

    fn on_close(self: &Arc<Self>, generation: u64) {
        {
            let mut link = self.link.lock();
            match link.as_ref() {
                Some(current) if current.generation == generation => *link = None,
                _ => return,
            }
        }

        info!(
            "{}",
            ConnectionClosed {
                endpoint: &self.config.endpoint,
                pending_calls: self.pending.lock().len(),
            }
        );
        self.settle_pending();
        self.state.send_replace(ConnectionState::Disconnected);

        if !self.closed.load(Ordering::SeqCst) {
            Arc::clone(self).schedule_reconnect();
        }
    }

    fn settle_pending(&self) -> usize {
        let drained: Vec<(String, PendingSender)> = self.pending.lock().drain().collect();
        let count = drained.len();
        if count == 0 {
            return 0;
        }

        match self.config.pending_calls {
            PendingCallPolicy::Fail => {
                for (message_id, sender) in drained {
                    let _ = sender.send(Err(DistributionError::ConnectionLost(message_id)));
                }
            }
            PendingCallPolicy::Abandon => {
                self.abandoned
                    .lock()
                    .extend(drained.into_iter().map(|(_, sender)| sender));
            }
        }

        info!(
            "{}",
            PendingCallsSettled {
                count,
                policy: self.config.pending_calls.as_str(),
            }
        );
        count
    }

    fn register_call(
        &self,
        message_type: MessageType,
        data: Value,
    ) -> DistributionResult<(String, oneshot::Receiver<DistributionResult<Value>>)> {
        if !self.state.borrow().is_connected() {
            return Err(DistributionError::NotConnected);
        }

        let (sender, receiver) = oneshot::channel();
        let message_id = {
            let mut pending = self.pending.lock();
            let message_id = loop {
                let candidate = Uuid::new_v4().to_string();
                if !pending.contains_key(&candidate) {
                    break candidate;
                }
            };
            pending.insert(message_id.clone(), sender);
            message_id
        };

        let sent = Frame::new(message_id.clone(), message_type, data)
            .encode()
            .and_then(|frame| self.transmit(frame));
        if let Err(e) = sent {
            self.pending.lock().remove(&message_id);
            return Err(e);
        }

        debug!("Sent {} request '{}'", message_type.as_str(), message_id);
        Ok((message_id, receiver))
    }

    fn transmit(&self, frame: String) -> DistributionResult<()> {
        if !self.state.borrow().is_connected() {
            return Err(DistributionError::NotConnected);
        }
        let link = self.link.lock();
        let link = link.as_ref().ok_or(DistributionError::NotConnected)?;
        link.outbound
            .send(frame)
            .map_err(|_| DistributionError::NotConnected)
    }

    fn superseded(&self, epoch: u64) -> bool {
        self.closed.load(Ordering::SeqCst) || self.reconnect_epoch.load(Ordering::SeqCst) != epoch
    }

    fn schedule_reconnect(self: Arc<Self>) {
        let epoch = self.reconnect_epoch.load(Ordering::SeqCst);
        tokio::spawn(async move { self.reconnect_loop(epoch).await });
    }

    async fn reconnect_loop(self: Arc<Self>, epoch: u64) {
        let policy = self.config.reconnect;
        loop {
            if self.superseded(epoch) {
                return;
            }

            let (attempt, delay) = match policy.next(self.attempts.load(Ordering::SeqCst)) {
                ReconnectDecision::Retry { attempt, delay } => (attempt, delay),
                ReconnectDecision::GiveUp => {
                    error!(
                        "{}",
                        ReconnectAbandoned {
                            attempts: policy.max_attempts,
                        }
                    );
                    self.state.send_replace(ConnectionState::Failed);
                    return;
                }
            };

            ReconnectScheduled {
                attempt,
                max_attempts: policy.max_attempts,
                delay,
            }
            .log();

            self.state.send_replace(ConnectionState::Reconnecting {
                attempt,
                remaining: delay,
            });
            for (remaining, step) in policy.countdown() {
                if self.superseded(epoch) {
                    return;
                }
                self.state
                    .send_replace(ConnectionState::Reconnecting { attempt, remaining });
                tokio::time::sleep(step).await;
            }

            if self.superseded(epoch) {
                return;
            }
            self.attempts.store(attempt, Ordering::SeqCst);
            if self.open().await.is_ok() {
                return;
            }
        }
    }
}
