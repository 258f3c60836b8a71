// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! In-memory connector for deterministic connection tests.
//!
//! Each successful `connect` yields a [`StubPeer`] playing the remote side of
//! that connection. Dropping the peer closes the connection.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::mpsc;

use super::credentials::Credentials;
use super::frame::{Frame, MessageType};
use crate::errors::{DistributionError, DistributionResult};
use crate::traits::{Channel, Connector};

pub struct StubConnector {
    accepting: AtomicBool,
    attempts: AtomicUsize,
    last_credentials: Mutex<Option<Credentials>>,
    peers_tx: mpsc::UnboundedSender<StubPeer>,
    peers_rx: tokio::sync::Mutex<mpsc::UnboundedReceiver<StubPeer>>,
}

impl StubConnector {
    pub fn new() -> Self {
        let (peers_tx, peers_rx) = mpsc::unbounded_channel();
        Self {
            accepting: AtomicBool::new(true),
            attempts: AtomicUsize::new(0),
            last_credentials: Mutex::new(None),
            peers_tx,
            peers_rx: tokio::sync::Mutex::new(peers_rx),
        }
    }

    pub fn set_accepting(&self, accepting: bool) {
        self.accepting.store(accepting, Ordering::SeqCst);
    }

    /// Total `connect` calls, successful or not.
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    pub fn last_credentials(&self) -> Option<Credentials> {
        self.last_credentials.lock().clone()
    }

    /// The remote side of the next successful connection.
    pub async fn next_peer(&self) -> StubPeer {
        let mut peers = self.peers_rx.lock().await;
        tokio::time::timeout(Duration::from_secs(5), peers.recv())
            .await
            .expect("no connection was opened")
            .expect("connector dropped")
    }
}

impl Default for StubConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for StubConnector {
    async fn connect(&self, _endpoint: &str, credentials: &Credentials) -> DistributionResult<Channel> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        *self.last_credentials.lock() = Some(credentials.clone());

        if !self.accepting.load(Ordering::SeqCst) {
            return Err(DistributionError::Transport("connection refused".to_string()));
        }

        let (to_peer, from_client) = mpsc::unbounded_channel();
        let (to_client, from_peer) = mpsc::unbounded_channel();
        let _ = self.peers_tx.send(StubPeer {
            to_client,
            from_client,
        });

        Ok(Channel {
            outbound: to_peer,
            inbound: from_peer,
        })
    }
}

pub struct StubPeer {
    to_client: mpsc::UnboundedSender<String>,
    from_client: mpsc::UnboundedReceiver<String>,
}

impl StubPeer {
    pub fn send_text(&self, text: &str) {
        let _ = self.to_client.send(text.to_string());
    }

    pub fn send_frame(&self, frame: &Frame) {
        self.send_text(&frame.encode().unwrap());
    }

    pub fn reply(&self, request: &Frame, data: Value) {
        self.send_frame(&Frame::new(
            request.message_id.clone(),
            MessageType::WasmResult,
            data,
        ));
    }

    pub async fn recv_frame(&mut self) -> Frame {
        let text = tokio::time::timeout(Duration::from_secs(5), self.from_client.recv())
            .await
            .expect("client sent nothing")
            .expect("client closed the connection");
        Frame::decode(&text).unwrap()
    }

    /// Frame already sent by the client, if any.
    pub fn try_recv_frame(&mut self) -> Option<Frame> {
        self.from_client
            .try_recv()
            .ok()
            .map(|text| Frame::decode(&text).unwrap())
    }
}
