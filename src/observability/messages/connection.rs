// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the remote connection state machine.
//!
//! This module contains message types for logging events related to:
//! * Connection establishment and loss
//! * The bounded reconnection policy
//! * Inbound frames that were dropped instead of dispatched

use super::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// Channel to the remote peer opened.
///
/// # Log Level
/// `info!` - Important operational event
pub struct Connected<'a> {
    pub endpoint: &'a str,
    pub generation: u64,
}

impl Display for Connected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Connected to remote peer at {} (connection #{})",
            self.endpoint, self.generation
        )
    }
}

/// Opening the channel failed.
///
/// # Log Level
/// `warn!` - The reconnection policy decides what happens next
pub struct ConnectFailed<'a> {
    pub endpoint: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ConnectFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Failed to connect to {}: {}", self.endpoint, self.error)
    }
}

pub struct ConnectionClosed<'a> {
    pub endpoint: &'a str,
    pub pending_calls: usize,
}

impl Display for ConnectionClosed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Connection to {} closed with {} pending calls",
            self.endpoint, self.pending_calls
        )
    }
}

/// A reconnect attempt is scheduled after the configured delay.
pub struct ReconnectScheduled {
    pub attempt: u32,
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Display for ReconnectScheduled {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Attempting to reconnect in {:?} (attempt {} of {})",
            self.delay, self.attempt, self.max_attempts
        )
    }
}

impl StructuredLog for ReconnectScheduled {
    fn log(&self) {
        tracing::info!(
            attempt = self.attempt,
            max_attempts = self.max_attempts,
            delay_ms = self.delay.as_millis() as u64,
            "{}",
            self
        );
    }
}

/// Reconnect budget exhausted; the client is now `Failed`.
///
/// # Log Level
/// `error!` - Manual reconnect required
pub struct ReconnectAbandoned {
    pub attempts: u32,
}

impl Display for ReconnectAbandoned {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Max reconnect attempts ({}) reached, no longer trying to reconnect",
            self.attempts
        )
    }
}

/// An inbound frame was dropped without failing the connection.
///
/// # Log Level
/// `warn!` for malformed frames, `debug!` for unmatched responses
pub struct FrameDropped<'a> {
    pub message_id: Option<&'a str>,
    pub reason: &'a str,
}

impl Display for FrameDropped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self.message_id {
            Some(id) => write!(f, "Dropped inbound frame '{}': {}", id, self.reason),
            None => write!(f, "Dropped inbound frame: {}", self.reason),
        }
    }
}

pub struct PendingCallsSettled<'a> {
    pub count: usize,
    pub policy: &'a str,
}

impl Display for PendingCallsSettled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Settled {} pending calls on close (policy: {})",
            self.count, self.policy
        )
    }
}
