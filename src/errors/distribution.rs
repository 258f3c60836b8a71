// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error taxonomy surfaced to callers of the distribution runtime.
//!
//! Every failure a caller can observe from `execute` or `update_placement`
//! maps onto one of these variants. Backend specific errors (wasmtime traps,
//! MessagePack decoding, socket failures) are flattened into the variant that
//! describes *where* the call failed, carrying the original detail as text so
//! the error stays `Clone` and can travel through response channels.

use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum DistributionError {
    /// No compiled module exists locally for the fragment.
    #[error("Fragment '{0}' is not loaded locally")]
    NotLoaded(String),

    /// The placement registry has no entry for the fragment.
    #[error("Fragment '{0}' has no placement entry")]
    UnknownFragment(String),

    /// A remote call was attempted while the connection is not `Connected`.
    #[error("Remote peer is not connected")]
    NotConnected,

    /// The local execution unit raised an error.
    #[error("Execution of fragment '{fragment_id}' failed: {reason}")]
    ExecutionFault { fragment_id: String, reason: String },

    /// The remote peer answered with an error payload.
    #[error("Remote peer returned an error: {0}")]
    RemoteFault(String),

    /// The channel closed while the call with this correlation id was pending.
    #[error("Connection closed before a response to '{0}' arrived")]
    ConnectionLost(String),

    /// A remote call did not complete within the configured request timeout.
    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),

    /// A fragment result could not be decoded as JSON.
    #[error("Fragment result is not valid JSON: {0}")]
    MalformedResult(String),

    /// The module for a fragment could not be fetched or compiled.
    #[error("Failed to load fragment '{fragment_id}': {reason}")]
    FragmentLoad { fragment_id: String, reason: String },

    /// The manifest could not be read or parsed.
    #[error("Invalid fragment manifest: {0}")]
    Manifest(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Placement persistence error: {0}")]
    Persistence(String),

    #[error("Credential error: {0}")]
    Credentials(String),

    /// A runtime component could not be constructed.
    #[error("Runtime initialization failed: {0}")]
    Startup(String),
}

impl DistributionError {
    pub fn execution_fault(fragment_id: &str, reason: impl std::fmt::Display) -> Self {
        DistributionError::ExecutionFault {
            fragment_id: fragment_id.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type DistributionResult<T> = Result<T, DistributionError>;
