// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::backends::remote::Credentials;
use crate::errors::DistributionResult;

/// An open text-frame channel to the remote peer.
///
/// The transport closes the connection when `outbound` is dropped and ends
/// `inbound` when the peer goes away.
#[derive(Debug)]
pub struct Channel {
    pub outbound: mpsc::UnboundedSender<String>,
    pub inbound: mpsc::UnboundedReceiver<String>,
}

/// Opens channels to the remote peer.
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, endpoint: &str, credentials: &Credentials) -> DistributionResult<Channel>;
}
