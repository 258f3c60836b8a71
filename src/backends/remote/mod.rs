// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Remote peer backend: wire frames, the persistent connection and the
//! executor that sends calls over it.

pub mod client;
pub mod credentials;
pub mod executor;
pub mod frame;
pub mod policy;
#[cfg(test)]
pub(crate) mod stub;
pub mod websocket;

pub use client::{ClientConfig, ConnectionClient, ConnectionState, PendingCallPolicy};
pub use credentials::{CredentialProvider, Credentials};
pub use executor::RemoteFragmentExecutor;
pub use frame::{ExecuteFunctionRequest, FragmentPlacement, Frame, MessageType};
pub use policy::{ReconnectDecision, ReconnectPolicy};
pub use websocket::WebSocketConnector;
