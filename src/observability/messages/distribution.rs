// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::StructuredLog;
use std::fmt::{Display, Formatter};

/// Where a single call is about to run.
pub struct RoutingDecision<'a> {
    pub fragment_id: &'a str,
    pub function_name: &'a str,
    pub location: &'a str,
}

impl Display for RoutingDecision<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Routing '{}::{}' to {} executor",
            self.fragment_id, self.function_name, self.location
        )
    }
}

impl StructuredLog for RoutingDecision<'_> {
    fn log(&self) {
        tracing::debug!(
            fragment_id = self.fragment_id,
            function_name = self.function_name,
            location = self.location,
            "{}",
            self
        );
    }
}

/// Fragment is placed remotely but the peer is unreachable; running it locally.
///
/// # Log Level
/// `info!`
pub struct RemoteFallback<'a> {
    pub fragment_id: &'a str,
    pub connection_state: &'a str,
}

impl Display for RemoteFallback<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Fragment '{}' is placed remotely but connection is {}, executing locally",
            self.fragment_id, self.connection_state
        )
    }
}

/// The peer could not be told about a placement change. The local change stands.
///
/// # Log Level
/// `warn!`
pub struct PlacementNotifyFailed<'a> {
    pub fragment_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for PlacementNotifyFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Could not notify peer about placement of '{}': {}",
            self.fragment_id, self.error
        )
    }
}

pub struct CallFailed<'a> {
    pub fragment_id: &'a str,
    pub function_name: &'a str,
    pub location: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for CallFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Call '{}::{}' failed on {} executor: {}",
            self.fragment_id, self.function_name, self.location, self.error
        )
    }
}

impl StructuredLog for CallFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            fragment_id = self.fragment_id,
            function_name = self.function_name,
            location = self.location,
            "{}",
            self
        );
    }
}
