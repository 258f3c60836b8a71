// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info, warn};

use super::result::normalize_result;
use crate::backends::local::LocalFragmentExecutor;
use crate::backends::remote::{
    ConnectionClient, FragmentPlacement, MessageType, RemoteFragmentExecutor,
};
use crate::errors::{DistributionError, DistributionResult};
use crate::observability::messages::distribution::{
    CallFailed, PlacementNotifyFailed, RemoteFallback, RoutingDecision,
};
use crate::observability::messages::StructuredLog;
use crate::registry::{ExecutionLocation, PlacementRegistry, PlacementStore};
use crate::traits::FragmentExecutor;

/// Routes each fragment call to the location the registry names and keeps
/// the registry and the remote peer in step.
///
/// A fragment placed `Remote` runs remotely only while the connection is up;
/// otherwise it falls back to the local executor.
pub struct DistributionManager {
    registry: Arc<PlacementRegistry>,
    local: Arc<LocalFragmentExecutor>,
    remote: RemoteFragmentExecutor,
    store: Option<PlacementStore>,
}

impl DistributionManager {
    pub fn new(
        registry: Arc<PlacementRegistry>,
        local: Arc<LocalFragmentExecutor>,
        client: Arc<ConnectionClient>,
        store: Option<PlacementStore>,
    ) -> Self {
        Self {
            registry,
            local,
            remote: RemoteFragmentExecutor::new(client),
            store,
        }
    }

    pub async fn execute(
        &self,
        fragment_id: &str,
        function_name: &str,
        parameters: Vec<Value>,
    ) -> DistributionResult<Value> {
        let placement = self
            .registry
            .get(fragment_id)
            .await
            .ok_or_else(|| DistributionError::UnknownFragment(fragment_id.to_string()))?;

        let executor: &dyn FragmentExecutor = match placement {
            ExecutionLocation::Remote if self.remote.is_available() => &self.remote,
            ExecutionLocation::Remote => {
                info!(
                    "{}",
                    RemoteFallback {
                        fragment_id,
                        connection_state: &self.client().state().to_string(),
                    }
                );
                self.local.as_ref()
            }
            ExecutionLocation::Local => self.local.as_ref(),
        };

        let location = executor.location();
        RoutingDecision {
            fragment_id,
            function_name,
            location: location.as_str(),
        }
        .log();

        let result = executor
            .execute(fragment_id, function_name, parameters)
            .await
            .and_then(normalize_result);

        if let Err(e) = &result {
            CallFailed {
                fragment_id,
                function_name,
                location: location.as_str(),
                error: e,
            }
            .log();
        }
        result
    }

    /// Change where a fragment runs.
    ///
    /// The registry is updated before this returns. The peer is then told with
    /// a fire-and-forget `UpdateFragments` frame; if that fails the local
    /// change stands.
    pub async fn update_placement(
        &self,
        fragment_id: &str,
        location: ExecutionLocation,
    ) -> DistributionResult<()> {
        self.registry.set(fragment_id, location).await?;

        let placement = FragmentPlacement {
            fragment_id: fragment_id.to_string(),
            execution_location: location,
        };
        let notified = serde_json::to_value(vec![placement])
            .map_err(|e| DistributionError::Transport(e.to_string()))
            .and_then(|data| self.client().notify(MessageType::UpdateFragments, data));

        match notified {
            Ok(()) => debug!("Notified peer: '{}' now executes {}", fragment_id, location),
            Err(e) => warn!(
                "{}",
                PlacementNotifyFailed {
                    fragment_id,
                    error: &e,
                }
            ),
        }
        Ok(())
    }

    /// Write current placements to the store. Returns how many were saved.
    pub async fn persist(&self) -> DistributionResult<usize> {
        match &self.store {
            Some(store) => store.save(&self.registry).await,
            None => Ok(0),
        }
    }

    /// Persist placements, then close the connection.
    pub async fn shutdown(&self) -> DistributionResult<()> {
        let persisted = self.persist().await;
        self.client().close();
        persisted.map(|_| ())
    }

    pub fn registry(&self) -> &Arc<PlacementRegistry> {
        &self.registry
    }

    pub fn local(&self) -> &Arc<LocalFragmentExecutor> {
        &self.local
    }

    pub fn client(&self) -> &ConnectionClient {
        self.remote.client()
    }

    pub fn store(&self) -> Option<&PlacementStore> {
        self.store.as_ref()
    }
}
