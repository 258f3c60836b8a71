// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use tracing::warn;

use crate::backends::local::LocalFragmentExecutor;
use crate::backends::remote::{ConnectionClient, CredentialProvider, WebSocketConnector};
use crate::backends::wasm::DirectoryFragmentSource;
use crate::config::Config;
use crate::distribution::DistributionManager;
use crate::errors::DistributionResult;
use crate::registry::{PlacementRegistry, PlacementStore};
use crate::traits::Connector;

/// Distribution runtime builder - wires every component from configuration.
///
/// Startup order:
/// 1. load the manifest into the [`PlacementRegistry`]
/// 2. restore persisted placements over it
/// 3. build the worker pool and local executor, preloading every manifest fragment
/// 4. obtain credentials and open the first connection
///
/// Neither a failed token exchange nor a failed first connection fails
/// startup. The client enters its reconnection policy and calls fall back to
/// local execution meanwhile.
pub struct RuntimeBuilder;

impl RuntimeBuilder {
    /// Build a [`DistributionManager`] connected over WebSocket.
    pub async fn from_config(cfg: &Config) -> DistributionResult<DistributionManager> {
        Self::with_connector(cfg, Arc::new(WebSocketConnector::new())).await
    }

    /// Build a [`DistributionManager`] over any transport.
    pub async fn with_connector(
        cfg: &Config,
        connector: Arc<dyn Connector>,
    ) -> DistributionResult<DistributionManager> {
        let registry = Arc::new(
            PlacementRegistry::load(&cfg.fragments.manifest, cfg.fragments.unknown_fragment_policy)
                .await?,
        );

        let store = PlacementStore::new(&cfg.fragments.placement_state);
        store.restore_into(&registry).await;

        let source = Arc::new(DirectoryFragmentSource::new(&cfg.fragments.directory));
        let local = Arc::new(LocalFragmentExecutor::new(
            source,
            cfg.pool.capacity(),
            cfg.wasm.fuel.effective(),
        )?);
        local.load_all(&registry.fragment_ids().await).await;

        let credentials = Self::credential_provider(cfg).obtain().await;
        let client = Arc::new(ConnectionClient::new(
            cfg.connection.client_config(),
            connector,
            Arc::clone(&registry),
        ));
        if let Err(e) = client.connect(credentials).await {
            warn!(
                "Starting without a remote peer, calls placed Remote run locally: {}",
                e
            );
        }

        Ok(DistributionManager::new(registry, local, client, Some(store)))
    }

    fn credential_provider(cfg: &Config) -> CredentialProvider {
        let connection = &cfg.connection;
        let mut provider =
            CredentialProvider::new().with_credentials_file(&connection.credentials_file);
        if let Some(token) = &connection.auth_token {
            provider = provider.with_static_token(token.clone());
        }
        if let Some(api) = &connection.api_endpoint {
            provider = provider.with_api(api.clone(), connection.api_key.clone());
        }
        provider
    }
}
