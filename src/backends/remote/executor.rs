// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use super::client::ConnectionClient;
use super::frame::{ExecuteFunctionRequest, MessageType};
use crate::errors::{DistributionError, DistributionResult};
use crate::registry::ExecutionLocation;
use crate::traits::FragmentExecutor;

/// Runs fragments on the remote peer with one `ExecuteFunction` request per call.
#[derive(Debug, Clone)]
pub struct RemoteFragmentExecutor {
    client: Arc<ConnectionClient>,
}

impl RemoteFragmentExecutor {
    pub fn new(client: Arc<ConnectionClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &ConnectionClient {
        &self.client
    }

    pub fn is_available(&self) -> bool {
        self.client.is_connected()
    }
}

#[async_trait]
impl FragmentExecutor for RemoteFragmentExecutor {
    async fn execute(
        &self,
        fragment_id: &str,
        function_name: &str,
        parameters: Vec<Value>,
    ) -> DistributionResult<Value> {
        let request = ExecuteFunctionRequest {
            fragment_id: fragment_id.to_string(),
            function_name: function_name.to_string(),
            parameters,
        };
        let data = serde_json::to_value(&request)
            .map_err(|e| DistributionError::Transport(e.to_string()))?;

        self.client.send(MessageType::ExecuteFunction, data).await
    }

    fn location(&self) -> ExecutionLocation {
        ExecutionLocation::Remote
    }
}
