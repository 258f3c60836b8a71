// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;
use serde_json::Value;

use crate::errors::DistributionResult;
use crate::registry::ExecutionLocation;

/// Runs one fragment call somewhere. Implemented by the local wasm executor
/// and by the remote peer executor.
#[async_trait]
pub trait FragmentExecutor: Send + Sync {
    async fn execute(
        &self,
        fragment_id: &str,
        function_name: &str,
        parameters: Vec<Value>,
    ) -> DistributionResult<Value>;

    fn location(&self) -> ExecutionLocation;
}
