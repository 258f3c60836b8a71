// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use tracing::{debug, error, info};
use wasmtime::Engine;

use crate::backends::wasm::{create_engine, ExecutionUnit, Fragment, WasmError};
use crate::engine::{WorkerPool, WorkerSlot};
use crate::errors::{DistributionError, DistributionResult};
use crate::observability::messages::wasm::{
    ExecutionCompleted, ExecutionFailed, ExecutionStarted, FragmentCompiled, ModuleLoadFailed,
};
use crate::registry::ExecutionLocation;
use crate::traits::{FragmentExecutor, FragmentSource};

/// Runs fragments in the local wasm sandbox.
///
/// Modules are fetched from a [`FragmentSource`] and compiled once by
/// [`load_fragment`](Self::load_fragment). Each call then runs on a slot of
/// the shared [`WorkerPool`], queueing when every slot is busy.
pub struct LocalFragmentExecutor {
    engine: Engine,
    source: Arc<dyn FragmentSource>,
    fragments: RwLock<HashMap<String, Arc<Fragment>>>,
    pool: WorkerPool<ExecutionUnit>,
}

impl LocalFragmentExecutor {
    /// Create the engine and a pool of `capacity` execution units, each
    /// allowed `fuel` units per call. Must run inside a tokio runtime.
    pub fn new(
        source: Arc<dyn FragmentSource>,
        capacity: usize,
        fuel: u64,
    ) -> DistributionResult<Self> {
        let engine = create_engine().map_err(|e| DistributionError::Startup(e.to_string()))?;
        let pool = WorkerPool::new(capacity, |_| ExecutionUnit::new(fuel))
            .map_err(|e| DistributionError::Startup(e.to_string()))?;

        Ok(Self {
            engine,
            source,
            fragments: RwLock::new(HashMap::new()),
            pool,
        })
    }

    /// Fetch, validate and compile a fragment. Reloading replaces the old module.
    pub async fn load_fragment(&self, fragment_id: &str) -> DistributionResult<()> {
        let fragment = self.compile(fragment_id).await.map_err(|e| {
            error!(
                "{}",
                ModuleLoadFailed {
                    fragment_id,
                    error: &e,
                }
            );
            DistributionError::FragmentLoad {
                fragment_id: fragment_id.to_string(),
                reason: e.to_string(),
            }
        })?;

        debug!(
            "{}",
            FragmentCompiled {
                fragment_id,
                entry_points: fragment.entry_points(),
            }
        );

        self.fragments
            .write()
            .await
            .insert(fragment_id.to_string(), Arc::new(fragment));
        Ok(())
    }

    async fn compile(&self, fragment_id: &str) -> Result<Fragment, WasmError> {
        let bytes = self.source.fetch(fragment_id).await?;
        let engine = self.engine.clone();
        let id = fragment_id.to_string();

        // Cranelift compilation is CPU bound.
        tokio::task::spawn_blocking(move || Fragment::compile(&engine, &id, &bytes))
            .await
            .map_err(|e| WasmError::ModuleError(format!("compilation task failed: {}", e)))?
    }

    /// Load every fragment in `fragment_ids`. A failure is logged once by
    /// [`load_fragment`](Self::load_fragment) and skipped; that fragment can
    /// still run remotely. Returns how many loaded.
    pub async fn load_all(&self, fragment_ids: &[String]) -> usize {
        let mut loaded = 0;
        for fragment_id in fragment_ids {
            if self.load_fragment(fragment_id).await.is_ok() {
                loaded += 1;
            }
        }
        info!(
            "Loaded {}/{} fragments for local execution (pool capacity {})",
            loaded,
            fragment_ids.len(),
            self.pool.capacity()
        );
        loaded
    }

    pub async fn is_loaded(&self, fragment_id: &str) -> bool {
        self.fragments.read().await.contains_key(fragment_id)
    }

    pub async fn entry_points(&self, fragment_id: &str) -> Option<Vec<String>> {
        self.fragments
            .read()
            .await
            .get(fragment_id)
            .map(|fragment| fragment.entry_points().to_vec())
    }

    pub fn pool(&self) -> &WorkerPool<ExecutionUnit> {
        &self.pool
    }

    pub fn source(&self) -> &dyn FragmentSource {
        self.source.as_ref()
    }
}

#[async_trait]
impl FragmentExecutor for LocalFragmentExecutor {
    async fn execute(
        &self,
        fragment_id: &str,
        function_name: &str,
        parameters: Vec<Value>,
    ) -> DistributionResult<Value> {
        let fragment = self
            .fragments
            .read()
            .await
            .get(fragment_id)
            .cloned()
            .ok_or_else(|| DistributionError::NotLoaded(fragment_id.to_string()))?;

        let function = function_name.to_string();
        let outcome = self
            .pool
            .submit(move |slot: &mut WorkerSlot<ExecutionUnit>| {
                debug!(
                    "{}",
                    ExecutionStarted {
                        fragment_id: fragment.id(),
                        function_name: &function,
                        slot: slot.index(),
                        parameter_count: parameters.len(),
                    }
                );
                let result = slot.unit_mut().execute(&fragment, &function, &parameters);
                (slot.index(), result)
            })
            .await
            .map_err(|e| DistributionError::execution_fault(fragment_id, e))?;

        match outcome {
            (slot, Ok(value)) => {
                debug!(
                    "{}",
                    ExecutionCompleted {
                        fragment_id,
                        function_name,
                        slot,
                    }
                );
                Ok(value)
            }
            (_, Err(e)) => {
                error!(
                    "{}",
                    ExecutionFailed {
                        fragment_id,
                        function_name,
                        error: &e,
                    }
                );
                Err(DistributionError::execution_fault(fragment_id, e))
            }
        }
    }

    fn location(&self) -> ExecutionLocation {
        ExecutionLocation::Local
    }
}
