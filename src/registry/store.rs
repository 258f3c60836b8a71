// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use super::PlacementRegistry;
use crate::errors::{DistributionError, DistributionResult};
use crate::observability::messages::registry::{PersistedStateUnreadable, PlacementPersisted};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// JSON file holding the last known placements across restarts.
#[derive(Debug, Clone)]
pub struct PlacementStore {
    path: PathBuf,
}

impl PlacementStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw persisted state, or `None` when nothing has been saved yet.
    pub async fn load(&self) -> DistributionResult<Option<String>> {
        match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DistributionError::Persistence(format!(
                "failed to read '{}': {}",
                self.path.display(),
                e
            ))),
        }
    }

    pub async fn save(&self, registry: &PlacementRegistry) -> DistributionResult<usize> {
        let serialized = registry.serialize().await?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                DistributionError::Persistence(format!(
                    "failed to create '{}': {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        tokio::fs::write(&self.path, serialized).await.map_err(|e| {
            DistributionError::Persistence(format!(
                "failed to write '{}': {}",
                self.path.display(),
                e
            ))
        })?;

        let fragment_count = registry.fragment_ids().await.len();
        info!(
            "{}",
            PlacementPersisted {
                path: &self.path.display().to_string(),
                fragment_count,
            }
        );
        Ok(fragment_count)
    }

    /// Apply the saved state to `registry`.
    ///
    /// A missing file restores nothing. An unreadable or corrupt file is logged
    /// and skipped so startup continues from the manifest.
    pub async fn restore_into(&self, registry: &PlacementRegistry) -> usize {
        let path = self.path.display().to_string();

        let content = match self.load().await {
            Ok(Some(content)) => content,
            Ok(None) => return 0,
            Err(e) => {
                warn!("{}", PersistedStateUnreadable { path: &path, error: &e });
                return 0;
            }
        };

        match registry.restore(&content).await {
            Ok(restored) => restored,
            Err(e) => {
                warn!("{}", PersistedStateUnreadable { path: &path, error: &e });
                0
            }
        }
    }
}
