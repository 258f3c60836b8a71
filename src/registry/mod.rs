// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Placement Registry
//!
//! Records, per fragment, where it currently executes. The registry is the
//! single source of truth the [`DistributionManager`](crate::distribution::DistributionManager)
//! consults for every call.
//!
//! ## Merge order
//!
//! ```text
//! manifest baseline ──► persisted overlay ──► remote overlays ──► local set()
//! ```
//!
//! Every change is a [`PlacementOverlay`] folded over the current map with
//! [`merge_overlays`], which only touches known ids. Under
//! [`UnknownFragmentPolicy::Insert`] a local `set()` first admits the new id,
//! then applies its overlay.
//!
//! The baseline is loaded once and never mutated. The current map is replaced
//! as a whole on every change, so readers always observe the result of the
//! latest completed update and never a partially applied one.

mod location;
mod placement;
mod store;

pub use location::ExecutionLocation;
pub use placement::{
    merge_overlays, OverlaySource, PlacementEntry, PlacementMap, PlacementOverlay,
    UnknownFragmentPolicy,
};
pub use store::PlacementStore;

use crate::errors::{DistributionError, DistributionResult};
use crate::observability::messages::registry::{
    DuplicateManifestEntry, ManifestLoaded, OverlayApplied, PlacementUpdated,
    UnknownFragmentIgnored,
};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Debug)]
pub struct PlacementRegistry {
    baseline: Arc<PlacementMap>,
    current: RwLock<Arc<PlacementMap>>,
    unknown_policy: UnknownFragmentPolicy,
}

impl PlacementRegistry {
    /// Build a registry from manifest entries. A repeated id keeps its last entry.
    pub fn from_manifest(entries: Vec<PlacementEntry>, unknown_policy: UnknownFragmentPolicy) -> Self {
        let mut baseline = PlacementMap::new();
        for entry in entries {
            if baseline.insert(entry.id.clone(), entry.execution_location).is_some() {
                warn!("{}", DuplicateManifestEntry { fragment_id: &entry.id });
            }
        }

        let baseline = Arc::new(baseline);
        Self {
            current: RwLock::new(Arc::clone(&baseline)),
            baseline,
            unknown_policy,
        }
    }

    /// Read the JSON manifest at `path` and build the baseline from it.
    pub async fn load(
        path: impl AsRef<Path>,
        unknown_policy: UnknownFragmentPolicy,
    ) -> DistributionResult<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            DistributionError::Manifest(format!("failed to read '{}': {}", path.display(), e))
        })?;
        let entries: Vec<PlacementEntry> = serde_json::from_str(&content).map_err(|e| {
            DistributionError::Manifest(format!("failed to parse '{}': {}", path.display(), e))
        })?;

        let registry = Self::from_manifest(entries, unknown_policy);
        info!(
            "{}",
            ManifestLoaded {
                origin: &path.display().to_string(),
                fragment_count: registry.baseline.len(),
            }
        );
        Ok(registry)
    }

    pub async fn get(&self, fragment_id: &str) -> Option<ExecutionLocation> {
        self.current.read().await.get(fragment_id)
    }

    /// Overwrite the placement of a fragment.
    ///
    /// Unknown ids are rejected with [`DistributionError::UnknownFragment`]
    /// unless the registry was built with [`UnknownFragmentPolicy::Insert`].
    pub async fn set(&self, fragment_id: &str, location: ExecutionLocation) -> DistributionResult<()> {
        let mut current = self.current.write().await;

        let mut base = PlacementMap::clone(&current);
        if !base.contains_key(fragment_id) {
            if self.unknown_policy == UnknownFragmentPolicy::Reject {
                return Err(DistributionError::UnknownFragment(fragment_id.to_string()));
            }
            // Insert policy admits the id; the overlay below then places it.
            base.insert(fragment_id.to_string(), location);
        }

        let overlay = PlacementOverlay::new(
            OverlaySource::Local,
            vec![PlacementEntry::new(fragment_id, location)],
        );
        *current = Arc::new(merge_overlays(&base, std::slice::from_ref(&overlay)));

        info!(
            "{}",
            PlacementUpdated {
                fragment_id,
                location: location.as_str(),
                source: &overlay.source.to_string(),
            }
        );
        Ok(())
    }

    /// Apply placements pushed by the remote peer. Unknown ids are ignored.
    pub async fn apply_remote_update(&self, entries: Vec<PlacementEntry>) -> usize {
        self.apply_overlay(PlacementOverlay::new(OverlaySource::Remote, entries))
            .await
    }

    /// Apply one overlay to the current map and return how many entries matched.
    pub async fn apply_overlay(&self, overlay: PlacementOverlay) -> usize {
        let mut current = self.current.write().await;

        let source = overlay.source.to_string();
        let mut applied = 0;
        for entry in &overlay.entries {
            if current.contains_key(&entry.id) {
                applied += 1;
            } else {
                debug!(
                    "{}",
                    UnknownFragmentIgnored {
                        fragment_id: &entry.id,
                        source: &source,
                    }
                );
            }
        }

        let offered = overlay.entries.len();
        *current = Arc::new(merge_overlays(&current, std::slice::from_ref(&overlay)));

        info!(
            "{}",
            OverlayApplied {
                source: &source,
                applied,
                offered,
            }
        );
        applied
    }

    /// JSON list of `{id, execution_location}` covering every known fragment.
    pub async fn serialize(&self) -> DistributionResult<String> {
        let entries = self.current.read().await.to_entries();
        serde_json::to_string_pretty(&entries)
            .map_err(|e| DistributionError::Persistence(e.to_string()))
    }

    /// Apply previously serialized state over the current map.
    ///
    /// Only ids already known to the registry are restored.
    pub async fn restore(&self, serialized: &str) -> DistributionResult<usize> {
        let entries: Vec<PlacementEntry> = serde_json::from_str(serialized)
            .map_err(|e| DistributionError::Persistence(e.to_string()))?;
        Ok(self
            .apply_overlay(PlacementOverlay::new(OverlaySource::Persisted, entries))
            .await)
    }

    pub async fn snapshot(&self) -> Arc<PlacementMap> {
        Arc::clone(&*self.current.read().await)
    }

    pub async fn fragment_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.current.read().await.keys().cloned().collect();
        ids.sort();
        ids
    }

    pub fn baseline(&self) -> &PlacementMap {
        &self.baseline
    }

    pub fn unknown_policy(&self) -> UnknownFragmentPolicy {
        self.unknown_policy
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;
    use ExecutionLocation::{Local, Remote};

    fn manifest() -> Vec<PlacementEntry> {
        vec![
            PlacementEntry::new("f1", Local),
            PlacementEntry::new("f2", Remote),
            PlacementEntry::new("f3", Remote),
        ]
    }

    fn registry(policy: UnknownFragmentPolicy) -> PlacementRegistry {
        PlacementRegistry::from_manifest(manifest(), policy)
    }

    #[tokio::test]
    async fn test_get_returns_manifest_value() {
        let registry = registry(UnknownFragmentPolicy::Reject);

        assert_eq!(registry.get("f1").await, Some(Local));
        assert_eq!(registry.get("f2").await, Some(Remote));
        assert_eq!(registry.get("missing").await, None);
    }

    #[tokio::test]
    async fn test_load_reads_json_manifest() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"id": "cart", "execution_location": "Client"}}, {{"id": "search", "execution_location": "Server"}}]"#
        )
        .unwrap();

        let registry = PlacementRegistry::load(file.path(), UnknownFragmentPolicy::Reject)
            .await
            .unwrap();

        assert_eq!(registry.get("cart").await, Some(Local));
        assert_eq!(registry.get("search").await, Some(Remote));
    }

    #[tokio::test]
    async fn test_load_rejects_malformed_manifest() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = PlacementRegistry::load(file.path(), UnknownFragmentPolicy::Reject).await;

        assert!(matches!(result, Err(DistributionError::Manifest(_))));
    }

    #[tokio::test]
    async fn test_duplicate_manifest_entry_keeps_last() {
        let registry = PlacementRegistry::from_manifest(
            vec![PlacementEntry::new("f1", Local), PlacementEntry::new("f1", Remote)],
            UnknownFragmentPolicy::Reject,
        );

        assert_eq!(registry.get("f1").await, Some(Remote));
        assert_eq!(registry.fragment_ids().await, vec!["f1".to_string()]);
    }

    #[tokio::test]
    async fn test_set_overwrites_existing_entry() {
        let registry = registry(UnknownFragmentPolicy::Reject);

        registry.set("f1", Remote).await.unwrap();

        assert_eq!(registry.get("f1").await, Some(Remote));
        assert_eq!(registry.baseline().get("f1"), Some(Local));
    }

    #[tokio::test]
    async fn test_set_unknown_rejected_by_default() {
        let registry = registry(UnknownFragmentPolicy::Reject);

        let result = registry.set("f9", Remote).await;

        assert_eq!(result, Err(DistributionError::UnknownFragment("f9".to_string())));
        assert_eq!(registry.get("f9").await, None);
    }

    #[tokio::test]
    async fn test_set_unknown_inserted_under_insert_policy() {
        let registry = registry(UnknownFragmentPolicy::Insert);

        registry.set("f9", Remote).await.unwrap();

        assert_eq!(registry.get("f9").await, Some(Remote));
    }

    #[tokio::test]
    async fn test_remote_update_never_creates_keys() {
        let registry = registry(UnknownFragmentPolicy::Reject);

        let applied = registry
            .apply_remote_update(vec![
                PlacementEntry::new("f1", Remote),
                PlacementEntry::new("unknown", Remote),
            ])
            .await;

        assert_eq!(applied, 1);
        assert_eq!(registry.get("f1").await, Some(Remote));
        assert_eq!(registry.get("unknown").await, None);
        assert_eq!(registry.fragment_ids().await.len(), 3);
    }

    #[tokio::test]
    async fn test_serialize_restore_round_trip() {
        let source = registry(UnknownFragmentPolicy::Reject);
        source.set("f1", Remote).await.unwrap();
        source.set("f2", Local).await.unwrap();
        let serialized = source.serialize().await.unwrap();

        let target = registry(UnknownFragmentPolicy::Reject);
        let restored = target.restore(&serialized).await.unwrap();

        assert_eq!(restored, 3);
        assert_eq!(*target.snapshot().await, *source.snapshot().await);
    }

    #[tokio::test]
    async fn test_restore_overrides_matching_ids_only() {
        let registry = registry(UnknownFragmentPolicy::Reject);
        let persisted = r#"[
            {"id": "f1", "execution_location": "Remote"},
            {"id": "gone", "execution_location": "Local"}
        ]"#;

        let restored = registry.restore(persisted).await.unwrap();

        assert_eq!(restored, 1);
        assert_eq!(registry.get("f1").await, Some(Remote));
        assert_eq!(registry.get("gone").await, None);
    }

    #[tokio::test]
    async fn test_restore_rejects_corrupt_state() {
        let registry = registry(UnknownFragmentPolicy::Reject);

        let result = registry.restore("{").await;

        assert!(matches!(result, Err(DistributionError::Persistence(_))));
        assert_eq!(registry.get("f1").await, Some(Local));
    }

    #[tokio::test]
    async fn test_snapshot_is_unaffected_by_later_updates() {
        let registry = registry(UnknownFragmentPolicy::Reject);
        let before = registry.snapshot().await;

        registry.set("f1", Remote).await.unwrap();

        assert_eq!(before.get("f1"), Some(Local));
        assert_eq!(registry.snapshot().await.get("f1"), Some(Remote));
    }

    #[tokio::test]
    async fn test_local_and_remote_changes_latest_wins() {
        let registry = registry(UnknownFragmentPolicy::Reject);

        registry.apply_remote_update(vec![PlacementEntry::new("f1", Remote)]).await;
        registry.set("f1", Local).await.unwrap();
        assert_eq!(registry.get("f1").await, Some(Local));

        registry.apply_remote_update(vec![PlacementEntry::new("f1", Remote)]).await;
        assert_eq!(registry.get("f1").await, Some(Remote));
        assert_eq!(registry.baseline().get("f1"), Some(Local));
    }

    #[tokio::test]
    async fn test_inserted_id_accepts_later_overlays() {
        let registry = registry(UnknownFragmentPolicy::Insert);

        registry.set("f4", Local).await.unwrap();
        let applied = registry
            .apply_remote_update(vec![PlacementEntry::new("f4", Remote)])
            .await;

        assert_eq!(applied, 1);
        assert_eq!(registry.get("f4").await, Some(Remote));
        assert!(!registry.baseline().contains_key("f4"));
    }
}
