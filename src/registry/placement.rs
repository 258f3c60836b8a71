// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Placement data and the overlay merge.
//!
//! The registry never edits its baseline. Every source of placement changes
//! (persisted state, peer updates, local calls to `set`) is expressed as a
//! [`PlacementOverlay`] and folded over the current map with [`merge_overlays`].

use super::ExecutionLocation;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};

/// A single manifest or persisted-state record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementEntry {
    pub id: String,
    pub execution_location: ExecutionLocation,
}

impl PlacementEntry {
    pub fn new(id: impl Into<String>, execution_location: ExecutionLocation) -> Self {
        Self {
            id: id.into(),
            execution_location,
        }
    }
}

/// Newtype wrapper for the fragment id to location table
#[derive(Clone, Default, PartialEq, Eq)]
pub struct PlacementMap(pub HashMap<String, ExecutionLocation>);

impl PlacementMap {
    pub fn new() -> Self {
        Self(HashMap::new())
    }

    pub fn insert(&mut self, id: String, location: ExecutionLocation) -> Option<ExecutionLocation> {
        self.0.insert(id, location)
    }

    pub fn get(&self, id: &str) -> Option<ExecutionLocation> {
        self.0.get(id).copied()
    }

    pub fn contains_key(&self, id: &str) -> bool {
        self.0.contains_key(id)
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Entries ordered by fragment id, for stable serialization.
    pub fn to_entries(&self) -> Vec<PlacementEntry> {
        let mut entries: Vec<PlacementEntry> = self
            .0
            .iter()
            .map(|(id, location)| PlacementEntry::new(id.clone(), *location))
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        entries
    }
}

impl std::fmt::Debug for PlacementMap {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlacementMap")
            .field("fragment_count", &self.0.len())
            .field("placements", &self.to_entries())
            .finish()
    }
}

impl From<HashMap<String, ExecutionLocation>> for PlacementMap {
    fn from(map: HashMap<String, ExecutionLocation>) -> Self {
        Self(map)
    }
}

impl FromIterator<PlacementEntry> for PlacementMap {
    fn from_iter<I: IntoIterator<Item = PlacementEntry>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .map(|entry| (entry.id, entry.execution_location))
                .collect(),
        )
    }
}

/// Origin of a placement overlay, in the order overlays are normally applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OverlaySource {
    Persisted,
    Remote,
    Local,
}

impl Display for OverlaySource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OverlaySource::Persisted => "persisted",
            OverlaySource::Remote => "remote",
            OverlaySource::Local => "local",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone)]
pub struct PlacementOverlay {
    pub source: OverlaySource,
    pub entries: Vec<PlacementEntry>,
}

impl PlacementOverlay {
    pub fn new(source: OverlaySource, entries: Vec<PlacementEntry>) -> Self {
        Self { source, entries }
    }
}

/// What `set` does with an id the registry has never seen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownFragmentPolicy {
    #[default]
    Reject,
    Insert,
}

/// Fold `overlays` over `baseline` in order.
///
/// Overlays only ever change the location of ids already in `baseline`;
/// an overlay entry for any other id is skipped. Later overlays win.
pub fn merge_overlays(baseline: &PlacementMap, overlays: &[PlacementOverlay]) -> PlacementMap {
    let mut merged = baseline.clone();
    for overlay in overlays {
        for entry in &overlay.entries {
            if let Some(location) = merged.0.get_mut(&entry.id) {
                *location = entry.execution_location;
            }
        }
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use ExecutionLocation::{Local, Remote};

    fn baseline() -> PlacementMap {
        vec![
            PlacementEntry::new("cart", Local),
            PlacementEntry::new("search", Remote),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_merge_without_overlays_is_baseline() {
        assert_eq!(merge_overlays(&baseline(), &[]), baseline());
    }

    #[test]
    fn test_later_overlay_wins() {
        let overlays = vec![
            PlacementOverlay::new(OverlaySource::Persisted, vec![PlacementEntry::new("cart", Remote)]),
            PlacementOverlay::new(OverlaySource::Remote, vec![PlacementEntry::new("cart", Local)]),
        ];

        let merged = merge_overlays(&baseline(), &overlays);

        assert_eq!(merged.get("cart"), Some(Local));
        assert_eq!(merged.get("search"), Some(Remote));
    }

    #[test]
    fn test_overlay_never_creates_keys() {
        let overlays = vec![PlacementOverlay::new(
            OverlaySource::Remote,
            vec![PlacementEntry::new("checkout", Remote)],
        )];

        let merged = merge_overlays(&baseline(), &overlays);

        assert_eq!(merged.len(), 2);
        assert!(!merged.contains_key("checkout"));
    }

    #[test]
    fn test_to_entries_sorted_by_id() {
        let ids: Vec<String> = baseline().to_entries().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["cart".to_string(), "search".to_string()]);
    }

    #[test]
    fn test_unknown_fragment_policy_deserializes_lowercase() {
        let policy: UnknownFragmentPolicy = serde_yaml::from_str("insert").unwrap();
        assert_eq!(policy, UnknownFragmentPolicy::Insert);
        assert_eq!(UnknownFragmentPolicy::default(), UnknownFragmentPolicy::Reject);
    }
}
