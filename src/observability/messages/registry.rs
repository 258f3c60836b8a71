// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for the placement registry and its persistence.

use std::fmt::{Display, Formatter};

/// Baseline manifest loaded.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ManifestLoaded<'a> {
    pub origin: &'a str,
    pub fragment_count: usize,
}

impl Display for ManifestLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded fragment manifest '{}': {} fragments",
            self.origin, self.fragment_count
        )
    }
}

/// A manifest listed the same id more than once; the later entry wins.
pub struct DuplicateManifestEntry<'a> {
    pub fragment_id: &'a str,
}

impl Display for DuplicateManifestEntry<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Fragment '{}' listed more than once in manifest, keeping last entry",
            self.fragment_id
        )
    }
}

/// Placement for a single fragment changed.
///
/// # Log Level
/// `info!` - Important operational event
pub struct PlacementUpdated<'a> {
    pub fragment_id: &'a str,
    pub location: &'a str,
    pub source: &'a str,
}

impl Display for PlacementUpdated<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Fragment '{}' now executes {} (source: {})",
            self.fragment_id, self.location, self.source
        )
    }
}

/// An overlay named a fragment that is not in the registry.
///
/// # Log Level
/// `debug!` - Expected when peers know about more fragments than we do
pub struct UnknownFragmentIgnored<'a> {
    pub fragment_id: &'a str,
    pub source: &'a str,
}

impl Display for UnknownFragmentIgnored<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring {} placement for unknown fragment '{}'",
            self.source, self.fragment_id
        )
    }
}

pub struct OverlayApplied<'a> {
    pub source: &'a str,
    pub applied: usize,
    pub offered: usize,
}

impl Display for OverlayApplied<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Applied {} placement overlay: {}/{} entries matched known fragments",
            self.source, self.applied, self.offered
        )
    }
}

pub struct PlacementPersisted<'a> {
    pub path: &'a str,
    pub fragment_count: usize,
}

impl Display for PlacementPersisted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Persisted {} placements to '{}'",
            self.fragment_count, self.path
        )
    }
}

/// Persisted placement state exists but could not be used.
///
/// # Log Level
/// `warn!` - Startup continues from the manifest baseline
pub struct PersistedStateUnreadable<'a> {
    pub path: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for PersistedStateUnreadable<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Ignoring unreadable placement state '{}': {}",
            self.path, self.error
        )
    }
}
