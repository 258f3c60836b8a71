// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for fragment module loading and local execution events.
//!
//! This module contains message types for logging events related to:
//! * Fragment module fetching and size validation
//! * Module compilation and entry point discovery
//! * Local execution lifecycle on worker slots

use std::fmt::{Display, Formatter};

/// Fragment module bytes fetched successfully.
///
/// # Log Level
/// `info!` - Important operational event
///
/// # Example
/// ```
/// use fragment_distributor::observability::messages::wasm::ModuleLoaded;
///
/// let msg = ModuleLoaded {
///     fragment_id: "shopping_cart",
///     origin: "fragments/shopping_cart.wasm",
///     size_bytes: 4096,
/// };
///
/// tracing::info!("{}", msg);
/// ```
pub struct ModuleLoaded<'a> {
    pub fragment_id: &'a str,
    pub origin: &'a str,
    pub size_bytes: usize,
}

impl Display for ModuleLoaded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Loaded module for fragment '{}' from {} ({} bytes)",
            self.fragment_id, self.origin, self.size_bytes
        )
    }
}

/// Fragment module loading failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
///
/// # Example
/// ```
/// use fragment_distributor::observability::messages::wasm::ModuleLoadFailed;
///
/// let error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
/// let msg = ModuleLoadFailed {
///     fragment_id: "missing",
///     error: &error,
/// };
///
/// tracing::error!("{}", msg);
/// ```
pub struct ModuleLoadFailed<'a> {
    pub fragment_id: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ModuleLoadFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Failed to load module for fragment '{}': {}",
            self.fragment_id, self.error
        )
    }
}

/// Fragment compiled and its entry points discovered.
///
/// # Log Level
/// `debug!`
pub struct FragmentCompiled<'a> {
    pub fragment_id: &'a str,
    pub entry_points: &'a [String],
}

impl Display for FragmentCompiled<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Compiled fragment '{}' with entry points [{}]",
            self.fragment_id,
            self.entry_points.join(", ")
        )
    }
}

/// Local execution started on a worker slot.
///
/// # Log Level
/// `debug!` - Emitted once per call
pub struct ExecutionStarted<'a> {
    pub fragment_id: &'a str,
    pub function_name: &'a str,
    pub slot: usize,
    pub parameter_count: usize,
}

impl Display for ExecutionStarted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Executing '{}::{}' on slot {} with {} parameters",
            self.fragment_id, self.function_name, self.slot, self.parameter_count
        )
    }
}

pub struct ExecutionCompleted<'a> {
    pub fragment_id: &'a str,
    pub function_name: &'a str,
    pub slot: usize,
}

impl Display for ExecutionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Execution of '{}::{}' on slot {} succeeded",
            self.fragment_id, self.function_name, self.slot
        )
    }
}

/// Local execution failed.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ExecutionFailed<'a> {
    pub fragment_id: &'a str,
    pub function_name: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ExecutionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Execution of '{}::{}' failed: {}",
            self.fragment_id, self.function_name, self.error
        )
    }
}
