// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging.
//!
//! Log text for the distributor lives in message structs that implement
//! `Display`, rather than in format strings scattered across call sites:
//!
//! * one place to reword or translate an operational message
//! * consistent output across the registry, pool, executor and connection
//! * messages can be unit tested like any other value
//!
//! # Architecture
//!
//! Messages are organized by subsystem:
//! * `messages::registry` - manifest loading, placement changes, persistence
//! * `messages::pool` - worker pool lifecycle and saturation
//! * `messages::wasm` - fragment module loading and local execution
//! * `messages::connection` - remote channel state machine and frames
//! * `messages::distribution` - per-call routing decisions
//!
//! # Usage
//!
//! ```rust
//! use fragment_distributor::observability::messages::wasm::ModuleLoaded;
//!
//! let msg = ModuleLoaded {
//!     fragment_id: "order_history",
//!     origin: "fragments/order_history.wasm",
//!     size_bytes: 4096,
//! };
//!
//! tracing::info!("{}", msg);
//! ```

pub mod messages;

/// Install the global `tracing` subscriber.
///
/// Honors `RUST_LOG`; falls back to `default_directive` (for example `"info"`)
/// when the variable is unset or invalid. Safe to call more than once; only the
/// first call installs a subscriber.
pub fn init_tracing(default_directive: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}
