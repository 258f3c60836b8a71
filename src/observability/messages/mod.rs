// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements `Display` for human-readable output. Types
//! that carry identifiers worth filtering on also implement [`StructuredLog`],
//! which emits the same text with the identifiers attached as `tracing` fields.
//!
//! # Usage Pattern
//!
//! ```rust
//! use fragment_distributor::observability::messages::StructuredLog;
//! use fragment_distributor::observability::messages::distribution::RoutingDecision;
//!
//! let msg = RoutingDecision {
//!     fragment_id: "f1",
//!     function_name: "sum",
//!     location: "Local",
//! };
//!
//! msg.log();
//! ```

pub mod connection;
pub mod distribution;
pub mod pool;
pub mod registry;
pub mod wasm;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog: std::fmt::Display {
    fn log(&self);
}
