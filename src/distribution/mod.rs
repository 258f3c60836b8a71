// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! # Distribution Manager
//!
//! The entry point callers use: `execute(fragment_id, function_name, parameters)`
//! and `update_placement(fragment_id, location)`.
//!
//! ```text
//! caller ──► DistributionManager ──► PlacementRegistry::get
//!                    │
//!        ┌───────────┴─────────────┐
//!   Local, or Remote            Remote and
//!   while disconnected          Connected
//!        ▼                         ▼
//! LocalFragmentExecutor     RemoteFragmentExecutor
//! ```

mod manager;
mod result;


pub use manager::DistributionManager;
pub use result::normalize_result;
