// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;     // local wasm + remote peer backends
pub mod config;       // config + runtime builder
pub mod distribution; // call routing
pub mod engine;       // worker pool
pub mod errors;       // error handling
pub mod observability;
pub mod registry;     // fragment placement
pub mod traits;       // unified abstractions
