// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

/// Default fuel level for WASM execution (100 million instructions)
pub const DEFAULT_FUEL_LEVEL: u64 = 100_000_000;
/// Minimum allowed fuel level (1 million instructions)
pub const MIN_FUEL_LEVEL: u64 = 1_000_000;
/// Maximum allowed fuel level (500 million instructions) - security limit
pub const MAX_FUEL_LEVEL: u64 = 500_000_000;

pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: u32 = 3;
pub const DEFAULT_RECONNECT_DELAY_SECONDS: u64 = 5;
pub const DEFAULT_COUNTDOWN_TICK_MILLIS: u64 = 1_000;

pub const DEFAULT_CREDENTIALS_FILE: &str = ".distributor-auth.json";
pub const DEFAULT_FRAGMENTS_DIRECTORY: &str = "fragments";
pub const DEFAULT_MANIFEST: &str = "fragments/executable_fragments.json";
pub const DEFAULT_PLACEMENT_STATE: &str = ".placement-state.json";

/// Environment variable the CLI reads to locate the config file.
pub const CONFIG_PATH_ENV: &str = "DISTRIBUTOR_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "distributor.yaml";
