// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Errors raised while loading the distributor configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The file was read but is not valid YAML for `Config`.
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// Parsed values are out of range or inconsistent.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
