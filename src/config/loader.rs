// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::remote::{ClientConfig, PendingCallPolicy, ReconnectPolicy};
use crate::config::consts::{
    DEFAULT_COUNTDOWN_TICK_MILLIS, DEFAULT_CREDENTIALS_FILE, DEFAULT_FRAGMENTS_DIRECTORY,
    DEFAULT_FUEL_LEVEL, DEFAULT_MANIFEST, DEFAULT_MAX_RECONNECT_ATTEMPTS, DEFAULT_PLACEMENT_STATE,
    DEFAULT_RECONNECT_DELAY_SECONDS, MAX_FUEL_LEVEL, MIN_FUEL_LEVEL,
};
use crate::engine::default_capacity;
use crate::errors::ConfigError;
use crate::registry::UnknownFragmentPolicy;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure for the fragment distributor.
///
/// Only `connection.endpoint` is required; every other section falls back
/// to its defaults.
///
/// # Example
/// ```yaml
/// connection:
///   endpoint: "ws://localhost:51335/ws"
///   api_endpoint: "http://localhost:51335/api/"
///   max_reconnect_attempts: 3
///   reconnect_delay_seconds: 5
/// fragments:
///   directory: "fragments"
///   manifest: "fragments/executable_fragments.json"
/// pool:
///   capacity: 4
/// wasm:
///   fuel:
///     default: 100000000
/// ```
#[derive(Debug, Deserialize)]
pub struct Config {
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub fragments: FragmentsConfig,
    #[serde(default)]
    pub pool: PoolConfig,
    #[serde(default)]
    pub wasm: WasmConfig,
}

/// Remote peer connection and credential settings.
#[derive(Debug, Deserialize)]
pub struct ConnectionConfig {
    /// WebSocket endpoint of the peer.
    pub endpoint: String,
    /// Base URL of the HTTP API used for the token exchange. Must end with `/`.
    pub api_endpoint: Option<String>,
    pub api_key: Option<String>,
    /// Static token. When set no HTTP exchange is made.
    pub auth_token: Option<String>,
    #[serde(default = "default_credentials_file")]
    pub credentials_file: PathBuf,
    #[serde(default = "default_max_reconnect_attempts")]
    pub max_reconnect_attempts: u32,
    #[serde(default = "default_reconnect_delay_seconds")]
    pub reconnect_delay_seconds: u64,
    #[serde(default = "default_countdown_tick_millis")]
    pub countdown_tick_millis: u64,
    pub request_timeout_seconds: Option<u64>,
    #[serde(default)]
    pub pending_calls_on_close: PendingCallPolicy,
}

impl ConnectionConfig {
    pub fn reconnect_policy(&self) -> ReconnectPolicy {
        ReconnectPolicy::new(
            self.max_reconnect_attempts,
            Duration::from_secs(self.reconnect_delay_seconds),
            Duration::from_millis(self.countdown_tick_millis),
        )
    }

    pub fn client_config(&self) -> ClientConfig {
        ClientConfig {
            endpoint: self.endpoint.clone(),
            reconnect: self.reconnect_policy(),
            pending_calls: self.pending_calls_on_close,
            request_timeout: self.request_timeout_seconds.map(Duration::from_secs),
        }
    }
}

/// Where fragment modules, the manifest and persisted placements live.
#[derive(Debug, Deserialize)]
pub struct FragmentsConfig {
    #[serde(default = "default_fragments_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_manifest")]
    pub manifest: PathBuf,
    #[serde(default = "default_placement_state")]
    pub placement_state: PathBuf,
    #[serde(default)]
    pub unknown_fragment_policy: UnknownFragmentPolicy,
}

impl Default for FragmentsConfig {
    fn default() -> Self {
        Self {
            directory: default_fragments_directory(),
            manifest: default_manifest(),
            placement_state: default_placement_state(),
            unknown_fragment_policy: UnknownFragmentPolicy::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct PoolConfig {
    pub capacity: Option<usize>,
}

impl PoolConfig {
    /// Configured capacity, or available parallelism. Never below 1.
    pub fn capacity(&self) -> usize {
        self.capacity.unwrap_or_else(default_capacity).max(1)
    }
}

/// WASM-specific configuration options.
///
/// These options control WASM module execution behavior, including resource limits
/// and security constraints. All fields are optional and use sensible defaults.
///
/// # Example
/// ```yaml
/// wasm:
///   fuel:
///     default: 100000000
///     minimum: 1000000
///     maximum: 500000000
/// ```
#[derive(Debug, Default, Deserialize)]
pub struct WasmConfig {
    #[serde(default)]
    pub fuel: FuelConfig,
}

/// Fuel consumption configuration for WASM execution.
///
/// Fuel limits prevent infinite loops and resource exhaustion by limiting the number
/// of instructions a fragment can execute per call.
///
/// # Fields
/// * `default` - Fuel granted to every call (defaults to 100M)
/// * `minimum` - Minimum allowed fuel level (defaults to 1M)
/// * `maximum` - Maximum allowed fuel level (defaults to 500M) - security limit
#[derive(Debug, Default, Deserialize)]
pub struct FuelConfig {
    pub default: Option<u64>,
    pub minimum: Option<u64>,
    pub maximum: Option<u64>,
}

impl FuelConfig {
    /// Get the default fuel level, using built-in default if not configured.
    pub fn get_default(&self) -> u64 {
        self.default.unwrap_or(DEFAULT_FUEL_LEVEL)
    }

    /// Get the minimum fuel level, using built-in default if not configured.
    pub fn get_minimum(&self) -> u64 {
        self.minimum.unwrap_or(MIN_FUEL_LEVEL)
    }

    /// Get the maximum fuel level, using built-in default if not configured.
    pub fn get_maximum(&self) -> u64 {
        self.maximum.unwrap_or(MAX_FUEL_LEVEL)
    }

    /// Validate and clamp a fuel level to configured bounds.
    ///
    /// # Example
    /// ```
    /// use fragment_distributor::config::FuelConfig;
    ///
    /// let config = FuelConfig::default();
    /// let fuel = config.validate_and_clamp(1_000_000_000); // Too high
    /// assert_eq!(fuel, 500_000_000); // Clamped to maximum
    /// ```
    pub fn validate_and_clamp(&self, requested: u64) -> u64 {
        let min = self.get_minimum();
        let max = self.get_maximum();
        if requested < min || requested > max {
            tracing::warn!(
                "Fuel level {} outside [{}, {}], clamping",
                requested,
                min,
                max
            );
        }
        requested.clamp(min, max)
    }

    /// Fuel granted to each call after clamping.
    pub fn effective(&self) -> u64 {
        self.validate_and_clamp(self.get_default())
    }
}

impl Config {
    /// Reject values that parse but cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.connection.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "connection.endpoint must not be empty".to_string(),
            ));
        }
        if self.connection.countdown_tick_millis == 0 {
            return Err(ConfigError::Invalid(
                "connection.countdown_tick_millis must be greater than zero".to_string(),
            ));
        }
        if let Some(api) = &self.connection.api_endpoint {
            if !api.ends_with('/') {
                return Err(ConfigError::Invalid(format!(
                    "connection.api_endpoint '{}' must end with '/'",
                    api
                )));
            }
        }
        if self.wasm.fuel.get_minimum() > self.wasm.fuel.get_maximum() {
            return Err(ConfigError::Invalid(
                "wasm.fuel.minimum exceeds wasm.fuel.maximum".to_string(),
            ));
        }
        Ok(())
    }
}

/// Load and validate a config from a YAML file.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    cfg.validate()?;
    Ok(cfg)
}

fn default_credentials_file() -> PathBuf {
    PathBuf::from(DEFAULT_CREDENTIALS_FILE)
}

fn default_max_reconnect_attempts() -> u32 {
    DEFAULT_MAX_RECONNECT_ATTEMPTS
}

fn default_reconnect_delay_seconds() -> u64 {
    DEFAULT_RECONNECT_DELAY_SECONDS
}

fn default_countdown_tick_millis() -> u64 {
    DEFAULT_COUNTDOWN_TICK_MILLIS
}

fn default_fragments_directory() -> PathBuf {
    PathBuf::from(DEFAULT_FRAGMENTS_DIRECTORY)
}

fn default_manifest() -> PathBuf {
    PathBuf::from(DEFAULT_MANIFEST)
}

fn default_placement_state() -> PathBuf {
    PathBuf::from(DEFAULT_PLACEMENT_STATE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_minimal_config_uses_defaults() {
        let yaml = r#"
connection:
  endpoint: "ws://localhost:51335/ws"
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(cfg.connection.max_reconnect_attempts, 3);
        assert_eq!(cfg.connection.reconnect_delay_seconds, 5);
        assert_eq!(cfg.connection.countdown_tick_millis, 1000);
        assert_eq!(cfg.connection.pending_calls_on_close, PendingCallPolicy::Fail);
        assert_eq!(
            cfg.connection.credentials_file,
            PathBuf::from(".distributor-auth.json")
        );
        assert_eq!(cfg.fragments.directory, PathBuf::from("fragments"));
        assert_eq!(
            cfg.fragments.manifest,
            PathBuf::from("fragments/executable_fragments.json")
        );
        assert_eq!(
            cfg.fragments.unknown_fragment_policy,
            UnknownFragmentPolicy::Reject
        );
        assert!(cfg.pool.capacity() >= 1);
        assert_eq!(cfg.wasm.fuel.get_default(), 100_000_000);
    }

    #[test]
    fn parse_full_config() {
        let yaml = r#"
connection:
  endpoint: "ws://peer:51335/ws"
  api_endpoint: "http://peer:51335/api/"
  api_key: "secret"
  auth_token: "static"
  credentials_file: "/tmp/auth.json"
  max_reconnect_attempts: 7
  reconnect_delay_seconds: 2
  countdown_tick_millis: 250
  request_timeout_seconds: 30
  pending_calls_on_close: abandon
fragments:
  directory: "mods"
  manifest: "mods/manifest.json"
  placement_state: "state.json"
  unknown_fragment_policy: insert
pool:
  capacity: 2
wasm:
  fuel:
    default: 200000000
"#;

        let cfg: Config = serde_yaml::from_str(yaml).unwrap();
        cfg.validate().unwrap();

        assert_eq!(cfg.connection.api_key.as_deref(), Some("secret"));
        assert_eq!(cfg.connection.auth_token.as_deref(), Some("static"));
        assert_eq!(cfg.fragments.unknown_fragment_policy, UnknownFragmentPolicy::Insert);
        assert_eq!(cfg.pool.capacity(), 2);
        assert_eq!(cfg.wasm.fuel.effective(), 200_000_000);

        let client = cfg.connection.client_config();
        assert_eq!(client.endpoint, "ws://peer:51335/ws");
        assert_eq!(client.pending_calls, PendingCallPolicy::Abandon);
        assert_eq!(client.request_timeout, Some(Duration::from_secs(30)));
        assert_eq!(
            client.reconnect,
            ReconnectPolicy::new(7, Duration::from_secs(2), Duration::from_millis(250))
        );
    }

    #[test]
    fn test_missing_endpoint_is_parse_error() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), "fragments:\n  directory: mods\n").unwrap();

        let result = load_config(file.path());

        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();

        let result = load_config(dir.path().join("absent.yaml"));

        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(
            file.path(),
            "connection:\n  endpoint: ws://x\n  api_endpoint: http://x/api\n",
        )
        .unwrap();

        let result = load_config(file.path());

        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_zero_pool_capacity_clamped() {
        let pool = PoolConfig { capacity: Some(0) };
        assert_eq!(pool.capacity(), 1);
    }

    #[test]
    fn test_fuel_config_validate_and_clamp() {
        let config = FuelConfig {
            default: Some(100_000_000),
            minimum: Some(10_000_000),
            maximum: Some(200_000_000),
        };

        // Within bounds - no change
        assert_eq!(config.validate_and_clamp(50_000_000), 50_000_000);

        // Below minimum - clamped to minimum
        assert_eq!(config.validate_and_clamp(1_000_000), 10_000_000);

        // Above maximum - clamped to maximum
        assert_eq!(config.validate_and_clamp(1_000_000_000), 200_000_000);
    }

    #[test]
    fn test_fuel_default_above_maximum_is_clamped() {
        let config = FuelConfig {
            default: Some(900_000_000),
            minimum: None,
            maximum: None,
        };
        assert_eq!(config.effective(), 500_000_000);
    }
}
