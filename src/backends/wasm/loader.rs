// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Fragment module fetching and engine setup
//!
//! This module handles getting WASM binaries into memory and performing basic
//! size validation. It does not parse or analyze the binary format - that's
//! the responsibility of the detector module.

use crate::backends::wasm::error::{WasmError, WasmResult};
use crate::observability::messages::wasm::ModuleLoaded;
use crate::traits::FragmentSource;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use wasmtime::{Config, Engine};

/// Maximum allowed size for WASM binaries (16 MB)
pub const MAX_WASM_SIZE: usize = 16 * 1024 * 1024;

/// Create the wasmtime engine shared by every fragment.
///
/// Fuel consumption is enabled so each execution can be bounded.
pub fn create_engine() -> WasmResult<Engine> {
    let mut config = Config::new();

    config.wasm_multi_memory(false);
    config.wasm_memory64(false);
    config.consume_fuel(true);
    config.epoch_interruption(false);

    Engine::new(&config).map_err(|e| WasmError::EngineError(e.to_string()))
}

/// Reject binaries over [`MAX_WASM_SIZE`].
pub fn check_size(fragment_id: &str, bytes: &[u8]) -> WasmResult<()> {
    if bytes.len() > MAX_WASM_SIZE {
        return Err(WasmError::ValidationError(format!(
            "WASM file for '{}' too large: {} bytes (max: {} bytes)",
            fragment_id,
            bytes.len(),
            MAX_WASM_SIZE
        )));
    }
    Ok(())
}

/// Reads WASM bytes from a file and validates the size
pub async fn load_wasm_bytes<P: AsRef<Path>>(fragment_id: &str, path: P) -> WasmResult<Vec<u8>> {
    let path = path.as_ref();
    let bytes = tokio::fs::read(path).await?;

    check_size(fragment_id, &bytes)?;

    tracing::info!(
        "{}",
        ModuleLoaded {
            fragment_id,
            origin: &path.display().to_string(),
            size_bytes: bytes.len(),
        }
    );

    Ok(bytes)
}

/// Modules stored as `<directory>/<fragment_id>.wasm`.
#[derive(Debug, Clone)]
pub struct DirectoryFragmentSource {
    directory: PathBuf,
}

impl DirectoryFragmentSource {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// File path for a fragment. Ids that could escape the directory are refused.
    pub fn module_path(&self, fragment_id: &str) -> WasmResult<PathBuf> {
        if fragment_id.is_empty()
            || fragment_id.contains('/')
            || fragment_id.contains('\\')
            || fragment_id.contains("..")
        {
            return Err(WasmError::InvalidFragmentId(fragment_id.to_string()));
        }
        Ok(self.directory.join(format!("{}.wasm", fragment_id)))
    }
}

#[async_trait]
impl FragmentSource for DirectoryFragmentSource {
    async fn fetch(&self, fragment_id: &str) -> WasmResult<Vec<u8>> {
        let path = self.module_path(fragment_id)?;
        load_wasm_bytes(fragment_id, path).await
    }

    fn describe(&self, fragment_id: &str) -> String {
        match self.module_path(fragment_id) {
            Ok(path) => path.display().to_string(),
            Err(_) => format!("{} (invalid id)", self.directory.display()),
        }
    }
}

/// Modules held in memory, keyed by fragment id.
#[derive(Debug, Clone, Default)]
pub struct InMemoryFragmentSource {
    modules: HashMap<String, Vec<u8>>,
}

impl InMemoryFragmentSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_module(mut self, fragment_id: impl Into<String>, bytes: Vec<u8>) -> Self {
        self.modules.insert(fragment_id.into(), bytes);
        self
    }

    pub fn insert(&mut self, fragment_id: impl Into<String>, bytes: Vec<u8>) {
        self.modules.insert(fragment_id.into(), bytes);
    }
}

#[async_trait]
impl FragmentSource for InMemoryFragmentSource {
    async fn fetch(&self, fragment_id: &str) -> WasmResult<Vec<u8>> {
        let bytes = self
            .modules
            .get(fragment_id)
            .cloned()
            .ok_or_else(|| WasmError::ModuleNotFound(fragment_id.to_string()))?;
        check_size(fragment_id, &bytes)?;
        Ok(bytes)
    }

    fn describe(&self, fragment_id: &str) -> String {
        format!("memory:{}", fragment_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::{NamedTempFile, TempDir};

    #[test]
    fn test_create_engine() {
        assert!(create_engine().is_ok());
    }

    #[tokio::test]
    async fn test_load_small_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let test_data = b"test wasm data";
        temp_file.write_all(test_data).unwrap();

        let result = load_wasm_bytes("small", temp_file.path()).await;
        assert_eq!(result.unwrap(), test_data);
    }

    #[tokio::test]
    async fn test_file_too_large() {
        let mut temp_file = NamedTempFile::new().unwrap();
        let large_data = vec![0u8; MAX_WASM_SIZE + 1];
        temp_file.write_all(&large_data).unwrap();

        let result = load_wasm_bytes("large", temp_file.path()).await;

        if let Err(WasmError::ValidationError(msg)) = result {
            assert!(msg.contains("too large"));
            assert!(msg.contains(&format!("{}", MAX_WASM_SIZE + 1)));
        } else {
            panic!("Expected ValidationError for oversized file");
        }
    }

    #[tokio::test]
    async fn test_nonexistent_file() {
        let result = load_wasm_bytes("missing", "/nonexistent/path/to/file.wasm").await;
        assert!(matches!(result, Err(WasmError::IoError(_))));
    }

    #[tokio::test]
    async fn test_directory_source_reads_id_dot_wasm() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("cart.wasm"), b"\0asm").unwrap();
        let source = DirectoryFragmentSource::new(dir.path());

        assert_eq!(source.fetch("cart").await.unwrap(), b"\0asm");
        assert!(source.describe("cart").ends_with("cart.wasm"));
    }

    #[tokio::test]
    async fn test_directory_source_rejects_path_traversal() {
        let source = DirectoryFragmentSource::new("fragments");

        for id in ["../secret", "nested/cart", ""] {
            let result = source.fetch(id).await;
            assert!(matches!(result, Err(WasmError::InvalidFragmentId(_))), "id {:?}", id);
        }
    }

    #[tokio::test]
    async fn test_in_memory_source() {
        let source = InMemoryFragmentSource::new().with_module("f1", vec![1, 2, 3]);

        assert_eq!(source.fetch("f1").await.unwrap(), vec![1, 2, 3]);
        assert!(matches!(
            source.fetch("f2").await,
            Err(WasmError::ModuleNotFound(_))
        ));
    }
}
