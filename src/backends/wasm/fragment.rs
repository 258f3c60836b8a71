// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::backends::wasm::detector::ensure_core_module;
use crate::backends::wasm::error::{WasmError, WasmResult};
use wasmtime::{Engine, ExternType, Module};

/// Export prefix marking a fragment entry point: `execute__<function_name>`.
pub const ENTRY_POINT_PREFIX: &str = "execute__";
pub const MEMORY_EXPORT: &str = "memory";
pub const ALLOC_EXPORT: &str = "alloc";

/// A compiled fragment module. Compiled once, instantiated per call.
#[derive(Debug)]
pub struct Fragment {
    id: String,
    module: Module,
    entry_points: Vec<String>,
}

impl Fragment {
    /// Validate and compile `bytes`, recording every exported entry point.
    ///
    /// The module must export `memory` and an `alloc` function; entry points
    /// are optional at compile time and checked again when called.
    pub fn compile(engine: &Engine, id: &str, bytes: &[u8]) -> WasmResult<Self> {
        ensure_core_module(bytes)?;

        let module = Module::new(engine, bytes).map_err(|e| WasmError::ModuleError(e.to_string()))?;

        let mut has_memory = false;
        let mut has_alloc = false;
        let mut entry_points = Vec::new();
        for export in module.exports() {
            match export.ty() {
                ExternType::Memory(_) if export.name() == MEMORY_EXPORT => has_memory = true,
                ExternType::Func(_) if export.name() == ALLOC_EXPORT => has_alloc = true,
                ExternType::Func(_) => {
                    if let Some(name) = export.name().strip_prefix(ENTRY_POINT_PREFIX) {
                        entry_points.push(name.to_string());
                    }
                }
                _ => {}
            }
        }

        if !has_memory {
            return Err(WasmError::MissingExport(format!(
                "fragment '{}' must export '{}'",
                id, MEMORY_EXPORT
            )));
        }
        if !has_alloc {
            return Err(WasmError::MissingExport(format!(
                "fragment '{}' must export '{}(i32) -> i32'",
                id, ALLOC_EXPORT
            )));
        }

        entry_points.sort();
        Ok(Self {
            id: id.to_string(),
            module,
            entry_points,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn module(&self) -> &Module {
        &self.module
    }

    pub fn entry_points(&self) -> &[String] {
        &self.entry_points
    }

    pub fn has_entry_point(&self, function_name: &str) -> bool {
        self.entry_points.iter().any(|name| name == function_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::wasm::loader::create_engine;
    use crate::backends::wasm::test_fixtures::fixture_module;

    #[test]
    fn test_compile_discovers_entry_points() {
        let engine = create_engine().unwrap();

        let fragment = Fragment::compile(&engine, "fixture", &fixture_module()).unwrap();

        assert_eq!(fragment.id(), "fixture");
        assert_eq!(
            fragment.entry_points(),
            &["answer", "count", "echo", "fail", "spin"]
        );
        assert!(fragment.has_entry_point("echo"));
        assert!(!fragment.has_entry_point("alloc"));
    }

    #[test]
    fn test_compile_requires_alloc() {
        let engine = create_engine().unwrap();
        let bytes = wat::parse_str("(module (memory (export \"memory\") 1))").unwrap();

        let result = Fragment::compile(&engine, "no_alloc", &bytes);

        assert!(matches!(result, Err(WasmError::MissingExport(_))));
    }

    #[test]
    fn test_compile_rejects_garbage() {
        let engine = create_engine().unwrap();
        let result = Fragment::compile(&engine, "garbage", b"not wasm at all");
        assert!(result.is_err());
    }
}
