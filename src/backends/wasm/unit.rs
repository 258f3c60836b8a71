// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! One execution unit per worker slot.
//!
//! Every call gets a fresh `Store` and instance, so nothing a fragment writes
//! to its linear memory survives into the next call. Memory allocated through
//! `alloc` is never freed; the whole instance is dropped instead.

use crate::backends::wasm::calling_convention::{
    decode_value, encode_arguments, read_length_prefix, LENGTH_PREFIX_SIZE,
};
use crate::backends::wasm::error::{WasmError, WasmResult};
use crate::backends::wasm::fragment::{Fragment, ALLOC_EXPORT, ENTRY_POINT_PREFIX, MEMORY_EXPORT};
use serde_json::Value;
use wasmtime::{Instance, Memory, Store};

#[derive(Debug, Clone)]
pub struct ExecutionUnit {
    fuel: u64,
    executions: u64,
}

impl ExecutionUnit {
    pub fn new(fuel: u64) -> Self {
        Self {
            fuel,
            executions: 0,
        }
    }

    pub fn fuel(&self) -> u64 {
        self.fuel
    }

    /// Number of calls this unit has run, successful or not.
    pub fn executions(&self) -> u64 {
        self.executions
    }

    pub fn execute(
        &mut self,
        fragment: &Fragment,
        function_name: &str,
        parameters: &[Value],
    ) -> WasmResult<Value> {
        self.executions += 1;

        let arguments = encode_arguments(parameters)?;
        let argument_len = i32::try_from(arguments.len()).map_err(|_| {
            WasmError::ValidationError(format!(
                "argument buffer of {} bytes exceeds the 32-bit address space",
                arguments.len()
            ))
        })?;
        let parameter_count = i32::try_from(parameters.len()).map_err(|_| {
            WasmError::ValidationError(format!("{} parameters is too many", parameters.len()))
        })?;

        let mut store = Store::new(fragment.module().engine(), ());
        store.set_fuel(self.fuel)?;

        let instance = Instance::new(&mut store, fragment.module(), &[])?;

        let memory = instance
            .get_memory(&mut store, MEMORY_EXPORT)
            .ok_or_else(|| WasmError::MissingExport(MEMORY_EXPORT.to_string()))?;

        let alloc = instance
            .get_typed_func::<i32, i32>(&mut store, ALLOC_EXPORT)
            .map_err(|_| {
                WasmError::MissingExport(format!("{} with signature (i32) -> i32", ALLOC_EXPORT))
            })?;

        let export_name = format!("{}{}", ENTRY_POINT_PREFIX, function_name);
        let entry_point = instance
            .get_typed_func::<(i32, i32), i32>(&mut store, &export_name)
            .map_err(|_| {
                WasmError::MissingExport(format!(
                    "{} with signature (i32, i32) -> i32",
                    export_name
                ))
            })?;

        let argument_ptr = alloc.call(&mut store, argument_len)?;
        memory
            .write(&mut store, address(argument_ptr), &arguments)
            .map_err(|e| WasmError::OutOfBounds(format!("writing arguments: {}", e)))?;

        let result_ptr = entry_point.call(&mut store, (argument_ptr, parameter_count))?;

        let payload = read_result(&memory, &store, address(result_ptr))?;
        decode_value(&payload)
    }
}

/// Guest pointers are unsigned 32-bit offsets.
fn address(ptr: i32) -> usize {
    ptr as u32 as usize
}

fn read_result(memory: &Memory, store: &Store<()>, offset: usize) -> WasmResult<Vec<u8>> {
    let data = memory.data(store);
    let length = read_length_prefix(data, offset)?;
    let start = offset + LENGTH_PREFIX_SIZE;
    data.get(start..start + length)
        .map(<[u8]>::to_vec)
        .ok_or_else(|| {
            WasmError::OutOfBounds(format!(
                "result of {} bytes at offset {} exceeds memory of {} bytes",
                length,
                start,
                data.len()
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::wasm::loader::create_engine;
    use crate::backends::wasm::test_fixtures::fixture_module;
    use serde_json::json;

    fn fixture() -> Fragment {
        let engine = create_engine().unwrap();
        Fragment::compile(&engine, "fixture", &fixture_module()).unwrap()
    }

    #[test]
    fn test_echo_returns_first_parameter() {
        let fragment = fixture();
        let mut unit = ExecutionUnit::new(1_000_000);

        let result = unit
            .execute(&fragment, "echo", &[json!({"item": "apple"}), json!(2)])
            .unwrap();

        assert_eq!(result, json!({"item": "apple"}));
        assert_eq!(unit.executions(), 1);
    }

    #[test]
    fn test_result_read_from_returned_pointer() {
        let fragment = fixture();
        let mut unit = ExecutionUnit::new(1_000_000);

        assert_eq!(unit.execute(&fragment, "answer", &[]).unwrap(), json!("42"));
    }

    #[test]
    fn test_parameter_count_passed_to_entry_point() {
        let fragment = fixture();
        let mut unit = ExecutionUnit::new(1_000_000);

        let result = unit
            .execute(&fragment, "count", &[json!(1), json!("two"), json!(null)])
            .unwrap();

        assert_eq!(result, json!(3));
    }

    #[test]
    fn test_trap_surfaces_as_execution_error() {
        let fragment = fixture();
        let mut unit = ExecutionUnit::new(1_000_000);

        let result = unit.execute(&fragment, "fail", &[]);

        assert!(matches!(result, Err(WasmError::ExecutionError(_))));
    }

    #[test]
    fn test_fuel_exhaustion_stops_runaway_fragment() {
        let fragment = fixture();
        let mut unit = ExecutionUnit::new(10_000);

        let result = unit.execute(&fragment, "spin", &[]);

        assert!(matches!(result, Err(WasmError::ExecutionError(_))));
    }

    #[test]
    fn test_unknown_entry_point() {
        let fragment = fixture();
        let mut unit = ExecutionUnit::new(1_000_000);

        let result = unit.execute(&fragment, "checkout", &[]);

        match result {
            Err(WasmError::MissingExport(msg)) => assert!(msg.contains("execute__checkout")),
            other => panic!("expected MissingExport, got {:?}", other),
        }
    }

    #[test]
    fn test_calls_do_not_share_memory() {
        let fragment = fixture();
        let mut unit = ExecutionUnit::new(1_000_000);

        let first = unit.execute(&fragment, "echo", &[json!("first")]).unwrap();
        let second = unit.execute(&fragment, "echo", &[json!("second")]).unwrap();

        assert_eq!(first, json!("first"));
        assert_eq!(second, json!("second"));
        assert_eq!(unit.executions(), 2);
    }
}
