// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! WASM binary encoding detection
//!
//! Fragments must be classic core modules. This module uses wasmparser to read
//! the version header and reject Component Model binaries before compilation.

use crate::backends::wasm::error::{WasmError, WasmResult, WASM_UNSUPPORTED_ENCODING};

use wasmparser::{Encoding, Parser, Payload};

/// Verify that `bytes` is a core WASM module.
///
/// # Errors
/// Returns an error if:
/// - The input is empty, truncated, or otherwise not valid WebAssembly
/// - The binary is a Component Model component
/// - A legacy Preview 1 component (core module with a "component" custom section) is detected
pub fn ensure_core_module(bytes: &[u8]) -> WasmResult<()> {
    let parser = Parser::new(0);
    let mut encoding = None;
    let mut has_component_section = false;

    for payload in parser.parse_all(bytes) {
        match payload? {
            Payload::Version { encoding: enc, .. } => {
                encoding = Some(enc);
                if matches!(enc, Encoding::Component) {
                    break;
                }
            }
            Payload::CustomSection(reader) if reader.name() == "component" => {
                has_component_section = true;
            }
            _ => {}
        }
    }

    let encoding =
        encoding.ok_or_else(|| WasmError::InvalidWasmBinary("Invalid WASM binary".to_string()))?;

    match encoding {
        Encoding::Component => Err(WasmError::UnsupportedEncoding(
            WASM_UNSUPPORTED_ENCODING.to_string(),
        )),
        Encoding::Module if has_component_section => Err(WasmError::UnsupportedEncoding(
            WASM_UNSUPPORTED_ENCODING.to_string(),
        )),
        Encoding::Module => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input() {
        let empty: &[u8] = &[];
        assert!(ensure_core_module(empty).is_err());
    }

    #[test]
    fn test_invalid_input() {
        let bad = b"\x00\x00\x00\x00\x00\x00\x00\x00";
        assert!(ensure_core_module(bad).is_err());
    }

    #[test]
    fn test_core_module_accepted() {
        let bytes = wat::parse_str("(module (memory (export \"memory\") 1))").unwrap();
        assert!(ensure_core_module(&bytes).is_ok());
    }

    #[test]
    fn test_component_rejected() {
        let bytes = wat::parse_str("(component)").unwrap();
        let result = ensure_core_module(&bytes);
        assert!(matches!(result, Err(WasmError::UnsupportedEncoding(_))));
    }
}
