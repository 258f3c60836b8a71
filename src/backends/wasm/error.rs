// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Error types for fragment loading and local execution.
//!
//! These errors stay inside the wasm backend. The local executor flattens them
//! into [`DistributionError`](crate::errors::DistributionError) variants before
//! they reach a caller.

use thiserror::Error;

/// Error message for binaries that are not plain core modules.
///
/// Fragments use the linear-memory calling convention, which only exists for
/// core modules. Component Model binaries, including legacy Preview 1 components
/// that carry a "component" custom section, are rejected.
pub const WASM_UNSUPPORTED_ENCODING: &str = "Unsupported WASM binary: Component Model detected. \
Fragments must be compiled as core WASM modules.";

#[derive(Error, Debug)]
pub enum WasmError {
    /// Invalid or malformed WASM binary format.
    #[error("Invalid WASM binary: {0}")]
    InvalidWasmBinary(String),

    /// Binary is valid WASM but not a core module.
    #[error("Unsupported encoding: {0}")]
    UnsupportedEncoding(String),

    /// Module compilation error.
    #[error("WASM module error: {0}")]
    ModuleError(String),

    /// A required export is missing or has the wrong signature.
    #[error("Missing export: {0}")]
    MissingExport(String),

    /// Memory access outside valid bounds.
    #[error("Memory access out of bounds: {0}")]
    OutOfBounds(String),

    /// Argument or length does not fit the 32-bit calling convention.
    #[error("Invalid input: {0}")]
    ValidationError(String),

    /// Fragment id cannot be mapped to a module file.
    #[error("Invalid fragment id '{0}'")]
    InvalidFragmentId(String),

    #[error("No module available for fragment '{0}'")]
    ModuleNotFound(String),

    /// Wasmtime engine creation or configuration error.
    #[error("Engine creation error: {0}")]
    EngineError(String),

    /// File I/O error during module loading.
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Wasmtime runtime execution error (traps, fuel exhaustion).
    #[error("WASM execution error: {0}")]
    ExecutionError(#[from] wasmtime::Error),

    #[error("Failed to encode parameter: {0}")]
    Encoding(#[from] rmp_serde::encode::Error),

    #[error("Failed to decode fragment output: {0}")]
    Decoding(#[from] rmp_serde::decode::Error),

    /// WASM binary parsing error from wasmparser.
    #[error("WASM parser error: {0}")]
    ParserError(#[from] wasmparser::BinaryReaderError),
}

pub type WasmResult<T> = Result<T, WasmError>;
