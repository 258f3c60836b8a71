// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Sandboxed fragment execution on wasmtime.
//!
//! ```text
//! FragmentSource::fetch ──► detector (core module only) ──► Fragment::compile
//!                                                                   │
//!                         WorkerPool slot ──► ExecutionUnit::execute ◄┘
//! ```

pub mod calling_convention;
pub mod detector;
pub mod error;
pub mod fragment;
pub mod loader;
pub mod unit;

#[cfg(test)]
pub(crate) mod test_fixtures;

pub use error::{WasmError, WasmResult};
pub use fragment::{Fragment, ENTRY_POINT_PREFIX};
pub use loader::{create_engine, DirectoryFragmentSource, InMemoryFragmentSource};
pub use unit::ExecutionUnit;
