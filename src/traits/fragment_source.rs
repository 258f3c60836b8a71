// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use async_trait::async_trait;

use crate::backends::wasm::WasmResult;

/// Where compiled fragment modules come from.
#[async_trait]
pub trait FragmentSource: Send + Sync {
    async fn fetch(&self, fragment_id: &str) -> WasmResult<Vec<u8>>;

    /// Human readable origin of a fragment, for logs.
    fn describe(&self, fragment_id: &str) -> String;
}
