// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Execution backends for fragment calls.
//!
//! Both backends implement [`FragmentExecutor`](crate::traits::FragmentExecutor),
//! so the distribution manager routes a call without knowing how it runs.
//!
//! # Available Backends
//!
//! ## Local Backend
//! Sandboxed WebAssembly execution on a bounded worker pool:
//! - **Core modules only**: linear-memory calling convention with MessagePack blocks
//! - **Isolation**: fresh store and instance per call, fuel-limited
//! - **Use Case**: fragments placed `Local`, and availability fallback for `Remote`
//!
//! ## Remote Backend
//! One persistent WebSocket connection to the peer:
//! - **Correlation**: UUID v4 `message_id` per request, out-of-order responses
//! - **Placement sync**: inbound `UpdateFragments` frames update the registry
//! - **Resilience**: bounded reconnection with an observable countdown
//!
//! # Architecture
//!
//! ```text
//! DistributionManager ─┬─► LocalFragmentExecutor ──► WorkerPool ──► ExecutionUnit (wasmtime)
//!                      └─► RemoteFragmentExecutor ──► ConnectionClient ──► Connector (WebSocket)
//! ```

pub mod local;
pub mod remote;
pub mod wasm;
