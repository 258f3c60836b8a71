// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod worker_pool;

pub use worker_pool::{default_capacity, PoolError, WorkerPool, WorkerSlot};
