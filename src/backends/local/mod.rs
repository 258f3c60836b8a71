// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod executor;

pub use executor::LocalFragmentExecutor;
