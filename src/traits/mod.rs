// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod connector;
pub mod fragment_executor;
pub mod fragment_source;

pub use connector::{Channel, Connector};
pub use fragment_executor::FragmentExecutor;
pub use fragment_source::FragmentSource;
