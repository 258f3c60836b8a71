// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Where a fragment currently executes.
///
/// Older manifests and peers use `Client`/`Server`; both are accepted on input,
/// output is always `Local`/`Remote`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExecutionLocation {
    #[serde(alias = "Client")]
    Local,
    #[serde(alias = "Server")]
    Remote,
}

impl ExecutionLocation {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionLocation::Local => "Local",
            ExecutionLocation::Remote => "Remote",
        }
    }
}

impl Display for ExecutionLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecutionLocation {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "local" | "client" => Ok(ExecutionLocation::Local),
            "remote" | "server" => Ok(ExecutionLocation::Remote),
            other => Err(format!(
                "unknown execution location '{}', expected Local or Remote",
                other
            )),
        }
    }
}
