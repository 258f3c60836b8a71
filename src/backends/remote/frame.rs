// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! JSON text frames exchanged with the remote peer.
//!
//! ```json
//! { "message_id": "9f0c...", "message_type": "ExecuteFunction", "data": { ... } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{DistributionError, DistributionResult};
use crate::registry::{ExecutionLocation, PlacementEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageType {
    ExecuteFunction,
    WasmResult,
    UpdateFragments,
}

impl MessageType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageType::ExecuteFunction => "ExecuteFunction",
            MessageType::WasmResult => "WasmResult",
            MessageType::UpdateFragments => "UpdateFragments",
        }
    }

    /// Frame types that answer an earlier request. Older peers echo
    /// `ExecuteFunction` instead of replying with `WasmResult`.
    pub fn is_response(&self) -> bool {
        matches!(self, MessageType::WasmResult | MessageType::ExecuteFunction)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Frame {
    pub message_id: String,
    pub message_type: MessageType,
    #[serde(default)]
    pub data: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Frame {
    pub fn new(message_id: impl Into<String>, message_type: MessageType, data: Value) -> Self {
        Self {
            message_id: message_id.into(),
            message_type,
            data,
            error: None,
        }
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn encode(&self) -> DistributionResult<String> {
        serde_json::to_string(self).map_err(|e| DistributionError::Transport(e.to_string()))
    }

    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

/// `data` of an `ExecuteFunction` request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecuteFunctionRequest {
    pub fragment_id: String,
    pub function_name: String,
    #[serde(default)]
    pub parameters: Vec<Value>,
}

/// One element of an `UpdateFragments` payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentPlacement {
    pub fragment_id: String,
    pub execution_location: ExecutionLocation,
}

impl From<FragmentPlacement> for PlacementEntry {
    fn from(placement: FragmentPlacement) -> Self {
        PlacementEntry::new(placement.fragment_id, placement.execution_location)
    }
}

impl From<PlacementEntry> for FragmentPlacement {
    fn from(entry: PlacementEntry) -> Self {
        Self {
            fragment_id: entry.id,
            execution_location: entry.execution_location,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_frame_wire_shape() {
        let frame = Frame::new(
            "abc",
            MessageType::ExecuteFunction,
            json!({"fragment_id": "f2", "function_name": "sum", "parameters": [1, 2]}),
        );

        let wire: Value = serde_json::from_str(&frame.encode().unwrap()).unwrap();

        assert_eq!(
            wire,
            json!({
                "message_id": "abc",
                "message_type": "ExecuteFunction",
                "data": {"fragment_id": "f2", "function_name": "sum", "parameters": [1, 2]}
            })
        );
    }

    #[test]
    fn test_decode_with_error_field() {
        let frame = Frame::decode(
            r#"{"message_id": "x", "message_type": "WasmResult", "data": null, "error": "trap"}"#,
        )
        .unwrap();

        assert_eq!(frame.error.as_deref(), Some("trap"));
        assert!(frame.message_type.is_response());
    }

    #[test]
    fn test_unknown_message_type_fails_to_decode() {
        let result = Frame::decode(r#"{"message_id": "x", "message_type": "Ping", "data": {}}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_update_payload_accepts_legacy_locations() {
        let placements: Vec<FragmentPlacement> = serde_json::from_value(json!([
            {"fragment_id": "f1", "execution_location": "Server"}
        ]))
        .unwrap();

        let entry: PlacementEntry = placements[0].clone().into();

        assert_eq!(entry, PlacementEntry::new("f1", ExecutionLocation::Remote));
        assert!(!MessageType::UpdateFragments.is_response());
    }
}
