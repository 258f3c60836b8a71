// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde_json::Value;

use crate::errors::{DistributionError, DistributionResult};

/// Fragments hand back JSON text. A string result is parsed as JSON; any
/// other value is already structured and passes through.
pub fn normalize_result(value: Value) -> DistributionResult<Value> {
    match value {
        Value::String(text) => serde_json::from_str(&text)
            .map_err(|e| DistributionError::MalformedResult(format!("{} in {:?}", e, text))),
        other => Ok(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_text_is_parsed() {
        assert_eq!(normalize_result(json!("42")).unwrap(), json!(42));
        assert_eq!(
            normalize_result(json!(r#"{"total": 3}"#)).unwrap(),
            json!({"total": 3})
        );
    }

    #[test]
    fn test_structured_value_passes_through() {
        assert_eq!(normalize_result(json!({"a": 1})).unwrap(), json!({"a": 1}));
        assert_eq!(normalize_result(Value::Null).unwrap(), Value::Null);
    }

    #[test]
    fn test_non_json_text_is_malformed() {
        assert!(matches!(
            normalize_result(json!("not json")),
            Err(DistributionError::MalformedResult(_))
        ));
    }
}
