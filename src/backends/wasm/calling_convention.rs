// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Linear-memory calling convention shared with fragment modules.
//!
//! ```text
//! argument buffer:  [pad to 4][u32 LE len][msgpack param 0][pad to 4][u32 LE len][msgpack param 1]...
//! result:           [u32 LE len][msgpack value]            (at the pointer the entry point returns)
//! ```
//!
//! Parameters are encoded with named struct fields so maps survive the trip
//! into the guest with their keys.

use crate::backends::wasm::error::{WasmError, WasmResult};
use serde_json::Value;

pub const LENGTH_PREFIX_SIZE: usize = 4;
const ALIGNMENT: usize = 4;

fn pad_to_alignment(buffer: &mut Vec<u8>) {
    let remainder = buffer.len() % ALIGNMENT;
    if remainder != 0 {
        buffer.resize(buffer.len() + ALIGNMENT - remainder, 0);
    }
}

/// Encode a parameter list into the argument buffer written to guest memory.
pub fn encode_arguments(parameters: &[Value]) -> WasmResult<Vec<u8>> {
    let mut buffer = Vec::new();
    for parameter in parameters {
        let encoded = rmp_serde::to_vec_named(parameter)?;
        let length = u32::try_from(encoded.len()).map_err(|_| {
            WasmError::ValidationError(format!("parameter of {} bytes is too large", encoded.len()))
        })?;

        pad_to_alignment(&mut buffer);
        buffer.extend_from_slice(&length.to_le_bytes());
        buffer.extend_from_slice(&encoded);
    }
    Ok(buffer)
}

/// Decode `count` parameters from an argument buffer. This is what a guest does
/// on entry; the host uses it for loopback peers and tests.
pub fn decode_arguments(buffer: &[u8], count: usize) -> WasmResult<Vec<Value>> {
    let mut offset: usize = 0;
    let mut parameters = Vec::with_capacity(count);

    for index in 0..count {
        offset = offset.div_ceil(ALIGNMENT) * ALIGNMENT;
        let length = read_length_prefix(buffer, offset)?;
        let start = offset + LENGTH_PREFIX_SIZE;
        let block = buffer.get(start..start + length).ok_or_else(|| {
            WasmError::OutOfBounds(format!(
                "parameter {} claims {} bytes at offset {}, buffer has {}",
                index,
                length,
                start,
                buffer.len()
            ))
        })?;
        parameters.push(rmp_serde::from_slice(block)?);
        offset = start + length;
    }

    Ok(parameters)
}

/// Read a little-endian `u32` length at `offset`.
pub fn read_length_prefix(buffer: &[u8], offset: usize) -> WasmResult<usize> {
    let bytes: [u8; LENGTH_PREFIX_SIZE] = buffer
        .get(offset..offset + LENGTH_PREFIX_SIZE)
        .and_then(|slice| slice.try_into().ok())
        .ok_or_else(|| {
            WasmError::OutOfBounds(format!(
                "no length prefix at offset {} (buffer has {} bytes)",
                offset,
                buffer.len()
            ))
        })?;
    Ok(u32::from_le_bytes(bytes) as usize)
}

/// Decode the MessagePack payload that follows a result's length prefix.
pub fn decode_value(payload: &[u8]) -> WasmResult<Value> {
    Ok(rmp_serde::from_slice(payload)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_parameter_list_encodes_to_empty_buffer() {
        assert!(encode_arguments(&[]).unwrap().is_empty());
    }

    #[test]
    fn test_blocks_are_length_prefixed_and_aligned() {
        // "a" encodes to two msgpack bytes: 0xa1 0x61
        let buffer = encode_arguments(&[json!("a"), json!(7)]).unwrap();

        assert_eq!(&buffer[0..4], &2u32.to_le_bytes());
        assert_eq!(&buffer[4..6], &[0xa1, 0x61]);
        assert_eq!(&buffer[6..8], &[0, 0]);
        assert_eq!(&buffer[8..12], &1u32.to_le_bytes());
        assert_eq!(buffer[12], 7);
        assert_eq!(buffer.len(), 13);
    }

    #[test]
    fn test_primitive_parameters_round_trip() {
        let parameters = vec![
            json!(42),
            json!(-3),
            json!(2.5),
            json!("shopping cart"),
            json!(true),
            json!(null),
            json!([1, 2, 3]),
            json!({"item": "apple", "quantity": 4}),
        ];

        let buffer = encode_arguments(&parameters).unwrap();
        let decoded = decode_arguments(&buffer, parameters.len()).unwrap();

        assert_eq!(decoded, parameters);
    }

    #[test]
    fn test_truncated_buffer_is_out_of_bounds() {
        let buffer = encode_arguments(&[json!("truncate me")]).unwrap();
        let result = decode_arguments(&buffer[..buffer.len() - 2], 1);
        assert!(matches!(result, Err(WasmError::OutOfBounds(_))));
    }

    #[test]
    fn test_decode_value_reads_msgpack_string() {
        let value = decode_value(&[0xa2, b'4', b'2']).unwrap();
        assert_eq!(value, json!("42"));
    }
}
