// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Hand-written fragment module used across backend and distribution tests.
//!
//! * `echo` returns the first argument block unchanged.
//! * `answer` returns the msgpack string `"42"` from a data segment.
//! * `count` returns the parameter count as a msgpack fixint.
//! * `fail` traps.
//! * `spin` loops until fuel runs out.

pub const FIXTURE_WAT: &str = r#"
(module
  (memory (export "memory") 1)
  (global $heap (mut i32) (i32.const 1024))

  (func (export "alloc") (param $len i32) (result i32)
    (local $ptr i32)
    (local.set $ptr (global.get $heap))
    (global.set $heap (i32.add (global.get $heap) (local.get $len)))
    (local.get $ptr))

  (func (export "execute__echo") (param $ptr i32) (param $count i32) (result i32)
    (local.get $ptr))

  (func (export "execute__answer") (param i32 i32) (result i32)
    (i32.const 16))

  (func (export "execute__count") (param $ptr i32) (param $count i32) (result i32)
    (i32.store (i32.const 32) (i32.const 1))
    (i32.store8 (i32.const 36) (local.get $count))
    (i32.const 32))

  (func (export "execute__fail") (param i32 i32) (result i32)
    unreachable)

  (func (export "execute__spin") (param i32 i32) (result i32)
    (loop $forever
      (br $forever))
    (i32.const 0))

  (data (i32.const 16) "\03\00\00\00\a2\34\32"))
"#;

pub fn fixture_module() -> Vec<u8> {
    wat::parse_str(FIXTURE_WAT).expect("fixture module must assemble")
}
