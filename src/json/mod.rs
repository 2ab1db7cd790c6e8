//! Purpose: Internal JSON boundary between `Value` trees and JSON text.
//! Exports: `encode`, `decode_with`, and the `parse` helpers.
//! Role: Single seam for serde_json so callsites avoid ad hoc encode/decode logic.
//! Invariants: Encoding consults bound transcoders; decoding runs the hook bottom-up.
//! Invariants: Helper APIs stay small and deterministic (no hidden global state).

mod decode;
mod encode;
pub(crate) mod parse;

pub(crate) use decode::decode_with;
pub(crate) use encode::{encode, to_json_value};
