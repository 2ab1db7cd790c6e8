//! Purpose: Library crate for type-tagged JSON encode/decode, used by the `jsontag` CLI and tests.
//! Exports: `api` (public facade), `core` (dispatch core), `handlers` (built-in transcoders).
//! Role: Extends JSON with `<identifier>:<payload>` strings that revive into native values.
//! Invariants: No process-wide state; every registry is owned by its caller.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod api;
pub mod core;
pub mod handlers;
mod json;
