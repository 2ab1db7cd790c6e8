//! Purpose: Define the stable public Rust API boundary for jsontag.
//! Exports: The `Serialiser` facade plus the value, handler, registry, and error types.
//! Role: Public, additive-only surface; callers should not need `core` paths.
//! Invariants: This module is the only supported path to the dispatch core.

mod serialiser;

pub use crate::core::error::{Error, ErrorKind, to_exit_code};
pub use crate::core::handler::{Handler, HandlerBuilder};
pub use crate::core::mark::mark_with;
pub use crate::core::registry::{Registry, Transcoder};
pub use crate::core::value::{Key, Map, Marked, Native, NativeValue, Value};
pub use serialiser::{Serialiser, SerialiserOptions};
