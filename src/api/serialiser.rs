//! Purpose: Top-level parse/stringify facade over a privately owned registry.
//! Exports: `Serialiser`, `SerialiserOptions`.
//! Role: Combines marking and revival with the JSON boundary.
//! Invariants: Each `Serialiser` owns its registry; there is no process-wide handler table.
//! Invariants: `stringify` never re-resolves; only `stringify_auto` walks and marks the tree.
use std::sync::Arc;

use crate::core::error::Error;
use crate::core::handler::Handler;
use crate::core::registry::{Registry, Transcoder};
use crate::core::value::Value;
use crate::handlers;
use crate::json;

#[derive(Clone, Debug)]
pub struct SerialiserOptions {
    /// Indent output with two spaces per level.
    pub pretty: bool,
}

impl SerialiserOptions {
    pub fn new() -> Self {
        Self { pretty: false }
    }

    pub fn pretty(mut self, pretty: bool) -> Self {
        self.pretty = pretty;
        self
    }
}

impl Default for SerialiserOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Default)]
pub struct Serialiser {
    registry: Registry,
    options: SerialiserOptions,
}

impl Serialiser {
    pub fn new() -> Self {
        Self::default()
    }

    /// A serialiser with `@date` and `@regexp` registered.
    pub fn with_builtin_handlers() -> Result<Self, Error> {
        let mut serialiser = Self::new();
        handlers::register_builtins(&mut serialiser.registry)?;
        Ok(serialiser)
    }

    pub fn with_options(mut self, options: SerialiserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn options(&self) -> &SerialiserOptions {
        &self.options
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn register(&mut self, identifier: impl Into<String>, handler: Handler) -> Result<bool, Error> {
        self.registry.register(identifier, handler)
    }

    pub fn transcoder(&self, identifier: &str) -> Option<Arc<Transcoder>> {
        self.registry.transcoder(identifier)
    }

    pub fn mark(&self, value: impl Into<Value>) -> Value {
        self.registry.mark(value.into())
    }

    pub fn mark_recursive(&self, value: impl Into<Value>) -> Value {
        self.registry.mark_recursive(value.into())
    }

    /// Encode as-is: marked values use their bound transcoder, the rest is plain JSON.
    pub fn stringify(&self, value: &Value) -> Result<String, Error> {
        json::encode(value, self.options.pretty)
    }

    /// Mark the whole tree in place, then encode it.
    ///
    /// The tree keeps its marks, so a later `stringify` of the same value
    /// produces identical output.
    pub fn stringify_auto(&self, value: &mut Value) -> Result<String, Error> {
        self.registry.mark_recursive_in_place(value);
        self.stringify(value)
    }

    pub fn parse(&self, text: &str) -> Result<Value, Error> {
        json::decode_with(text, |key, value| self.registry.revive(key, value))
    }

    /// The JSON tree `stringify` would write, before it becomes text.
    pub fn to_json(&self, value: &Value) -> Result<serde_json::Value, Error> {
        json::to_json_value(value)
    }
}
