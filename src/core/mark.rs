//! Purpose: Bind transcoders to values so the encoder emits their tagged form.
//! Exports: `Registry::{mark, mark_in_place, mark_recursive}`, `mark_with`.
//! Role: Encode-side half of the dispatch core.
//! Invariants: Values no transcoder claims are returned unchanged.
//! Invariants: Marking an already marked value replaces its binding.
use std::sync::Arc;

use crate::core::registry::{Registry, Transcoder};
use crate::core::value::{Marked, Value};

/// Bind `transcoder` to `value` without consulting a registry.
pub fn mark_with(value: Value, transcoder: &Arc<Transcoder>) -> Value {
    Marked::bind(value, Arc::clone(transcoder))
}

impl Registry {
    pub fn mark(&self, value: Value) -> Value {
        match self.resolve_for_encoding(&value) {
            Some(transcoder) => Marked::bind(value, transcoder),
            None => value,
        }
    }

    pub fn mark_in_place(&self, value: &mut Value) {
        if let Some(transcoder) = self.resolve_for_encoding(value) {
            let taken = std::mem::take(value);
            *value = Marked::bind(taken, transcoder);
        }
    }

    /// Mark every nested value depth-first, then `value` itself.
    pub fn mark_recursive(&self, mut value: Value) -> Value {
        self.mark_recursive_in_place(&mut value);
        value
    }

    pub fn mark_recursive_in_place(&self, value: &mut Value) {
        match value.unmarked_mut() {
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.mark_recursive_in_place(item);
                }
            }
            Value::Object(map) => {
                for item in map.values_mut() {
                    self.mark_recursive_in_place(item);
                }
            }
            _ => {}
        }
        self.mark_in_place(value);
    }
}
