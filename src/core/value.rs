//! Purpose: Dynamic value tree carried through encode and decode.
//! Exports: `Value`, `Map`, `Native`, `NativeValue`, `Marked`, `Key`.
//! Role: JSON shapes plus opaque native values plus transcoder bindings.
//! Invariants: A `Marked` never wraps another `Marked`; re-binding replaces the transcoder.
//! Invariants: Type names of JSON shapes are stable: Boolean, Number, String, Array, Object.
use std::any::Any;
use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Number;

use crate::core::registry::Transcoder;

/// Object fields in document order.
pub type Map = IndexMap<String, Value>;

/// A non-JSON value that can live inside a [`Value`] tree.
///
/// Implementors pick the runtime type name that type-name fast paths are
/// matched against. `plain_json` is what the value encodes to when no
/// transcoder is bound to it.
pub trait NativeValue: fmt::Debug + Send + Sync + 'static {
    fn type_name(&self) -> &str;

    fn as_any(&self) -> &dyn Any;

    fn native_eq(&self, other: &dyn NativeValue) -> bool {
        let _ = other;
        false
    }

    fn plain_json(&self) -> serde_json::Value {
        serde_json::Value::Object(serde_json::Map::new())
    }
}

#[derive(Clone)]
pub struct Native(Arc<dyn NativeValue>);

impl Native {
    pub fn new<T: NativeValue>(value: T) -> Self {
        Self(Arc::new(value))
    }

    pub fn type_name(&self) -> &str {
        self.0.type_name()
    }

    pub fn get(&self) -> &dyn NativeValue {
        self.0.as_ref()
    }

    pub fn downcast_ref<T: NativeValue>(&self) -> Option<&T> {
        self.0.as_any().downcast_ref::<T>()
    }

    pub fn plain_json(&self) -> serde_json::Value {
        self.0.plain_json()
    }
}

impl fmt::Debug for Native {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self.0.as_ref(), f)
    }
}

impl PartialEq for Native {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0) || self.0.native_eq(other.0.as_ref())
    }
}

/// A value bound to the transcoder that will encode it.
#[derive(Clone, Debug)]
pub struct Marked {
    value: Value,
    transcoder: Arc<Transcoder>,
}

impl Marked {
    pub(crate) fn bind(value: Value, transcoder: Arc<Transcoder>) -> Value {
        match value {
            Value::Marked(mut marked) => {
                marked.transcoder = transcoder;
                Value::Marked(marked)
            }
            value => Value::Marked(Box::new(Marked { value, transcoder })),
        }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut Value {
        &mut self.value
    }

    pub fn transcoder(&self) -> &Arc<Transcoder> {
        &self.transcoder
    }

    pub fn identifier(&self) -> &str {
        self.transcoder.identifier()
    }

    pub fn into_inner(self) -> Value {
        self.value
    }
}

impl PartialEq for Marked {
    fn eq(&self, other: &Self) -> bool {
        self.identifier() == other.identifier() && self.value == other.value
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<Value>),
    Object(Map),
    Native(Native),
    Marked(Box<Marked>),
}

impl Value {
    pub fn native<T: NativeValue>(value: T) -> Self {
        Value::Native(Native::new(value))
    }

    /// Runtime type name used by type-name fast paths. `Null` has none.
    pub fn type_name(&self) -> Option<&str> {
        match self {
            Value::Null => None,
            Value::Bool(_) => Some("Boolean"),
            Value::Number(_) => Some("Number"),
            Value::String(_) => Some("String"),
            Value::Array(_) => Some("Array"),
            Value::Object(_) => Some("Object"),
            Value::Native(native) => Some(native.type_name()),
            Value::Marked(marked) => marked.value.type_name(),
        }
    }

    pub fn unmarked(&self) -> &Value {
        let mut current = self;
        while let Value::Marked(marked) = current {
            current = &marked.value;
        }
        current
    }

    pub fn unmarked_mut(&mut self) -> &mut Value {
        match self {
            Value::Marked(marked) => marked.value.unmarked_mut(),
            value => value,
        }
    }

    pub fn into_unmarked(self) -> Value {
        match self {
            Value::Marked(marked) => marked.value.into_unmarked(),
            value => value,
        }
    }

    pub fn is_marked(&self) -> bool {
        matches!(self, Value::Marked(_))
    }

    pub fn as_marked(&self) -> Option<&Marked> {
        match self {
            Value::Marked(marked) => Some(marked),
            _ => None,
        }
    }

    /// Identifier of the bound transcoder, if any.
    pub fn mark_identifier(&self) -> Option<&str> {
        self.as_marked().map(Marked::identifier)
    }

    pub fn is_null(&self) -> bool {
        matches!(self.unmarked(), Value::Null)
    }

    pub fn as_native<T: NativeValue>(&self) -> Option<&T> {
        match self.unmarked() {
            Value::Native(native) => native.downcast_ref::<T>(),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.unmarked() {
            Value::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.unmarked() {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self.unmarked() {
            Value::Number(num) => num.as_i64(),
            _ => None,
        }
    }

    pub fn as_u64(&self) -> Option<u64> {
        match self.unmarked() {
            Value::Number(num) => num.as_u64(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self.unmarked() {
            Value::Number(num) => num.as_f64(),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self.unmarked() {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Map> {
        match self.unmarked() {
            Value::Object(map) => Some(map),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_object().and_then(|map| map.get(key))
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self.unmarked_mut() {
            Value::Object(map) => map.get_mut(key),
            _ => None,
        }
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|items| items.get(index))
    }
}

impl From<serde_json::Value> for Value {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(value) => Value::Bool(value),
            serde_json::Value::Number(num) => Value::Number(num),
            serde_json::Value::String(text) => Value::String(text),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Object(
                map.into_iter()
                    .map(|(key, value)| (key, Value::from(value)))
                    .collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Number(value.into())
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Value::Number(value.into())
    }
}

impl From<u64> for Value {
    fn from(value: u64) -> Self {
        Value::Number(value.into())
    }
}

impl From<f64> for Value {
    /// Non-finite floats have no JSON form and become `Null`.
    fn from(value: f64) -> Self {
        Number::from_f64(value).map_or(Value::Null, Value::Number)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Value::Array(value)
    }
}

impl From<Map> for Value {
    fn from(value: Map) -> Self {
        Value::Object(value)
    }
}

impl From<Native> for Value {
    fn from(value: Native) -> Self {
        Value::Native(value)
    }
}

impl FromIterator<Value> for Value {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Value::Array(iter.into_iter().collect())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        Value::Object(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value))
                .collect(),
        )
    }
}

/// Position of a node within its parent, as handed to per-value hooks.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Key<'a> {
    Root,
    Index(usize),
    Field(&'a str),
}

impl fmt::Display for Key<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Root => f.write_str(""),
            Key::Index(index) => write!(f, "{index}"),
            Key::Field(name) => f.write_str(name),
        }
    }
}
