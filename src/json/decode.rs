// Bottom-up decode: every node reaches the hook after its children.
use serde_json::Value as JsonValue;

use super::parse::{categorize_error, from_str, hint_for_error};
use crate::core::error::{Error, ErrorKind};
use crate::core::value::{Key, Map, Value};

/// Parse `text` and replace every node with `hook(key, node)`, children first.
pub(crate) fn decode_with<F>(text: &str, mut hook: F) -> Result<Value, Error>
where
    F: FnMut(Key<'_>, Value) -> Result<Value, Error>,
{
    let parsed: JsonValue = from_str(text).map_err(|err| {
        let category = categorize_error(&err);
        Error::new(ErrorKind::Decode)
            .with_message(format!("invalid JSON ({})", category.label()))
            .with_hint(hint_for_error(&err, "decode"))
            .with_source(err)
    })?;
    walk(Key::Root, parsed, &mut hook)
}

fn walk<F>(key: Key<'_>, node: JsonValue, hook: &mut F) -> Result<Value, Error>
where
    F: FnMut(Key<'_>, Value) -> Result<Value, Error>,
{
    let value = match node {
        JsonValue::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (index, item) in items.into_iter().enumerate() {
                out.push(walk(Key::Index(index), item, hook)?);
            }
            Value::Array(out)
        }
        JsonValue::Object(fields) => {
            let mut out = Map::new();
            for (name, item) in fields {
                let revived = walk(Key::Field(&name), item, hook)?;
                out.insert(name, revived);
            }
            Value::Object(out)
        }
        scalar => Value::from(scalar),
    };
    hook(key, value)
}
