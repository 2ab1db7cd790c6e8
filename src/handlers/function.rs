//! Purpose: `@function` transcoder carrying function source text as an opaque value.
//! Exports: `FunctionSource`, `handler`.
//! Role: Optional built-in; shows that any text-representable value can be tagged.
//! Invariants: Source text is round-tripped verbatim and never evaluated.
//! Invariants: Not registered by `register_builtins`; callers opt in explicitly.
use std::any::Any;

use crate::core::error::{Error, ErrorKind};
use crate::core::handler::Handler;
use crate::core::value::{NativeValue, Value};

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct FunctionSource(String);

impl FunctionSource {
    pub fn new(source: impl Into<String>) -> Self {
        Self(source.into())
    }

    pub fn source(&self) -> &str {
        &self.0
    }
}

impl NativeValue for FunctionSource {
    fn type_name(&self) -> &str {
        "Function"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn native_eq(&self, other: &dyn NativeValue) -> bool {
        other.as_any().downcast_ref::<FunctionSource>() == Some(self)
    }

    // Functions have no plain JSON form.
    fn plain_json(&self) -> serde_json::Value {
        serde_json::Value::Null
    }
}

pub fn handler() -> Handler {
    Handler::builder()
        .encode_type_name("Function")
        .encode_convert(|value| {
            value
                .as_native::<FunctionSource>()
                .map(|function| function.source().to_string())
                .ok_or_else(|| {
                    Error::new(ErrorKind::Encode).with_message("value is not a FunctionSource")
                })
        })
        .decode_by_identifier()
        .decode_convert(|payload, _| Ok(Some(Value::native(FunctionSource::new(payload)))))
        .build()
}

#[cfg(test)]
mod tests {
    use super::{FunctionSource, handler};
    use crate::core::registry::Registry;
    use crate::core::value::Value;

    #[test]
    fn source_text_round_trips_verbatim() {
        let mut registry = Registry::new();
        registry.register("@function", handler()).unwrap();
        let source = "function (a, b) {\n  return a + b;\n}";

        let marked = registry.mark(Value::native(FunctionSource::new(source)));
        let tagged = marked.as_marked().unwrap().transcoder().encode(marked.unmarked()).unwrap();
        assert_eq!(tagged, format!("@function:{source}"));

        let transcoder = registry.resolve_for_decoding(&tagged).unwrap();
        let revived = transcoder.decode(&tagged).unwrap().unwrap();
        assert_eq!(revived.as_native::<FunctionSource>().unwrap().source(), source);
    }
}
