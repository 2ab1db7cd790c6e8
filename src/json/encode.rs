// Encode: marked values are replaced by their transcoder's tagged string.
use serde_json::Value as JsonValue;

use crate::core::error::{Error, ErrorKind};
use crate::core::value::Value;

pub(crate) fn to_json_value(value: &Value) -> Result<JsonValue, Error> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(value) => JsonValue::Bool(*value),
        Value::Number(num) => JsonValue::Number(num.clone()),
        Value::String(text) => JsonValue::String(text.clone()),
        Value::Array(items) => JsonValue::Array(
            items
                .iter()
                .map(to_json_value)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, item) in map {
                out.insert(key.clone(), to_json_value(item)?);
            }
            JsonValue::Object(out)
        }
        Value::Native(native) => native.plain_json(),
        Value::Marked(marked) => JsonValue::String(marked.transcoder().encode(marked.value())?),
    })
}

pub(crate) fn encode(value: &Value, pretty: bool) -> Result<String, Error> {
    let json = to_json_value(value)?;
    let text = if pretty {
        serde_json::to_string_pretty(&json)
    } else {
        serde_json::to_string(&json)
    };
    text.map_err(|err| {
        Error::new(ErrorKind::Encode)
            .with_message("failed to write JSON text")
            .with_source(err)
    })
}

#[cfg(test)]
mod tests {
    use super::encode;
    use crate::core::error::{Error, ErrorKind};
    use crate::core::handler::Handler;
    use crate::core::registry::Registry;
    use crate::core::value::Value;
    use serde_json::json;

    #[test]
    fn plain_values_encode_as_json() {
        let value = Value::from(json!({"a": [1, "x", null], "b": true}));
        assert_eq!(
            encode(&value, false).unwrap(),
            r#"{"a":[1,"x",null],"b":true}"#
        );
    }

    #[test]
    fn marked_values_encode_through_transcoder() {
        let mut registry = Registry::new();
        let handler = Handler::builder()
            .encode_type_name("Boolean")
            .encode_convert(|value| Ok(if value.as_bool() == Some(true) { "yes" } else { "no" }.to_string()))
            .decode_by_identifier()
            .decode_convert(|payload, _| Ok(Some(Value::from(payload == "yes"))))
            .build();
        registry.register("@bool", handler).unwrap();

        let value: Value = [("flag", registry.mark(Value::from(true)))]
            .into_iter()
            .collect();
        assert_eq!(encode(&value, false).unwrap(), r#"{"flag":"@bool:yes"}"#);
    }

    #[test]
    fn convert_failures_surface_as_errors() {
        let mut registry = Registry::new();
        let handler = Handler::builder()
            .encode_type_name("Number")
            .encode_convert(|_| Err(Error::new(ErrorKind::Encode).with_message("no numbers")))
            .decode_by_identifier()
            .decode_convert(|_, _| Ok(None))
            .build();
        registry.register("@num", handler).unwrap();

        let err = encode(&registry.mark(Value::from(1)), false).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Encode);
        assert_eq!(err.identifier(), Some("@num"));
    }
}
