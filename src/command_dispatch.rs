//! Purpose: Hold top-level CLI command dispatch for `jsontag`.
//! Exports: `dispatch_command`.
//! Role: Keep `main.rs` focused on parse/bootstrap and delegate command execution.
//! Invariants: Every command builds its own `Serialiser`; nothing is shared across runs.
//! Invariants: Stdout carries only the command's JSON result; diagnostics go to stderr.

use super::*;

use jsontag::api::Value;
use serde::Serialize;

#[derive(Serialize)]
struct HandlerInfo<'a> {
    identifier: &'a str,
    type_name: Option<&'a str>,
    encode_predicate: bool,
    decode_by_identifier: bool,
    decode_predicate: bool,
}

pub(super) fn dispatch_command(command: Command, color_mode: ColorMode) -> Result<RunOutcome, Error> {
    match command {
        Command::Decode {
            input,
            with_functions,
        } => {
            let serialiser = build_serialiser(with_functions, false)?;
            let text = read_input(input.as_deref())?;
            let value = serialiser.parse(&text)?;
            emit_json(
                json!({
                    "revived": count_marked(&value),
                    "value": describe(&value)?,
                }),
                color_mode,
            );
            Ok(RunOutcome::ok())
        }
        Command::Roundtrip {
            input,
            check,
            pretty,
            with_functions,
        } => {
            let serialiser = build_serialiser(with_functions, pretty)?;
            let text = read_input(input.as_deref())?;
            let value = serialiser.parse(&text)?;
            let output = serialiser.stringify(&value)?;
            if check {
                ensure_unchanged(&text, &output)?;
            }
            println!("{output}");
            Ok(RunOutcome::ok())
        }
        Command::Handlers { with_functions } => {
            let serialiser = build_serialiser(with_functions, false)?;
            let infos = serialiser
                .registry()
                .transcoders()
                .map(|transcoder| HandlerInfo {
                    identifier: transcoder.identifier(),
                    type_name: transcoder.handler().encode_type_name(),
                    encode_predicate: transcoder.handler().has_encode_match(),
                    decode_by_identifier: transcoder.handler().decodes_by_identifier(),
                    decode_predicate: transcoder.handler().has_decode_match(),
                })
                .collect::<Vec<_>>();
            let handlers = serde_json::to_value(&infos).map_err(|err| {
                Error::new(ErrorKind::Internal)
                    .with_message("failed to encode handler list")
                    .with_source(err)
            })?;
            emit_json(json!({ "handlers": handlers }), color_mode);
            Ok(RunOutcome::ok())
        }
    }
}

fn ensure_unchanged(input: &str, output: &str) -> Result<(), Error> {
    let parse = |text: &str| {
        serde_json::from_str::<JsonValue>(text).map_err(|err| {
            Error::new(ErrorKind::Internal)
                .with_message("round trip produced invalid JSON")
                .with_source(err)
        })
    };
    if parse(input)? == parse(output)? {
        return Ok(());
    }
    Err(Error::new(ErrorKind::Decode)
        .with_message("round trip changed the document")
        .with_hint("Some tagged payloads were re-encoded differently (e.g. dates normalized to millisecond precision)."))
}

fn count_marked(value: &Value) -> usize {
    match value {
        Value::Marked(marked) => 1 + count_marked(marked.value()),
        Value::Array(items) => items.iter().map(count_marked).sum(),
        Value::Object(map) => map.values().map(count_marked).sum(),
        _ => 0,
    }
}

/// JSON view of a decoded tree; revived values show their tag, type, and payload.
fn describe(value: &Value) -> Result<JsonValue, Error> {
    Ok(match value {
        Value::Null => JsonValue::Null,
        Value::Bool(flag) => JsonValue::Bool(*flag),
        Value::Number(num) => JsonValue::Number(num.clone()),
        Value::String(text) => JsonValue::String(text.clone()),
        Value::Array(items) => JsonValue::Array(
            items
                .iter()
                .map(describe)
                .collect::<Result<Vec<_>, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = Map::new();
            for (key, item) in map {
                out.insert(key.clone(), describe(item)?);
            }
            JsonValue::Object(out)
        }
        Value::Native(native) => json!({
            "$type": native.type_name(),
            "value": native.plain_json(),
        }),
        Value::Marked(marked) => {
            let tagged = marked.transcoder().encode(marked.value())?;
            let payload = tagged
                .strip_prefix(marked.identifier())
                .and_then(|rest| rest.strip_prefix(':'))
                .unwrap_or(&tagged);
            json!({
                "$tag": marked.identifier(),
                "$type": marked.value().type_name(),
                "payload": payload,
            })
        }
    })
}

#[cfg(test)]
mod tests {
    use super::{count_marked, describe, ensure_unchanged};
    use jsontag::api::{ErrorKind, Serialiser};
    use serde_json::json;

    #[test]
    fn describe_shows_revived_values() {
        let serialiser = Serialiser::with_builtin_handlers().unwrap();
        let value = serialiser
            .parse(r#"{"at":"@date:2020-01-01T00:01:02.000Z","re":"@regexp:2:a+:g","n":1}"#)
            .unwrap();
        assert_eq!(count_marked(&value), 2);
        assert_eq!(
            describe(&value).unwrap(),
            json!({
                "at": {"$tag": "@date", "$type": "Date", "payload": "2020-01-01T00:01:02.000Z"},
                "re": {"$tag": "@regexp", "$type": "RegExp", "payload": "2:a+:g"},
                "n": 1,
            })
        );
    }

    #[test]
    fn ensure_unchanged_flags_normalized_payloads() {
        assert!(ensure_unchanged(r#"{"a":1}"#, r#"{ "a": 1 }"#).is_ok());
        let err = ensure_unchanged(
            r#""@date:2020-01-01T00:01:02Z""#,
            r#""@date:2020-01-01T00:01:02.000Z""#,
        )
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Decode);
    }
}
