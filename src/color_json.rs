//! Purpose: Render pretty JSON with optional ANSI colorization for CLI output.
//! Exports: colorize_json.
//! Role: Small, pure formatter used by CLI emission paths.
//! Invariants: When color is disabled, output equals serde_json::to_string_pretty.
//! Invariants: Tagged strings color their `@identifier:` prefix apart from the payload.
use serde_json::Value;

const INDENT: &str = "  ";

const COLOR_KEY: &str = "36";
const COLOR_STRING: &str = "32";
const COLOR_TAG: &str = "35";
const COLOR_NUMBER: &str = "33";
const COLOR_BOOL: &str = "34";
const COLOR_NULL: &str = "39";
const COLOR_PUNCT: &str = "39";

pub fn colorize_json(value: &Value, use_color: bool) -> String {
    let mut out = String::new();
    write_value(value, 0, use_color, &mut out);
    out
}

fn write_value(value: &Value, indent: usize, use_color: bool, out: &mut String) {
    match value {
        Value::Null => push_colored("null", COLOR_NULL, use_color, out),
        Value::Bool(val) => {
            let text = if *val { "true" } else { "false" };
            push_colored(text, COLOR_BOOL, use_color, out);
        }
        Value::Number(num) => push_colored(&num.to_string(), COLOR_NUMBER, use_color, out),
        Value::String(text) => write_string(text, use_color, out),
        Value::Array(items) => write_array(items, indent, use_color, out),
        Value::Object(map) => write_object(map, indent, use_color, out),
    }
}

fn write_string(text: &str, use_color: bool, out: &mut String) {
    let encoded = serde_json::to_string(text).unwrap_or_else(|_| "\"\"".to_string());
    // Split after the opening quote plus `@identifier:`; escaping never touches that prefix.
    match tag_prefix_len(text) {
        Some(len) if use_color => {
            let (tag, rest) = encoded.split_at(len + 1);
            push_colored(tag, COLOR_TAG, use_color, out);
            push_colored(rest, COLOR_STRING, use_color, out);
        }
        _ => push_colored(&encoded, COLOR_STRING, use_color, out),
    }
}

/// Byte length of a leading `@identifier:` made of plain ASCII word characters.
fn tag_prefix_len(text: &str) -> Option<usize> {
    let rest = text.strip_prefix('@')?;
    let end = rest.find(':')?;
    let identifier = &rest[..end];
    let plain = !identifier.is_empty()
        && identifier
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-' || b == b'.');
    plain.then_some(end + 2)
}

fn write_array(items: &[Value], indent: usize, use_color: bool, out: &mut String) {
    if items.is_empty() {
        push_colored("[]", COLOR_PUNCT, use_color, out);
        return;
    }
    push_colored("[", COLOR_PUNCT, use_color, out);
    out.push('\n');
    for (idx, item) in items.iter().enumerate() {
        push_indent(indent + 1, out);
        write_value(item, indent + 1, use_color, out);
        if idx + 1 < items.len() {
            push_colored(",", COLOR_PUNCT, use_color, out);
        }
        out.push('\n');
    }
    push_indent(indent, out);
    push_colored("]", COLOR_PUNCT, use_color, out);
}

fn write_object(
    map: &serde_json::Map<String, Value>,
    indent: usize,
    use_color: bool,
    out: &mut String,
) {
    if map.is_empty() {
        push_colored("{}", COLOR_PUNCT, use_color, out);
        return;
    }
    push_colored("{", COLOR_PUNCT, use_color, out);
    out.push('\n');
    let len = map.len();
    for (idx, (key, value)) in map.iter().enumerate() {
        push_indent(indent + 1, out);
        let encoded = serde_json::to_string(key).unwrap_or_else(|_| "\"\"".to_string());
        push_colored(&encoded, COLOR_KEY, use_color, out);
        push_colored(":", COLOR_PUNCT, use_color, out);
        out.push(' ');
        write_value(value, indent + 1, use_color, out);
        if idx + 1 < len {
            push_colored(",", COLOR_PUNCT, use_color, out);
        }
        out.push('\n');
    }
    push_indent(indent, out);
    push_colored("}", COLOR_PUNCT, use_color, out);
}

fn push_indent(level: usize, out: &mut String) {
    for _ in 0..level {
        out.push_str(INDENT);
    }
}

fn push_colored(text: &str, color: &str, use_color: bool, out: &mut String) {
    if !use_color {
        out.push_str(text);
        return;
    }
    out.push_str("\u{1b}[");
    out.push_str(color);
    out.push('m');
    out.push_str(text);
    out.push_str("\u{1b}[0m");
}

#[cfg(test)]
mod tests {
    use super::{colorize_json, tag_prefix_len};
    use serde_json::json;

    #[test]
    fn colorize_json_matches_pretty_when_disabled() {
        let value = json!({
            "when": "@date:2020-01-01T00:01:02.000Z",
            "nested": { "re": "@regexp:5:(.*?):gi", "n": [1, true, null] }
        });
        let plain = colorize_json(&value, false);
        let pretty = serde_json::to_string_pretty(&value).expect("pretty");
        assert_eq!(plain, pretty);
    }

    #[test]
    fn tagged_strings_color_the_identifier() {
        let value = json!({"when": "@date:2020", "text": "plain", "b": true});
        let colored = colorize_json(&value, true);
        assert!(colored.contains("\u{1b}[35m\"@date:\u{1b}[0m\u{1b}[32m2020\"\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[32m\"plain\"\u{1b}[0m"));
        assert!(colored.contains("\u{1b}[34mtrue\u{1b}[0m"));
    }

    #[test]
    fn tag_prefix_requires_a_plain_identifier() {
        assert_eq!(tag_prefix_len("@date:x"), Some(6));
        assert_eq!(tag_prefix_len("@:x"), None);
        assert_eq!(tag_prefix_len("@a b:x"), None);
        assert_eq!(tag_prefix_len("date:x"), None);
    }
}
