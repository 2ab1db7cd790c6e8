//! Purpose: Own registered transcoders and resolve which one applies to a value or string.
//! Exports: `Registry`, `Transcoder`.
//! Role: Dispatch core shared by marking, revival, and the `Serialiser` facade.
//! Invariants: Fast-path indexes are consulted first; the ordered scan is the fallback.
//! Invariants: Fallback scans run in registration order and the first match wins.
//! Invariants: Transcoders are never removed or mutated once registered.
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::core::error::{Error, ErrorKind};
use crate::core::handler::Handler;
use crate::core::value::Value;

/// A handler bound to its identifier.
///
/// Only `Registry::register` builds one, by consuming a `Handler`, so the
/// identifier prefix is applied in exactly one place and cannot stack.
pub struct Transcoder {
    identifier: String,
    handler: Handler,
}

impl Transcoder {
    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn handler(&self) -> &Handler {
        &self.handler
    }

    /// Produce the tagged string `<identifier>:<payload>` for `value`.
    pub fn encode(&self, value: &Value) -> Result<String, Error> {
        let convert = self.handler.encode_convert.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Internal)
                .with_message("registered transcoder has no encode convert")
                .with_identifier(&self.identifier)
        })?;
        let payload = convert(value.unmarked())
            .map_err(|err| attach_identifier(err, &self.identifier))?;
        Ok(format!("{}:{payload}", self.identifier))
    }

    /// Strip the identifier prefix from `tagged` and run the decode convert.
    ///
    /// `Ok(None)` means the handler declined the payload.
    pub fn decode(&self, tagged: &str) -> Result<Option<Value>, Error> {
        let convert = self.handler.decode_convert.as_ref().ok_or_else(|| {
            Error::new(ErrorKind::Internal)
                .with_message("registered transcoder has no decode convert")
                .with_identifier(&self.identifier)
        })?;
        convert(self.payload_of(tagged), self).map_err(|err| attach_identifier(err, &self.identifier))
    }

    /// Slice off `identifier.len() + 1` characters. Strings claimed by a
    /// predicate may not carry the prefix at all; they get whatever remains.
    pub(crate) fn payload_of<'a>(&self, tagged: &'a str) -> &'a str {
        let skip = self.identifier.chars().count() + 1;
        tagged
            .char_indices()
            .nth(skip)
            .map_or("", |(offset, _)| &tagged[offset..])
    }

    fn encode_matches(&self, value: &Value) -> bool {
        self.handler
            .encode_match
            .as_ref()
            .is_some_and(|matcher| matcher(value))
    }

    fn decode_matches(&self, tagged: &str) -> bool {
        self.handler
            .decode_match
            .as_ref()
            .is_some_and(|matcher| matcher(tagged, self))
    }
}

impl fmt::Debug for Transcoder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transcoder")
            .field("identifier", &self.identifier)
            .field("handler", &self.handler)
            .finish()
    }
}

fn attach_identifier(err: Error, identifier: &str) -> Error {
    if err.identifier().is_some() {
        err
    } else {
        err.with_identifier(identifier)
    }
}

#[derive(Debug, Default)]
pub struct Registry {
    ordered: Vec<Arc<Transcoder>>,
    by_type_name: HashMap<String, Arc<Transcoder>>,
    by_identifier: HashMap<String, Arc<Transcoder>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` under `identifier`.
    ///
    /// Returns `Ok(false)` for an empty or already registered identifier,
    /// whatever the handler looks like. An incomplete handler under a fresh
    /// identifier is an `InvalidHandler` error.
    pub fn register(&mut self, identifier: impl Into<String>, handler: Handler) -> Result<bool, Error> {
        let identifier = identifier.into();
        if identifier.is_empty() {
            warn!("rejected transcoder with empty identifier");
            return Ok(false);
        }
        if self.contains(&identifier) {
            warn!(identifier = %identifier, "rejected duplicate transcoder identifier");
            return Ok(false);
        }
        handler
            .validate()
            .map_err(|err| err.with_identifier(&identifier))?;
        if identifier.contains(':') && handler.decode_by_identifier {
            warn!(
                identifier = %identifier,
                "identifier contains ':'; only a decode predicate can reach it"
            );
        }

        let transcoder = Arc::new(Transcoder {
            identifier: identifier.clone(),
            handler,
        });

        if let Some(type_name) = transcoder.handler.encode_type_name.as_deref() {
            match self.by_type_name.get(type_name) {
                Some(existing) => warn!(
                    identifier = %identifier,
                    type_name,
                    shadowed_by = %existing.identifier,
                    "type name already indexed; relying on fallback scan"
                ),
                None => {
                    self.by_type_name
                        .insert(type_name.to_string(), Arc::clone(&transcoder));
                }
            }
        }
        if transcoder.handler.decode_by_identifier {
            self.by_identifier
                .insert(identifier.clone(), Arc::clone(&transcoder));
        }
        debug!(
            identifier = %identifier,
            type_name = ?transcoder.handler.encode_type_name,
            by_identifier = transcoder.handler.decode_by_identifier,
            "registered transcoder"
        );
        self.ordered.push(transcoder);
        Ok(true)
    }

    pub fn contains(&self, identifier: &str) -> bool {
        self.ordered
            .iter()
            .any(|transcoder| transcoder.identifier == identifier)
    }

    pub fn transcoder(&self, identifier: &str) -> Option<Arc<Transcoder>> {
        self.ordered
            .iter()
            .find(|transcoder| transcoder.identifier == identifier)
            .cloned()
    }

    /// Registered transcoders in registration order.
    pub fn transcoders(&self) -> impl Iterator<Item = &Arc<Transcoder>> {
        self.ordered.iter()
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn resolve_for_encoding(&self, value: &Value) -> Option<Arc<Transcoder>> {
        let value = value.unmarked();
        if let Some(transcoder) = value
            .type_name()
            .and_then(|type_name| self.by_type_name.get(type_name))
        {
            return Some(Arc::clone(transcoder));
        }

        let found = self
            .ordered
            .iter()
            .find(|transcoder| transcoder.encode_matches(value))
            .cloned();
        if found.is_none() {
            trace!(type_name = ?value.type_name(), "no transcoder claims value");
        }
        found
    }

    pub fn resolve_for_decoding(&self, tagged: &str) -> Option<Arc<Transcoder>> {
        if let Some(transcoder) = tagged
            .split_once(':')
            .and_then(|(candidate, _)| self.by_identifier.get(candidate))
        {
            return Some(Arc::clone(transcoder));
        }

        self.ordered
            .iter()
            .find(|transcoder| transcoder.decode_matches(tagged))
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::core::error::ErrorKind;
    use crate::core::handler::Handler;
    use crate::core::value::Value;

    fn upper_handler() -> Handler {
        Handler::builder()
            .encode_type_name("String")
            .encode_convert(|value| Ok(value.as_str().unwrap_or_default().to_uppercase()))
            .decode_by_identifier()
            .decode_convert(|payload, _| Ok(Some(Value::from(payload.to_lowercase()))))
            .build()
    }

    fn even_handler() -> Handler {
        Handler::builder()
            .encode_match(|value| value.as_i64().is_some_and(|n| n % 2 == 0))
            .encode_convert(|value| Ok(value.as_i64().unwrap_or_default().to_string()))
            .decode_match(|text, _| text.starts_with("@even:"))
            .decode_convert(|payload, _| Ok(payload.parse::<i64>().ok().map(Value::from)))
            .build()
    }

    #[test]
    fn register_rejects_empty_and_duplicate_identifiers() {
        let mut registry = Registry::new();
        assert!(registry.register("@up", upper_handler()).unwrap());
        assert!(!registry.register("@up", upper_handler()).unwrap());
        assert!(!registry.register("", upper_handler()).unwrap());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn register_raises_for_incomplete_handler() {
        let mut registry = Registry::new();
        let incomplete = Handler::builder()
            .encode_type_name("String")
            .decode_by_identifier()
            .build();
        let err = registry.register("@bad", incomplete).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHandler);
        assert_eq!(err.identifier(), Some("@bad"));
        assert!(registry.is_empty());
    }

    #[test]
    fn identifier_checks_run_before_handler_validation() {
        let mut registry = Registry::new();
        let incomplete = Handler::builder().encode_type_name("Half").build();
        assert!(!registry.register("", incomplete.clone()).unwrap());

        registry.register("@up", upper_handler()).unwrap();
        assert!(!registry.register("@up", incomplete).unwrap());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn identifier_with_separator_decodes_through_predicate() {
        let mut registry = Registry::new();
        let handler = Handler::builder()
            .encode_match(|value| value.as_bool().is_some())
            .encode_convert(|value| Ok(value.as_bool().unwrap_or_default().to_string()))
            .decode_match(|text, transcoder| {
                text.strip_prefix(transcoder.identifier())
                    .is_some_and(|rest| rest.starts_with(':'))
            })
            .decode_convert(|payload, _| Ok(payload.parse::<bool>().ok().map(Value::from)))
            .build();
        assert!(registry.register("ns:flag", handler).unwrap());

        let transcoder = registry.resolve_for_decoding("ns:flag:true").unwrap();
        assert_eq!(transcoder.identifier(), "ns:flag");
        assert_eq!(
            transcoder.decode("ns:flag:true").unwrap(),
            Some(Value::from(true))
        );
        assert_eq!(
            transcoder.encode(&Value::from(false)).unwrap(),
            "ns:flag:false"
        );
        assert!(registry.resolve_for_decoding("ns:other:true").is_none());
    }

    #[test]
    fn encode_prepends_identifier_once() {
        let mut registry = Registry::new();
        registry.register("@up", upper_handler()).unwrap();
        let transcoder = registry.transcoder("@up").unwrap();
        let value = Value::from("abc");
        assert_eq!(transcoder.encode(&value).unwrap(), "@up:ABC");
        assert_eq!(transcoder.encode(&value).unwrap(), "@up:ABC");
    }

    #[test]
    fn type_name_fast_path_resolves_before_scan() {
        let mut registry = Registry::new();
        registry.register("@even", even_handler()).unwrap();
        registry.register("@up", upper_handler()).unwrap();

        let resolved = registry.resolve_for_encoding(&Value::from("x")).unwrap();
        assert_eq!(resolved.identifier(), "@up");
        let resolved = registry.resolve_for_encoding(&Value::from(4)).unwrap();
        assert_eq!(resolved.identifier(), "@even");
        assert!(registry.resolve_for_encoding(&Value::from(3)).is_none());
        assert!(registry.resolve_for_encoding(&Value::Null).is_none());
    }

    #[test]
    fn fallback_scan_uses_registration_order() {
        let mut registry = Registry::new();
        let first = Handler::builder()
            .encode_match(|value| value.as_bool().is_some())
            .encode_convert(|_| Ok("first".to_string()))
            .decode_match(|_, _| true)
            .decode_convert(|_, _| Ok(None))
            .build();
        let second = Handler::builder()
            .encode_match(|value| value.as_bool().is_some())
            .encode_convert(|_| Ok("second".to_string()))
            .decode_match(|_, _| true)
            .decode_convert(|_, _| Ok(None))
            .build();
        registry.register("@first", first).unwrap();
        registry.register("@second", second).unwrap();

        let resolved = registry.resolve_for_encoding(&Value::from(true)).unwrap();
        assert_eq!(resolved.identifier(), "@first");
        let resolved = registry.resolve_for_decoding("anything").unwrap();
        assert_eq!(resolved.identifier(), "@first");
    }

    #[test]
    fn decode_resolution_prefers_identifier_index() {
        let mut registry = Registry::new();
        registry.register("@even", even_handler()).unwrap();
        registry.register("@up", upper_handler()).unwrap();

        assert_eq!(
            registry.resolve_for_decoding("@up:ABC").unwrap().identifier(),
            "@up"
        );
        assert_eq!(
            registry.resolve_for_decoding("@even:4").unwrap().identifier(),
            "@even"
        );
        assert!(registry.resolve_for_decoding("@other:1").is_none());
        assert!(registry.resolve_for_decoding("plain").is_none());
    }

    fn greedy_handler() -> Handler {
        Handler::builder()
            .encode_match(|_| true)
            .encode_convert(|_| Ok("greedy".to_string()))
            .decode_match(|_, _| true)
            .decode_convert(|_, _| Ok(None))
            .build()
    }

    #[test]
    fn encode_fast_path_beats_earlier_matching_predicate() {
        let mut registry = Registry::new();
        registry.register("@greedy", greedy_handler()).unwrap();
        registry.register("@fast", upper_handler()).unwrap();

        let resolved = registry.resolve_for_encoding(&Value::from("x")).unwrap();
        assert_eq!(resolved.identifier(), "@fast");
        let resolved = registry.resolve_for_encoding(&Value::from(1)).unwrap();
        assert_eq!(resolved.identifier(), "@greedy");
    }

    #[test]
    fn decode_fast_path_beats_earlier_matching_predicate() {
        let mut registry = Registry::new();
        registry.register("@greedy", greedy_handler()).unwrap();
        registry.register("@fast", upper_handler()).unwrap();

        let resolved = registry.resolve_for_decoding("@fast:ABC").unwrap();
        assert_eq!(resolved.identifier(), "@fast");
        let resolved = registry.resolve_for_decoding("@other:ABC").unwrap();
        assert_eq!(resolved.identifier(), "@greedy");
    }

    #[test]
    fn first_type_name_registration_keeps_the_index() {
        let mut registry = Registry::new();
        registry.register("@up", upper_handler()).unwrap();
        registry.register("@up2", upper_handler()).unwrap();
        let resolved = registry.resolve_for_encoding(&Value::from("x")).unwrap();
        assert_eq!(resolved.identifier(), "@up");
    }

    #[test]
    fn payload_slicing_counts_characters() {
        let mut registry = Registry::new();
        registry.register("@up", upper_handler()).unwrap();
        let transcoder = registry.transcoder("@up").unwrap();
        assert_eq!(transcoder.payload_of("@up:héllo"), "héllo");
        assert_eq!(transcoder.payload_of("@up:"), "");
        assert_eq!(transcoder.payload_of("@u"), "");
        assert_eq!(
            transcoder.decode("@up:ABC").unwrap(),
            Some(Value::from("abc"))
        );
    }
}
