//! Purpose: Describe how one data shape is recognized and converted in both directions.
//! Exports: `Handler`, `HandlerBuilder`, and the closure type aliases.
//! Role: Passive behavior bundle consumed by `Registry::register`.
//! Invariants: A valid handler has one matcher and one convert per direction.
//! Invariants: Encode converts return the payload only; the registry adds the identifier.
use std::fmt;
use std::sync::Arc;

use crate::core::error::{Error, ErrorKind};
use crate::core::registry::Transcoder;
use crate::core::value::Value;

pub type EncodeMatch = Arc<dyn Fn(&Value) -> bool + Send + Sync>;
pub type EncodeConvert = Arc<dyn Fn(&Value) -> Result<String, Error> + Send + Sync>;
pub type DecodeMatch = Arc<dyn Fn(&str, &Transcoder) -> bool + Send + Sync>;
pub type DecodeConvert =
    Arc<dyn Fn(&str, &Transcoder) -> Result<Option<Value>, Error> + Send + Sync>;

#[derive(Clone, Default)]
pub struct Handler {
    pub(crate) encode_match: Option<EncodeMatch>,
    pub(crate) encode_type_name: Option<String>,
    pub(crate) encode_convert: Option<EncodeConvert>,
    pub(crate) decode_match: Option<DecodeMatch>,
    pub(crate) decode_by_identifier: bool,
    pub(crate) decode_convert: Option<DecodeConvert>,
}

impl Handler {
    pub fn builder() -> HandlerBuilder {
        HandlerBuilder::default()
    }

    pub fn encode_type_name(&self) -> Option<&str> {
        self.encode_type_name.as_deref()
    }

    pub fn decodes_by_identifier(&self) -> bool {
        self.decode_by_identifier
    }

    pub fn has_encode_match(&self) -> bool {
        self.encode_match.is_some()
    }

    pub fn has_decode_match(&self) -> bool {
        self.decode_match.is_some()
    }

    /// Names of required fields that are missing, in declaration order.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.encode_match.is_none() && self.encode_type_name.is_none() {
            missing.push("encode_match|encode_type_name");
        }
        if self.encode_convert.is_none() {
            missing.push("encode_convert");
        }
        if self.decode_match.is_none() && !self.decode_by_identifier {
            missing.push("decode_match|decode_by_identifier");
        }
        if self.decode_convert.is_none() {
            missing.push("decode_convert");
        }
        missing
    }

    pub fn validate(&self) -> Result<(), Error> {
        let missing = self.missing_fields();
        if missing.is_empty() {
            return Ok(());
        }
        Err(Error::new(ErrorKind::InvalidHandler)
            .with_message(format!("handler is missing {}", missing.join(", ")))
            .with_hint(
                "Supply an encode matcher (predicate or type name), a decode matcher (predicate or identifier), and a convert for each direction.",
            ))
    }
}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handler")
            .field("encode_match", &self.encode_match.is_some())
            .field("encode_type_name", &self.encode_type_name)
            .field("encode_convert", &self.encode_convert.is_some())
            .field("decode_match", &self.decode_match.is_some())
            .field("decode_by_identifier", &self.decode_by_identifier)
            .field("decode_convert", &self.decode_convert.is_some())
            .finish()
    }
}

#[derive(Default)]
pub struct HandlerBuilder {
    handler: Handler,
}

impl HandlerBuilder {
    pub fn encode_match<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.handler.encode_match = Some(Arc::new(matcher));
        self
    }

    /// Claim values whose runtime type name equals `type_name` without running a predicate.
    pub fn encode_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.handler.encode_type_name = Some(type_name.into());
        self
    }

    pub fn encode_convert<F>(mut self, convert: F) -> Self
    where
        F: Fn(&Value) -> Result<String, Error> + Send + Sync + 'static,
    {
        self.handler.encode_convert = Some(Arc::new(convert));
        self
    }

    /// Claim strings accepted by `matcher`; it also sees the transcoder, so it
    /// can read its own identifier instead of hard-coding the tag.
    pub fn decode_match<F>(mut self, matcher: F) -> Self
    where
        F: Fn(&str, &Transcoder) -> bool + Send + Sync + 'static,
    {
        self.handler.decode_match = Some(Arc::new(matcher));
        self
    }

    /// Claim any string whose prefix before the first `:` is this handler's identifier.
    pub fn decode_by_identifier(mut self) -> Self {
        self.handler.decode_by_identifier = true;
        self
    }

    /// `convert` receives the payload (identifier prefix removed) and the transcoder.
    pub fn decode_convert<F>(mut self, convert: F) -> Self
    where
        F: Fn(&str, &Transcoder) -> Result<Option<Value>, Error> + Send + Sync + 'static,
    {
        self.handler.decode_convert = Some(Arc::new(convert));
        self
    }

    pub fn build(self) -> Handler {
        self.handler
    }
}

#[cfg(test)]
mod tests {
    use super::Handler;
    use crate::core::error::ErrorKind;
    use crate::core::value::Value;

    #[test]
    fn complete_handler_validates() {
        let handler = Handler::builder()
            .encode_type_name("Thing")
            .encode_convert(|_| Ok("x".to_string()))
            .decode_by_identifier()
            .decode_convert(|payload, _| Ok(Some(Value::from(payload))))
            .build();
        assert!(handler.validate().is_ok());
        assert_eq!(handler.encode_type_name(), Some("Thing"));
        assert!(handler.decodes_by_identifier());
    }

    #[test]
    fn predicates_substitute_for_fast_paths() {
        let handler = Handler::builder()
            .encode_match(|value| value.is_null())
            .encode_convert(|_| Ok(String::new()))
            .decode_match(|text, _| text.starts_with("@nil:"))
            .decode_convert(|_, _| Ok(Some(Value::Null)))
            .build();
        assert!(handler.missing_fields().is_empty());
    }

    #[test]
    fn empty_handler_lists_every_missing_field() {
        let handler = Handler::builder().build();
        assert_eq!(
            handler.missing_fields(),
            vec![
                "encode_match|encode_type_name",
                "encode_convert",
                "decode_match|decode_by_identifier",
                "decode_convert",
            ]
        );
        let err = handler.validate().unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidHandler);
        assert!(err.message().unwrap().contains("encode_convert"));
    }
}
