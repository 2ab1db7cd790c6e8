//! Purpose: `@regexp` transcoder for regular expression source plus flags.
//! Exports: `RegExp`, `RegExpFlags`, `handler`, `compat_handler`.
//! Role: Built-in handler; payload is `<len>:<source>:<flags>`.
//! Invariants: `len` counts UTF-16 code units so sources containing `:` slice safely.
//! Invariants: Flags serialize in the fixed order g, i, m, s, u, y.
//! Invariants: Malformed payloads are `Payload` errors, not declines.
use std::any::Any;
use std::fmt;
use std::str::FromStr;

use regex::{Regex, RegexBuilder};

use crate::core::error::{Error, ErrorKind};
use crate::core::handler::Handler;
use crate::core::registry::Transcoder;
use crate::core::value::{NativeValue, Value};

#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub struct RegExpFlags {
    pub global: bool,
    pub ignore_case: bool,
    pub multiline: bool,
    pub dot_all: bool,
    pub unicode: bool,
    pub sticky: bool,
}

impl RegExpFlags {
    fn slot(&mut self, flag: char) -> Option<&mut bool> {
        match flag {
            'g' => Some(&mut self.global),
            'i' => Some(&mut self.ignore_case),
            'm' => Some(&mut self.multiline),
            's' => Some(&mut self.dot_all),
            'u' => Some(&mut self.unicode),
            'y' => Some(&mut self.sticky),
            _ => None,
        }
    }
}

impl FromStr for RegExpFlags {
    type Err = Error;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let mut flags = RegExpFlags::default();
        for flag in text.chars() {
            let slot = flags.slot(flag).ok_or_else(|| {
                Error::new(ErrorKind::Usage)
                    .with_message(format!("unknown regular expression flag '{flag}'"))
                    .with_hint("Supported flags: g, i, m, s, u, y")
            })?;
            if *slot {
                return Err(Error::new(ErrorKind::Usage)
                    .with_message(format!("regular expression flag '{flag}' repeated")));
            }
            *slot = true;
        }
        Ok(flags)
    }
}

impl fmt::Display for RegExpFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ordered = [
            (self.global, 'g'),
            (self.ignore_case, 'i'),
            (self.multiline, 'm'),
            (self.dot_all, 's'),
            (self.unicode, 'u'),
            (self.sticky, 'y'),
        ];
        for (set, flag) in ordered {
            if set {
                write!(f, "{flag}")?;
            }
        }
        Ok(())
    }
}

#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct RegExp {
    source: String,
    flags: RegExpFlags,
}

impl RegExp {
    pub fn new(source: impl Into<String>, flags: &str) -> Result<Self, Error> {
        Ok(Self::with_flags(source, flags.parse()?))
    }

    pub fn with_flags(source: impl Into<String>, flags: RegExpFlags) -> Self {
        Self {
            source: source.into(),
            flags,
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn flags(&self) -> RegExpFlags {
        self.flags
    }

    /// Build a matcher. `g` and `y` describe iteration state and have no effect here.
    pub fn compile(&self) -> Result<Regex, Error> {
        RegexBuilder::new(&self.source)
            .case_insensitive(self.flags.ignore_case)
            .multi_line(self.flags.multiline)
            .dot_matches_new_line(self.flags.dot_all)
            .build()
            .map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message("regular expression does not compile")
                    .with_source(err)
            })
    }

    pub fn encode_payload(&self) -> String {
        format!(
            "{}:{}:{}",
            self.source.encode_utf16().count(),
            self.source,
            self.flags
        )
    }

    pub fn decode_payload(payload: &str) -> Result<Self, Error> {
        let (length, rest) = payload
            .split_once(':')
            .ok_or_else(|| payload_error("missing source length"))?;
        let length: usize = length
            .parse()
            .map_err(|_| payload_error("source length is not a number"))?;
        let split = utf16_offset(rest, length)
            .ok_or_else(|| payload_error("source is shorter than its declared length"))?;
        let (source, tail) = rest.split_at(split);
        let flags = tail
            .strip_prefix(':')
            .ok_or_else(|| payload_error("missing flags separator"))?;
        let flags = flags.parse::<RegExpFlags>().map_err(|err| {
            let message = err.message().unwrap_or("invalid flags").to_string();
            payload_error(message)
        })?;
        Ok(Self::with_flags(source, flags))
    }
}

impl fmt::Display for RegExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}/{}", self.source, self.flags)
    }
}

impl NativeValue for RegExp {
    fn type_name(&self) -> &str {
        "RegExp"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn native_eq(&self, other: &dyn NativeValue) -> bool {
        other.as_any().downcast_ref::<RegExp>() == Some(self)
    }
}

fn payload_error(message: impl Into<String>) -> Error {
    Error::new(ErrorKind::Payload)
        .with_message(message)
        .with_hint("Expected `<source length>:<source>:<flags>`, e.g. `5:(.*?):gi`")
}

/// Byte offset reached after `units` UTF-16 code units, if it falls on a char boundary.
fn utf16_offset(text: &str, units: usize) -> Option<usize> {
    let mut consumed = 0;
    for (offset, ch) in text.char_indices() {
        if consumed == units {
            return Some(offset);
        }
        consumed += ch.len_utf16();
        if consumed > units {
            return None;
        }
    }
    (consumed == units).then_some(text.len())
}

fn encode(value: &Value) -> Result<String, Error> {
    value
        .as_native::<RegExp>()
        .map(RegExp::encode_payload)
        .ok_or_else(|| Error::new(ErrorKind::Encode).with_message("value is not a RegExp"))
}

fn decode(payload: &str, _transcoder: &Transcoder) -> Result<Option<Value>, Error> {
    RegExp::decode_payload(payload).map(|regexp| Some(Value::native(regexp)))
}

pub fn handler() -> Handler {
    Handler::builder()
        .encode_type_name("RegExp")
        .encode_convert(encode)
        .decode_by_identifier()
        .decode_convert(decode)
        .build()
}

/// Predicate-only variant for registries that avoid the fast-path indexes.
pub fn compat_handler() -> Handler {
    Handler::builder()
        .encode_match(|value| value.as_native::<RegExp>().is_some())
        .encode_convert(encode)
        .decode_match(|text, transcoder| {
            text.strip_prefix(transcoder.identifier())
                .is_some_and(|rest| rest.starts_with(':'))
        })
        .decode_convert(decode)
        .build()
}
