//! Purpose: `@date` transcoder for UTC instants.
//! Exports: `Date`, `handler`, `compat_handler`.
//! Role: Built-in handler; payload is `YYYY-MM-DDTHH:MM:SS.sssZ`.
//! Invariants: Instants are held in UTC at millisecond precision.
//! Invariants: Unparseable payloads are declined, never raised.
use std::any::Any;
use std::fmt;

use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{OffsetDateTime, UtcOffset};

use crate::core::error::{Error, ErrorKind};
use crate::core::handler::Handler;
use crate::core::registry::Transcoder;
use crate::core::value::{NativeValue, Value};

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct Date(OffsetDateTime);

impl Date {
    /// Convert to UTC and drop anything below a millisecond.
    pub fn new(datetime: OffsetDateTime) -> Self {
        let utc = datetime.to_offset(UtcOffset::UTC);
        Self(utc.replace_millisecond(utc.millisecond()).unwrap_or(utc))
    }

    pub fn from_unix_millis(millis: i64) -> Result<Self, Error> {
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(millis) * 1_000_000)
            .map(Self)
            .map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message("unix milliseconds out of range")
                    .with_source(err)
            })
    }

    /// Parse RFC 3339, or a bare `YYYY-MM-DD` taken as UTC midnight.
    pub fn parse(text: &str) -> Result<Self, Error> {
        let trimmed = text.trim();
        if let Ok(datetime) = OffsetDateTime::parse(trimmed, &Rfc3339) {
            return Ok(Self::new(datetime));
        }
        time::Date::parse(trimmed, format_description!("[year]-[month]-[day]"))
            .map(|date| Self(date.midnight().assume_utc()))
            .map_err(|err| {
                Error::new(ErrorKind::Usage)
                    .with_message("invalid date")
                    .with_hint("Use RFC 3339, e.g. 2020-01-01T00:01:02.000Z")
                    .with_source(err)
            })
    }

    pub fn unix_millis(&self) -> i64 {
        (self.0.unix_timestamp_nanos() / 1_000_000) as i64
    }

    pub fn offset_date_time(&self) -> OffsetDateTime {
        self.0
    }

    pub fn to_iso_string(&self) -> Result<String, Error> {
        self.0
            .format(format_description!(
                "[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond digits:3]Z"
            ))
            .map_err(|err| {
                Error::new(ErrorKind::Encode)
                    .with_message("date cannot be formatted")
                    .with_source(err)
            })
    }
}

impl From<OffsetDateTime> for Date {
    fn from(datetime: OffsetDateTime) -> Self {
        Self::new(datetime)
    }
}

impl fmt::Display for Date {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_iso_string() {
            Ok(text) => f.write_str(&text),
            Err(_) => write!(f, "{}", self.0),
        }
    }
}

impl NativeValue for Date {
    fn type_name(&self) -> &str {
        "Date"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn native_eq(&self, other: &dyn NativeValue) -> bool {
        other.as_any().downcast_ref::<Date>() == Some(self)
    }

    fn plain_json(&self) -> serde_json::Value {
        self.to_iso_string()
            .map_or(serde_json::Value::Null, serde_json::Value::String)
    }
}

fn encode(value: &Value) -> Result<String, Error> {
    value
        .as_native::<Date>()
        .ok_or_else(|| Error::new(ErrorKind::Encode).with_message("value is not a Date"))?
        .to_iso_string()
}

fn decode(payload: &str, _transcoder: &Transcoder) -> Result<Option<Value>, Error> {
    Ok(Date::parse(payload).ok().map(Value::native))
}

pub fn handler() -> Handler {
    Handler::builder()
        .encode_type_name("Date")
        .encode_convert(encode)
        .decode_by_identifier()
        .decode_convert(decode)
        .build()
}

/// Predicate-only variant for registries that avoid the fast-path indexes.
pub fn compat_handler() -> Handler {
    Handler::builder()
        .encode_match(|value| value.as_native::<Date>().is_some())
        .encode_convert(encode)
        .decode_match(|text, transcoder| {
            text.strip_prefix(transcoder.identifier())
                .is_some_and(|rest| rest.starts_with(':'))
        })
        .decode_convert(decode)
        .build()
}

#[cfg(test)]
mod tests {
    use super::Date;
    use time::macros::datetime;

    #[test]
    fn iso_string_has_millisecond_precision() {
        let date = Date::new(datetime!(2020-01-01 0:01:02 UTC));
        assert_eq!(date.to_iso_string().unwrap(), "2020-01-01T00:01:02.000Z");

        let date = Date::new(datetime!(2020-02-03 4:05:06.789123 UTC));
        assert_eq!(date.to_iso_string().unwrap(), "2020-02-03T04:05:06.789Z");
    }

    #[test]
    fn offsets_are_normalized_to_utc() {
        let date = Date::new(datetime!(2020-01-01 2:00 +2));
        assert_eq!(date.to_iso_string().unwrap(), "2020-01-01T00:00:00.000Z");
    }

    #[test]
    fn parse_accepts_rfc3339_and_bare_dates() {
        let parsed = Date::parse("2020-01-01T00:01:02.000Z").unwrap();
        assert_eq!(parsed, Date::new(datetime!(2020-01-01 0:01:02 UTC)));

        let parsed = Date::parse("2021-06-30").unwrap();
        assert_eq!(parsed.to_iso_string().unwrap(), "2021-06-30T00:00:00.000Z");

        assert!(Date::parse("yesterday").is_err());
    }

    #[test]
    fn unix_millis_round_trip() {
        let date = Date::from_unix_millis(1_577_836_862_000).unwrap();
        assert_eq!(date.to_iso_string().unwrap(), "2020-01-01T00:01:02.000Z");
        assert_eq!(date.unix_millis(), 1_577_836_862_000);
    }
}
