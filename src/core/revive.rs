//! Purpose: Turn tagged strings back into native values during decode.
//! Exports: `Registry::revive`.
//! Role: Per-value hook handed to `json::decode_with`; decode-side half of the dispatch core.
//! Invariants: Only strings are inspected; everything else passes through untouched.
//! Invariants: A declined or unclaimed string is returned exactly as parsed.
//! Invariants: Revived values come back marked with the transcoder that produced them.
use tracing::trace;

use crate::core::error::Error;
use crate::core::mark::mark_with;
use crate::core::registry::Registry;
use crate::core::value::{Key, Value};

impl Registry {
    pub fn revive(&self, key: Key<'_>, value: Value) -> Result<Value, Error> {
        let Value::String(tagged) = &value else {
            return Ok(value);
        };
        let Some(transcoder) = self.resolve_for_decoding(tagged) else {
            return Ok(value);
        };

        match transcoder.decode(tagged)? {
            Some(revived) => Ok(mark_with(revived, &transcoder)),
            None => {
                trace!(
                    key = %key,
                    identifier = transcoder.identifier(),
                    "transcoder declined payload"
                );
                Ok(value)
            }
        }
    }
}
