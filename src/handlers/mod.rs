//! Purpose: Built-in handlers for dates, regular expressions, and function sources.
//! Exports: identifier constants, `register_builtins`, and the per-type modules.
//! Role: Concrete instances of the handler interface; nothing here is special-cased by the core.
//! Invariants: Built-in identifiers are stable wire tags.

pub mod date;
pub mod function;
pub mod regexp;

use crate::core::error::Error;
use crate::core::registry::Registry;

pub const DATE_IDENTIFIER: &str = "@date";
pub const REGEXP_IDENTIFIER: &str = "@regexp";
pub const FUNCTION_IDENTIFIER: &str = "@function";

/// Register `@date` and `@regexp`. Returns how many were newly added.
pub fn register_builtins(registry: &mut Registry) -> Result<usize, Error> {
    let mut added = 0;
    if registry.register(DATE_IDENTIFIER, date::handler())? {
        added += 1;
    }
    if registry.register(REGEXP_IDENTIFIER, regexp::handler())? {
        added += 1;
    }
    Ok(added)
}
