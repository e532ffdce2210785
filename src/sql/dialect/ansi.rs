//! Generic SQL dialect - base reference implementation.
//!
//! Used by plain `Query`. Double-quoted identifiers, `true`/`false`,
//! LIMIT/OFFSET pagination, GLOB and REGEXP predicates.

use super::helpers;
use super::SqlDialect;

/// Generic SQL dialect (reference implementation).
#[derive(Debug, Clone, Copy)]
pub struct Ansi;

impl SqlDialect for Ansi {
    fn name(&self) -> &'static str {
        "ansi"
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn supports_glob(&self) -> bool {
        true
    }
}
