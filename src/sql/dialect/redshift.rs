//! Amazon Redshift dialect.
//!
//! Redshift is PostgreSQL 8.0-based with significant differences:
//! - No RETURNING clause
//! - No ON CONFLICT (use MERGE or staging tables)
//! - No DISTINCT ON
//! - No JSONB operators
//!
//! It keeps ILIKE, the `~` regex operators and `ARRAY[...]` literals.

use super::helpers;
use super::{RegexSyntax, SqlDialect};

/// Amazon Redshift dialect.
#[derive(Debug, Clone, Copy)]
pub struct Redshift;

impl SqlDialect for Redshift {
    fn name(&self) -> &'static str {
        "redshift"
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn supports_ilike(&self) -> bool {
        true
    }

    fn regex_syntax(&self) -> RegexSyntax {
        RegexSyntax::Operator {
            matches: "~",
            not_matches: "!~",
        }
    }

    fn array_prefix(&self) -> Option<&'static str> {
        Some("ARRAY")
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_redshift(name)
    }
}
