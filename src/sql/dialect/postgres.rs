//! PostgreSQL dialect.
//!
//! The most feature-complete target: RETURNING, ON CONFLICT, DISTINCT ON,
//! native ILIKE, POSIX regex operators, JSON/JSONB operators and
//! `ARRAY[...]` literals.

use super::helpers;
use super::{RegexSyntax, SqlDialect, UpsertStyle};
use crate::sql::filter::{FilterOp, FilterSyntax};
use crate::sql::types::DataType;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct Postgres;

impl SqlDialect for Postgres {
    fn name(&self) -> &'static str {
        "postgres"
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

    fn supports_json_operators(&self) -> bool {
        true
    }

    fn filter_syntax(&self, op: FilterOp) -> Option<FilterSyntax> {
        match op {
            FilterOp::Contains => Some(FilterSyntax::Operator("@>")),
            FilterOp::ContainedBy => Some(FilterSyntax::Operator("<@")),
            FilterOp::Search => Some(FilterSyntax::FullText),
            FilterOp::PosixRegex => Some(FilterSyntax::Regex),
        }
    }

    fn array_prefix(&self) -> Option<&'static str> {
        Some("ARRAY")
    }

    fn supports_returning(&self) -> bool {
        true
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnConflict
    }

    fn supports_distinct_on(&self) -> bool {
        true
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_postgres(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_postgres(dt)
    }
}
