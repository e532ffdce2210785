//! MySQL dialect.
//!
//! MySQL differences from the generic dialect:
//! - Backtick identifier quoting
//! - Backslashes escaped inside string literals
//! - OFFSET requires a LIMIT
//! - ON DUPLICATE KEY UPDATE, INSERT IGNORE, REPLACE INTO
//! - `GROUP BY ... WITH ROLLUP`
//! - Unparenthesized queries in set operations

use super::helpers;
use super::{IntervalStyle, RollupStyle, SqlDialect, UpsertStyle};
use crate::sql::filter::{FilterOp, FilterSyntax};
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// Largest LIMIT MySQL accepts, used when only an offset is given.
const UNBOUNDED_LIMIT: &str = "18446744073709551615";

/// MySQL dialect.
#[derive(Debug, Clone, Copy)]
pub struct MySql;

impl SqlDialect for MySql {
    fn name(&self) -> &'static str {
        "mysql"
    }

    fn quote_char(&self) -> Option<char> {
        Some('`')
    }

    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_backslash(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_literal(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_required_limit(limit, offset, UNBOUNDED_LIMIT)
    }

    fn rollup_style(&self) -> RollupStyle {
        RollupStyle::WithRollup
    }

    fn wraps_set_operation_queries(&self) -> bool {
        false
    }

    fn text_cast_type(&self) -> &'static str {
        "CHAR"
    }

    fn filter_syntax(&self, op: FilterOp) -> Option<FilterSyntax> {
        match op {
            FilterOp::Contains => Some(FilterSyntax::Function {
                name: "JSON_CONTAINS",
                value_first: false,
            }),
            FilterOp::ContainedBy => Some(FilterSyntax::Function {
                name: "JSON_CONTAINS",
                value_first: true,
            }),
            FilterOp::Search => Some(FilterSyntax::MatchAgainst),
            FilterOp::PosixRegex => Some(FilterSyntax::Regex),
        }
    }

    fn interval_style(&self) -> IntervalStyle {
        IntervalStyle::QuoteValue
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnDuplicateKey
    }

    fn supports_replace(&self) -> bool {
        true
    }

    fn insert_ignore_keyword(&self) -> Option<&'static str> {
        Some("IGNORE")
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_mysql(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_mysql(dt)
    }
}
