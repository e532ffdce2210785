//! Oracle dialect.
//!
//! - Identifiers are left unquoted
//! - Booleans are `1`/`0`
//! - OFFSET ... ROWS FETCH NEXT ... ROWS ONLY pagination
//! - `INTERVAL '1' DAY` literal form
//! - `REGEXP_LIKE(x, pattern)` instead of a regex operator
//! - GROUP BY cannot reference select aliases

use super::helpers;
use super::{IntervalStyle, RegexSyntax, SqlDialect};
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// Oracle dialect.
#[derive(Debug, Clone, Copy)]
pub struct Oracle;

impl SqlDialect for Oracle {
    fn name(&self) -> &'static str {
        "oracle"
    }

    fn quote_char(&self) -> Option<char> {
        None
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_oracle(limit, offset)
    }

    fn supports_groupby_alias(&self) -> bool {
        false
    }

    fn emit_recursive_keyword(&self) -> bool {
        false
    }

    fn text_cast_type(&self) -> &'static str {
        "VARCHAR2(4000)"
    }

    fn regex_syntax(&self) -> RegexSyntax {
        RegexSyntax::Function("REGEXP_LIKE")
    }

    fn interval_style(&self) -> IntervalStyle {
        IntervalStyle::QuoteValue
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_oracle(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_oracle(dt)
    }
}
