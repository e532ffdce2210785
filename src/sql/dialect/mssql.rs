//! MSSQL (SQL Server / Azure SQL) dialect.
//!
//! MSSQL has significant differences from the generic dialect:
//! - No native boolean literal, `1`/`0` instead
//! - OFFSET FETCH for pagination (requires ORDER BY)
//! - TOP for simple limiting
//! - N'...' prefix for Unicode strings
//! - No RECURSIVE keyword for recursive CTEs
//! - GROUP BY cannot reference select aliases
//! - No regex predicate and no row-locking clause

use super::helpers;
use super::{RegexSyntax, SqlDialect};
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// MSSQL (SQL Server) dialect.
#[derive(Debug, Clone, Copy)]
pub struct MsSql;

impl SqlDialect for MsSql {
    fn name(&self) -> &'static str {
        "mssql"
    }

    fn quote_string(&self, s: &str) -> String {
        if s.is_ascii() {
            helpers::quote_string_single(s)
        } else {
            helpers::quote_string_unicode(s)
        }
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_tsql(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        true
    }

    fn supports_top(&self) -> bool {
        true
    }

    fn supports_groupby_alias(&self) -> bool {
        false
    }

    fn emit_recursive_keyword(&self) -> bool {
        false
    }

    fn regex_syntax(&self) -> RegexSyntax {
        RegexSyntax::Unsupported
    }

    fn supports_for_update(&self) -> bool {
        false
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_tsql(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_tsql(dt)
    }
}
