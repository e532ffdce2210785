//! SQLite dialect.
//!
//! - Booleans are stored as `1`/`0`
//! - `LIMIT -1` stands in for "no limit" when only an offset is set
//! - ON CONFLICT upserts, `INSERT OR REPLACE`, `INSERT OR IGNORE`, `REPLACE INTO`
//! - GLOB and REGEXP predicates
//! - No row locking (FOR UPDATE)
//! - Unparenthesized queries in set operations

use super::helpers;
use super::{SqlDialect, UpsertStyle};
use crate::sql::token::TokenStream;
use crate::sql::types::DataType;

/// SQLite dialect.
#[derive(Debug, Clone, Copy)]
pub struct Sqlite;

impl SqlDialect for Sqlite {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn format_bool(&self, b: bool) -> &'static str {
        helpers::format_bool_numeric(b)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_required_limit(limit, offset, "-1")
    }

    fn wraps_set_operation_queries(&self) -> bool {
        false
    }

    fn supports_glob(&self) -> bool {
        true
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::OnConflict
    }

    fn supports_replace(&self) -> bool {
        true
    }

    fn supports_insert_or_replace(&self) -> bool {
        true
    }

    fn insert_ignore_keyword(&self) -> Option<&'static str> {
        Some("OR IGNORE")
    }

    fn supports_for_update(&self) -> bool {
        false
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        helpers::remap_function_sqlite(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_sqlite(dt)
    }
}
