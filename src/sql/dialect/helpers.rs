//! Shared helper functions for SQL dialect implementations.
//!
//! This module provides reusable building blocks that dialects can compose
//! to implement the `SqlDialect` trait with minimal duplication.

use super::super::token::{Token, TokenStream};
use super::super::types::DataType;

// =============================================================================
// String Quoting
// =============================================================================

/// Quote string with single quotes (standard SQL).
/// Used by: All dialects
pub fn quote_string_single(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// Quote string with single quotes, also escaping backslashes.
/// Used by: MySQL
pub fn quote_string_backslash(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''").replace('\\', "\\\\"))
}

/// Quote string with N prefix for Unicode.
/// Used by: MSSQL for non-ASCII strings
pub fn quote_string_unicode(s: &str) -> String {
    format!("N'{}'", s.replace('\'', "''"))
}

// =============================================================================
// Literal Formatting
// =============================================================================

/// Format boolean as literal true/false.
/// Used by: Ansi, Postgres, MySQL, Redshift
pub fn format_bool_literal(b: bool) -> &'static str {
    if b {
        "true"
    } else {
        "false"
    }
}

/// Format boolean as numeric 1/0.
/// Used by: SQLite, MSSQL, Oracle
pub fn format_bool_numeric(b: bool) -> &'static str {
    if b {
        "1"
    } else {
        "0"
    }
}

/// Shortest round-trip spelling of a float, always with a fractional part.
pub fn format_float(f: f64) -> String {
    let mut buf = ryu::Buffer::new();
    buf.format(f).to_string()
}

// =============================================================================
// Pagination
// =============================================================================

/// Integer token for a row count. Counts beyond `i64::MAX` saturate.
pub fn count_token(n: u64) -> Token {
    Token::LitInt(i64::try_from(n).unwrap_or(i64::MAX))
}

fn push_clause(ts: &mut TokenStream, keyword: Token, count: Token) {
    ts.space().push(keyword).space().push(count);
}

/// Emit ` LIMIT n OFFSET m` (standard SQL). A zero offset is omitted.
/// Used by: Ansi, Postgres, Redshift
pub fn emit_limit_offset_standard(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    if let Some(lim) = limit {
        push_clause(&mut ts, Token::Limit, count_token(lim));
    }
    if let Some(off) = offset.filter(|o| *o > 0) {
        push_clause(&mut ts, Token::Offset, count_token(off));
    }

    ts
}

/// Emit LIMIT/OFFSET, substituting `unbounded` for LIMIT when only an
/// offset is set, since these dialects reject a bare OFFSET.
/// Used by: MySQL (`18446744073709551615`), SQLite (`-1`)
pub fn emit_limit_offset_required_limit(
    limit: Option<u64>,
    offset: Option<u64>,
    unbounded: &str,
) -> TokenStream {
    let offset = offset.filter(|o| *o > 0);
    match (limit, offset) {
        (None, Some(off)) => {
            let mut ts = TokenStream::new();
            push_clause(&mut ts, Token::Limit, Token::Raw(unbounded.into()));
            push_clause(&mut ts, Token::Offset, count_token(off));
            ts
        }
        _ => emit_limit_offset_standard(limit, offset),
    }
}

/// Emit ` OFFSET m ROWS FETCH NEXT n ROWS ONLY`, always with an OFFSET.
/// Used by: MSSQL (requires ORDER BY)
pub fn emit_limit_offset_tsql(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();
    if limit.is_none() && offset.is_none() {
        return ts;
    }

    ts.space()
        .push(Token::Offset)
        .space()
        .push(count_token(offset.unwrap_or(0)))
        .space()
        .push(Token::Rows);

    if let Some(lim) = limit {
        emit_fetch_next(&mut ts, lim);
    }

    ts
}

/// Emit ` OFFSET m ROWS FETCH NEXT n ROWS ONLY`, OFFSET only when non-zero.
/// Used by: Oracle
pub fn emit_limit_offset_oracle(limit: Option<u64>, offset: Option<u64>) -> TokenStream {
    let mut ts = TokenStream::new();

    if let Some(off) = offset.filter(|o| *o > 0) {
        ts.space()
            .push(Token::Offset)
            .space()
            .push(count_token(off))
            .space()
            .push(Token::Rows);
    }
    if let Some(lim) = limit {
        emit_fetch_next(&mut ts, lim);
    }

    ts
}

fn emit_fetch_next(ts: &mut TokenStream, limit: u64) {
    ts.space()
        .push(Token::Fetch)
        .space()
        .push(Token::Next)
        .space()
        .push(count_token(limit))
        .space()
        .push(Token::Rows)
        .space()
        .push(Token::Only);
}

// =============================================================================
// Function Remapping
// =============================================================================

/// Remap functions for Postgres dialect.
pub fn remap_function_postgres(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "NVL" | "IFNULL" => Some("COALESCE"),
        "RAND" => Some("RANDOM"),
        "DATE_FORMAT" => Some("TO_CHAR"),
        _ => None,
    }
}

/// Remap functions for MySQL dialect.
pub fn remap_function_mysql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "NVL" => Some("IFNULL"),
        "TO_CHAR" => Some("DATE_FORMAT"),
        "RANDOM" => Some("RAND"),
        _ => None,
    }
}

/// Remap functions for SQLite dialect.
pub fn remap_function_sqlite(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "NVL" => Some("IFNULL"),
        "RAND" => Some("RANDOM"),
        "CHAR_LENGTH" => Some("LENGTH"),
        _ => None,
    }
}

/// Remap functions for MSSQL dialect.
pub fn remap_function_tsql(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "LENGTH" | "CHAR_LENGTH" => Some("LEN"),
        "SUBSTR" => Some("SUBSTRING"),
        "NOW" => Some("GETDATE"),
        "NVL" | "IFNULL" => Some("ISNULL"),
        "RANDOM" => Some("RAND"),
        _ => None,
    }
}

/// Remap functions for Oracle dialect.
pub fn remap_function_oracle(name: &str) -> Option<&'static str> {
    match name.to_uppercase().as_str() {
        "IFNULL" => Some("NVL"),
        "SUBSTRING" => Some("SUBSTR"),
        "CHAR_LENGTH" => Some("LENGTH"),
        _ => None,
    }
}

/// Remap functions for Redshift dialect.
/// Redshift is Postgres-based, so we delegate to Postgres remapping.
pub fn remap_function_redshift(name: &str) -> Option<&'static str> {
    remap_function_postgres(name)
}

// =============================================================================
// Data Type Emission
// =============================================================================

/// Emit data type for ANSI style.
/// Used by: Ansi, Redshift
pub fn emit_data_type_ansi(dt: &DataType) -> String {
    dt.to_string()
}

/// Emit data type for Postgres.
pub fn emit_data_type_postgres(dt: &DataType) -> String {
    match dt {
        DataType::Int8 => "SMALLINT".into(),
        DataType::Signed => "BIGINT".into(),
        DataType::Unsigned => "BIGINT".into(),
        DataType::Binary => "BYTEA".into(),
        DataType::Json => "JSONB".into(),
        other => other.to_string(),
    }
}

/// Emit data type for MySQL.
pub fn emit_data_type_mysql(dt: &DataType) -> String {
    match dt {
        DataType::Bool => "TINYINT(1)".into(),
        DataType::Int32 => "INT".into(),
        DataType::Float32 => "FLOAT".into(),
        DataType::Float64 => "DOUBLE".into(),
        DataType::Timestamp => "DATETIME".into(),
        DataType::TimestampTz => "TIMESTAMP".into(),
        DataType::Binary => "BLOB".into(),
        DataType::Uuid => "CHAR(36)".into(),
        other => other.to_string(),
    }
}

/// Emit data type for SQLite, using its storage classes.
pub fn emit_data_type_sqlite(dt: &DataType) -> String {
    match dt {
        DataType::Bool
        | DataType::Int8
        | DataType::Int16
        | DataType::Int32
        | DataType::Int64
        | DataType::Signed
        | DataType::Unsigned => "INTEGER".into(),
        DataType::Float32 | DataType::Float64 => "REAL".into(),
        DataType::Decimal(_, _) => "NUMERIC".into(),
        DataType::Binary => "BLOB".into(),
        _ => "TEXT".into(),
    }
}

/// Emit data type for MSSQL.
pub fn emit_data_type_tsql(dt: &DataType) -> String {
    match dt {
        DataType::Bool => "BIT".into(),
        DataType::Int32 | DataType::Signed => "INT".into(),
        DataType::Unsigned => "BIGINT".into(),
        DataType::Float64 => "FLOAT".into(),
        DataType::String | DataType::Json => "NVARCHAR(MAX)".into(),
        DataType::Varchar(Some(u16::MAX)) => "VARCHAR(MAX)".into(),
        DataType::Timestamp => "DATETIME2".into(),
        DataType::TimestampTz => "DATETIMEOFFSET".into(),
        DataType::Binary => "VARBINARY(MAX)".into(),
        DataType::Uuid => "UNIQUEIDENTIFIER".into(),
        other => other.to_string(),
    }
}

/// Emit data type for Oracle.
pub fn emit_data_type_oracle(dt: &DataType) -> String {
    match dt {
        DataType::Bool => "NUMBER(1)".into(),
        DataType::Int8 => "NUMBER(3)".into(),
        DataType::Int16 => "NUMBER(5)".into(),
        DataType::Int32 => "NUMBER(10)".into(),
        DataType::Int64 | DataType::Signed | DataType::Unsigned => "NUMBER(19)".into(),
        DataType::Float32 => "BINARY_FLOAT".into(),
        DataType::Float64 => "BINARY_DOUBLE".into(),
        DataType::Decimal(p, s) => format!("NUMBER({},{})", p, s),
        DataType::String | DataType::Json => "CLOB".into(),
        DataType::Varchar(Some(n)) => format!("VARCHAR2({})", n),
        DataType::Varchar(None) => "VARCHAR2(4000)".into(),
        DataType::Time => "TIMESTAMP".into(),
        DataType::Binary => "BLOB".into(),
        DataType::Uuid => "RAW(16)".into(),
        other => other.to_string(),
    }
}
