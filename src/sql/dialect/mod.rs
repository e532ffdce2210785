//! SQL Dialect definitions and formatting rules.
//!
//! This module provides a trait-based abstraction for SQL dialect differences.
//! Each dialect implements `SqlDialect` to describe its capabilities; the one
//! concrete query builder consults those hooks while rendering:
//!
//! - Identifier quoting: `"` (ANSI/PG/SQLite/MSSQL), `` ` `` (MySQL), none (Oracle)
//! - Pagination: LIMIT/OFFSET vs OFFSET ... FETCH NEXT
//! - Literal encoding: booleans, string escapes, JSON text
//! - Upserts: ON CONFLICT vs ON DUPLICATE KEY UPDATE
//! - Interval quoting, ARRAY literals, regex operators, ILIKE
//!
//! # Usage
//!
//! ```
//! use querycraft::sql::dialect::{Dialect, SqlDialect};
//!
//! let dialect = Dialect::MySql;
//! assert_eq!(dialect.quote_char(), Some('`'));
//! ```
//!
//! | Feature | PostgreSQL | MySQL | SQLite | MSSQL | Oracle |
//! |---------|-----------|-------|--------|-------|--------|
//! | RETURNING | ✓ | ❌ | ❌ | ❌ | ❌ |
//! | ON CONFLICT | ✓ | ❌ | ✓ | ❌ | ❌ |
//! | ON DUPLICATE KEY | ❌ | ✓ | ❌ | ❌ | ❌ |
//! | DISTINCT ON | ✓ | ❌ | ❌ | ❌ | ❌ |
//! | TOP | ❌ | ❌ | ❌ | ✓ | ❌ |
//! | Native ILIKE | ✓ | ❌ | ❌ | ❌ | ❌ |
//! | GROUP BY alias | ✓ | ✓ | ✓ | ❌ | ❌ |
//! | FOR UPDATE | ✓ | ✓ | ❌ | ❌ | ✓ |

mod ansi;
pub mod helpers;
mod mssql;
mod mysql;
mod oracle;
mod postgres;
mod redshift;
mod sqlite;

pub use ansi::Ansi;
pub use mssql::MsSql;
pub use mysql::MySql;
pub use oracle::Oracle;
pub use postgres::Postgres;
pub use redshift::Redshift;
pub use sqlite::Sqlite;

use std::fmt;
use std::str::FromStr;

use super::filter::{FilterOp, FilterSyntax};
use super::token::TokenStream;
use super::types::DataType;
use super::value::Value;

/// How a dialect expresses INSERT conflict handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertStyle {
    /// `ON CONFLICT (...) DO NOTHING | DO UPDATE SET ...`
    OnConflict,
    /// `ON DUPLICATE KEY UPDATE ...`
    OnDuplicateKey,
    Unsupported,
}

/// How a dialect spells a regular-expression match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegexSyntax {
    /// Infix operator and its negated form, e.g. `~` / `!~`.
    Operator {
        matches: &'static str,
        not_matches: &'static str,
    },
    /// Predicate function, e.g. `REGEXP_LIKE(x, pattern)`.
    Function(&'static str),
    Unsupported,
}

/// Where the quotes go in an INTERVAL literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntervalStyle {
    /// `INTERVAL '1 DAY'`
    QuoteAll,
    /// `INTERVAL '1' DAY`
    QuoteValue,
}

/// How ROLLUP is attached to GROUP BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RollupStyle {
    /// `GROUP BY ROLLUP(a,b)`
    Function,
    /// `GROUP BY a,b WITH ROLLUP`
    WithRollup,
}

/// SQL dialect trait - defines how SQL constructs are rendered.
///
/// Implementations handle dialect-specific syntax differences.
/// The default implementations follow the generic (ANSI-flavoured) rules.
pub trait SqlDialect: fmt::Debug {
    /// Dialect name for display/logging.
    fn name(&self) -> &'static str;

    // =========================================================================
    // Identifier and Literal Quoting
    // =========================================================================

    /// Quote character for identifiers, `None` for bare identifiers.
    fn quote_char(&self) -> Option<char> {
        Some('"')
    }

    /// Quote character for aliases. Defaults to the identifier quote.
    fn alias_quote_char(&self) -> Option<char> {
        self.quote_char()
    }

    /// Quote a string literal.
    ///
    /// All dialects use single quotes with `''` for escaping.
    /// MySQL additionally escapes backslashes; MSSQL prefixes `N` for Unicode.
    fn quote_string(&self, s: &str) -> String {
        helpers::quote_string_single(s)
    }

    /// Format a boolean literal.
    ///
    /// - PostgreSQL/MySQL: `true`/`false`
    /// - SQLite/MSSQL/Oracle: `1`/`0`
    fn format_bool(&self, b: bool) -> &'static str;

    /// Format a JSON document literal.
    fn format_json(&self, json: &serde_json::Value) -> String {
        self.quote_string(&json.to_string())
    }

    /// Encode a literal value. This is the value wrapper of the dialect.
    fn format_value(&self, value: &Value) -> String {
        match value {
            Value::Int(n) => n.to_string(),
            Value::Float(f) => helpers::format_float(*f),
            Value::Str(s) => self.quote_string(s),
            Value::Bool(b) => self.format_bool(*b).into(),
            Value::Uuid(u) => self.quote_string(&u.to_string()),
            Value::Json(j) => self.format_json(j),
            Value::Date(_) | Value::Time(_) | Value::DateTime(_) | Value::Timestamp(_) => {
                self.quote_string(&value.iso_format().unwrap_or_default())
            }
        }
    }

    // =========================================================================
    // Pagination
    // =========================================================================

    /// Emit LIMIT/OFFSET or equivalent pagination clause, with leading spaces.
    ///
    /// - Default: ` LIMIT n OFFSET m`, offset omitted when zero
    /// - MSSQL/Oracle: ` OFFSET m ROWS FETCH NEXT n ROWS ONLY` (override)
    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        helpers::emit_limit_offset_standard(limit, offset)
    }

    /// Whether this dialect requires ORDER BY for OFFSET/FETCH.
    ///
    /// MSSQL requires ORDER BY when using OFFSET FETCH.
    fn requires_order_by_for_offset(&self) -> bool {
        false
    }

    /// Whether TOP (n) is available in SELECT.
    fn supports_top(&self) -> bool {
        false
    }

    // =========================================================================
    // GROUP BY / ORDER BY
    // =========================================================================

    /// Whether GROUP BY may refer to a select-list alias.
    ///
    /// MSSQL and Oracle reject aliases in GROUP BY.
    fn supports_groupby_alias(&self) -> bool {
        true
    }

    fn rollup_style(&self) -> RollupStyle {
        RollupStyle::Function
    }

    // =========================================================================
    // CTE and Set Operations
    // =========================================================================

    /// Whether to emit RECURSIVE keyword for recursive CTEs.
    ///
    /// MSSQL and Oracle omit the RECURSIVE keyword.
    fn emit_recursive_keyword(&self) -> bool {
        true
    }

    /// Whether each query of a UNION/INTERSECT/... is wrapped in parentheses.
    fn wraps_set_operation_queries(&self) -> bool {
        true
    }

    // =========================================================================
    // Predicates
    // =========================================================================

    /// Whether ILIKE is native. Otherwise it is rewritten as
    /// `UPPER(CAST(x AS <text>)) LIKE UPPER(pattern)`.
    fn supports_ilike(&self) -> bool {
        false
    }

    /// Type used when casting to text for case-insensitive matching.
    fn text_cast_type(&self) -> &'static str {
        "VARCHAR"
    }

    fn regex_syntax(&self) -> RegexSyntax {
        RegexSyntax::Operator {
            matches: "REGEXP",
            not_matches: "NOT REGEXP",
        }
    }

    fn supports_glob(&self) -> bool {
        false
    }

    /// Whether the JSON/JSONB operators (`->`, `@>`, `?`, ...) are available.
    fn supports_json_operators(&self) -> bool {
        false
    }

    /// How a named filter operator is expressed, `None` if unsupported.
    ///
    /// `posix_regex` falls back to [`SqlDialect::regex_syntax`].
    fn filter_syntax(&self, op: FilterOp) -> Option<FilterSyntax> {
        match op {
            FilterOp::PosixRegex => Some(FilterSyntax::Regex),
            _ => None,
        }
    }

    // =========================================================================
    // Literals
    // =========================================================================

    fn interval_style(&self) -> IntervalStyle {
        IntervalStyle::QuoteAll
    }

    /// Keyword placed before `[...]` array literals.
    fn array_prefix(&self) -> Option<&'static str> {
        None
    }

    // =========================================================================
    // DML
    // =========================================================================

    /// Whether RETURNING is available on INSERT/UPDATE/DELETE.
    fn supports_returning(&self) -> bool {
        false
    }

    fn upsert_style(&self) -> UpsertStyle {
        UpsertStyle::Unsupported
    }

    /// Whether `REPLACE INTO` is available.
    fn supports_replace(&self) -> bool {
        false
    }

    /// Whether `INSERT OR REPLACE INTO` is available.
    fn supports_insert_or_replace(&self) -> bool {
        false
    }

    /// Keyword placed between INSERT and INTO to skip conflicting rows,
    /// e.g. `IGNORE` (MySQL) or `OR IGNORE` (SQLite).
    fn insert_ignore_keyword(&self) -> Option<&'static str> {
        None
    }

    /// Whether DISTINCT ON (...) is available.
    ///
    /// Only PostgreSQL supports this.
    fn supports_distinct_on(&self) -> bool {
        false
    }

    /// Whether SELECT ... FOR UPDATE is available.
    fn supports_for_update(&self) -> bool {
        true
    }

    // =========================================================================
    // Function Remapping
    // =========================================================================

    /// Remap a function name for this dialect.
    ///
    /// Returns `Some(new_name)` if the function should be remapped, `None` to keep original.
    fn remap_function(&self, name: &str) -> Option<&'static str> {
        let _ = name;
        None
    }

    // =========================================================================
    // DDL Support
    // =========================================================================

    /// Emit a data type for this dialect.
    fn emit_data_type(&self, dt: &DataType) -> String {
        helpers::emit_data_type_ansi(dt)
    }
}

/// Supported SQL dialects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dialect {
    /// Generic SQL, used by plain `Query`.
    #[default]
    Ansi,
    MySql,
    Postgres,
    Sqlite,
    MsSql,
    Oracle,
    Redshift,
}

impl Dialect {
    /// Get the dialect implementation.
    pub fn dialect(&self) -> &'static dyn SqlDialect {
        match self {
            Dialect::Ansi => &Ansi,
            Dialect::MySql => &MySql,
            Dialect::Postgres => &Postgres,
            Dialect::Sqlite => &Sqlite,
            Dialect::MsSql => &MsSql,
            Dialect::Oracle => &Oracle,
            Dialect::Redshift => &Redshift,
        }
    }

    /// All dialects, in declaration order.
    pub fn all() -> [Dialect; 7] {
        [
            Dialect::Ansi,
            Dialect::MySql,
            Dialect::Postgres,
            Dialect::Sqlite,
            Dialect::MsSql,
            Dialect::Oracle,
            Dialect::Redshift,
        ]
    }
}

// Implement SqlDialect for Dialect enum by delegating to concrete types
impl SqlDialect for Dialect {
    fn name(&self) -> &'static str {
        self.dialect().name()
    }

    fn quote_char(&self) -> Option<char> {
        self.dialect().quote_char()
    }

    fn alias_quote_char(&self) -> Option<char> {
        self.dialect().alias_quote_char()
    }

    fn quote_string(&self, s: &str) -> String {
        self.dialect().quote_string(s)
    }

    fn format_bool(&self, b: bool) -> &'static str {
        self.dialect().format_bool(b)
    }

    fn format_json(&self, json: &serde_json::Value) -> String {
        self.dialect().format_json(json)
    }

    fn format_value(&self, value: &Value) -> String {
        self.dialect().format_value(value)
    }

    fn emit_limit_offset(&self, limit: Option<u64>, offset: Option<u64>) -> TokenStream {
        self.dialect().emit_limit_offset(limit, offset)
    }

    fn requires_order_by_for_offset(&self) -> bool {
        self.dialect().requires_order_by_for_offset()
    }

    fn supports_top(&self) -> bool {
        self.dialect().supports_top()
    }

    fn supports_groupby_alias(&self) -> bool {
        self.dialect().supports_groupby_alias()
    }

    fn rollup_style(&self) -> RollupStyle {
        self.dialect().rollup_style()
    }

    fn emit_recursive_keyword(&self) -> bool {
        self.dialect().emit_recursive_keyword()
    }

    fn wraps_set_operation_queries(&self) -> bool {
        self.dialect().wraps_set_operation_queries()
    }

    fn supports_ilike(&self) -> bool {
        self.dialect().supports_ilike()
    }

    fn text_cast_type(&self) -> &'static str {
        self.dialect().text_cast_type()
    }

    fn regex_syntax(&self) -> RegexSyntax {
        self.dialect().regex_syntax()
    }

    fn supports_glob(&self) -> bool {
        self.dialect().supports_glob()
    }

    fn supports_json_operators(&self) -> bool {
        self.dialect().supports_json_operators()
    }

    fn filter_syntax(&self, op: FilterOp) -> Option<FilterSyntax> {
        self.dialect().filter_syntax(op)
    }

    fn interval_style(&self) -> IntervalStyle {
        self.dialect().interval_style()
    }

    fn array_prefix(&self) -> Option<&'static str> {
        self.dialect().array_prefix()
    }

    fn supports_returning(&self) -> bool {
        self.dialect().supports_returning()
    }

    fn upsert_style(&self) -> UpsertStyle {
        self.dialect().upsert_style()
    }

    fn supports_replace(&self) -> bool {
        self.dialect().supports_replace()
    }

    fn supports_insert_or_replace(&self) -> bool {
        self.dialect().supports_insert_or_replace()
    }

    fn insert_ignore_keyword(&self) -> Option<&'static str> {
        self.dialect().insert_ignore_keyword()
    }

    fn supports_distinct_on(&self) -> bool {
        self.dialect().supports_distinct_on()
    }

    fn supports_for_update(&self) -> bool {
        self.dialect().supports_for_update()
    }

    fn remap_function(&self, name: &str) -> Option<&'static str> {
        self.dialect().remap_function(name)
    }

    fn emit_data_type(&self, dt: &DataType) -> String {
        self.dialect().emit_data_type(dt)
    }
}

impl fmt::Display for Dialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Dialect {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ansi" | "generic" | "sql" => Ok(Dialect::Ansi),
            "mysql" | "mariadb" => Ok(Dialect::MySql),
            "postgres" | "postgresql" | "pg" => Ok(Dialect::Postgres),
            "sqlite" | "sqlite3" => Ok(Dialect::Sqlite),
            "mssql" | "sqlserver" | "tsql" => Ok(Dialect::MsSql),
            "oracle" => Ok(Dialect::Oracle),
            "redshift" => Ok(Dialect::Redshift),
            other => Err(format!("unknown dialect: {}", other)),
        }
    }
}
