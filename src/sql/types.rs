//! SQL data types for CAST targets and column definitions.
//!
//! The SQL-level DataType provides precise control over:
//! - Integer sizes (Int8, Int16, Int32, Int64) and MySQL's SIGNED/UNSIGNED cast targets
//! - Floating point sizes (Float32, Float64)
//! - Decimal precision and scale
//! - String length constraints (Char, Varchar), optional for CAST
//! - Time types with and without timezone
//! - Binary, JSON, and UUID types
//!
//! `Display` gives the generic spelling; each dialect may spell a type its
//! own way through [`SqlDialect::emit_data_type`](super::dialect::SqlDialect::emit_data_type).

use std::fmt;

/// SQL data type.
///
/// # Examples
///
/// ```
/// use querycraft::sql::types::DataType;
///
/// assert_eq!(DataType::Decimal(10, 2).to_string(), "DECIMAL(10,2)");
/// assert_eq!(DataType::Varchar(None).to_string(), "VARCHAR");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DataType {
    Bool,

    /// 8-bit signed integer (TINYINT in most databases).
    Int8,

    /// 16-bit signed integer (SMALLINT).
    Int16,

    /// 32-bit signed integer (INT/INTEGER).
    Int32,

    /// 64-bit signed integer (BIGINT).
    Int64,

    /// MySQL cast target `SIGNED`.
    Signed,

    /// MySQL cast target `UNSIGNED`.
    Unsigned,

    /// 32-bit floating point (REAL/FLOAT4).
    Float32,

    /// 64-bit floating point (DOUBLE PRECISION/FLOAT8).
    Float64,

    /// Fixed-precision decimal: precision, then scale.
    Decimal(u8, u8),

    /// Variable-length string (TEXT, VARCHAR without limit).
    String,

    /// Fixed-length character string, length optional.
    Char(Option<u16>),

    /// Variable-length character string, maximum length optional.
    Varchar(Option<u16>),

    Date,

    Time,

    /// Timestamp without timezone.
    Timestamp,

    /// Timestamp with timezone.
    TimestampTz,

    /// Binary data (BLOB, BYTEA, VARBINARY).
    Binary,

    Json,

    Uuid,
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataType::Bool => write!(f, "BOOLEAN"),
            DataType::Int8 => write!(f, "TINYINT"),
            DataType::Int16 => write!(f, "SMALLINT"),
            DataType::Int32 => write!(f, "INTEGER"),
            DataType::Int64 => write!(f, "BIGINT"),
            DataType::Signed => write!(f, "SIGNED"),
            DataType::Unsigned => write!(f, "UNSIGNED"),
            DataType::Float32 => write!(f, "REAL"),
            DataType::Float64 => write!(f, "DOUBLE PRECISION"),
            DataType::Decimal(p, s) => write!(f, "DECIMAL({},{})", p, s),
            DataType::String => write!(f, "TEXT"),
            DataType::Char(n) => write_sized(f, "CHAR", *n),
            DataType::Varchar(n) => write_sized(f, "VARCHAR", *n),
            DataType::Date => write!(f, "DATE"),
            DataType::Time => write!(f, "TIME"),
            DataType::Timestamp => write!(f, "TIMESTAMP"),
            DataType::TimestampTz => write!(f, "TIMESTAMP WITH TIME ZONE"),
            DataType::Binary => write!(f, "BINARY"),
            DataType::Json => write!(f, "JSON"),
            DataType::Uuid => write!(f, "UUID"),
        }
    }
}

fn write_sized(f: &mut fmt::Formatter<'_>, name: &str, len: Option<u16>) -> fmt::Result {
    match len {
        Some(n) => write!(f, "{}({})", name, n),
        None => write!(f, "{}", name),
    }
}
