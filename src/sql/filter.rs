//! Named filter operators.
//!
//! Logical operators whose SQL spelling differs per dialect. The dialect
//! decides the spelling through [`SqlDialect::filter_syntax`]; a `None`
//! there means the operator cannot be expressed.
//!
//! | Operator | PostgreSQL | MySQL |
//! |----------|-----------|-------|
//! | `contains` | `a@>b` | `JSON_CONTAINS(a,b)` |
//! | `contained_by` | `a<@b` | `JSON_CONTAINS(b,a)` |
//! | `search` | `TO_TSVECTOR(a) @@ PLAINTO_TSQUERY(b)` | `MATCH(a) AGAINST (b)` |
//! | `posix_regex` | `a~b` | `a REGEXP b` |
//!
//! [`SqlDialect::filter_syntax`]: super::dialect::SqlDialect::filter_syntax

use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

/// A named, dialect-dependent filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FilterOp {
    Contains,
    ContainedBy,
    Search,
    PosixRegex,
}

impl FilterOp {
    pub fn name(&self) -> &'static str {
        match self {
            FilterOp::Contains => "contains",
            FilterOp::ContainedBy => "contained_by",
            FilterOp::Search => "search",
            FilterOp::PosixRegex => "posix_regex",
        }
    }
}

impl fmt::Display for FilterOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for FilterOp {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contains" => Ok(FilterOp::Contains),
            "contained_by" => Ok(FilterOp::ContainedBy),
            "search" => Ok(FilterOp::Search),
            "posix_regex" => Ok(FilterOp::PosixRegex),
            other => Err(QueryError::UnknownFilter(other.to_string())),
        }
    }
}

/// How a dialect spells a [`FilterOp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterSyntax {
    /// Infix operator without spaces, e.g. `a@>b`.
    Operator(&'static str),
    /// Two-argument function; `value_first` swaps the arguments.
    Function {
        name: &'static str,
        value_first: bool,
    },
    /// MySQL `MATCH(a) AGAINST (b)`.
    MatchAgainst,
    /// PostgreSQL `TO_TSVECTOR(a) @@ PLAINTO_TSQUERY(b)`.
    FullText,
    /// The dialect's regular-expression match.
    Regex,
}
