//! SQL building and rendering.
//!
//! Builders accumulate clauses into plain values; rendering lowers them to
//! a token stream and serializes it for one dialect:
//!
//! - [`query`] - `Query` entry points and the SELECT builder
//! - [`join`], [`set_op`] - joins and UNION/INTERSECT/EXCEPT
//! - [`dml`] - INSERT, REPLACE, UPDATE, DELETE and upserts
//! - [`ddl`] - CREATE TABLE and DROP statements
//! - [`term`], [`criterion`], [`functions`], [`case`], [`window`] - expressions
//! - [`token`], [`render`], [`param`] - serialization and bound parameters
//! - [`dialect`] - per-engine rendering rules

pub mod case;
pub mod criterion;
pub mod ddl;
pub mod dialect;
pub mod dml;
pub mod filter;
pub mod functions;
pub mod interval;
pub mod join;
pub mod param;
pub mod query;
pub mod render;
pub mod set_op;
pub mod term;
pub mod token;
pub mod types;
pub mod value;
pub mod window;

#[cfg(test)]
pub mod test_utils;

// Re-export commonly used types at the sql module level
pub use case::Case;
pub use criterion::{Comparator, Criterion, InList, JsonOp, Logic, MatchOp};
pub use ddl::{Column, CreateTable, DropKind, DropQuery, ReferenceOption};
pub use dialect::{Dialect, SqlDialect};
pub use dml::InsertMode;
pub use filter::FilterOp;
pub use functions::{CustomFunction, DatePart, Function};
pub use interval::Interval;
pub use join::{Join, JoinType, Joiner};
pub use param::{BoundParams, ParamStyle, Parameterizer};
pub use query::{LockWait, Query, QueryBuilder, SelectItem, Selectable, Source};
pub use render::{Render, RenderOptions};
pub use set_op::{SetOpKind, SetOperation};
pub use term::{Aggregation, Namespace, Order, SourceId, Table, Term, TermExt};
pub use token::{Token, TokenStream};
pub use types::DataType;
pub use value::Value;
pub use window::{FrameBound, Window};
