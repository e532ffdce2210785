//! # querycraft
//!
//! A fluent SQL query builder that renders to multiple dialects.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │     Builders (Query, QueryBuilder, Term, Criterion)      │
//! │   SELECT / INSERT / UPDATE / DELETE / DDL / set ops      │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Render::to_tokens]
//! ┌─────────────────────────────────────────────────────────┐
//! │                    TokenStream                           │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [Serializer + SqlDialect]
//! ┌─────────────────────────────────────────────────────────┐
//! │        SQL text (+ bound parameters when requested)      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use querycraft::prelude::*;
//!
//! let customers = Table::new("customers");
//! let q = Query::from_(customers.clone())
//!     .select([customers.field("id"), customers.field("name")])
//!     .unwrap()
//!     .where_(customers.field("age").gt(18))
//!     .orderby(["name"], Order::Asc)
//!     .limit(10);
//!
//! assert_eq!(
//!     q.get_sql().unwrap(),
//!     "SELECT \"id\",\"name\" FROM \"customers\" WHERE \"age\">18 ORDER BY \"name\" ASC LIMIT 10"
//! );
//! ```

pub mod config;
pub mod error;
pub mod sql;

// Re-export SQL submodules at crate level for convenience
pub use sql::dialect;
pub use sql::query;
pub use sql::term;
pub use sql::token;

pub use error::{QueryError, Result};

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::error::QueryError;
    pub use crate::sql::case::Case;
    pub use crate::sql::criterion::Criterion;
    pub use crate::sql::ddl::{Column, CreateTable};
    pub use crate::sql::dialect::{Dialect, SqlDialect};
    pub use crate::sql::functions::{self, CustomFunction, DatePart};
    pub use crate::sql::interval::Interval;
    pub use crate::sql::join::JoinType;
    pub use crate::sql::param::{BoundParams, ParamStyle};
    pub use crate::sql::query::{Query, QueryBuilder};
    pub use crate::sql::render::{Render, RenderOptions};
    pub use crate::sql::set_op::SetOperation;
    pub use crate::sql::term::{Order, Table, Term, TermExt};
    pub use crate::sql::types::DataType;
    pub use crate::sql::value::Value;
    pub use crate::sql::window::{FrameBound, Window};
}

/// Build an insert row from heterogeneous values.
///
/// ```
/// use querycraft::{row, prelude::*};
///
/// let q = Query::into_table("abc").insert(row![1, "a", true]).unwrap();
/// assert_eq!(q.get_sql().unwrap(), "INSERT INTO \"abc\" VALUES (1,'a',true)");
/// ```
#[macro_export]
macro_rules! row {
    ($($value:expr),* $(,)?) => {
        vec![$($crate::sql::term::Term::from($value)),*]
    };
}
