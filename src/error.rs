//! Error types for query building and rendering.
//!
//! Every error here is a programmer error: an invalid builder state, a
//! wrong function arity, or a feature the target dialect cannot express.
//! They are raised at the call that introduces the problem whenever that
//! call has enough context, otherwise at render time.

use thiserror::Error;

/// Errors raised while building or rendering a query.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    /// Invalid builder state transition or clause combination.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A function was called with the wrong number of arguments.
    #[error("function {name} expects {expected} argument(s), got {actual}")]
    FunctionArity {
        name: String,
        expected: String,
        actual: usize,
    },

    /// A CASE expression has no WHEN branch.
    #[error("case error: CASE statement requires at least one WHEN clause")]
    Case,

    /// A builder method was used with a value or term it cannot accept.
    #[error("usage error: {0}")]
    Usage(String),

    /// GROUP BY modifiers or window frames requested in an invalid order.
    #[error("grouping error: {0}")]
    Grouping(String),

    /// A join criterion references tables that are not part of the query.
    #[error("join error: {0}")]
    Join(String),

    /// The queries of a set operation do not line up.
    #[error("set operation error: {0}")]
    SetOperation(String),

    /// The dialect has no way to express the requested feature.
    #[error("{feature} is not supported by the {dialect} dialect")]
    Unsupported {
        dialect: &'static str,
        feature: String,
    },

    /// No function is registered under the given name.
    #[error("unknown function: {0}")]
    UnknownFunction(String),

    /// No filter operator is registered under the given name.
    #[error("unknown filter: {0}")]
    UnknownFilter(String),
}

impl QueryError {
    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        QueryError::Configuration(message.into())
    }

    /// Create a usage error.
    pub fn usage(message: impl Into<String>) -> Self {
        QueryError::Usage(message.into())
    }

    /// Create a grouping error.
    pub fn grouping(message: impl Into<String>) -> Self {
        QueryError::Grouping(message.into())
    }

    /// Create an unsupported-feature error for a dialect.
    pub fn unsupported(dialect: &'static str, feature: impl Into<String>) -> Self {
        QueryError::Unsupported {
            dialect,
            feature: feature.into(),
        }
    }

    /// Create an arity error.
    pub fn arity(name: impl Into<String>, expected: impl Into<String>, actual: usize) -> Self {
        QueryError::FunctionArity {
            name: name.into(),
            expected: expected.into(),
            actual,
        }
    }
}

/// Result type for query building and rendering.
pub type Result<T> = std::result::Result<T, QueryError>;
