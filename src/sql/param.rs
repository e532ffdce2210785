//! Parameter strategies.
//!
//! A [`Parameterizer`] intercepts literal values during serialization,
//! emits a placeholder in their place and records the value. One
//! parameterizer lives for one render call, so subqueries keep numbering
//! where the outer query left off.

use std::fmt;
use std::str::FromStr;

use super::value::Value;
use crate::error::{QueryError, Result};

/// Placeholder syntax understood by a driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamStyle {
    /// `?`
    Qmark,
    /// `:1`, `:2`, ...
    Numeric,
    /// `$1`, `$2`, ...
    Dollar,
    /// `:param1` or `:name`
    Named,
    /// `%s`
    Format,
    /// `%(param1)s` or `%(name)s`
    Pyformat,
}

impl ParamStyle {
    /// Whether bound values are keyed by name rather than position.
    pub fn is_named(&self) -> bool {
        matches!(self, ParamStyle::Named | ParamStyle::Pyformat)
    }
}

impl fmt::Display for ParamStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParamStyle::Qmark => "qmark",
            ParamStyle::Numeric => "numeric",
            ParamStyle::Dollar => "dollar",
            ParamStyle::Named => "named",
            ParamStyle::Format => "format",
            ParamStyle::Pyformat => "pyformat",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ParamStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "qmark" | "?" => Ok(ParamStyle::Qmark),
            "numeric" => Ok(ParamStyle::Numeric),
            "dollar" | "$" => Ok(ParamStyle::Dollar),
            "named" => Ok(ParamStyle::Named),
            "format" => Ok(ParamStyle::Format),
            "pyformat" => Ok(ParamStyle::Pyformat),
            other => Err(format!("unknown parameter style: {}", other)),
        }
    }
}

/// Values collected by a [`Parameterizer`], shaped by its style.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundParams {
    /// Values in placeholder order.
    Positional(Vec<Value>),
    /// Name/value pairs in first-seen order.
    Named(Vec<(String, Value)>),
}

impl BoundParams {
    pub fn len(&self) -> usize {
        match self {
            BoundParams::Positional(values) => values.len(),
            BoundParams::Named(pairs) => pairs.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Look up a named value.
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self {
            BoundParams::Positional(_) => None,
            BoundParams::Named(pairs) => pairs.iter().find(|(k, _)| k == name).map(|(_, v)| v),
        }
    }

    /// Values in order, discarding names.
    pub fn values(&self) -> Vec<&Value> {
        match self {
            BoundParams::Positional(values) => values.iter().collect(),
            BoundParams::Named(pairs) => pairs.iter().map(|(_, v)| v).collect(),
        }
    }
}

/// Placeholder generator and value sink for one render call.
#[derive(Debug, Clone)]
pub struct Parameterizer {
    style: ParamStyle,
    values: Vec<(String, Value)>,
}

impl Parameterizer {
    pub fn new(style: ParamStyle) -> Self {
        Self {
            style,
            values: Vec::new(),
        }
    }

    pub fn style(&self) -> ParamStyle {
        self.style
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Record `value` and return the placeholder that stands for it.
    ///
    /// Named styles reuse the placeholder of an already-bound name when the
    /// value matches, and reject the name when it does not. Generated names
    /// skip any name the caller bound first.
    pub fn placeholder(&mut self, name: Option<&str>, value: Value) -> Result<String> {
        let index = self.values.len() + 1;
        let key = match name {
            Some(n) => n.to_string(),
            None => self.next_generated_name(index),
        };

        if self.style.is_named() {
            if let Some((_, bound)) = self.values.iter().find(|(k, _)| *k == key) {
                if *bound != value {
                    return Err(QueryError::configuration(format!(
                        "parameter '{}' is already bound to a different value",
                        key
                    )));
                }
                return Ok(self.format(index, &key));
            }
        }

        let placeholder = self.format(index, &key);
        self.values.push((key, value));
        Ok(placeholder)
    }

    fn next_generated_name(&self, start: usize) -> String {
        let mut n = start;
        loop {
            let key = format!("param{}", n);
            if !self.values.iter().any(|(k, _)| *k == key) {
                return key;
            }
            n += 1;
        }
    }

    fn format(&self, index: usize, key: &str) -> String {
        match self.style {
            ParamStyle::Qmark => "?".into(),
            ParamStyle::Numeric => format!(":{}", index),
            ParamStyle::Dollar => format!("${}", index),
            ParamStyle::Named => format!(":{}", key),
            ParamStyle::Format => "%s".into(),
            ParamStyle::Pyformat => format!("%({})s", key),
        }
    }

    /// Consume the sink, returning the collected values.
    pub fn into_params(self) -> BoundParams {
        if self.style.is_named() {
            BoundParams::Named(self.values)
        } else {
            BoundParams::Positional(self.values.into_iter().map(|(_, v)| v).collect())
        }
    }
}
