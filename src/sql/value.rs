//! Literal values.
//!
//! A [`Value`] is a dialect-agnostic literal. How it is spelled in SQL is
//! decided by the dialect's value wrapper at serialization time, or it is
//! replaced by a placeholder when a parameter strategy is active.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, SecondsFormat, Utc};
use uuid::Uuid;

/// A literal value that can appear in a statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Str(String),
    Bool(bool),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Timestamp(DateTime<FixedOffset>),
    Uuid(Uuid),
    Json(serde_json::Value),
}

impl Value {
    /// ISO-8601 text for temporal values, `None` for everything else.
    pub fn iso_format(&self) -> Option<String> {
        match self {
            Value::Date(d) => Some(d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => Some(t.to_string()),
            Value::DateTime(dt) => Some(format!("{}T{}", dt.date().format("%Y-%m-%d"), dt.time())),
            Value::Timestamp(ts) => Some(ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)),
            _ => None,
        }
    }

    /// Whether the value can be written as a SQL literal.
    ///
    /// NaN and infinities have no literal spelling.
    pub fn is_renderable(&self) -> bool {
        match self {
            Value::Float(f) => f.is_finite(),
            _ => true,
        }
    }
}

macro_rules! value_from_int {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(n: $t) -> Self {
                    Value::Int(i64::from(n))
                }
            }
        )*
    };
}

value_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(f: f32) -> Self {
        Value::Float(f64::from(f))
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Str(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Str(s)
    }
}

impl From<&String> for Value {
    fn from(s: &String) -> Self {
        Value::Str(s.clone())
    }
}

impl From<NaiveDate> for Value {
    fn from(d: NaiveDate) -> Self {
        Value::Date(d)
    }
}

impl From<NaiveTime> for Value {
    fn from(t: NaiveTime) -> Self {
        Value::Time(t)
    }
}

impl From<NaiveDateTime> for Value {
    fn from(dt: NaiveDateTime) -> Self {
        Value::DateTime(dt)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    fn from(ts: DateTime<FixedOffset>) -> Self {
        Value::Timestamp(ts)
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(ts: DateTime<Utc>) -> Self {
        Value::Timestamp(ts.fixed_offset())
    }
}

impl From<Uuid> for Value {
    fn from(u: Uuid) -> Self {
        Value::Uuid(u)
    }
}

impl From<serde_json::Value> for Value {
    fn from(j: serde_json::Value) -> Self {
        Value::Json(j)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iso_format() {
        let date = NaiveDate::from_ymd_opt(2020, 2, 1).unwrap();
        assert_eq!(Value::from(date).iso_format().unwrap(), "2020-02-01");

        let dt = date.and_hms_opt(10, 30, 0).unwrap();
        assert_eq!(Value::from(dt).iso_format().unwrap(), "2020-02-01T10:30:00");

        let ts = dt.and_utc();
        assert_eq!(
            Value::from(ts).iso_format().unwrap(),
            "2020-02-01T10:30:00+00:00"
        );

        assert!(Value::from(1).iso_format().is_none());
    }

    #[test]
    fn test_renderable() {
        assert!(Value::from(1.5).is_renderable());
        assert!(!Value::from(f64::NAN).is_renderable());
        assert!(!Value::from(f64::INFINITY).is_renderable());
    }
}
