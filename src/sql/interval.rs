//! INTERVAL literals.
//!
//! An interval spanning several units renders as one compound value whose
//! unit names the largest and smallest parts, e.g. `'1 1 DAY_HOUR'`.
//! Quarters and weeks cannot be mixed with other units.

use once_cell::sync::Lazy;
use regex::Regex;

use super::dialect::{Dialect, IntervalStyle, SqlDialect};
use super::render::{Render, RenderCtx};
use super::token::{Token, TokenStream};
use crate::error::Result;

/// Leading and trailing zero components of the compound value.
static TRIM_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(^0+\.)|(\.0+$)|(^[0\-.: ]+[\-: ])|([\-:. ][0\-.: ]+$)")
        .expect("interval trim pattern is valid")
});

/// A duration literal.
///
/// ```
/// use querycraft::sql::interval::Interval;
/// use querycraft::sql::render::Render;
///
/// assert_eq!(Interval::new().days(1).hours(1).get_sql().unwrap(), "INTERVAL '1 1 DAY_HOUR'");
/// assert_eq!(Interval::new().days(-1).get_sql().unwrap(), "INTERVAL '-1 DAY'");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Interval {
    years: i64,
    months: i64,
    days: i64,
    hours: i64,
    minutes: i64,
    seconds: i64,
    microseconds: i64,
    quarters: i64,
    weeks: i64,
    dialect: Option<Dialect>,
}

impl Interval {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn years(mut self, n: i64) -> Self {
        self.years = n;
        self
    }

    pub fn months(mut self, n: i64) -> Self {
        self.months = n;
        self
    }

    pub fn days(mut self, n: i64) -> Self {
        self.days = n;
        self
    }

    pub fn hours(mut self, n: i64) -> Self {
        self.hours = n;
        self
    }

    pub fn minutes(mut self, n: i64) -> Self {
        self.minutes = n;
        self
    }

    pub fn seconds(mut self, n: i64) -> Self {
        self.seconds = n;
        self
    }

    pub fn microseconds(mut self, n: i64) -> Self {
        self.microseconds = n;
        self
    }

    /// Quarters take precedence over every other unit.
    pub fn quarters(mut self, n: i64) -> Self {
        self.quarters = n;
        self
    }

    /// Weeks take precedence over every unit except quarters.
    pub fn weeks(mut self, n: i64) -> Self {
        self.weeks = n;
        self
    }

    /// Render with this dialect's quoting regardless of the statement's.
    pub fn for_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    fn units(&self) -> [(i64, &'static str); 7] {
        [
            (self.years, "YEAR"),
            (self.months, "MONTH"),
            (self.days, "DAY"),
            (self.hours, "HOUR"),
            (self.minutes, "MINUTE"),
            (self.seconds, "SECOND"),
            (self.microseconds, "MICROSECOND"),
        ]
    }

    /// The value and unit text, e.g. `("1 1", "DAY_HOUR")`.
    fn expr_and_unit(&self) -> (String, String) {
        if self.quarters != 0 {
            return (self.quarters.to_string(), "QUARTER".into());
        }
        if self.weeks != 0 {
            return (self.weeks.to_string(), "WEEK".into());
        }

        let units = self.units();
        let present: Vec<&(i64, &str)> = units.iter().filter(|(v, _)| *v != 0).collect();
        let (largest, smallest) = match (present.first(), present.last()) {
            (Some(l), Some(s)) => (**l, **s),
            _ => return ("0".into(), "DAY".into()),
        };

        if largest.1 == "MICROSECOND" {
            return (self.microseconds.to_string(), "MICROSECOND".into());
        }

        let full = format!(
            "{}-{}-{} {}:{}:{}.{}",
            self.years.abs(),
            self.months.abs(),
            self.days.abs(),
            self.hours.abs(),
            self.minutes.abs(),
            self.seconds.abs(),
            self.microseconds.abs()
        );
        let mut expr = TRIM_PATTERN.replace_all(&full, "").into_owned();
        if largest.0 < 0 {
            expr.insert(0, '-');
        }

        let unit = if largest.1 == smallest.1 {
            largest.1.to_string()
        } else {
            format!("{}_{}", largest.1, smallest.1)
        };
        (expr, unit)
    }
}

impl Render for Interval {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let dialect = self.dialect.unwrap_or(ctx.dialect);
        let (expr, unit) = self.expr_and_unit();
        let text = match dialect.interval_style() {
            IntervalStyle::QuoteAll => format!("INTERVAL '{} {}'", expr, unit),
            IntervalStyle::QuoteValue => format!("INTERVAL '{}' {}", expr, unit),
        };
        let mut ts = TokenStream::new();
        ts.push(Token::Raw(text));
        Ok(ts)
    }

    fn default_dialect(&self) -> Dialect {
        self.dialect.unwrap_or_default()
    }

    fn statement_kind(&self) -> &'static str {
        "interval"
    }
}
