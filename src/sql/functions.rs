//! SQL function calls.
//!
//! Every builtin is a plain constructor returning a [`Term`], so calls nest
//! and compose with the rest of the term API:
//!
//! ```
//! use querycraft::sql::functions::{coalesce, sum};
//! use querycraft::sql::render::Render;
//! use querycraft::sql::term::Term;
//!
//! let t = coalesce([sum(Term::field("a")), Term::from(0)]);
//! assert_eq!(t.get_sql().unwrap(), "COALESCE(SUM(\"a\"),0)");
//! ```
//!
//! Functions known only by name go through [`call`], which checks arity
//! against the builtin registry, or through a [`CustomFunction`].

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;

use super::criterion::Criterion;
use super::render::{Render, RenderCtx};
use super::term::{tokens_of, Aggregation, Namespace, Node, Term};
use super::token::{Token, TokenStream};
use super::types::DataType;
use super::value::Value;
use super::window::WindowSpec;
use crate::error::{QueryError, Result};

// =============================================================================
// Function node
// =============================================================================

/// Date/time field for EXTRACT and date arithmetic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DatePart {
    Year,
    Quarter,
    Month,
    Week,
    Day,
    Hour,
    Minute,
    Second,
    Microsecond,
}

impl DatePart {
    pub fn name(self) -> &'static str {
        match self {
            DatePart::Year => "YEAR",
            DatePart::Quarter => "QUARTER",
            DatePart::Month => "MONTH",
            DatePart::Week => "WEEK",
            DatePart::Day => "DAY",
            DatePart::Hour => "HOUR",
            DatePart::Minute => "MINUTE",
            DatePart::Second => "SECOND",
            DatePart::Microsecond => "MICROSECOND",
        }
    }
}

impl fmt::Display for DatePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Call syntax of a function.
#[derive(Debug, Clone, PartialEq)]
pub enum FunctionForm {
    /// `NAME(a,b)`
    Call,
    /// `NAME` without parentheses (`CURRENT_DATE`).
    Bare,
    /// `CAST(x AS type)`
    Cast(DataType),
    /// `CONVERT(x USING charset)`
    Convert(String),
    /// `EXTRACT(part FROM x)`
    Extract(DatePart),
}

/// A function call with its modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct Function {
    pub(crate) name: String,
    pub(crate) args: Vec<Term>,
    pub(crate) form: FunctionForm,
    pub(crate) aggregate: bool,
    pub(crate) distinct: bool,
    pub(crate) filter: Option<Criterion>,
    pub(crate) ignore_nulls: bool,
    pub(crate) window: Option<WindowSpec>,
}

impl Function {
    /// Scalar function `NAME(args)`.
    pub fn new(name: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            name: name.into(),
            args,
            form: FunctionForm::Call,
            aggregate: false,
            distinct: false,
            filter: None,
            ignore_nulls: false,
            window: None,
        }
    }

    /// Aggregate function `NAME(args)`.
    pub fn aggregate(name: impl Into<String>, args: Vec<Term>) -> Self {
        Self {
            aggregate: true,
            ..Self::new(name, args)
        }
    }

    fn with_form(mut self, form: FunctionForm) -> Self {
        self.form = form;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn args(&self) -> &[Term] {
        &self.args
    }

    pub fn form(&self) -> &FunctionForm {
        &self.form
    }

    pub fn is_aggregate_function(&self) -> bool {
        self.aggregate
    }

    /// Aggregates are always definite; other functions take the
    /// aggregation of their arguments.
    pub fn aggregation(&self) -> Aggregation {
        if self.aggregate {
            Aggregation::Definite
        } else {
            Aggregation::resolve(self.args.iter().map(Term::aggregation))
        }
    }

    pub(crate) fn collect_namespaces<'a>(&'a self, out: &mut Vec<&'a Namespace>) {
        for arg in &self.args {
            arg.collect_namespaces(out);
        }
        if let Some(filter) = &self.filter {
            filter.collect_namespaces(out);
        }
        if let Some(window) = &self.window {
            window.collect_namespaces(out);
        }
    }

    fn first_arg(&self) -> Result<&Term> {
        self.args
            .first()
            .ok_or_else(|| QueryError::arity(self.name.clone(), "1", 0))
    }
}

impl Render for Function {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let nested = ctx.nested();
        let mut ts = TokenStream::new();

        match &self.form {
            FunctionForm::Bare => {
                ts.push(Token::FunctionName(self.name.clone()));
            }
            FunctionForm::Call => {
                ts.push(Token::FunctionName(self.name.clone())).lparen();
                if self.distinct {
                    ts.push(Token::Distinct).space();
                }
                ts.append_list(&tokens_of(&self.args, &nested)?);
                if self.ignore_nulls {
                    ts.space()
                        .push(Token::Ignore)
                        .space()
                        .push(Token::Raw("NULLS".into()));
                }
                ts.rparen();
            }
            FunctionForm::Cast(data_type) => {
                ts.push(Token::FunctionName(self.name.clone()))
                    .lparen()
                    .append(&self.first_arg()?.to_tokens(&nested)?)
                    .keyword(Token::As)
                    .push(Token::Raw(data_type.to_string()))
                    .rparen();
            }
            FunctionForm::Convert(charset) => {
                ts.push(Token::FunctionName(self.name.clone()))
                    .lparen()
                    .append(&self.first_arg()?.to_tokens(&nested)?)
                    .keyword(Token::Using)
                    .push(Token::Raw(charset.clone()))
                    .rparen();
            }
            FunctionForm::Extract(part) => {
                ts.push(Token::FunctionName(self.name.clone()))
                    .lparen()
                    .push(Token::Raw(part.name().into()))
                    .keyword(Token::From)
                    .append(&self.first_arg()?.to_tokens(&nested)?)
                    .rparen();
            }
        }

        if let Some(filter) = &self.filter {
            ts.space()
                .push(Token::Filter)
                .lparen()
                .push(Token::Where)
                .space()
                .append(&filter.to_tokens(&nested)?)
                .rparen();
        }

        if let Some(window) = &self.window {
            ts.space().append(&window.to_tokens(ctx)?);
        }

        Ok(ts)
    }

    fn statement_kind(&self) -> &'static str {
        "function"
    }
}

fn func(name: &str, args: Vec<Term>) -> Term {
    Function::new(name, args).into()
}

fn agg(name: &str, args: Vec<Term>) -> Term {
    Function::aggregate(name, args).into()
}

/// A `"*"` string argument means the star, as in `COUNT(*)`.
fn star_or_term(term: impl Into<Term>) -> Term {
    let term = term.into();
    match &term.node {
        Node::Value(Value::Str(s)) if s == "*" => Term::star(),
        _ => term,
    }
}

fn terms<I, T>(items: I) -> Vec<Term>
where
    I: IntoIterator<Item = T>,
    T: Into<Term>,
{
    items.into_iter().map(Into::into).collect()
}

// =============================================================================
// Registry
// =============================================================================

/// Accepted argument count of a builtin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Exact(usize),
    Between(usize, usize),
    AtLeast(usize),
}

impl Arity {
    pub fn accepts(self, n: usize) -> bool {
        match self {
            Arity::Exact(k) => n == k,
            Arity::Between(lo, hi) => (lo..=hi).contains(&n),
            Arity::AtLeast(k) => n >= k,
        }
    }
}

impl fmt::Display for Arity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arity::Exact(k) => write!(f, "{}", k),
            Arity::Between(lo, hi) => write!(f, "{} to {}", lo, hi),
            Arity::AtLeast(k) => write!(f, "at least {}", k),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Builtin {
    arity: Arity,
    aggregate: bool,
}

static REGISTRY: Lazy<HashMap<&'static str, Builtin>> = Lazy::new(|| {
    use Arity::*;

    let aggregates: &[(&str, Arity)] = &[
        ("COUNT", Exact(1)),
        ("SUM", Exact(1)),
        ("AVG", Exact(1)),
        ("MIN", Exact(1)),
        ("MAX", Exact(1)),
        ("STD", Exact(1)),
        ("STDDEV", Exact(1)),
        ("FIRST", Exact(1)),
        ("LAST", Exact(1)),
        ("MEDIAN", Exact(1)),
        ("ROW_NUMBER", Exact(0)),
        ("RANK", Exact(0)),
        ("DENSE_RANK", Exact(0)),
        ("PERCENT_RANK", Exact(0)),
        ("CUME_DIST", Exact(0)),
        ("NTILE", Exact(1)),
        ("FIRST_VALUE", Exact(1)),
        ("LAST_VALUE", Exact(1)),
        ("LAG", Between(1, 3)),
        ("LEAD", Between(1, 3)),
    ];
    let scalars: &[(&str, Arity)] = &[
        ("COALESCE", AtLeast(1)),
        ("IFNULL", Exact(2)),
        ("NULLIF", Exact(2)),
        ("NVL", Exact(2)),
        ("CONCAT", AtLeast(1)),
        ("UPPER", Exact(1)),
        ("LOWER", Exact(1)),
        ("LENGTH", Exact(1)),
        ("CHAR_LENGTH", Exact(1)),
        ("SUBSTRING", Between(2, 3)),
        ("TRIM", Exact(1)),
        ("REPLACE", Exact(3)),
        ("REVERSE", Exact(1)),
        ("ASCII", Exact(1)),
        ("BIN", Exact(1)),
        ("INSERT", Exact(4)),
        ("SPLIT_PART", Exact(3)),
        ("REGEXP_REPLACE", Between(3, 4)),
        ("ABS", Exact(1)),
        ("CEIL", Exact(1)),
        ("FLOOR", Exact(1)),
        ("ROUND", Between(1, 2)),
        ("SQRT", Exact(1)),
        ("SIGN", Exact(1)),
        ("EXP", Exact(1)),
        ("LN", Exact(1)),
        ("LOG", Exact(2)),
        ("POW", Exact(2)),
        ("MOD", Exact(2)),
        ("RAND", Between(0, 1)),
        ("NOW", Exact(0)),
        ("UTC_TIMESTAMP", Exact(0)),
        ("DATE", Exact(1)),
        ("TIMESTAMP", Between(1, 2)),
        ("DATEDIFF", Between(2, 3)),
        ("DATE_ADD", Exact(3)),
        ("TIMESTAMPADD", Exact(3)),
        ("TO_CHAR", Exact(2)),
        ("TO_DATE", Exact(2)),
    ];

    let mut map = HashMap::new();
    for (name, arity) in aggregates {
        map.insert(*name, Builtin { arity: *arity, aggregate: true });
    }
    for (name, arity) in scalars {
        map.insert(*name, Builtin { arity: *arity, aggregate: false });
    }
    map
});

/// Whether `name` is a registered builtin (case-insensitive).
pub fn is_builtin(name: &str) -> bool {
    REGISTRY.contains_key(name.to_uppercase().as_str())
}

/// Call a builtin by name, checking its arity.
///
/// ```
/// use querycraft::sql::functions::call;
/// use querycraft::sql::render::Render;
/// use querycraft::sql::term::Term;
///
/// let t = call("upper", vec![Term::field("name")]).unwrap();
/// assert_eq!(t.get_sql().unwrap(), "UPPER(\"name\")");
/// assert!(call("frobnicate", vec![]).is_err());
/// ```
pub fn call(name: &str, args: Vec<Term>) -> Result<Term> {
    let upper = name.to_uppercase();
    let builtin = REGISTRY
        .get(upper.as_str())
        .ok_or_else(|| QueryError::UnknownFunction(name.to_string()))?;
    if !builtin.arity.accepts(args.len()) {
        return Err(QueryError::arity(upper, builtin.arity.to_string(), args.len()));
    }
    let args = if upper == "COUNT" {
        args.into_iter().map(star_or_term).collect()
    } else {
        args
    };
    let f = if builtin.aggregate {
        Function::aggregate(upper, args)
    } else {
        Function::new(upper, args)
    };
    Ok(f.into())
}

/// A user-declared function with named parameters.
///
/// ```
/// use querycraft::sql::functions::CustomFunction;
/// use querycraft::sql::render::Render;
/// use querycraft::sql::term::Term;
///
/// let date_diff = CustomFunction::new("DATE_DIFF", ["interval", "start_date", "end_date"]);
/// let t = date_diff
///     .call(vec![Term::raw("day"), Term::field("a"), Term::field("b")])
///     .unwrap();
/// assert_eq!(t.get_sql().unwrap(), "DATE_DIFF(day,\"a\",\"b\")");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomFunction {
    name: String,
    params: Vec<String>,
    aggregate: bool,
}

impl CustomFunction {
    pub fn new<I, S>(name: impl Into<String>, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            params: params.into_iter().map(Into::into).collect(),
            aggregate: false,
        }
    }

    /// Mark calls of this function as aggregates.
    pub fn aggregate(mut self) -> Self {
        self.aggregate = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn call(&self, args: Vec<Term>) -> Result<Term> {
        if args.len() != self.params.len() {
            return Err(QueryError::arity(
                self.name.clone(),
                format!("{} ({})", self.params.len(), self.params.join(", ")),
                args.len(),
            ));
        }
        let f = if self.aggregate {
            Function::aggregate(self.name.clone(), args)
        } else {
            Function::new(self.name.clone(), args)
        };
        Ok(f.into())
    }
}

// =============================================================================
// Aggregates
// =============================================================================

/// `COUNT(x)`; `count("*")` gives `COUNT(*)`.
pub fn count(term: impl Into<Term>) -> Term {
    agg("COUNT", vec![star_or_term(term)])
}

pub fn sum(term: impl Into<Term>) -> Term {
    agg("SUM", vec![term.into()])
}

pub fn avg(term: impl Into<Term>) -> Term {
    agg("AVG", vec![term.into()])
}

pub fn min(term: impl Into<Term>) -> Term {
    agg("MIN", vec![term.into()])
}

pub fn max(term: impl Into<Term>) -> Term {
    agg("MAX", vec![term.into()])
}

pub fn std(term: impl Into<Term>) -> Term {
    agg("STD", vec![term.into()])
}

pub fn stddev(term: impl Into<Term>) -> Term {
    agg("STDDEV", vec![term.into()])
}

pub fn first(term: impl Into<Term>) -> Term {
    agg("FIRST", vec![term.into()])
}

pub fn last(term: impl Into<Term>) -> Term {
    agg("LAST", vec![term.into()])
}

// =============================================================================
// Analytic
// =============================================================================

pub fn row_number() -> Term {
    agg("ROW_NUMBER", vec![])
}

pub fn rank() -> Term {
    agg("RANK", vec![])
}

pub fn dense_rank() -> Term {
    agg("DENSE_RANK", vec![])
}

pub fn percent_rank() -> Term {
    agg("PERCENT_RANK", vec![])
}

pub fn cume_dist() -> Term {
    agg("CUME_DIST", vec![])
}

pub fn ntile(buckets: u32) -> Term {
    agg("NTILE", vec![Term::from(buckets)])
}

pub fn median(term: impl Into<Term>) -> Term {
    agg("MEDIAN", vec![term.into()])
}

pub fn first_value(term: impl Into<Term>) -> Term {
    agg("FIRST_VALUE", vec![term.into()])
}

pub fn last_value(term: impl Into<Term>) -> Term {
    agg("LAST_VALUE", vec![term.into()])
}

fn offset_args(term: Term, offset: Option<i64>, default: Option<Term>) -> Vec<Term> {
    let mut args = vec![term];
    match (offset, default) {
        (Some(n), Some(d)) => args.extend([Term::from(n), d]),
        (Some(n), None) => args.push(Term::from(n)),
        (None, Some(d)) => args.extend([Term::from(1), d]),
        (None, None) => {}
    }
    args
}

/// `LAG(x[,offset[,default]])`
pub fn lag(
    term: impl Into<Term>,
    offset: Option<i64>,
    default: Option<Term>,
) -> Term {
    agg("LAG", offset_args(term.into(), offset, default))
}

/// `LEAD(x[,offset[,default]])`
pub fn lead(
    term: impl Into<Term>,
    offset: Option<i64>,
    default: Option<Term>,
) -> Term {
    agg("LEAD", offset_args(term.into(), offset, default))
}

// =============================================================================
// NULL handling
// =============================================================================

pub fn coalesce<I, T>(items: I) -> Term
where
    I: IntoIterator<Item = T>,
    T: Into<Term>,
{
    func("COALESCE", terms(items))
}

/// `IFNULL(a,b)`, spelled COALESCE/ISNULL/NVL where the dialect requires.
pub fn if_null(term: impl Into<Term>, alt: impl Into<Term>) -> Term {
    func("IFNULL", vec![term.into(), alt.into()])
}

pub fn null_if(term: impl Into<Term>, other: impl Into<Term>) -> Term {
    func("NULLIF", vec![term.into(), other.into()])
}

pub fn nvl(term: impl Into<Term>, alt: impl Into<Term>) -> Term {
    func("NVL", vec![term.into(), alt.into()])
}

// =============================================================================
// Strings
// =============================================================================

pub fn concat<I, T>(parts: I) -> Term
where
    I: IntoIterator<Item = T>,
    T: Into<Term>,
{
    func("CONCAT", terms(parts))
}

pub fn upper(term: impl Into<Term>) -> Term {
    func("UPPER", vec![term.into()])
}

pub fn lower(term: impl Into<Term>) -> Term {
    func("LOWER", vec![term.into()])
}

pub fn length(term: impl Into<Term>) -> Term {
    func("LENGTH", vec![term.into()])
}

pub fn char_length(term: impl Into<Term>) -> Term {
    func("CHAR_LENGTH", vec![term.into()])
}

/// `SUBSTRING(x,start[,len])`
pub fn substring(term: impl Into<Term>, start: i64, len: Option<i64>) -> Term {
    let mut args = vec![term.into(), Term::from(start)];
    if let Some(n) = len {
        args.push(Term::from(n));
    }
    func("SUBSTRING", args)
}

pub fn trim(term: impl Into<Term>) -> Term {
    func("TRIM", vec![term.into()])
}

pub fn replace(term: impl Into<Term>, from: impl Into<Term>, to: impl Into<Term>) -> Term {
    func("REPLACE", vec![term.into(), from.into(), to.into()])
}

pub fn reverse(term: impl Into<Term>) -> Term {
    func("REVERSE", vec![term.into()])
}

pub fn ascii(term: impl Into<Term>) -> Term {
    func("ASCII", vec![term.into()])
}

pub fn bin(term: impl Into<Term>) -> Term {
    func("BIN", vec![term.into()])
}

/// MySQL `INSERT(str,pos,len,newstr)`.
pub fn insert(
    term: impl Into<Term>,
    start: impl Into<Term>,
    len: impl Into<Term>,
    new: impl Into<Term>,
) -> Term {
    func("INSERT", vec![term.into(), start.into(), len.into(), new.into()])
}

pub fn split_part(term: impl Into<Term>, delimiter: impl Into<Term>, index: i64) -> Term {
    func("SPLIT_PART", vec![term.into(), delimiter.into(), Term::from(index)])
}

pub fn regexp_replace(
    term: impl Into<Term>,
    pattern: impl Into<Term>,
    replacement: impl Into<Term>,
) -> Term {
    func(
        "REGEXP_REPLACE",
        vec![term.into(), pattern.into(), replacement.into()],
    )
}

// =============================================================================
// Math
// =============================================================================

pub fn abs(term: impl Into<Term>) -> Term {
    func("ABS", vec![term.into()])
}

pub fn ceil(term: impl Into<Term>) -> Term {
    func("CEIL", vec![term.into()])
}

pub fn floor(term: impl Into<Term>) -> Term {
    func("FLOOR", vec![term.into()])
}

/// `ROUND(x[,decimals])`
pub fn round(term: impl Into<Term>, decimals: Option<i64>) -> Term {
    let mut args = vec![term.into()];
    if let Some(d) = decimals {
        args.push(Term::from(d));
    }
    func("ROUND", args)
}

pub fn sqrt(term: impl Into<Term>) -> Term {
    func("SQRT", vec![term.into()])
}

pub fn sign(term: impl Into<Term>) -> Term {
    func("SIGN", vec![term.into()])
}

pub fn exp(term: impl Into<Term>) -> Term {
    func("EXP", vec![term.into()])
}

pub fn ln(term: impl Into<Term>) -> Term {
    func("LN", vec![term.into()])
}

/// `LOG(base,x)`
pub fn log(base: impl Into<Term>, term: impl Into<Term>) -> Term {
    func("LOG", vec![base.into(), term.into()])
}

/// `POW(x,exponent)`
pub fn pow(term: impl Into<Term>, exponent: impl Into<Term>) -> Term {
    func("POW", vec![term.into(), exponent.into()])
}

/// `MOD(x,modulus)`
pub fn modulo(term: impl Into<Term>, modulus: impl Into<Term>) -> Term {
    func("MOD", vec![term.into(), modulus.into()])
}

/// `RAND()` or `RAND(seed)`.
pub fn rand(seed: Option<i64>) -> Term {
    func("RAND", seed.map(Term::from).into_iter().collect())
}

// =============================================================================
// Date and time
// =============================================================================

pub fn now() -> Term {
    func("NOW", vec![])
}

pub fn utc_timestamp() -> Term {
    func("UTC_TIMESTAMP", vec![])
}

pub fn current_date() -> Term {
    Function::new("CURRENT_DATE", vec![])
        .with_form(FunctionForm::Bare)
        .into()
}

pub fn current_time() -> Term {
    Function::new("CURRENT_TIME", vec![])
        .with_form(FunctionForm::Bare)
        .into()
}

pub fn current_timestamp() -> Term {
    Function::new("CURRENT_TIMESTAMP", vec![])
        .with_form(FunctionForm::Bare)
        .into()
}

pub fn date(term: impl Into<Term>) -> Term {
    func("DATE", vec![term.into()])
}

pub fn timestamp(term: impl Into<Term>) -> Term {
    func("TIMESTAMP", vec![term.into()])
}

/// `DATE_ADD(part,n,x)`
pub fn date_add(part: DatePart, interval: i64, term: impl Into<Term>) -> Term {
    func(
        "DATE_ADD",
        vec![Term::raw(part.name()), Term::from(interval), term.into()],
    )
}

/// `TIMESTAMPADD(part,n,x)`
pub fn timestamp_add(part: DatePart, interval: i64, term: impl Into<Term>) -> Term {
    func(
        "TIMESTAMPADD",
        vec![Term::raw(part.name()), Term::from(interval), term.into()],
    )
}

/// `DATEDIFF(part,start,end)`
pub fn date_diff(part: DatePart, start: impl Into<Term>, end: impl Into<Term>) -> Term {
    func(
        "DATEDIFF",
        vec![Term::raw(part.name()), start.into(), end.into()],
    )
}

pub fn to_char(term: impl Into<Term>, format: impl Into<Term>) -> Term {
    func("TO_CHAR", vec![term.into(), format.into()])
}

pub fn to_date(term: impl Into<Term>, format: impl Into<Term>) -> Term {
    func("TO_DATE", vec![term.into(), format.into()])
}

/// `EXTRACT(part FROM x)`
pub fn extract(part: DatePart, term: impl Into<Term>) -> Term {
    Function::new("EXTRACT", vec![term.into()])
        .with_form(FunctionForm::Extract(part))
        .into()
}

// =============================================================================
// Conversion
// =============================================================================

/// `CAST(x AS type)`
pub fn cast(term: impl Into<Term>, data_type: DataType) -> Term {
    Function::new("CAST", vec![term.into()])
        .with_form(FunctionForm::Cast(data_type))
        .into()
}

/// `CONVERT(x USING charset)`
pub fn convert(term: impl Into<Term>, charset: impl Into<String>) -> Term {
    Function::new("CONVERT", vec![term.into()])
        .with_form(FunctionForm::Convert(charset.into()))
        .into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::dialect::Dialect;
    use crate::sql::render::RenderOptions;
    use crate::sql::term::TermExt;

    fn f(name: &str) -> Term {
        Term::field(name)
    }

    fn sql(t: Term) -> String {
        t.get_sql().unwrap()
    }

    fn sql_for(t: Term, dialect: Dialect) -> String {
        t.get_sql_with(&RenderOptions::new().dialect(dialect)).unwrap()
    }

    #[test]
    fn test_aggregates() {
        assert_eq!(sql(count("*")), "COUNT(*)");
        assert_eq!(sql(count(f("id")).distinct().unwrap()), "COUNT(DISTINCT \"id\")");
        assert_eq!(sql(sum(f("a") + f("b"))), "SUM(\"a\"+\"b\")");
        assert_eq!(sql(max(f("a")).as_("m")), "MAX(\"a\")");
    }

    #[test]
    fn test_filter_where() {
        let t = sum(f("amount")).filter_where(f("kind").eq("x")).unwrap();
        assert_eq!(sql(t), "SUM(\"amount\") FILTER(WHERE \"kind\"='x')");

        let t = sum(f("a"))
            .filter_where(f("x").gt(1))
            .unwrap()
            .filter_where(f("y").lt(2))
            .unwrap();
        assert_eq!(sql(t), "SUM(\"a\") FILTER(WHERE \"x\">1 AND \"y\"<2)");

        let err = upper(f("a")).filter_where(f("b").eq(1)).unwrap_err();
        assert!(matches!(err, QueryError::Usage(_)));
    }

    #[test]
    fn test_scalar_functions() {
        assert_eq!(sql(coalesce([f("a"), Term::from(0)])), "COALESCE(\"a\",0)");
        assert_eq!(sql(substring(f("s"), 1, Some(3))), "SUBSTRING(\"s\",1,3)");
        assert_eq!(sql(round(f("x"), None)), "ROUND(\"x\")");
        assert_eq!(sql(concat([f("a"), Term::from("-"), f("b")])), "CONCAT(\"a\",'-',\"b\")");
        assert_eq!(sql(date_add(DatePart::Day, 1, f("d"))), "DATE_ADD(DAY,1,\"d\")");
        assert_eq!(sql(rand(None)), "RAND()");
        assert_eq!(sql(rand(Some(7))), "RAND(7)");
    }

    #[test]
    fn test_special_forms() {
        assert_eq!(sql(cast(f("a"), DataType::Varchar(None))), "CAST(\"a\" AS VARCHAR)");
        assert_eq!(sql(cast(f("a"), DataType::Signed)), "CAST(\"a\" AS SIGNED)");
        assert_eq!(sql(convert(f("a"), "utf8")), "CONVERT(\"a\" USING utf8)");
        assert_eq!(sql(extract(DatePart::Year, f("d"))), "EXTRACT(YEAR FROM \"d\")");
        assert_eq!(sql(current_date()), "CURRENT_DATE");
        assert_eq!(sql(now()), "NOW()");
    }

    #[test]
    fn test_dialect_remapping() {
        assert_eq!(sql_for(length(f("a")), Dialect::MsSql), "LEN(\"a\")");
        assert_eq!(sql_for(if_null(f("a"), 0), Dialect::Postgres), "COALESCE(\"a\",0)");
        assert_eq!(sql_for(rand(None), Dialect::Postgres), "RANDOM()");
    }

    #[test]
    fn test_lag_lead_args() {
        assert_eq!(sql(lag(f("v"), None, None)), "LAG(\"v\")");
        assert_eq!(sql(lead(f("v"), Some(2), None)), "LEAD(\"v\",2)");
        assert_eq!(sql(lag(f("v"), None, Some(Term::from(0)))), "LAG(\"v\",1,0)");
    }

    #[test]
    fn test_aggregation_propagates() {
        assert_eq!(upper(f("a")).is_aggregate(), Some(false));
        assert_eq!(upper(sum(f("a"))).is_aggregate(), Some(true));
        assert_eq!(now().is_aggregate(), None);
        assert_eq!(coalesce([sum(f("a")), Term::from(0)]).is_aggregate(), Some(true));
    }

    #[test]
    fn test_registry_call() {
        assert_eq!(sql(call("count", vec![Term::from("*")]).unwrap()), "COUNT(*)");
        assert_eq!(call("sum", vec![f("a")]).unwrap().is_aggregate(), Some(true));

        let err = call("ABS", vec![]).unwrap_err();
        assert_eq!(err, QueryError::arity("ABS", "1", 0));

        let err = call("LAG", vec![]).unwrap_err();
        assert_eq!(err.to_string(), "function LAG expects 1 to 3 argument(s), got 0");

        assert_eq!(
            call("nope", vec![]).unwrap_err(),
            QueryError::UnknownFunction("nope".into())
        );
        assert!(is_builtin("coalesce"));
    }

    #[test]
    fn test_custom_function() {
        let my_sum = CustomFunction::new("MY_SUM", ["a"]).aggregate();
        let t = my_sum.call(vec![f("x")]).unwrap();
        assert_eq!(sql(t.clone()), "MY_SUM(\"x\")");
        assert_eq!(t.is_aggregate(), Some(true));

        let err = my_sum.call(vec![]).unwrap_err();
        assert!(matches!(err, QueryError::FunctionArity { actual: 0, .. }));
    }
}
