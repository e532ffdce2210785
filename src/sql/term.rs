//! Term model - the nodes every statement is built from.
//!
//! A [`Term`] is an expression node plus an optional alias. The alias is
//! display-only: it is emitted at select-list and RETURNING positions and
//! stripped everywhere else, and it never takes part in equality.
//!
//! Builder methods live on the [`TermExt`] trait so that plain terms and
//! criteria share them; `+ - * / %` and unary `-`/`!` are available
//! through `std::ops`.

use std::ops::{Add, Div, Mul, Neg, Not, Range, RangeInclusive, Rem, Sub};
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use uuid::Uuid;

use super::case::Case;
use super::criterion::{Comparator, Criterion, InList, JsonOp, MatchOp};
use super::dialect::{Dialect, SqlDialect};
use super::filter::FilterOp;
use super::functions::{self, Function};
use super::interval::Interval;
use super::query::{QueryBuilder, SelectItem, Selectable};
use super::render::{Render, RenderCtx};
use super::set_op::SetOperation;
use super::token::{Token, TokenStream};
use super::value::Value;
use super::window::Window;
use crate::error::{QueryError, Result};

static NEXT_SOURCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a table instance or query value.
///
/// Equality of tables is by name; identity is what automatically
/// assigned aliases are keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

impl SourceId {
    pub(crate) fn next() -> Self {
        SourceId(NEXT_SOURCE_ID.fetch_add(1, Ordering::Relaxed))
    }
}

// =============================================================================
// Ordering and aggregation
// =============================================================================

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Order {
    Asc,
    Desc,
}

impl Order {
    pub(crate) fn token(self) -> Token {
        match self {
            Order::Asc => Token::Asc,
            Order::Desc => Token::Desc,
        }
    }
}

/// Whether an expression is an aggregate.
///
/// Constants are `Indefinite`: they fit either side of GROUP BY.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Aggregation {
    Definite,
    Indefinite,
    NonAggregate,
}

impl Aggregation {
    /// Combine the aggregation of sibling expressions.
    ///
    /// Indefinite parts are ignored; if nothing is left the result is
    /// Indefinite, otherwise Definite only when every part is.
    pub fn resolve(parts: impl IntoIterator<Item = Aggregation>) -> Aggregation {
        let mut seen = false;
        let mut all = true;
        for part in parts {
            match part {
                Aggregation::Indefinite => {}
                Aggregation::Definite => seen = true,
                Aggregation::NonAggregate => {
                    seen = true;
                    all = false;
                }
            }
        }
        match (seen, all) {
            (false, _) => Aggregation::Indefinite,
            (true, true) => Aggregation::Definite,
            (true, false) => Aggregation::NonAggregate,
        }
    }

    /// Definite wins, otherwise the right-hand side decides.
    pub fn or(self, other: Aggregation) -> Aggregation {
        match self {
            Aggregation::Definite => Aggregation::Definite,
            _ => other,
        }
    }

    /// `Some(true)` / `Some(false)`, or `None` when undeterminable.
    pub fn as_option(self) -> Option<bool> {
        match self {
            Aggregation::Definite => Some(true),
            Aggregation::NonAggregate => Some(false),
            Aggregation::Indefinite => None,
        }
    }
}

/// Infix arithmetic operators. `%` and `**` render as MOD/POW calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl ArithOp {
    fn token(self) -> Token {
        match self {
            ArithOp::Add => Token::Plus,
            ArithOp::Sub => Token::Minus,
            ArithOp::Mul => Token::Mul,
            ArithOp::Div => Token::Div,
        }
    }

    fn is_additive(self) -> bool {
        matches!(self, ArithOp::Add | ArithOp::Sub)
    }

    fn left_needs_parens(self, left: Option<ArithOp>) -> bool {
        match left {
            Some(l) => !self.is_additive() && l.is_additive(),
            None => false,
        }
    }

    fn right_needs_parens(self, right: Option<ArithOp>) -> bool {
        match right {
            None => false,
            Some(r) => match self {
                ArithOp::Add => false,
                ArithOp::Div => true,
                ArithOp::Sub | ArithOp::Mul => r.is_additive(),
            },
        }
    }
}

// =============================================================================
// Namespaces and tables
// =============================================================================

/// What a field or star is qualified by.
#[derive(Debug, Clone)]
pub enum Namespace {
    Table(Table),
    /// A subquery or set operation, by identity.
    Query { id: SourceId, alias: Option<String> },
    /// Unquoted prefix such as `EXCLUDED`.
    Raw(String),
}

impl PartialEq for Namespace {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Namespace::Table(a), Namespace::Table(b)) => a == b,
            (Namespace::Query { id: a, .. }, Namespace::Query { id: b, .. }) => a == b,
            (Namespace::Raw(a), Namespace::Raw(b)) => a == b,
            _ => false,
        }
    }
}

impl Namespace {
    /// Qualifier token for this namespace, or `None` when the field should
    /// stay bare.
    fn qualifier(&self, ctx: &RenderCtx) -> Option<Token> {
        match self {
            Namespace::Table(table) => {
                let alias = table
                    .alias
                    .as_deref()
                    .or_else(|| ctx.alias_of(table.id));
                match alias {
                    Some(a) => Some(Token::Ident(a.to_string())),
                    None if ctx.with_namespace => Some(Token::Ident(table.name.clone())),
                    None => None,
                }
            }
            Namespace::Query { id, alias } => alias
                .as_deref()
                .or_else(|| ctx.alias_of(*id))
                .map(|a| Token::Ident(a.to_string())),
            Namespace::Raw(prefix) => Some(Token::Raw(prefix.clone())),
        }
    }
}

/// A table reference, optionally schema-qualified and aliased.
///
/// Two tables are equal when their schema path and name match; each
/// instance still has its own identity.
///
/// # Examples
///
/// ```
/// use querycraft::sql::term::Table;
/// use querycraft::sql::render::Render;
///
/// let t = Table::new("abc").in_schema(["schema1"]).as_("a");
/// assert_eq!(t.get_sql().unwrap(), "\"schema1\".\"abc\" \"a\"");
/// ```
#[derive(Debug, Clone)]
pub struct Table {
    pub(crate) name: String,
    pub(crate) schema: Vec<String>,
    pub(crate) alias: Option<String>,
    pub(crate) dialect: Option<Dialect>,
    pub(crate) id: SourceId,
}

impl Table {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: Vec::new(),
            alias: None,
            dialect: None,
            id: SourceId::next(),
        }
    }

    /// Qualify with a schema path, outermost first (`["db", "dbo"]`).
    pub fn in_schema<I, S>(mut self, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.schema = path.into_iter().map(Into::into).collect();
        self
    }

    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Dialect used by queries started from this table.
    pub fn for_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Name fields are qualified with: the alias if set, else the name.
    pub fn table_name(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.name)
    }

    pub fn field(&self, name: impl Into<String>) -> Term {
        Term::new(Node::Field {
            name: name.into(),
            namespace: Some(Namespace::Table(self.clone())),
        })
    }

    /// `"table".*`
    pub fn star(&self) -> Term {
        Term::new(Node::Star(Some(Namespace::Table(self.clone()))))
    }

    fn query(&self) -> QueryBuilder {
        QueryBuilder::new(self.dialect.unwrap_or_default())
    }

    /// `SELECT ... FROM <self>`
    pub fn select<I, S>(&self, items: I) -> Result<QueryBuilder>
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        self.query().from_(self.clone()).select(items)
    }

    /// `UPDATE <self>`
    pub fn update(&self) -> QueryBuilder {
        self.query().update_target(self.clone())
    }

    /// `INSERT INTO <self> VALUES (...)`
    pub fn insert(&self, row: Vec<Term>) -> Result<QueryBuilder> {
        self.query().into_table(self.clone())?.insert(row)
    }
}

impl PartialEq for Table {
    fn eq(&self, other: &Self) -> bool {
        self.schema == other.schema && self.name == other.name
    }
}

impl Eq for Table {}

impl std::hash::Hash for Table {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.schema.hash(state);
        self.name.hash(state);
    }
}

impl Render for Table {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        for part in &self.schema {
            ts.push(Token::Ident(part.clone())).push(Token::Dot);
        }
        ts.push(Token::Ident(self.name.clone()));
        if let Some(alias) = &self.alias {
            ctx.push_alias(&mut ts, alias);
        }
        Ok(ts)
    }

    fn default_dialect(&self) -> Dialect {
        self.dialect.unwrap_or_default()
    }

    fn statement_kind(&self) -> &'static str {
        "table"
    }
}

impl From<&str> for Table {
    fn from(name: &str) -> Self {
        Table::new(name)
    }
}

impl From<String> for Table {
    fn from(name: String) -> Self {
        Table::new(name)
    }
}

// =============================================================================
// Terms
// =============================================================================

/// Expression node kinds.
///
/// Every variant must be handled in `Term::body_tokens()` - the compiler
/// enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Column reference, optionally qualified.
    Field {
        name: String,
        namespace: Option<Namespace>,
    },
    /// `*` or `"t".*`
    Star(Option<Namespace>),
    Value(Value),
    /// Literal with a parameter name for named placeholder styles.
    Bound { name: String, value: Value },
    Null,
    /// Caller-supplied placeholder (`?`, `:id`, `%s`), emitted verbatim.
    Parameter(String),
    /// Raw SQL. Never pass user input here.
    Raw(String),
    Tuple(Vec<Term>),
    Array(Vec<Term>),
    Interval(Interval),
    Arithmetic {
        op: ArithOp,
        left: Box<Term>,
        right: Box<Term>,
    },
    Negative(Box<Term>),
    Function(Box<Function>),
    Case(Box<Case>),
    Subquery(Box<Selectable>),
    Criterion(Box<Criterion>),
}

/// An expression with an optional display alias.
#[derive(Debug, Clone)]
pub struct Term {
    pub(crate) node: Node,
    pub(crate) alias: Option<String>,
}

impl PartialEq for Term {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Term {
    pub(crate) fn new(node: Node) -> Self {
        Self { node, alias: None }
    }

    /// Unqualified column reference.
    pub fn field(name: impl Into<String>) -> Self {
        Term::new(Node::Field {
            name: name.into(),
            namespace: None,
        })
    }

    pub fn qualified(namespace: Namespace, name: impl Into<String>) -> Self {
        Term::new(Node::Field {
            name: name.into(),
            namespace: Some(namespace),
        })
    }

    pub fn star() -> Self {
        Term::new(Node::Star(None))
    }

    pub fn value(value: impl Into<Value>) -> Self {
        Term::new(Node::Value(value.into()))
    }

    /// A literal bound under `name` by named placeholder styles.
    pub fn bind(name: impl Into<String>, value: impl Into<Value>) -> Self {
        Term::new(Node::Bound {
            name: name.into(),
            value: value.into(),
        })
    }

    /// `NULL`. Not a valid comparison operand: `eq`, `ne` and the ordering
    /// comparisons fail to render with it.
    pub fn null() -> Self {
        Term::new(Node::Null)
    }

    pub fn param(placeholder: impl Into<String>) -> Self {
        Term::new(Node::Parameter(placeholder.into()))
    }

    /// Raw SQL fragment. Never pass user input here.
    pub fn raw(sql: impl Into<String>) -> Self {
        Term::new(Node::Raw(sql.into()))
    }

    /// Unquoted pseudo column such as `ROWNUM` or `SYSDATE`.
    pub fn pseudo(name: impl Into<String>) -> Self {
        Term::new(Node::Raw(name.into()))
    }

    pub fn tuple<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        Term::new(Node::Tuple(items.into_iter().map(Into::into).collect()))
    }

    pub fn array<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        Term::new(Node::Array(items.into_iter().map(Into::into).collect()))
    }

    pub fn json(doc: serde_json::Value) -> Self {
        Term::new(Node::Value(Value::Json(doc)))
    }

    /// MySQL `VALUES("field")`, the incoming value inside ON DUPLICATE KEY UPDATE.
    pub fn values(field: impl Into<String>) -> Self {
        Function::new("VALUES", vec![Term::field(field)]).into()
    }

    /// `EXCLUDED."field"`, the incoming row inside ON CONFLICT DO UPDATE.
    pub fn excluded(field: impl Into<String>) -> Self {
        Term::qualified(Namespace::Raw("EXCLUDED".into()), field)
    }

    pub(crate) fn arithmetic(op: ArithOp, left: Term, right: Term) -> Self {
        Term::new(Node::Arithmetic {
            op,
            left: Box::new(left),
            right: Box::new(right),
        })
    }

    pub fn node(&self) -> &Node {
        &self.node
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Column name if this is a field.
    pub fn field_name(&self) -> Option<&str> {
        match &self.node {
            Node::Field { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_field(&self) -> bool {
        matches!(self.node, Node::Field { .. })
    }

    pub fn is_star(&self) -> bool {
        matches!(self.node, Node::Star(_))
    }

    pub(crate) fn namespace(&self) -> Option<&Namespace> {
        match &self.node {
            Node::Field { namespace, .. } => namespace.as_ref(),
            Node::Star(namespace) => namespace.as_ref(),
            _ => None,
        }
    }

    fn arith_op(&self) -> Option<ArithOp> {
        match &self.node {
            Node::Arithmetic { op, .. } => Some(*op),
            _ => None,
        }
    }

    pub fn aggregation(&self) -> Aggregation {
        match &self.node {
            Node::Field { .. } | Node::Star(_) => Aggregation::NonAggregate,
            Node::Value(_)
            | Node::Bound { .. }
            | Node::Null
            | Node::Parameter(_)
            | Node::Raw(_)
            | Node::Interval(_)
            | Node::Subquery(_) => Aggregation::Indefinite,
            Node::Tuple(items) | Node::Array(items) => {
                Aggregation::resolve(items.iter().map(Term::aggregation))
            }
            Node::Arithmetic { left, right, .. } => {
                Aggregation::resolve([left.aggregation(), right.aggregation()])
            }
            Node::Negative(inner) => inner.aggregation(),
            Node::Function(f) => f.aggregation(),
            Node::Case(c) => c.aggregation(),
            Node::Criterion(c) => c.aggregation(),
        }
    }

    /// `Some(true)` for aggregates, `Some(false)` for bare columns, `None`
    /// for constants.
    pub fn is_aggregate(&self) -> Option<bool> {
        self.aggregation().as_option()
    }

    /// Namespaces of every field in this expression, without descending
    /// into subqueries.
    pub fn namespaces(&self) -> Vec<&Namespace> {
        let mut out = Vec::new();
        self.collect_namespaces(&mut out);
        out
    }

    pub(crate) fn collect_namespaces<'a>(&'a self, out: &mut Vec<&'a Namespace>) {
        match &self.node {
            Node::Field { namespace, .. } | Node::Star(namespace) => {
                if let Some(ns) = namespace {
                    out.push(ns);
                }
            }
            Node::Tuple(items) | Node::Array(items) => {
                items.iter().for_each(|t| t.collect_namespaces(out))
            }
            Node::Arithmetic { left, right, .. } => {
                left.collect_namespaces(out);
                right.collect_namespaces(out);
            }
            Node::Negative(inner) => inner.collect_namespaces(out),
            Node::Function(f) => f.collect_namespaces(out),
            Node::Case(c) => c.collect_namespaces(out),
            Node::Criterion(c) => c.collect_namespaces(out),
            Node::Value(_)
            | Node::Bound { .. }
            | Node::Null
            | Node::Parameter(_)
            | Node::Raw(_)
            | Node::Interval(_)
            | Node::Subquery(_) => {}
        }
    }

    /// Tokens for the expression itself, without the alias.
    pub(crate) fn body_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        match &self.node {
            Node::Field { name, namespace } => {
                if let Some(q) = namespace.as_ref().and_then(|ns| ns.qualifier(ctx)) {
                    ts.push(q).push(Token::Dot);
                }
                ts.push(Token::Ident(name.clone()));
            }
            Node::Star(namespace) => {
                if let Some(q) = namespace.as_ref().and_then(|ns| ns.qualifier(ctx)) {
                    ts.push(q).push(Token::Dot);
                }
                ts.push(Token::Star);
            }
            Node::Value(value) => {
                ensure_renderable(value)?;
                ts.push(Token::Value(value.clone()));
            }
            Node::Bound { name, value } => {
                ensure_renderable(value)?;
                ts.push(Token::BoundValue {
                    name: name.clone(),
                    value: value.clone(),
                });
            }
            Node::Null => {
                ts.push(Token::Null);
            }
            Node::Parameter(p) => {
                ts.push(Token::Placeholder(p.clone()));
            }
            Node::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
            Node::Tuple(items) => {
                let items = tokens_of(items, &ctx.nested())?;
                ts.lparen().append_list(&items).rparen();
            }
            Node::Array(items) => {
                let prefix = ctx.dialect.array_prefix();
                if items.is_empty() && prefix.is_some() {
                    ts.push(Token::Raw("'{}'".into()));
                } else {
                    if let Some(p) = prefix {
                        ts.push(Token::Raw(p.into()));
                    }
                    let items = tokens_of(items, &ctx.nested())?;
                    ts.push(Token::LBracket)
                        .append_list(&items)
                        .push(Token::RBracket);
                }
            }
            Node::Interval(interval) => {
                ts.append(&interval.to_tokens(ctx)?);
            }
            Node::Arithmetic { op, left, right } => {
                let nested = ctx.nested();
                let l = left.to_tokens(&nested)?;
                let r = right.to_tokens(&nested)?;
                if op.left_needs_parens(left.arith_op()) {
                    ts.append_parens(&l);
                } else {
                    ts.append(&l);
                }
                ts.push(op.token());
                if op.right_needs_parens(right.arith_op()) {
                    ts.append_parens(&r);
                } else {
                    ts.append(&r);
                }
            }
            Node::Negative(inner) => {
                let body = inner.to_tokens(&ctx.nested())?;
                ts.push(Token::Minus);
                if matches!(inner.node, Node::Arithmetic { .. } | Node::Negative(_)) {
                    ts.append_parens(&body);
                } else {
                    ts.append(&body);
                }
            }
            Node::Function(f) => {
                ts.append(&f.to_tokens(&ctx.nested())?);
            }
            Node::Case(c) => {
                ts.append(&c.to_tokens(&ctx.nested())?);
            }
            Node::Subquery(sel) => {
                ts.append(&sel.to_tokens(&ctx.subquery(true).with_alias(false))?);
            }
            Node::Criterion(c) => {
                ts.append(&c.to_tokens(&ctx.nested())?);
            }
        }
        Ok(ts)
    }
}

fn ensure_renderable(value: &Value) -> Result<()> {
    if value.is_renderable() {
        Ok(())
    } else {
        Err(QueryError::usage(format!(
            "{:?} has no SQL literal form",
            value
        )))
    }
}

/// Render each term under `ctx`.
pub(crate) fn tokens_of(terms: &[Term], ctx: &RenderCtx) -> Result<Vec<TokenStream>> {
    terms.iter().map(|t| t.to_tokens(ctx)).collect()
}

impl Render for Term {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = self.body_tokens(ctx)?;
        if ctx.with_alias {
            if let Some(alias) = &self.alias {
                ctx.push_alias(&mut ts, alias);
            }
        }
        Ok(ts)
    }
}

// =============================================================================
// Builder trait
// =============================================================================

/// Key accepted by [`TermExt::get_item`]: a range becomes BETWEEN.
#[derive(Debug, Clone, PartialEq)]
pub enum SliceKey {
    Range(Term, Term),
    Index(Term),
}

impl<T: Into<Term>> From<Range<T>> for SliceKey {
    fn from(r: Range<T>) -> Self {
        SliceKey::Range(r.start.into(), r.end.into())
    }
}

impl<T: Into<Term>> From<RangeInclusive<T>> for SliceKey {
    fn from(r: RangeInclusive<T>) -> Self {
        let (start, end) = r.into_inner();
        SliceKey::Range(start.into(), end.into())
    }
}

impl From<i64> for SliceKey {
    fn from(n: i64) -> Self {
        SliceKey::Index(n.into())
    }
}

impl From<i32> for SliceKey {
    fn from(n: i32) -> Self {
        SliceKey::Index(n.into())
    }
}

impl From<&str> for SliceKey {
    fn from(s: &str) -> Self {
        SliceKey::Index(s.into())
    }
}

/// Extension trait for building criteria and derived terms.
///
/// Implemented for [`Term`] and [`Criterion`], so a criterion can itself
/// be compared, aliased or combined.
pub trait TermExt: Sized {
    fn into_term(self) -> Term;

    /// Set the display alias, replacing any previous one.
    fn as_(self, alias: impl Into<String>) -> Term {
        let mut term = self.into_term();
        term.alias = Some(alias.into());
        term
    }

    // === Comparison ===
    //
    // Comparisons stay infallible so criteria compose with `&` and `|`.
    // A `Term::null()` operand is rejected with `QueryError::Usage` when
    // the criterion is rendered; use `is_null()` instead.

    /// `a=b`
    fn eq(self, other: impl Into<Term>) -> Criterion {
        Criterion::compare(Comparator::Eq, self.into_term(), other.into())
    }

    /// `a<>b OR a IS NULL`: rows where the column is NULL also match.
    fn ne(self, other: impl Into<Term>) -> Criterion {
        let term = self.into_term();
        Criterion::compare(Comparator::Ne, term.clone(), other.into())
            .or_(Criterion::is_null(term))
    }

    /// Plain `a<>b`.
    fn ne_strict(self, other: impl Into<Term>) -> Criterion {
        Criterion::compare(Comparator::Ne, self.into_term(), other.into())
    }

    fn gt(self, other: impl Into<Term>) -> Criterion {
        Criterion::compare(Comparator::Gt, self.into_term(), other.into())
    }

    fn gte(self, other: impl Into<Term>) -> Criterion {
        Criterion::compare(Comparator::Gte, self.into_term(), other.into())
    }

    fn lt(self, other: impl Into<Term>) -> Criterion {
        Criterion::compare(Comparator::Lt, self.into_term(), other.into())
    }

    fn lte(self, other: impl Into<Term>) -> Criterion {
        Criterion::compare(Comparator::Lte, self.into_term(), other.into())
    }

    fn is_null(self) -> Criterion {
        Criterion::is_null(self.into_term())
    }

    fn is_not_null(self) -> Criterion {
        Criterion::IsNull {
            term: self.into_term(),
            negated: true,
        }
    }

    // === Membership and ranges ===

    fn isin(self, list: impl Into<InList>) -> Criterion {
        Criterion::In {
            term: self.into_term(),
            list: list.into(),
            negated: false,
        }
    }

    /// `a NOT IN (...) OR a IS NULL`
    fn not_in(self, list: impl Into<InList>) -> Criterion {
        let term = self.into_term();
        Criterion::In {
            term: term.clone(),
            list: list.into(),
            negated: true,
        }
        .or_(Criterion::is_null(term))
    }

    /// Plain `a NOT IN (...)`.
    fn not_in_strict(self, list: impl Into<InList>) -> Criterion {
        Criterion::In {
            term: self.into_term(),
            list: list.into(),
            negated: true,
        }
    }

    fn between(self, low: impl Into<Term>, high: impl Into<Term>) -> Criterion {
        Criterion::Between {
            term: self.into_term(),
            low: low.into(),
            high: high.into(),
            negated: false,
        }
    }

    fn not_between(self, low: impl Into<Term>, high: impl Into<Term>) -> Criterion {
        Criterion::Between {
            term: self.into_term(),
            low: low.into(),
            high: high.into(),
            negated: true,
        }
    }

    /// Slice sugar: `field.get_item(1..5)` is `field BETWEEN 1 AND 5`.
    fn get_item(self, key: impl Into<SliceKey>) -> Result<Criterion> {
        match key.into() {
            SliceKey::Range(low, high) => Ok(self.between(low, high)),
            SliceKey::Index(_) => Err(QueryError::usage(
                "field can only be indexed with a range (BETWEEN)",
            )),
        }
    }

    // === Pattern matching ===

    fn like(self, pattern: impl Into<Term>) -> Criterion {
        Criterion::matching(MatchOp::Like, false, self.into_term(), pattern.into())
    }

    /// `a LIKE p ESCAPE 'c'`
    fn like_escape(self, pattern: impl Into<Term>, escape: char) -> Criterion {
        Criterion::Match {
            op: MatchOp::Like,
            negated: false,
            term: self.into_term(),
            pattern: pattern.into(),
            escape: Some(escape),
        }
    }

    fn not_like(self, pattern: impl Into<Term>) -> Criterion {
        Criterion::matching(MatchOp::Like, true, self.into_term(), pattern.into())
    }

    fn ilike(self, pattern: impl Into<Term>) -> Criterion {
        Criterion::matching(MatchOp::Ilike, false, self.into_term(), pattern.into())
    }

    fn not_ilike(self, pattern: impl Into<Term>) -> Criterion {
        Criterion::matching(MatchOp::Ilike, true, self.into_term(), pattern.into())
    }

    fn regexp(self, pattern: impl Into<Term>) -> Criterion {
        Criterion::matching(MatchOp::Regexp, false, self.into_term(), pattern.into())
    }

    fn not_regexp(self, pattern: impl Into<Term>) -> Criterion {
        Criterion::matching(MatchOp::Regexp, true, self.into_term(), pattern.into())
    }

    /// Alias of [`TermExt::regexp`].
    fn rlike(self, pattern: impl Into<Term>) -> Criterion {
        self.regexp(pattern)
    }

    fn glob(self, pattern: impl Into<Term>) -> Criterion {
        Criterion::matching(MatchOp::Glob, false, self.into_term(), pattern.into())
    }

    // === Logic ===

    fn and_(self, other: impl Into<Criterion>) -> Criterion {
        Criterion::from(self.into_term()) & other.into()
    }

    fn or_(self, other: impl Into<Criterion>) -> Criterion {
        Criterion::from(self.into_term()) | other.into()
    }

    fn xor(self, other: impl Into<Criterion>) -> Criterion {
        Criterion::from(self.into_term()) ^ other.into()
    }

    /// `NOT <self>`
    fn negate(self) -> Criterion {
        !Criterion::from(self.into_term())
    }

    // === JSON (PostgreSQL) ===

    /// `a->key`
    fn get_json_value(self, key: impl Into<Term>) -> Criterion {
        Criterion::json(JsonOp::GetJsonValue, self.into_term(), key.into())
    }

    /// `a->>key`
    fn get_text_value(self, key: impl Into<Term>) -> Criterion {
        Criterion::json(JsonOp::GetTextValue, self.into_term(), key.into())
    }

    /// `a#>'{path}'`
    fn get_path_json_value(self, path: impl Into<Term>) -> Criterion {
        Criterion::json(JsonOp::GetPathJsonValue, self.into_term(), path.into())
    }

    /// `a#>>'{path}'`
    fn get_path_text_value(self, path: impl Into<Term>) -> Criterion {
        Criterion::json(JsonOp::GetPathTextValue, self.into_term(), path.into())
    }

    /// `a?key`
    fn has_key(self, key: impl Into<Term>) -> Criterion {
        Criterion::json(JsonOp::HasKey, self.into_term(), key.into())
    }

    /// `a?&ARRAY[...]`
    fn has_keys<I, S>(self, keys: I) -> Criterion
    where
        I: IntoIterator<Item = S>,
        S: Into<Term>,
    {
        Criterion::json(JsonOp::HasKeys, self.into_term(), Term::array(keys))
    }

    /// `a?|ARRAY[...]`
    fn has_any_keys<I, S>(self, keys: I) -> Criterion
    where
        I: IntoIterator<Item = S>,
        S: Into<Term>,
    {
        Criterion::json(JsonOp::HasAnyKeys, self.into_term(), Term::array(keys))
    }

    /// `a@>b`
    fn contains(self, other: impl Into<Term>) -> Criterion {
        Criterion::json(JsonOp::Contains, self.into_term(), other.into())
    }

    /// `a<@b`
    fn contained_by(self, other: impl Into<Term>) -> Criterion {
        Criterion::json(JsonOp::ContainedBy, self.into_term(), other.into())
    }

    /// Named filter operator (`contains`, `contained_by`, `search`,
    /// `posix_regex`), spelled per dialect.
    fn filter(self, name: &str, value: impl Into<Term>) -> Result<Criterion> {
        let op: FilterOp = name.parse()?;
        Ok(Criterion::Filter {
            op,
            term: self.into_term(),
            value: value.into(),
        })
    }

    // === Arithmetic ===

    /// `POW(a,b)`
    fn pow(self, exponent: impl Into<Term>) -> Term {
        functions::pow(self.into_term(), exponent)
    }

    // === Function modifiers ===

    /// Start an OVER(...) window for this function.
    fn over(self) -> Window {
        Window::new(self.into_term())
    }

    /// `FN(DISTINCT ...)`
    fn distinct(self) -> Result<Term> {
        self.into_term().map_function("DISTINCT", |f| {
            f.distinct = true;
            Ok(())
        })
    }

    /// `FN(...) FILTER(WHERE ...)` on an aggregate.
    fn filter_where(self, criterion: impl Into<Criterion>) -> Result<Term> {
        let criterion = criterion.into();
        self.into_term().map_function("FILTER", |f| {
            if !f.is_aggregate_function() {
                return Err(QueryError::usage(format!(
                    "FILTER only applies to aggregate functions, not {}",
                    f.name
                )));
            }
            f.filter = Some(match f.filter.take() {
                Some(existing) => existing & criterion,
                None => criterion,
            });
            Ok(())
        })
    }

    /// `FN(x IGNORE NULLS)`
    fn ignore_nulls(self) -> Result<Term> {
        self.into_term().map_function("IGNORE NULLS", |f| {
            f.ignore_nulls = true;
            Ok(())
        })
    }
}

impl Term {
    fn map_function(
        mut self,
        modifier: &str,
        apply: impl FnOnce(&mut Function) -> Result<()>,
    ) -> Result<Term> {
        match &mut self.node {
            Node::Function(f) => {
                apply(f)?;
                Ok(self)
            }
            _ => Err(QueryError::usage(format!(
                "{} can only be applied to a function",
                modifier
            ))),
        }
    }
}

impl TermExt for Term {
    fn into_term(self) -> Term {
        self
    }
}

impl TermExt for Criterion {
    fn into_term(self) -> Term {
        Term::from(self)
    }
}

// =============================================================================
// Operators
// =============================================================================

impl<T: Into<Term>> Add<T> for Term {
    type Output = Term;

    fn add(self, rhs: T) -> Term {
        Term::arithmetic(ArithOp::Add, self, rhs.into())
    }
}

impl<T: Into<Term>> Sub<T> for Term {
    type Output = Term;

    fn sub(self, rhs: T) -> Term {
        Term::arithmetic(ArithOp::Sub, self, rhs.into())
    }
}

impl<T: Into<Term>> Mul<T> for Term {
    type Output = Term;

    fn mul(self, rhs: T) -> Term {
        Term::arithmetic(ArithOp::Mul, self, rhs.into())
    }
}

impl<T: Into<Term>> Div<T> for Term {
    type Output = Term;

    fn div(self, rhs: T) -> Term {
        Term::arithmetic(ArithOp::Div, self, rhs.into())
    }
}

/// `a % b` renders `MOD(a,b)`.
impl<T: Into<Term>> Rem<T> for Term {
    type Output = Term;

    fn rem(self, rhs: T) -> Term {
        functions::modulo(self, rhs)
    }
}

/// Negating a criterion gives `NOT ...`, anything else `-x`.
impl Neg for Term {
    type Output = Term;

    fn neg(self) -> Term {
        match self.node {
            Node::Criterion(c) => Term::from(!*c),
            node => Term::new(Node::Negative(Box::new(Term::new(node)))),
        }
    }
}

impl Not for Term {
    type Output = Criterion;

    fn not(self) -> Criterion {
        !Criterion::from(self)
    }
}

macro_rules! reverse_arith {
    ($($t:ty),*) => {
        $(
            impl Add<Term> for $t {
                type Output = Term;
                fn add(self, rhs: Term) -> Term {
                    Term::arithmetic(ArithOp::Add, Term::from(self), rhs)
                }
            }

            impl Sub<Term> for $t {
                type Output = Term;
                fn sub(self, rhs: Term) -> Term {
                    Term::arithmetic(ArithOp::Sub, Term::from(self), rhs)
                }
            }

            impl Mul<Term> for $t {
                type Output = Term;
                fn mul(self, rhs: Term) -> Term {
                    Term::arithmetic(ArithOp::Mul, Term::from(self), rhs)
                }
            }

            impl Div<Term> for $t {
                type Output = Term;
                fn div(self, rhs: Term) -> Term {
                    Term::arithmetic(ArithOp::Div, Term::from(self), rhs)
                }
            }
        )*
    };
}

reverse_arith!(i32, i64, f64);

// =============================================================================
// Conversions
// =============================================================================

macro_rules! term_from_value {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Term {
                fn from(v: $t) -> Self {
                    Term::new(Node::Value(Value::from(v)))
                }
            }
        )*
    };
}

term_from_value!(
    i8,
    i16,
    i32,
    i64,
    u8,
    u16,
    u32,
    f32,
    f64,
    bool,
    &str,
    String,
    &String,
    NaiveDate,
    NaiveTime,
    NaiveDateTime,
    DateTime<FixedOffset>,
    DateTime<Utc>,
    Uuid,
    serde_json::Value
);

impl From<Value> for Term {
    fn from(v: Value) -> Self {
        Term::new(Node::Value(v))
    }
}

impl From<Criterion> for Term {
    fn from(c: Criterion) -> Self {
        match c {
            Criterion::Term(term) => term,
            other => Term::new(Node::Criterion(Box::new(other))),
        }
    }
}

impl From<Function> for Term {
    fn from(f: Function) -> Self {
        Term::new(Node::Function(Box::new(f)))
    }
}

impl From<Case> for Term {
    fn from(c: Case) -> Self {
        Term::new(Node::Case(Box::new(c)))
    }
}

impl From<Interval> for Term {
    fn from(i: Interval) -> Self {
        Term::new(Node::Interval(i))
    }
}

impl From<QueryBuilder> for Term {
    fn from(q: QueryBuilder) -> Self {
        let alias = q.alias.clone();
        Term {
            node: Node::Subquery(Box::new(Selectable::Query(Box::new(q)))),
            alias,
        }
    }
}

impl From<SetOperation> for Term {
    fn from(s: SetOperation) -> Self {
        let alias = s.alias.clone();
        Term {
            node: Node::Subquery(Box::new(Selectable::SetOp(Box::new(s)))),
            alias,
        }
    }
}
