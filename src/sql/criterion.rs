//! Criteria - boolean-valued expressions for WHERE, HAVING, ON and CASE.
//!
//! Criteria are built through [`TermExt`](super::term::TermExt) and
//! combined with `&`, `|`, `^` and `!`. [`Criterion::Empty`] is the
//! identity for combination, so criteria can be folded from nothing.

use std::ops::{BitAnd, BitOr, BitXor, Neg, Not};

use super::dialect::{RegexSyntax, SqlDialect};
use super::filter::{FilterOp, FilterSyntax};
use super::query::{QueryBuilder, Selectable};
use super::render::{Render, RenderCtx};
use super::set_op::SetOperation;
use super::term::{tokens_of, Aggregation, Namespace, Node, Term};
use super::token::{Token, TokenStream};
use crate::error::{QueryError, Result};

/// Binary comparison operators, rendered without spaces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparator {
    Eq,
    Ne,
    Gt,
    Gte,
    Lt,
    Lte,
}

impl Comparator {
    fn token(self) -> Token {
        match self {
            Comparator::Eq => Token::Eq,
            Comparator::Ne => Token::Ne,
            Comparator::Gt => Token::Gt,
            Comparator::Gte => Token::Gte,
            Comparator::Lt => Token::Lt,
            Comparator::Lte => Token::Lte,
        }
    }
}

/// Pattern-matching predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MatchOp {
    Like,
    Ilike,
    Regexp,
    Glob,
}

/// PostgreSQL JSON/JSONB operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JsonOp {
    GetJsonValue,
    GetTextValue,
    GetPathJsonValue,
    GetPathTextValue,
    HasKey,
    HasKeys,
    HasAnyKeys,
    Contains,
    ContainedBy,
}

impl JsonOp {
    pub fn symbol(self) -> &'static str {
        match self {
            JsonOp::GetJsonValue => "->",
            JsonOp::GetTextValue => "->>",
            JsonOp::GetPathJsonValue => "#>",
            JsonOp::GetPathTextValue => "#>>",
            JsonOp::HasKey => "?",
            JsonOp::HasKeys => "?&",
            JsonOp::HasAnyKeys => "?|",
            JsonOp::Contains => "@>",
            JsonOp::ContainedBy => "<@",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Logic {
    And,
    Or,
    Xor,
}

impl Logic {
    fn token(self) -> Token {
        match self {
            Logic::And => Token::And,
            Logic::Or => Token::Or,
            Logic::Xor => Token::Xor,
        }
    }
}

/// Right-hand side of IN.
#[derive(Debug, Clone, PartialEq)]
pub enum InList {
    Terms(Vec<Term>),
    Query(Box<Selectable>),
}

impl<T: Into<Term>> From<Vec<T>> for InList {
    fn from(items: Vec<T>) -> Self {
        InList::Terms(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Term>, const N: usize> From<[T; N]> for InList {
    fn from(items: [T; N]) -> Self {
        InList::Terms(items.into_iter().map(Into::into).collect())
    }
}

impl From<QueryBuilder> for InList {
    fn from(q: QueryBuilder) -> Self {
        InList::Query(Box::new(Selectable::from(q)))
    }
}

impl From<SetOperation> for InList {
    fn from(s: SetOperation) -> Self {
        InList::Query(Box::new(Selectable::from(s)))
    }
}

/// A boolean expression.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Criterion {
    /// No condition. Renders nothing and vanishes when combined.
    #[default]
    Empty,
    Compare {
        op: Comparator,
        left: Term,
        right: Term,
    },
    Match {
        op: MatchOp,
        negated: bool,
        term: Term,
        pattern: Term,
        escape: Option<char>,
    },
    Json {
        op: JsonOp,
        left: Term,
        right: Term,
    },
    Filter {
        op: FilterOp,
        term: Term,
        value: Term,
    },
    IsNull {
        term: Term,
        negated: bool,
    },
    In {
        term: Term,
        list: InList,
        negated: bool,
    },
    Between {
        term: Term,
        low: Term,
        high: Term,
        negated: bool,
    },
    Exists {
        query: Box<Selectable>,
        negated: bool,
    },
    Complex {
        op: Logic,
        left: Box<Criterion>,
        right: Box<Criterion>,
    },
    Not(Box<Criterion>),
    /// A plain term used as a condition (boolean column, function, ...).
    Term(Term),
}

impl Criterion {
    pub fn empty() -> Self {
        Criterion::Empty
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Criterion::Empty)
    }

    pub(crate) fn compare(op: Comparator, left: Term, right: Term) -> Self {
        Criterion::Compare { op, left, right }
    }

    pub(crate) fn matching(op: MatchOp, negated: bool, term: Term, pattern: Term) -> Self {
        Criterion::Match {
            op,
            negated,
            term,
            pattern,
            escape: None,
        }
    }

    pub(crate) fn json(op: JsonOp, left: Term, right: Term) -> Self {
        Criterion::Json { op, left, right }
    }

    pub fn is_null(term: impl Into<Term>) -> Self {
        Criterion::IsNull {
            term: term.into(),
            negated: false,
        }
    }

    /// `EXISTS (SELECT ...)`
    pub fn exists(query: impl Into<Selectable>) -> Self {
        Criterion::Exists {
            query: Box::new(query.into()),
            negated: false,
        }
    }

    /// `NOT EXISTS (SELECT ...)`
    pub fn not_exists(query: impl Into<Selectable>) -> Self {
        Criterion::Exists {
            query: Box::new(query.into()),
            negated: true,
        }
    }

    /// AND together every criterion; empty input gives [`Criterion::Empty`].
    pub fn all<I, C>(criteria: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Criterion>,
    {
        criteria
            .into_iter()
            .fold(Criterion::Empty, |acc, c| acc & c.into())
    }

    /// OR together every criterion; empty input gives [`Criterion::Empty`].
    pub fn any<I, C>(criteria: I) -> Self
    where
        I: IntoIterator<Item = C>,
        C: Into<Criterion>,
    {
        criteria
            .into_iter()
            .fold(Criterion::Empty, |acc, c| acc | c.into())
    }

    fn combine(op: Logic, left: Criterion, right: Criterion) -> Self {
        match (left, right) {
            (Criterion::Empty, r) => r,
            (l, Criterion::Empty) => l,
            (l, r) => Criterion::Complex {
                op,
                left: Box::new(l),
                right: Box::new(r),
            },
        }
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            Criterion::Empty | Criterion::Exists { .. } => Aggregation::Indefinite,
            Criterion::Compare { left, right, .. } | Criterion::Json { left, right, .. } => {
                Aggregation::resolve([left.aggregation(), right.aggregation()])
            }
            Criterion::Match { term, pattern, .. } => {
                Aggregation::resolve([term.aggregation(), pattern.aggregation()])
            }
            Criterion::Filter { term, value, .. } => {
                Aggregation::resolve([term.aggregation(), value.aggregation()])
            }
            Criterion::IsNull { term, .. }
            | Criterion::In { term, .. }
            | Criterion::Between { term, .. }
            | Criterion::Term(term) => term.aggregation(),
            Criterion::Complex { left, right, .. } => {
                Aggregation::resolve([left.aggregation(), right.aggregation()])
            }
            Criterion::Not(inner) => inner.aggregation(),
        }
    }

    /// Namespaces of every field referenced, not descending into subqueries.
    pub fn namespaces(&self) -> Vec<&Namespace> {
        let mut out = Vec::new();
        self.collect_namespaces(&mut out);
        out
    }

    pub(crate) fn collect_namespaces<'a>(&'a self, out: &mut Vec<&'a Namespace>) {
        match self {
            Criterion::Empty | Criterion::Exists { .. } => {}
            Criterion::Compare { left, right, .. } | Criterion::Json { left, right, .. } => {
                left.collect_namespaces(out);
                right.collect_namespaces(out);
            }
            Criterion::Match { term, pattern, .. } => {
                term.collect_namespaces(out);
                pattern.collect_namespaces(out);
            }
            Criterion::Filter { term, value, .. } => {
                term.collect_namespaces(out);
                value.collect_namespaces(out);
            }
            Criterion::IsNull { term, .. } | Criterion::Term(term) => {
                term.collect_namespaces(out)
            }
            Criterion::In { term, list, .. } => {
                term.collect_namespaces(out);
                if let InList::Terms(items) = list {
                    items.iter().for_each(|t| t.collect_namespaces(out));
                }
            }
            Criterion::Between {
                term, low, high, ..
            } => {
                term.collect_namespaces(out);
                low.collect_namespaces(out);
                high.collect_namespaces(out);
            }
            Criterion::Complex { left, right, .. } => {
                left.collect_namespaces(out);
                right.collect_namespaces(out);
            }
            Criterion::Not(inner) => inner.collect_namespaces(out),
        }
    }
}

impl From<Term> for Criterion {
    fn from(term: Term) -> Self {
        match term.node {
            Node::Criterion(c) => *c,
            node => Criterion::Term(Term::new(node)),
        }
    }
}

// =============================================================================
// Rendering
// =============================================================================

impl Render for Criterion {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let nested = ctx.nested();
        let mut ts = TokenStream::new();

        match self {
            Criterion::Empty => {}

            Criterion::Compare { op, left, right } => {
                if matches!(left.node, Node::Null) || matches!(right.node, Node::Null) {
                    return Err(QueryError::usage(
                        "cannot compare with NULL, use is_null() or is_not_null()",
                    ));
                }
                ts.append(&left.to_tokens(&nested)?)
                    .push(op.token())
                    .append(&right.to_tokens(&nested)?);
            }

            Criterion::Match {
                op,
                negated,
                term,
                pattern,
                escape,
            } => {
                let term = term.to_tokens(&nested)?;
                let pattern = pattern.to_tokens(&nested)?;
                match op {
                    MatchOp::Like => {
                        push_infix(&mut ts, &term, *negated, Token::Like, &pattern);
                    }
                    MatchOp::Ilike if ctx.dialect.supports_ilike() => {
                        push_infix(&mut ts, &term, *negated, Token::Operator("ILIKE"), &pattern);
                    }
                    MatchOp::Ilike => {
                        let mut upper_term = TokenStream::new();
                        upper_term
                            .push(Token::FunctionName("UPPER".into()))
                            .lparen()
                            .push(Token::FunctionName("CAST".into()))
                            .lparen()
                            .append(&term)
                            .keyword(Token::As)
                            .push(Token::Raw(ctx.dialect.text_cast_type().into()))
                            .rparen()
                            .rparen();
                        let mut upper_pattern = TokenStream::new();
                        upper_pattern
                            .push(Token::FunctionName("UPPER".into()))
                            .append_parens(&pattern);
                        push_infix(&mut ts, &upper_term, *negated, Token::Like, &upper_pattern);
                    }
                    MatchOp::Regexp => {
                        ts.append(&regex_tokens(ctx, &term, &pattern, *negated)?);
                    }
                    MatchOp::Glob => {
                        if !ctx.dialect.supports_glob() {
                            return Err(QueryError::unsupported(ctx.dialect.name(), "GLOB"));
                        }
                        push_infix(&mut ts, &term, *negated, Token::Operator("GLOB"), &pattern);
                    }
                }
                if let Some(c) = escape {
                    ts.keyword(Token::Escape)
                        .push(Token::Raw(ctx.dialect.quote_string(&c.to_string())));
                }
            }

            Criterion::Json { op, left, right } => {
                if !ctx.dialect.supports_json_operators() {
                    return Err(QueryError::unsupported(
                        ctx.dialect.name(),
                        format!("JSON operator {}", op.symbol()),
                    ));
                }
                ts.append(&left.to_tokens(&nested)?)
                    .push(Token::Operator(op.symbol()))
                    .append(&right.to_tokens(&nested)?);
            }

            Criterion::Filter { op, term, value } => {
                let syntax = ctx.dialect.filter_syntax(*op).ok_or_else(|| {
                    QueryError::unsupported(ctx.dialect.name(), format!("filter {}", op))
                })?;
                let term = term.to_tokens(&nested)?;
                let value = value.to_tokens(&nested)?;
                match syntax {
                    FilterSyntax::Operator(sym) => {
                        ts.append(&term).push(Token::Operator(sym)).append(&value);
                    }
                    FilterSyntax::Function { name, value_first } => {
                        let (a, b) = if value_first {
                            (&value, &term)
                        } else {
                            (&term, &value)
                        };
                        ts.push(Token::FunctionName(name.into()))
                            .lparen()
                            .append(a)
                            .comma()
                            .append(b)
                            .rparen();
                    }
                    FilterSyntax::MatchAgainst => {
                        ts.push(Token::FunctionName("MATCH".into()))
                            .append_parens(&term)
                            .space()
                            .push(Token::Raw("AGAINST".into()))
                            .space()
                            .append_parens(&value);
                    }
                    FilterSyntax::FullText => {
                        ts.push(Token::FunctionName("TO_TSVECTOR".into()))
                            .append_parens(&term)
                            .keyword(Token::Operator("@@"))
                            .push(Token::FunctionName("PLAINTO_TSQUERY".into()))
                            .append_parens(&value);
                    }
                    FilterSyntax::Regex => {
                        ts.append(&regex_tokens(ctx, &term, &value, false)?);
                    }
                }
            }

            Criterion::IsNull { term, negated } => {
                ts.append(&term.to_tokens(&nested)?).keyword(Token::Is);
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::Null);
            }

            Criterion::In {
                term,
                list,
                negated,
            } => {
                if let InList::Terms(items) = list {
                    if items.is_empty() {
                        let always = if *negated { "1=1" } else { "1=0" };
                        ts.push(Token::Raw(always.into()));
                        return Ok(ts);
                    }
                }
                ts.append(&term.to_tokens(&nested)?).space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::In).space();
                match list {
                    InList::Terms(items) => {
                        ts.lparen().append_list(&tokens_of(items, &nested)?).rparen();
                    }
                    InList::Query(query) => {
                        ts.append(&query.to_tokens(&nested.subquery(true))?);
                    }
                }
            }

            Criterion::Between {
                term,
                low,
                high,
                negated,
            } => {
                ts.append(&term.to_tokens(&nested)?).space();
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::Between)
                    .space()
                    .append(&low.to_tokens(&nested)?)
                    .keyword(Token::And)
                    .append(&high.to_tokens(&nested)?);
            }

            Criterion::Exists { query, negated } => {
                if *negated {
                    ts.push(Token::Not).space();
                }
                ts.push(Token::Exists)
                    .space()
                    .append(&query.to_tokens(&nested.subquery(true))?);
            }

            Criterion::Complex { op, left, right } => {
                ts.append(&complex_operand(left, *op, &nested)?)
                    .keyword(op.token())
                    .append(&complex_operand(right, *op, &nested)?);
            }

            Criterion::Not(inner) => {
                let body = inner.to_tokens(&nested)?;
                ts.push(Token::Not).space();
                if matches!(**inner, Criterion::Complex { .. }) {
                    ts.append_parens(&body);
                } else {
                    ts.append(&body);
                }
            }

            Criterion::Term(term) => {
                ts.append(&term.to_tokens(&nested)?);
            }
        }

        Ok(ts)
    }

    fn statement_kind(&self) -> &'static str {
        "criterion"
    }
}

/// `a [NOT ]OP b` with spaces.
fn push_infix(ts: &mut TokenStream, left: &TokenStream, negated: bool, op: Token, right: &TokenStream) {
    ts.append(left).space();
    if negated {
        ts.push(Token::Not).space();
    }
    ts.push(op).space().append(right);
}

fn regex_tokens(
    ctx: &RenderCtx,
    term: &TokenStream,
    pattern: &TokenStream,
    negated: bool,
) -> Result<TokenStream> {
    let mut ts = TokenStream::new();
    match ctx.dialect.regex_syntax() {
        RegexSyntax::Operator {
            matches,
            not_matches,
        } => {
            let op = if negated { not_matches } else { matches };
            ts.append(term)
                .keyword(Token::Operator(op))
                .append(pattern);
        }
        RegexSyntax::Function(name) => {
            if negated {
                ts.push(Token::Not).space();
            }
            ts.push(Token::FunctionName(name.into()))
                .lparen()
                .append(term)
                .comma()
                .append(pattern)
                .rparen();
        }
        RegexSyntax::Unsupported => {
            return Err(QueryError::unsupported(
                ctx.dialect.name(),
                "regular expression matching",
            ));
        }
    }
    Ok(ts)
}

/// A child of AND/OR/XOR, parenthesised when it uses a different operator.
fn complex_operand(child: &Criterion, parent: Logic, ctx: &RenderCtx) -> Result<TokenStream> {
    let body = child.to_tokens(ctx)?;
    match child {
        Criterion::Complex { op, .. } if *op != parent => {
            let mut ts = TokenStream::new();
            ts.append_parens(&body);
            Ok(ts)
        }
        _ => Ok(body),
    }
}

// =============================================================================
// Operators
// =============================================================================

impl<T: Into<Criterion>> BitAnd<T> for Criterion {
    type Output = Criterion;

    fn bitand(self, rhs: T) -> Criterion {
        Criterion::combine(Logic::And, self, rhs.into())
    }
}

impl<T: Into<Criterion>> BitOr<T> for Criterion {
    type Output = Criterion;

    fn bitor(self, rhs: T) -> Criterion {
        Criterion::combine(Logic::Or, self, rhs.into())
    }
}

impl<T: Into<Criterion>> BitXor<T> for Criterion {
    type Output = Criterion;

    fn bitxor(self, rhs: T) -> Criterion {
        Criterion::combine(Logic::Xor, self, rhs.into())
    }
}

impl Not for Criterion {
    type Output = Criterion;

    fn not(self) -> Criterion {
        Criterion::Not(Box::new(self))
    }
}

impl Neg for Criterion {
    type Output = Criterion;

    fn neg(self) -> Criterion {
        !self
    }
}
