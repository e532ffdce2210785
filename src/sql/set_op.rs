//! UNION, INTERSECT, EXCEPT and MINUS.

use std::ops::{Add, Mul, Sub};

use super::dialect::{Dialect, SqlDialect};
use super::query::{QueryBuilder, SelectItem};
use super::render::{Render, RenderCtx};
use super::term::{Namespace, Node, Order, SourceId, Term};
use super::token::{Token, TokenStream};
use crate::error::{QueryError, Result};

/// Kind of set operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOpKind {
    Union,
    UnionAll,
    Intersect,
    Except,
    /// Oracle's EXCEPT.
    Minus,
}

impl SetOpKind {
    fn tokens(self) -> Vec<Token> {
        match self {
            SetOpKind::Union => vec![Token::Union],
            SetOpKind::UnionAll => vec![Token::Union, Token::Space, Token::All],
            SetOpKind::Intersect => vec![Token::Intersect],
            SetOpKind::Except => vec![Token::Except],
            SetOpKind::Minus => vec![Token::SetMinus],
        }
    }
}

/// Queries combined by set operators, with an optional ORDER BY and
/// pagination that apply to the combined result.
///
/// ```
/// use querycraft::sql::query::Query;
/// use querycraft::sql::render::Render;
///
/// let a = Query::from_("a").select(["x"]).unwrap();
/// let b = Query::from_("b").select(["y"]).unwrap();
/// assert_eq!(
///     (a + b).get_sql().unwrap(),
///     "(SELECT \"x\" FROM \"a\") UNION (SELECT \"y\" FROM \"b\")"
/// );
/// ```
#[derive(Debug, Clone)]
#[must_use = "set operations have no effect until rendered"]
pub struct SetOperation {
    pub(crate) id: SourceId,
    base: Box<QueryBuilder>,
    ops: Vec<(SetOpKind, QueryBuilder)>,
    orderbys: Vec<(Term, Option<Order>)>,
    limit: Option<u64>,
    offset: Option<u64>,
    pub(crate) alias: Option<String>,
}

impl PartialEq for SetOperation {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl SetOperation {
    pub(crate) fn new(base: QueryBuilder, kind: SetOpKind, other: QueryBuilder) -> Self {
        Self {
            id: SourceId::next(),
            base: Box::new(base),
            ops: vec![(kind, other)],
            orderbys: Vec::new(),
            limit: None,
            offset: None,
            alias: None,
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    fn push(mut self, kind: SetOpKind, other: QueryBuilder) -> Self {
        self.ops.push((kind, other));
        self
    }

    pub fn union(self, other: QueryBuilder) -> Self {
        self.push(SetOpKind::Union, other)
    }

    pub fn union_all(self, other: QueryBuilder) -> Self {
        self.push(SetOpKind::UnionAll, other)
    }

    pub fn intersect(self, other: QueryBuilder) -> Self {
        self.push(SetOpKind::Intersect, other)
    }

    pub fn except_of(self, other: QueryBuilder) -> Self {
        self.push(SetOpKind::Except, other)
    }

    pub fn minus(self, other: QueryBuilder) -> Self {
        self.push(SetOpKind::Minus, other)
    }

    /// ORDER BY over the combined result.
    pub fn orderby<I, S>(mut self, items: I, order: impl Into<Option<Order>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        let order = order.into();
        self.orderbys
            .extend(items.into_iter().map(|i| (i.into().into_term(None), order)));
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// A column of the combined result, for use by an enclosing query.
    pub fn field(&self, name: impl Into<String>) -> Term {
        Term::qualified(self.namespace(), name)
    }

    pub fn star(&self) -> Term {
        Term::new(Node::Star(Some(self.namespace())))
    }

    fn namespace(&self) -> Namespace {
        Namespace::Query {
            id: self.id,
            alias: self.alias.clone(),
        }
    }

    fn orderby_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        if self.orderbys.is_empty() {
            return Ok(ts);
        }
        let items = self
            .orderbys
            .iter()
            .map(|(term, order)| {
                let mut item = TokenStream::new();
                let selected = term
                    .alias()
                    .filter(|a| ctx.orderby_alias && self.base.selects.iter().any(|s| s.alias() == Some(*a)));
                match selected {
                    Some(alias) => {
                        item.push(Token::Alias(alias.to_string()));
                    }
                    None => {
                        item.append(&term.to_tokens(&ctx.nested())?);
                    }
                }
                if let Some(order) = order {
                    item.space().push(order.token());
                }
                Ok(item)
            })
            .collect::<Result<Vec<_>>>()?;
        ts.space().push(Token::OrderBy).space().append_list(&items);
        Ok(ts)
    }
}

impl Render for SetOperation {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let dialect = ctx.dialect;
        let query_ctx = ctx
            .with_alias(false)
            .subquery(dialect.wraps_set_operation_queries());

        let mut body = self.base.to_tokens(&query_ctx)?;
        for (kind, query) in &self.ops {
            if query.select_count() != self.base.select_count() {
                return Err(QueryError::SetOperation(format!(
                    "queries must have an equal number of select terms, got {} and {}",
                    self.base.select_count(),
                    query.select_count()
                )));
            }
            body.space()
                .extend(kind.tokens())
                .space()
                .append(&query.to_tokens(&query_ctx)?);
        }

        let tail_ctx = ctx.with_alias(false).subquery(false);
        body.append(&self.orderby_tokens(&tail_ctx)?);
        let offset = self.offset.filter(|o| *o > 0);
        if (self.limit.is_some() || offset.is_some())
            && self.orderbys.is_empty()
            && dialect.requires_order_by_for_offset()
        {
            body.space()
                .push(Token::OrderBy)
                .space()
                .push(Token::Raw("(SELECT 0)".into()));
        }
        body.append(&dialect.emit_limit_offset(self.limit, offset));

        let mut ts = TokenStream::new();
        if ctx.subquery {
            ts.append_parens(&body);
        } else {
            ts = body;
        }
        if ctx.with_alias {
            if let Some(alias) = self.alias.as_deref().or_else(|| ctx.alias_of(self.id)) {
                ctx.push_alias(&mut ts, alias);
            }
        }
        Ok(ts)
    }

    fn default_dialect(&self) -> Dialect {
        self.base.dialect()
    }

    fn statement_kind(&self) -> &'static str {
        "set operation"
    }
}

// `a + b` is UNION, `a * b` is UNION ALL, `a - b` is MINUS.

impl Add for QueryBuilder {
    type Output = SetOperation;

    fn add(self, rhs: QueryBuilder) -> SetOperation {
        self.union(rhs)
    }
}

impl Mul for QueryBuilder {
    type Output = SetOperation;

    fn mul(self, rhs: QueryBuilder) -> SetOperation {
        self.union_all(rhs)
    }
}

impl Sub for QueryBuilder {
    type Output = SetOperation;

    fn sub(self, rhs: QueryBuilder) -> SetOperation {
        self.minus(rhs)
    }
}

impl Add<QueryBuilder> for SetOperation {
    type Output = SetOperation;

    fn add(self, rhs: QueryBuilder) -> SetOperation {
        self.union(rhs)
    }
}

impl Mul<QueryBuilder> for SetOperation {
    type Output = SetOperation;

    fn mul(self, rhs: QueryBuilder) -> SetOperation {
        self.union_all(rhs)
    }
}

impl Sub<QueryBuilder> for SetOperation {
    type Output = SetOperation;

    fn sub(self, rhs: QueryBuilder) -> SetOperation {
        self.minus(rhs)
    }
}
