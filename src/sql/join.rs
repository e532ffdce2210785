//! JOIN clauses.
//!
//! A join is started on the query ([`QueryBuilder::join`] and friends),
//! which returns a [`Joiner`]. The joiner must be finished with a
//! condition before the query can be used again.

use super::criterion::Criterion;
use super::query::{QueryBuilder, Source};
use super::render::{Render, RenderCtx};
use super::term::{Namespace, Term, TermExt};
use super::token::{Token, TokenStream};
use crate::error::{QueryError, Result};

/// Kind of join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    /// Renders as a bare `JOIN`.
    #[default]
    Inner,
    Left,
    Right,
    /// `FULL OUTER JOIN`
    Outer,
    LeftOuter,
    RightOuter,
    Cross,
    Hash,
}

impl JoinType {
    fn keyword(self) -> Option<&'static str> {
        match self {
            JoinType::Inner => None,
            JoinType::Left => Some("LEFT"),
            JoinType::Right => Some("RIGHT"),
            JoinType::Outer => Some("FULL OUTER"),
            JoinType::LeftOuter => Some("LEFT OUTER"),
            JoinType::RightOuter => Some("RIGHT OUTER"),
            JoinType::Cross => Some("CROSS"),
            JoinType::Hash => Some("HASH"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum JoinCondition {
    None,
    On(Criterion),
    Using(Vec<String>),
}

/// One join of a query.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    pub(crate) item: Source,
    pub(crate) how: JoinType,
    pub(crate) condition: JoinCondition,
}

impl Join {
    pub fn how(&self) -> JoinType {
        self.how
    }

    /// Every table in an ON criterion must belong to the query or be the
    /// joined item.
    pub(crate) fn validate(&self, query: &QueryBuilder) -> Result<()> {
        let JoinCondition::On(criterion) = &self.condition else {
            return Ok(());
        };
        for ns in criterion.namespaces() {
            let known = match ns {
                Namespace::Table(table) => {
                    self.item.table() == Some(table) || query.has_table(table)
                }
                Namespace::Query { id, .. } => self.item.id() == *id || query.has_source(*id),
                Namespace::Raw(_) => true,
            };
            if !known {
                return Err(QueryError::Join(format!(
                    "invalid join criterion, {} is not part of the query",
                    describe(ns)
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        if let Some(kw) = self.how.keyword() {
            ts.push(Token::Raw(kw.into())).space();
        }
        ts.push(Token::Join).space().append(&self.item.to_tokens(ctx)?);
        match &self.condition {
            JoinCondition::None => {}
            JoinCondition::On(criterion) => {
                ts.keyword(Token::On)
                    .append(&criterion.to_tokens(&ctx.nested())?);
            }
            JoinCondition::Using(fields) => {
                let fields: Vec<TokenStream> = fields
                    .iter()
                    .map(|f| {
                        let mut field = TokenStream::new();
                        field.push(Token::Ident(f.clone()));
                        field
                    })
                    .collect();
                ts.keyword(Token::Using).lparen().append_list(&fields).rparen();
            }
        }
        Ok(ts)
    }
}

fn describe(ns: &Namespace) -> String {
    match ns {
        Namespace::Table(t) => format!("table \"{}\"", t.table_name()),
        Namespace::Query { alias: Some(a), .. } => format!("subquery \"{}\"", a),
        Namespace::Query { .. } => "a subquery".into(),
        Namespace::Raw(r) => r.clone(),
    }
}

/// A join waiting for its condition.
#[derive(Debug)]
#[must_use = "a join is only added once its condition is given"]
pub struct Joiner {
    query: QueryBuilder,
    item: Source,
    how: JoinType,
}

impl Joiner {
    pub(crate) fn new(query: QueryBuilder, item: Source, how: JoinType) -> Self {
        Self { query, item, how }
    }

    fn finish(self, condition: JoinCondition) -> Result<QueryBuilder> {
        let join = Join {
            item: self.item,
            how: self.how,
            condition,
        };
        self.query.do_join(join)
    }

    /// `JOIN <item> ON <criterion>`
    pub fn on(self, criterion: impl Into<Criterion>) -> Result<QueryBuilder> {
        let criterion = criterion.into();
        if criterion.is_empty() {
            return Err(QueryError::Join(
                "JOIN ON requires a criterion, use cross() for a cross join".into(),
            ));
        }
        self.finish(JoinCondition::On(criterion))
    }

    /// Join on equality of same-named fields of the base table and the
    /// joined item.
    pub fn on_field<I, S>(self, fields: I) -> Result<QueryBuilder>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let base = self.query.from_namespace().ok_or_else(|| {
            QueryError::Join("JOIN ON fields requires a FROM table".into())
        })?;
        let joined = self.item.namespace();
        let criteria: Vec<Criterion> = fields
            .into_iter()
            .map(|f| {
                let f = f.into();
                Term::qualified(base.clone(), f.clone()).eq(Term::qualified(joined.clone(), f))
            })
            .collect();
        if criteria.is_empty() {
            return Err(QueryError::Join("JOIN ON requires at least one field".into()));
        }
        self.finish(JoinCondition::On(Criterion::all(criteria)))
    }

    /// `JOIN <item> USING ("a","b")`
    pub fn using<I, S>(self, fields: I) -> Result<QueryBuilder>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let fields: Vec<String> = fields.into_iter().map(Into::into).collect();
        if fields.is_empty() {
            return Err(QueryError::Join("JOIN USING requires at least one field".into()));
        }
        self.finish(JoinCondition::Using(fields))
    }

    /// Join without a condition, as `CROSS JOIN`.
    pub fn cross(mut self) -> Result<QueryBuilder> {
        self.how = JoinType::Cross;
        self.finish(JoinCondition::None)
    }
}
