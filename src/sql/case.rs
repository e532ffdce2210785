//! CASE expressions.

use super::criterion::Criterion;
use super::render::{Render, RenderCtx};
use super::term::{Aggregation, Namespace, Term};
use super::token::{Token, TokenStream};
use crate::error::{QueryError, Result};

/// `CASE WHEN ... THEN ... [ELSE ...] END`
///
/// Rendering fails with [`QueryError::Case`] when no WHEN branch was added.
///
/// ```
/// use querycraft::sql::case::Case;
/// use querycraft::sql::render::Render;
/// use querycraft::sql::term::{Term, TermExt};
///
/// let c = Case::new()
///     .when(Term::field("foo").eq(1), "a")
///     .else_("b");
/// assert_eq!(c.get_sql().unwrap(), "CASE WHEN \"foo\"=1 THEN 'a' ELSE 'b' END");
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Case {
    cases: Vec<(Criterion, Term)>,
    else_: Option<Term>,
}

impl Case {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn when(mut self, criterion: impl Into<Criterion>, then: impl Into<Term>) -> Self {
        self.cases.push((criterion.into(), then.into()));
        self
    }

    pub fn else_(mut self, term: impl Into<Term>) -> Self {
        self.else_ = Some(term.into());
        self
    }

    /// A branch counts as aggregate if its condition or its result is;
    /// the branches then combine like siblings.
    pub fn aggregation(&self) -> Aggregation {
        let branches = self
            .cases
            .iter()
            .map(|(criterion, term)| criterion.aggregation().or(term.aggregation()));
        let else_ = self.else_.iter().map(Term::aggregation);
        Aggregation::resolve(branches.chain(else_))
    }

    pub(crate) fn collect_namespaces<'a>(&'a self, out: &mut Vec<&'a Namespace>) {
        for (criterion, term) in &self.cases {
            criterion.collect_namespaces(out);
            term.collect_namespaces(out);
        }
        if let Some(term) = &self.else_ {
            term.collect_namespaces(out);
        }
    }
}

impl Render for Case {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        if self.cases.is_empty() {
            return Err(QueryError::Case);
        }
        let nested = ctx.nested();
        let mut ts = TokenStream::new();
        ts.push(Token::Case);
        for (criterion, term) in &self.cases {
            ts.space()
                .push(Token::When)
                .space()
                .append(&criterion.to_tokens(&nested)?)
                .keyword(Token::Then)
                .append(&term.to_tokens(&nested)?);
        }
        if let Some(term) = &self.else_ {
            ts.keyword(Token::Else).append(&term.to_tokens(&nested)?);
        }
        ts.space().push(Token::End);
        Ok(ts)
    }

    fn statement_kind(&self) -> &'static str {
        "case"
    }
}
