//! Window specifications for analytic and aggregate functions.
//!
//! ```
//! use querycraft::sql::functions::rank;
//! use querycraft::sql::render::Render;
//! use querycraft::sql::term::{Order, Term, TermExt};
//!
//! let ranked = rank()
//!     .over()
//!     .partition_by([Term::field("dept")])
//!     .orderby(Term::field("salary"), Order::Desc)
//!     .build()
//!     .unwrap();
//! assert_eq!(
//!     ranked.get_sql().unwrap(),
//!     "RANK() OVER(PARTITION BY \"dept\" ORDER BY \"salary\" DESC)"
//! );
//! ```

use super::render::{Render, RenderCtx};
use super::term::{tokens_of, Namespace, Node, Order, Term};
use super::token::{Token, TokenStream};
use crate::error::{QueryError, Result};

/// Frame boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameBound {
    UnboundedPreceding,
    Preceding(u64),
    CurrentRow,
    Following(u64),
    UnboundedFollowing,
}

impl FrameBound {
    /// Position on the frame axis, for checking that start precedes end.
    fn position(self) -> u8 {
        match self {
            FrameBound::UnboundedPreceding => 0,
            FrameBound::Preceding(_) => 1,
            FrameBound::CurrentRow => 2,
            FrameBound::Following(_) => 3,
            FrameBound::UnboundedFollowing => 4,
        }
    }

    fn to_tokens(self, ts: &mut TokenStream) {
        match self {
            FrameBound::UnboundedPreceding => {
                ts.push(Token::Unbounded).space().push(Token::Preceding);
            }
            FrameBound::Preceding(n) => {
                ts.push(Token::LitInt(n as i64)).space().push(Token::Preceding);
            }
            FrameBound::CurrentRow => {
                ts.push(Token::CurrentRow);
            }
            FrameBound::Following(n) => {
                ts.push(Token::LitInt(n as i64)).space().push(Token::Following);
            }
            FrameBound::UnboundedFollowing => {
                ts.push(Token::Unbounded).space().push(Token::Following);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Rows,
    Range,
}

/// `ROWS|RANGE <start>` or `ROWS|RANGE BETWEEN <start> AND <end>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub start: FrameBound,
    pub end: Option<FrameBound>,
}

impl Frame {
    fn validate(&self) -> Result<()> {
        match self.end {
            None if self.start == FrameBound::UnboundedFollowing => Err(QueryError::grouping(
                "a frame cannot start at UNBOUNDED FOLLOWING",
            )),
            None => Ok(()),
            Some(end) => {
                if self.start == FrameBound::UnboundedFollowing
                    || end == FrameBound::UnboundedPreceding
                    || self.start.position() > end.position()
                {
                    Err(QueryError::grouping(format!(
                        "frame start {:?} comes after frame end {:?}",
                        self.start, end
                    )))
                } else {
                    Ok(())
                }
            }
        }
    }
}

/// The contents of an OVER(...) clause.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct WindowSpec {
    pub(crate) partition_by: Vec<Term>,
    pub(crate) order_by: Vec<(Term, Option<Order>)>,
    pub(crate) frame: Option<Frame>,
}

impl WindowSpec {
    pub(crate) fn collect_namespaces<'a>(&'a self, out: &mut Vec<&'a Namespace>) {
        for term in &self.partition_by {
            term.collect_namespaces(out);
        }
        for (term, _) in &self.order_by {
            term.collect_namespaces(out);
        }
    }

    /// `OVER(...)`
    pub(crate) fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let nested = ctx.nested();
        let mut parts: Vec<TokenStream> = Vec::new();

        if !self.partition_by.is_empty() {
            let mut ts = TokenStream::new();
            ts.push(Token::PartitionBy)
                .space()
                .append_list(&tokens_of(&self.partition_by, &nested)?);
            parts.push(ts);
        }

        if !self.order_by.is_empty() {
            let items = self
                .order_by
                .iter()
                .map(|(term, order)| {
                    let mut ts = term.to_tokens(&nested)?;
                    if let Some(order) = order {
                        ts.space().push(order.token());
                    }
                    Ok(ts)
                })
                .collect::<Result<Vec<_>>>()?;
            let mut ts = TokenStream::new();
            ts.push(Token::OrderBy).space().append_list(&items);
            parts.push(ts);
        }

        if let Some(frame) = &self.frame {
            let mut ts = TokenStream::new();
            ts.push(match frame.kind {
                FrameKind::Rows => Token::Rows,
                FrameKind::Range => Token::Range,
            })
            .space();
            match frame.end {
                Some(end) => {
                    ts.push(Token::Between).space();
                    frame.start.to_tokens(&mut ts);
                    ts.keyword(Token::And);
                    end.to_tokens(&mut ts);
                }
                None => frame.start.to_tokens(&mut ts),
            }
            parts.push(ts);
        }

        let mut ts = TokenStream::new();
        ts.push(Token::Over).lparen();
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                ts.space();
            }
            ts.append(part);
        }
        ts.rparen();
        Ok(ts)
    }
}

/// Builder attaching an OVER clause to a function term.
///
/// Started with [`TermExt::over`](super::term::TermExt::over); finish with
/// [`Window::build`].
#[derive(Debug, Clone)]
#[must_use = "Window has no effect until build() is called"]
pub struct Window {
    function: Term,
    spec: WindowSpec,
}

impl Window {
    pub(crate) fn new(function: Term) -> Self {
        let spec = match &function.node {
            Node::Function(f) => f.window.clone().unwrap_or_default(),
            _ => WindowSpec::default(),
        };
        Self { function, spec }
    }

    /// Add PARTITION BY terms.
    pub fn partition_by<I, T>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Term>,
    {
        self.spec
            .partition_by
            .extend(terms.into_iter().map(Into::into));
        self
    }

    /// Add an ORDER BY term, optionally with a direction.
    pub fn orderby(mut self, term: impl Into<Term>, order: impl Into<Option<Order>>) -> Self {
        self.spec.order_by.push((term.into(), order.into()));
        self
    }

    /// `ROWS <start>` or `ROWS BETWEEN <start> AND <end>`.
    pub fn rows(self, start: FrameBound, end: impl Into<Option<FrameBound>>) -> Result<Self> {
        self.frame(FrameKind::Rows, start, end.into())
    }

    /// `RANGE <start>` or `RANGE BETWEEN <start> AND <end>`.
    pub fn range(self, start: FrameBound, end: impl Into<Option<FrameBound>>) -> Result<Self> {
        self.frame(FrameKind::Range, start, end.into())
    }

    fn frame(mut self, kind: FrameKind, start: FrameBound, end: Option<FrameBound>) -> Result<Self> {
        if self.spec.frame.is_some() {
            return Err(QueryError::grouping("'rows' or 'range' is already set"));
        }
        let frame = Frame { kind, start, end };
        frame.validate()?;
        self.spec.frame = Some(frame);
        Ok(self)
    }

    /// Attach the window to the function.
    pub fn build(mut self) -> Result<Term> {
        match &mut self.function.node {
            Node::Function(f) => {
                f.window = Some(self.spec);
                Ok(self.function)
            }
            _ => Err(QueryError::usage("OVER can only be applied to a function")),
        }
    }
}
