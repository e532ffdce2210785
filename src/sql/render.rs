//! Rendering entry points.
//!
//! Every renderable node lowers itself to a [`TokenStream`] under a
//! [`RenderCtx`]; the stream is then serialized once, which is where
//! quoting, literal encoding and placeholder substitution happen.

use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::dialect::{Dialect, SqlDialect};
use super::param::{BoundParams, ParamStyle, Parameterizer};
use super::term::SourceId;
use super::token::{Serializer, Token, TokenStream};
use crate::error::Result;

/// Output options accepted by [`Render::get_sql_with`].
///
/// `None` fields fall back to the dialect of the rendered statement.
///
/// # Examples
///
/// ```
/// use querycraft::sql::render::{Render, RenderOptions};
/// use querycraft::sql::query::Query;
/// use querycraft::sql::dialect::Dialect;
///
/// let q = Query::from_("abc").select(["foo"]).unwrap();
/// let sql = q.get_sql_with(&RenderOptions::new().dialect(Dialect::MySql)).unwrap();
/// assert_eq!(sql, "SELECT `foo` FROM `abc`");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub dialect: Option<Dialect>,
    /// Identifier quote override. `Some(None)` leaves identifiers bare.
    pub quote_char: Option<Option<char>>,
    /// Alias quote override. Falls back to `quote_char`, then the dialect.
    pub alias_quote_char: Option<Option<char>>,
    /// Emit ` AS "alias"` instead of ` "alias"`.
    pub as_keyword: bool,
    /// Qualify every field with its table, even in single-table queries.
    pub with_namespace: bool,
    pub groupby_alias: bool,
    pub orderby_alias: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            dialect: None,
            quote_char: None,
            alias_quote_char: None,
            as_keyword: false,
            with_namespace: false,
            groupby_alias: true,
            orderby_alias: true,
        }
    }
}

impl RenderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn quote_char(mut self, quote_char: Option<char>) -> Self {
        self.quote_char = Some(quote_char);
        self
    }

    pub fn alias_quote_char(mut self, alias_quote_char: Option<char>) -> Self {
        self.alias_quote_char = Some(alias_quote_char);
        self
    }

    pub fn as_keyword(mut self, as_keyword: bool) -> Self {
        self.as_keyword = as_keyword;
        self
    }

    pub fn with_namespace(mut self, with_namespace: bool) -> Self {
        self.with_namespace = with_namespace;
        self
    }

    pub fn groupby_alias(mut self, groupby_alias: bool) -> Self {
        self.groupby_alias = groupby_alias;
        self
    }

    pub fn orderby_alias(mut self, orderby_alias: bool) -> Self {
        self.orderby_alias = orderby_alias;
        self
    }
}

/// Context threaded through token generation.
///
/// Cheap to clone: the alias table is shared.
#[derive(Debug, Clone)]
pub struct RenderCtx {
    pub(crate) dialect: Dialect,
    pub(crate) with_alias: bool,
    pub(crate) with_namespace: bool,
    pub(crate) force_namespace: bool,
    pub(crate) subquery: bool,
    pub(crate) groupby_alias: bool,
    pub(crate) orderby_alias: bool,
    pub(crate) as_keyword: bool,
    /// Aliases assigned by enclosing queries to sources without one
    /// (`sq0`, self-joined `abc2`), keyed by source identity.
    pub(crate) aliases: Rc<HashMap<SourceId, String>>,
}

impl RenderCtx {
    pub fn new(dialect: Dialect) -> Self {
        Self::from_options(dialect, &RenderOptions::default())
    }

    pub fn from_options(dialect: Dialect, options: &RenderOptions) -> Self {
        Self {
            dialect,
            with_alias: false,
            with_namespace: options.with_namespace,
            force_namespace: options.with_namespace,
            subquery: false,
            groupby_alias: options.groupby_alias,
            orderby_alias: options.orderby_alias,
            as_keyword: options.as_keyword,
            aliases: Rc::new(HashMap::new()),
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// Context for an operand nested inside another expression.
    pub(crate) fn nested(&self) -> Self {
        self.with_alias(false)
    }

    pub(crate) fn with_alias(&self, with_alias: bool) -> Self {
        let mut ctx = self.clone();
        ctx.with_alias = with_alias;
        ctx
    }

    pub(crate) fn subquery(&self, subquery: bool) -> Self {
        let mut ctx = self.clone();
        ctx.subquery = subquery;
        ctx
    }

    pub(crate) fn with_namespace(&self, with_namespace: bool) -> Self {
        let mut ctx = self.clone();
        ctx.with_namespace = with_namespace;
        ctx
    }

    /// Context for the clauses of a query with its own namespace rule and
    /// automatically assigned source aliases.
    pub(crate) fn enter_query(&self, with_namespace: bool, aliases: &HashMap<SourceId, String>) -> Self {
        let mut ctx = self.clone();
        ctx.with_alias = false;
        ctx.subquery = false;
        ctx.with_namespace = self.force_namespace || with_namespace;
        if !aliases.is_empty() {
            let mut merged = (*self.aliases).clone();
            merged.extend(aliases.iter().map(|(id, a)| (*id, a.clone())));
            ctx.aliases = Rc::new(merged);
        }
        ctx
    }

    pub(crate) fn alias_of(&self, id: SourceId) -> Option<&str> {
        self.aliases.get(&id).map(String::as_str)
    }

    /// Append ` "alias"` (or ` AS "alias"`) to `ts`.
    pub(crate) fn push_alias(&self, ts: &mut TokenStream, alias: &str) {
        ts.space();
        if self.as_keyword {
            ts.push(Token::As).space();
        }
        ts.push(Token::Alias(alias.to_string()));
    }
}

/// Anything that renders to SQL.
pub trait Render {
    /// Lower to tokens under `ctx`.
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream>;

    /// Dialect used when the caller does not pick one.
    fn default_dialect(&self) -> Dialect {
        Dialect::Ansi
    }

    /// Short statement label for logs.
    fn statement_kind(&self) -> &'static str {
        "term"
    }

    /// Render with the default dialect and options.
    fn get_sql(&self) -> Result<String> {
        render(self, &RenderOptions::default(), None)
    }

    fn get_sql_with(&self, options: &RenderOptions) -> Result<String> {
        render(self, options, None)
    }

    /// Render with every literal replaced by a placeholder from `params`.
    fn get_parameterized_sql(
        &self,
        options: &RenderOptions,
        params: &mut Parameterizer,
    ) -> Result<String> {
        render(self, options, Some(params))
    }

    /// Render with a fresh parameterizer and return the bound values.
    fn to_parameterized(&self, style: ParamStyle) -> Result<(String, BoundParams)> {
        let mut params = Parameterizer::new(style);
        let sql = render(self, &RenderOptions::default(), Some(&mut params))?;
        Ok((sql, params.into_params()))
    }
}

fn render<R: Render + ?Sized>(
    item: &R,
    options: &RenderOptions,
    params: Option<&mut Parameterizer>,
) -> Result<String> {
    let dialect = options.dialect.unwrap_or_else(|| item.default_dialect());
    let ctx = RenderCtx::from_options(dialect, options);
    let tokens = item.to_tokens(&ctx)?;

    let quote_char = options.quote_char.unwrap_or_else(|| dialect.quote_char());
    let alias_quote_char = options
        .alias_quote_char
        .or(options.quote_char)
        .unwrap_or_else(|| dialect.alias_quote_char());
    let out = Serializer::new(dialect)
        .quote_char(quote_char)
        .alias_quote_char(alias_quote_char);

    let (sql, bound) = match params {
        Some(p) => {
            let sql = tokens.serialize_with(&mut out.parameterizer(&mut *p))?;
            (sql, p.len())
        }
        None => {
            let mut out = out;
            (tokens.serialize_with(&mut out)?, 0)
        }
    };

    debug!(
        dialect = dialect.name(),
        kind = item.statement_kind(),
        params = bound,
        "rendered statement"
    );
    Ok(sql)
}
