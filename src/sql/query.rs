//! Query builder - construct SQL statements with a fluent API.
//!
//! [`Query`] is the entry point. Every statement kind (SELECT, INSERT,
//! UPDATE, DELETE) is one [`QueryBuilder`] value; which clauses are staged
//! decides what it renders as. Builder methods consume the builder and hand
//! it back, so a chain reads like a single expression:
//!
//! ```
//! use querycraft::sql::query::Query;
//! use querycraft::sql::render::Render;
//! use querycraft::sql::term::{Table, TermExt};
//!
//! let customers = Table::new("customers");
//! let q = Query::from_(customers.clone())
//!     .select(["id", "fname"])
//!     .unwrap()
//!     .where_(customers.field("age").gt(18))
//!     .limit(10);
//! assert_eq!(
//!     q.get_sql().unwrap(),
//!     "SELECT \"id\",\"fname\" FROM \"customers\" WHERE \"age\">18 LIMIT 10"
//! );
//! ```
//!
//! Fields are qualified with their table only when the query needs it:
//! when it has joins, several FROM sources, a subquery source, an UPDATE
//! with its own FROM, or a WHERE referencing a table the query does not
//! select from.

use std::collections::HashMap;

use tracing::trace;

use super::case::Case;
use super::criterion::Criterion;
use super::ddl::{CreateTable, DropKind, DropQuery};
use super::dialect::{Dialect, RollupStyle, SqlDialect};
use super::dml::Dml;
use super::functions::Function;
use super::interval::Interval;
use super::join::{Join, JoinType, Joiner};
use super::render::{Render, RenderCtx};
use super::set_op::{SetOpKind, SetOperation};
use super::term::{tokens_of, Namespace, Node, Order, SourceId, Table, Term};
use super::token::{Token, TokenStream};
use crate::error::{QueryError, Result};

// =============================================================================
// Select items and sources
// =============================================================================

/// A select-list or column argument: a bare column name or any term.
///
/// Column names resolve against the first FROM source (or the statement's
/// target table), so `"*"` and `"id"` need no explicit table.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Column(String),
    Term(Term),
}

impl SelectItem {
    /// Resolve to a term, qualifying column names with `namespace`.
    pub(crate) fn into_term(self, namespace: Option<&Namespace>) -> Term {
        match self {
            SelectItem::Column(name) if name == "*" => Term::star(),
            SelectItem::Column(name) => match namespace {
                Some(ns) => Term::qualified(ns.clone(), name),
                None => Term::field(name),
            },
            SelectItem::Term(term) => term,
        }
    }
}

impl From<&str> for SelectItem {
    fn from(name: &str) -> Self {
        SelectItem::Column(name.to_string())
    }
}

impl From<String> for SelectItem {
    fn from(name: String) -> Self {
        SelectItem::Column(name)
    }
}

macro_rules! select_item_from_term {
    ($($t:ty),*) => {
        $(
            impl From<$t> for SelectItem {
                fn from(v: $t) -> Self {
                    SelectItem::Term(Term::from(v))
                }
            }
        )*
    };
}

select_item_from_term!(
    Term,
    Criterion,
    Function,
    Case,
    Interval,
    QueryBuilder,
    SetOperation,
    i32,
    i64,
    f64,
    bool
);

/// A FROM or JOIN source.
#[derive(Debug, Clone, PartialEq)]
pub enum Source {
    Table(Table),
    Query(Box<Selectable>),
}

impl Source {
    pub(crate) fn table(&self) -> Option<&Table> {
        match self {
            Source::Table(t) => Some(t),
            Source::Query(_) => None,
        }
    }

    pub(crate) fn id(&self) -> SourceId {
        match self {
            Source::Table(t) => t.id,
            Source::Query(q) => q.id(),
        }
    }

    /// What fields of this source are qualified by.
    pub(crate) fn namespace(&self) -> Namespace {
        match self {
            Source::Table(t) => Namespace::Table(t.clone()),
            Source::Query(q) => Namespace::Query {
                id: q.id(),
                alias: q.alias().map(str::to_string),
            },
        }
    }

    pub(crate) fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        match self {
            Source::Table(t) => t.to_tokens(ctx),
            Source::Query(q) => q.to_tokens(&ctx.subquery(true).with_alias(true)),
        }
    }
}

impl From<&str> for Source {
    fn from(name: &str) -> Self {
        Source::Table(Table::new(name))
    }
}

impl From<String> for Source {
    fn from(name: String) -> Self {
        Source::Table(Table::new(name))
    }
}

impl From<Table> for Source {
    fn from(table: Table) -> Self {
        Source::Table(table)
    }
}

impl From<QueryBuilder> for Source {
    fn from(q: QueryBuilder) -> Self {
        Source::Query(Box::new(Selectable::from(q)))
    }
}

impl From<SetOperation> for Source {
    fn from(s: SetOperation) -> Self {
        Source::Query(Box::new(Selectable::from(s)))
    }
}

impl From<Selectable> for Source {
    fn from(s: Selectable) -> Self {
        Source::Query(Box::new(s))
    }
}

/// Anything that can stand where a subquery is expected.
#[derive(Debug, Clone, PartialEq)]
pub enum Selectable {
    Query(Box<QueryBuilder>),
    SetOp(Box<SetOperation>),
}

impl Selectable {
    pub fn id(&self) -> SourceId {
        match self {
            Selectable::Query(q) => q.id,
            Selectable::SetOp(s) => s.id,
        }
    }

    pub fn alias(&self) -> Option<&str> {
        match self {
            Selectable::Query(q) => q.alias.as_deref(),
            Selectable::SetOp(s) => s.alias.as_deref(),
        }
    }

    pub(crate) fn set_alias(&mut self, alias: String) {
        match self {
            Selectable::Query(q) => q.alias = Some(alias),
            Selectable::SetOp(s) => s.alias = Some(alias),
        }
    }

    fn subquery_count(&self) -> usize {
        match self {
            Selectable::Query(q) => q.subquery_count,
            Selectable::SetOp(_) => 0,
        }
    }
}

impl From<QueryBuilder> for Selectable {
    fn from(q: QueryBuilder) -> Self {
        Selectable::Query(Box::new(q))
    }
}

impl From<SetOperation> for Selectable {
    fn from(s: SetOperation) -> Self {
        Selectable::SetOp(Box::new(s))
    }
}

impl Render for Selectable {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        match self {
            Selectable::Query(q) => q.to_tokens(ctx),
            Selectable::SetOp(s) => s.to_tokens(ctx),
        }
    }

    fn default_dialect(&self) -> Dialect {
        match self {
            Selectable::Query(q) => q.default_dialect(),
            Selectable::SetOp(s) => s.default_dialect(),
        }
    }

    fn statement_kind(&self) -> &'static str {
        match self {
            Selectable::Query(q) => q.statement_kind(),
            Selectable::SetOp(s) => s.statement_kind(),
        }
    }
}

/// A common table expression bound by WITH.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Cte {
    pub(crate) name: String,
    pub(crate) columns: Vec<String>,
    pub(crate) query: Selectable,
    pub(crate) recursive: bool,
}

// =============================================================================
// Clause options
// =============================================================================

/// MSSQL `TOP (n) [PERCENT] [WITH TIES]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Top {
    n: u64,
    percent: bool,
    with_ties: bool,
}

/// What a locking read does when a row is already locked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LockWait {
    #[default]
    Wait,
    NoWait,
    SkipLocked,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ForUpdate {
    of: Vec<Table>,
    wait: LockWait,
}

// =============================================================================
// Entry points
// =============================================================================

/// Entry point for building statements with the generic dialect.
///
/// For a specific database start from [`Dialect::query`] instead, e.g.
/// `Dialect::Postgres.query().from_("abc")`.
pub struct Query;

impl Query {
    /// `SELECT ... FROM <source>`
    pub fn from_(source: impl Into<Source>) -> QueryBuilder {
        QueryBuilder::new(Dialect::Ansi).from_(source)
    }

    /// SELECT without a FROM clause, e.g. `SELECT 1+1`.
    pub fn select<I, S>(items: I) -> Result<QueryBuilder>
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        QueryBuilder::new(Dialect::Ansi).select(items)
    }

    /// `INSERT INTO <table>`
    pub fn into_table(table: impl Into<Table>) -> QueryBuilder {
        Dialect::Ansi.query().insert_target(table)
    }

    /// `UPDATE <table>`
    pub fn update(table: impl Into<Table>) -> QueryBuilder {
        QueryBuilder::new(Dialect::Ansi).update_target(table)
    }

    /// `WITH <name> AS (<query>) ...`
    pub fn with_(query: impl Into<Selectable>, name: impl Into<String>) -> QueryBuilder {
        QueryBuilder::new(Dialect::Ansi).with_(query, name)
    }

    pub fn create_table(table: impl Into<Table>) -> CreateTable {
        CreateTable::new(table)
    }

    pub fn drop_table(table: impl Into<Table>) -> DropQuery {
        DropQuery::new(DropKind::Table, table)
    }

    pub fn drop_view(view: impl Into<Table>) -> DropQuery {
        DropQuery::new(DropKind::View, view)
    }

    pub fn drop_index(index: impl Into<Table>) -> DropQuery {
        DropQuery::new(DropKind::Index, index)
    }

    pub fn drop_database(database: impl Into<Table>) -> DropQuery {
        DropQuery::new(DropKind::Database, database)
    }

    pub fn drop_user(user: impl Into<Table>) -> DropQuery {
        DropQuery::new(DropKind::User, user)
    }
}

impl Dialect {
    /// An empty builder rendering for this dialect.
    pub fn query(self) -> QueryBuilder {
        QueryBuilder::new(self)
    }

    pub fn create_table(self, table: impl Into<Table>) -> CreateTable {
        CreateTable::new(table).for_dialect(self)
    }

    pub fn drop_table(self, table: impl Into<Table>) -> DropQuery {
        DropQuery::new(DropKind::Table, table).for_dialect(self)
    }
}

// =============================================================================
// QueryBuilder
// =============================================================================

/// Accumulated clauses of one statement.
///
/// By default every chained call yields a new value with a fresh
/// [`SourceId`]. With `.immutable(false)` the id is kept, so the builder
/// stays the same handle across the chain. Rendered output is identical in
/// both modes.
#[derive(Debug, Clone)]
#[must_use = "builders have no effect until rendered"]
pub struct QueryBuilder {
    pub(crate) id: SourceId,
    pub(crate) dialect: Dialect,
    pub(crate) immutable: bool,
    pub(crate) alias: Option<String>,

    pub(crate) with: Vec<Cte>,
    pub(crate) from: Vec<Source>,
    pub(crate) selects: Vec<Term>,
    pub(crate) select_star: bool,
    pub(crate) star_namespaces: Vec<Namespace>,
    pub(crate) distinct: bool,
    pub(crate) distinct_on: Vec<Term>,
    pub(crate) top: Option<Top>,
    pub(crate) joins: Vec<Join>,
    pub(crate) wheres: Criterion,
    pub(crate) groupbys: Vec<Term>,
    pub(crate) with_rollup: bool,
    pub(crate) havings: Criterion,
    pub(crate) orderbys: Vec<(Term, Option<Order>)>,
    pub(crate) limit: Option<u64>,
    pub(crate) offset: Option<u64>,
    pub(crate) for_update: Option<ForUpdate>,

    pub(crate) dml: Dml,

    /// Next `sqN` suffix for unaliased subqueries.
    pub(crate) subquery_count: usize,
    /// Aliases this query assigned to its sources.
    pub(crate) aliases: HashMap<SourceId, String>,
}

/// Queries compare by identity: a clone is equal, a fork is not.
impl PartialEq for QueryBuilder {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl QueryBuilder {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            id: SourceId::next(),
            dialect,
            immutable: true,
            alias: None,
            with: Vec::new(),
            from: Vec::new(),
            selects: Vec::new(),
            select_star: false,
            star_namespaces: Vec::new(),
            distinct: false,
            distinct_on: Vec::new(),
            top: None,
            joins: Vec::new(),
            wheres: Criterion::Empty,
            groupbys: Vec::new(),
            with_rollup: false,
            havings: Criterion::Empty,
            orderbys: Vec::new(),
            limit: None,
            offset: None,
            for_update: None,
            dml: Dml::default(),
            subquery_count: 0,
            aliases: HashMap::new(),
        }
    }

    pub fn id(&self) -> SourceId {
        self.id
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// `false` keeps this builder's identity across chained calls.
    pub fn immutable(mut self, immutable: bool) -> Self {
        self.immutable = immutable;
        self
    }

    /// An independent copy with its own identity.
    pub fn fork(&self) -> Self {
        let mut copy = self.clone();
        copy.id = SourceId::next();
        copy
    }

    /// Finish a chained step.
    pub(crate) fn touch(mut self) -> Self {
        if self.immutable {
            self.id = SourceId::next();
        }
        self
    }

    /// Alias used when this query appears as a subquery.
    pub fn as_(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// A column of this query, for use by an enclosing query.
    pub fn field(&self, name: impl Into<String>) -> Term {
        Term::qualified(self.namespace(), name)
    }

    /// `"sq0".*`
    pub fn star(&self) -> Term {
        Term::new(Node::Star(Some(self.namespace())))
    }

    fn namespace(&self) -> Namespace {
        Namespace::Query {
            id: self.id,
            alias: self.alias.clone(),
        }
    }

    /// Number of select-list entries.
    pub fn select_count(&self) -> usize {
        self.selects.len()
    }

    /// Namespace that bare column names resolve to.
    pub(crate) fn from_namespace(&self) -> Option<Namespace> {
        self.from.first().map(Source::namespace)
    }

    // === Sources ===

    /// Add a FROM source. Unaliased subqueries are named `sq0`, `sq1`, ...
    pub fn from_(mut self, source: impl Into<Source>) -> Self {
        let mut source = source.into();
        if let Source::Query(query) = &mut source {
            if query.alias().is_none() {
                let n = self.subquery_count.max(query.subquery_count());
                self.subquery_count = n + 1;
                self.tag_subquery(query, n);
            }
        }
        self.from.push(source);
        self.touch()
    }

    pub(crate) fn tag_subquery(&mut self, query: &mut Selectable, n: usize) {
        let alias = format!("sq{}", n);
        trace!(alias = %alias, "aliased subquery");
        self.aliases.insert(query.id(), alias.clone());
        query.set_alias(alias);
    }

    /// `WITH <name> AS (<query>)`
    pub fn with_(self, query: impl Into<Selectable>, name: impl Into<String>) -> Self {
        self.push_cte(query.into(), name.into(), Vec::new(), false)
    }

    /// `WITH <name> (<columns>) AS (<query>)`
    pub fn with_columns<I, S>(self, query: impl Into<Selectable>, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.push_cte(query.into(), name.into(), columns, false)
    }

    /// `WITH RECURSIVE <name> (<columns>) AS (<query>)`
    pub fn with_recursive<I, S>(self, query: impl Into<Selectable>, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = columns.into_iter().map(Into::into).collect();
        self.push_cte(query.into(), name.into(), columns, true)
    }

    fn push_cte(mut self, query: Selectable, name: String, columns: Vec<String>, recursive: bool) -> Self {
        self.with.push(Cte {
            name,
            columns,
            query,
            recursive,
        });
        self.touch()
    }

    // === Select list ===

    /// Add select-list entries.
    ///
    /// Column names need a FROM source. Selecting `*` replaces the whole
    /// list and later fields are ignored; `t.star()` does the same for the
    /// fields of `t`.
    pub fn select<I, S>(mut self, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        if !self.dml.values.is_empty() {
            return Err(QueryError::configuration(
                "cannot select into an INSERT that already has VALUES",
            ));
        }
        if self.dml.update_table.is_some() || self.dml.delete_from {
            return Err(QueryError::configuration(
                "select() cannot be combined with UPDATE or DELETE",
            ));
        }
        for item in items {
            match item.into() {
                SelectItem::Column(name) => {
                    let ns = self.from_namespace().ok_or_else(|| {
                        QueryError::configuration(format!(
                            "cannot select {}, no FROM table specified",
                            name
                        ))
                    })?;
                    let term = SelectItem::Column(name).into_term(Some(&ns));
                    self.select_field(term);
                }
                SelectItem::Term(term) => match term.node {
                    Node::Field { .. } | Node::Star(_) => self.select_field(term),
                    _ => self.selects.push(term),
                },
            }
        }
        Ok(self.touch())
    }

    fn select_field(&mut self, term: Term) {
        if self.select_star {
            return;
        }
        let namespace = term.namespace().cloned();
        if let Some(ns) = &namespace {
            if self.star_namespaces.contains(ns) {
                return;
            }
        }
        if term.is_star() {
            match namespace {
                None => {
                    self.select_star = true;
                    self.selects = vec![term];
                    return;
                }
                Some(ns) => {
                    self.selects.retain(|s| s.namespace() != Some(&ns));
                    self.star_namespaces.push(ns);
                }
            }
        }
        self.selects.push(term);
    }

    /// `SELECT DISTINCT`
    pub fn distinct(mut self) -> Self {
        self.distinct = true;
        self.touch()
    }

    /// PostgreSQL `SELECT DISTINCT ON(...)`.
    pub fn distinct_on<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        let ns = self.from_namespace();
        self.distinct_on
            .extend(items.into_iter().map(|i| i.into().into_term(ns.as_ref())));
        self.touch()
    }

    /// MSSQL `TOP (n) [PERCENT] [WITH TIES]`.
    pub fn top(mut self, n: u64, percent: bool, with_ties: bool) -> Result<Self> {
        if percent && n > 100 {
            return Err(QueryError::usage(format!(
                "TOP value must be between 0 and 100 when PERCENT is used, got {}",
                n
            )));
        }
        self.top = Some(Top {
            n,
            percent,
            with_ties,
        });
        Ok(self.touch())
    }

    // === Filtering and grouping ===

    /// Add a WHERE criterion, ANDed with any existing one.
    pub fn where_(mut self, criterion: impl Into<Criterion>) -> Self {
        let criterion = criterion.into();
        if !criterion.is_empty() {
            self.wheres = std::mem::take(&mut self.wheres) & criterion;
        }
        self.touch()
    }

    /// Add a HAVING criterion, ANDed with any existing one.
    pub fn having(mut self, criterion: impl Into<Criterion>) -> Self {
        let criterion = criterion.into();
        if !criterion.is_empty() {
            self.havings = std::mem::take(&mut self.havings) & criterion;
        }
        self.touch()
    }

    pub fn groupby<I, S>(mut self, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        let ns = self.from_namespace();
        self.groupbys
            .extend(items.into_iter().map(|i| i.into().into_term(ns.as_ref())));
        self.touch()
    }

    /// Roll the grouping up.
    ///
    /// Renders `GROUP BY ROLLUP(...)`; repeated calls extend the last
    /// ROLLUP. MySQL instead appends the terms to GROUP BY and adds
    /// `WITH ROLLUP`, which can only be done once and needs at least one
    /// group.
    pub fn rollup<I, S>(mut self, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        let ns = self.from_namespace();
        let terms: Vec<Term> = items
            .into_iter()
            .map(|i| i.into().into_term(ns.as_ref()))
            .collect();

        match self.dialect.rollup_style() {
            RollupStyle::WithRollup => {
                if self.with_rollup {
                    return Err(QueryError::grouping("ROLLUP is already applied"));
                }
                if terms.is_empty() && self.groupbys.is_empty() {
                    return Err(QueryError::grouping(
                        "at least one group is required, call groupby() or pass terms to rollup()",
                    ));
                }
                self.with_rollup = true;
                self.groupbys.extend(terms);
            }
            RollupStyle::Function => {
                let extended = match self.groupbys.last_mut().map(|t| &mut t.node) {
                    Some(Node::Function(f)) if f.name == "ROLLUP" => {
                        f.args.extend(terms.iter().cloned());
                        true
                    }
                    _ => false,
                };
                if !extended {
                    self.groupbys.push(Function::new("ROLLUP", terms).into());
                }
            }
        }
        Ok(self.touch())
    }

    // === Ordering and pagination ===

    /// Add ORDER BY terms, all with the same direction.
    pub fn orderby<I, S>(mut self, items: I, order: impl Into<Option<Order>>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        let ns = self.from_namespace();
        let order = order.into();
        self.orderbys.extend(
            items
                .into_iter()
                .map(|i| (i.into().into_term(ns.as_ref()), order)),
        );
        self.touch()
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self.touch()
    }

    pub fn offset(mut self, offset: u64) -> Self {
        self.offset = Some(offset);
        self.touch()
    }

    /// `FOR UPDATE`
    pub fn for_update(self) -> Self {
        self.for_update_with(Vec::<Table>::new(), LockWait::Wait)
    }

    /// `FOR UPDATE [OF ...] [NOWAIT | SKIP LOCKED]`
    pub fn for_update_with<I, T>(mut self, of: I, wait: LockWait) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Table>,
    {
        self.for_update = Some(ForUpdate {
            of: of.into_iter().map(Into::into).collect(),
            wait,
        });
        self.touch()
    }

    // === Joins ===

    /// `JOIN <item>`; finish with [`Joiner::on`], `on_field`, `using` or `cross`.
    pub fn join(self, item: impl Into<Source>) -> Joiner {
        self.join_with(item, JoinType::Inner)
    }

    pub fn left_join(self, item: impl Into<Source>) -> Joiner {
        self.join_with(item, JoinType::Left)
    }

    pub fn right_join(self, item: impl Into<Source>) -> Joiner {
        self.join_with(item, JoinType::Right)
    }

    pub fn outer_join(self, item: impl Into<Source>) -> Joiner {
        self.join_with(item, JoinType::Outer)
    }

    /// `CROSS JOIN <item>`
    pub fn cross_join(self, item: impl Into<Source>) -> Result<Self> {
        self.join_with(item, JoinType::Cross).cross()
    }

    /// Start a join of any kind. Unaliased subqueries are tagged `sqN`.
    pub fn join_with(mut self, item: impl Into<Source>, how: JoinType) -> Joiner {
        let mut item = item.into();
        if let Source::Query(query) = &mut item {
            if query.alias().is_none() {
                let n = self.subquery_count;
                self.subquery_count += 1;
                self.tag_subquery(query, n);
            }
        }
        Joiner::new(self, item, how)
    }

    /// Validate and append a join. A table joined to itself without an
    /// alias is renamed `<name>2`.
    pub(crate) fn do_join(mut self, mut join: Join) -> Result<Self> {
        join.validate(&self)?;
        if let Source::Table(table) = &mut join.item {
            if table.alias.is_none() && self.is_base_table(table) {
                let alias = format!("{}2", table.name);
                trace!(table = %table.name, alias = %alias, "aliased self join");
                self.aliases.insert(table.id, alias.clone());
                table.alias = Some(alias);
            }
        }
        self.joins.push(join);
        Ok(self.touch())
    }

    /// FROM, UPDATE target and CTE tables.
    fn is_base_table(&self, table: &Table) -> bool {
        self.from.iter().any(|s| s.table() == Some(table))
            || self.dml.update_table.as_ref() == Some(table)
            || self
                .with
                .iter()
                .any(|cte| table.schema.is_empty() && table.name == cte.name)
    }

    /// Whether `table` is selected from or joined.
    pub(crate) fn has_table(&self, table: &Table) -> bool {
        self.is_base_table(table) || self.joins.iter().any(|j| j.item.table() == Some(table))
    }

    /// Whether a subquery with this identity is a FROM or JOIN source.
    pub(crate) fn has_source(&self, id: SourceId) -> bool {
        self.from.iter().any(|s| s.id() == id) || self.joins.iter().any(|j| j.item.id() == id)
    }

    // === Set operations ===

    pub fn union(self, other: QueryBuilder) -> SetOperation {
        SetOperation::new(self, SetOpKind::Union, other)
    }

    pub fn union_all(self, other: QueryBuilder) -> SetOperation {
        SetOperation::new(self, SetOpKind::UnionAll, other)
    }

    pub fn intersect(self, other: QueryBuilder) -> SetOperation {
        SetOperation::new(self, SetOpKind::Intersect, other)
    }

    pub fn except_of(self, other: QueryBuilder) -> SetOperation {
        SetOperation::new(self, SetOpKind::Except, other)
    }

    pub fn minus(self, other: QueryBuilder) -> SetOperation {
        SetOperation::new(self, SetOpKind::Minus, other)
    }

    // === Rendering ===

    /// Nothing staged that would render a statement.
    pub fn is_empty(&self) -> bool {
        let dml = &self.dml;
        if self.selects.is_empty()
            && dml.insert_table.is_none()
            && !dml.delete_from
            && dml.update_table.is_none()
        {
            return true;
        }
        if dml.insert_table.is_some() && self.selects.is_empty() && dml.values.is_empty() {
            return true;
        }
        dml.update_table.is_some() && dml.updates.is_empty()
    }

    fn uses_namespace(&self) -> bool {
        !self.joins.is_empty()
            || self.from.len() > 1
            || matches!(self.from.first(), Some(Source::Query(_)))
            || (self.dml.update_table.is_some() && !self.from.is_empty())
            || self.references_foreign_table()
    }

    /// WHERE mentions a table the query neither selects from nor joins.
    fn references_foreign_table(&self) -> bool {
        self.wheres.namespaces().into_iter().any(|ns| match ns {
            Namespace::Table(t) => !self.has_table(t),
            _ => false,
        })
    }

    fn with_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        if self.with.is_empty() {
            return Ok(ts);
        }
        ts.push(Token::With).space();
        if self.with.iter().any(|c| c.recursive) && ctx.dialect.emit_recursive_keyword() {
            ts.push(Token::Recursive).space();
        }
        for (i, cte) in self.with.iter().enumerate() {
            if i > 0 {
                ts.comma();
            }
            ts.push(Token::Ident(cte.name.clone()));
            if !cte.columns.is_empty() {
                let columns: Vec<TokenStream> = cte
                    .columns
                    .iter()
                    .map(|c| {
                        let mut col = TokenStream::new();
                        col.push(Token::Ident(c.clone()));
                        col
                    })
                    .collect();
                ts.space().lparen().append_list(&columns).rparen();
            }
            let body = cte.query.to_tokens(&ctx.subquery(false).with_alias(false))?;
            ts.keyword(Token::As).append_parens(&body);
        }
        ts.space();
        Ok(ts)
    }

    /// `SELECT [DISTINCT] [TOP] <list>`
    pub(crate) fn select_clause(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Select).space();

        if !self.distinct_on.is_empty() {
            if !ctx.dialect.supports_distinct_on() {
                return Err(QueryError::unsupported(ctx.dialect.name(), "DISTINCT ON"));
            }
            let items = tokens_of(&self.distinct_on, &ctx.nested())?;
            ts.push(Token::Distinct)
                .space()
                .push(Token::On)
                .lparen()
                .append_list(&items)
                .rparen()
                .space();
        } else if self.distinct {
            ts.push(Token::Distinct).space();
        }

        if let Some(top) = &self.top {
            if !ctx.dialect.supports_top() {
                return Err(QueryError::unsupported(ctx.dialect.name(), "TOP"));
            }
            ts.push(Token::Top)
                .space()
                .lparen()
                .push(Token::LitInt(i64::try_from(top.n).unwrap_or(i64::MAX)))
                .rparen()
                .space();
            if top.percent {
                ts.push(Token::Percent).space();
            }
            if top.with_ties {
                ts.push(Token::Raw("WITH TIES".into())).space();
            }
        }

        let items = tokens_of(&self.selects, &ctx.with_alias(true))?;
        ts.append_list(&items);
        Ok(ts)
    }

    pub(crate) fn from_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        if self.from.is_empty() {
            return Ok(ts);
        }
        let sources = self
            .from
            .iter()
            .map(|s| s.to_tokens(ctx))
            .collect::<Result<Vec<_>>>()?;
        ts.space().push(Token::From).space().append_list(&sources);
        Ok(ts)
    }

    pub(crate) fn join_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        for join in &self.joins {
            ts.space().append(&join.to_tokens(ctx)?);
        }
        Ok(ts)
    }

    pub(crate) fn where_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        if !self.wheres.is_empty() {
            ts.space()
                .push(Token::Where)
                .space()
                .append(&self.wheres.to_tokens(&ctx.nested())?);
        }
        Ok(ts)
    }

    /// A GROUP BY / ORDER BY entry: the select alias when allowed, else
    /// the expression.
    fn clause_term(&self, term: &Term, use_alias: bool, ctx: &RenderCtx) -> Result<TokenStream> {
        if use_alias {
            if let Some(alias) = term.alias() {
                if self.selects.iter().any(|s| s.alias() == Some(alias)) {
                    let mut ts = TokenStream::new();
                    ts.push(Token::Alias(alias.to_string()));
                    return Ok(ts);
                }
            }
        }
        term.to_tokens(&ctx.nested())
    }

    pub(crate) fn orderby_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        if self.orderbys.is_empty() {
            return Ok(ts);
        }
        let items = self
            .orderbys
            .iter()
            .map(|(term, order)| {
                let mut item = self.clause_term(term, ctx.orderby_alias, ctx)?;
                if let Some(order) = order {
                    item.space().push(order.token());
                }
                Ok(item)
            })
            .collect::<Result<Vec<_>>>()?;
        ts.space().push(Token::OrderBy).space().append_list(&items);
        Ok(ts)
    }

    /// Everything after the select list: FROM through FOR UPDATE.
    pub(crate) fn select_tail(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let dialect = ctx.dialect;
        let mut ts = self.from_tokens(ctx)?;
        ts.append(&self.join_tokens(ctx)?);
        ts.append(&self.where_tokens(ctx)?);

        if !self.groupbys.is_empty() {
            let use_alias = ctx.groupby_alias && dialect.supports_groupby_alias();
            let items = self
                .groupbys
                .iter()
                .map(|t| self.clause_term(t, use_alias, ctx))
                .collect::<Result<Vec<_>>>()?;
            ts.space().push(Token::GroupBy).space().append_list(&items);
            if self.with_rollup {
                ts.space()
                    .push(Token::With)
                    .space()
                    .push(Token::Raw("ROLLUP".into()));
            }
        }

        if !self.havings.is_empty() {
            ts.space()
                .push(Token::Having)
                .space()
                .append(&self.havings.to_tokens(&ctx.nested())?);
        }

        ts.append(&self.orderby_tokens(ctx)?);

        let offset = self.offset.filter(|o| *o > 0);
        if (self.limit.is_some() || offset.is_some())
            && self.orderbys.is_empty()
            && dialect.requires_order_by_for_offset()
        {
            ts.space()
                .push(Token::OrderBy)
                .space()
                .push(Token::Raw("(SELECT 0)".into()));
        }
        ts.append(&dialect.emit_limit_offset(self.limit, offset));

        if let Some(lock) = &self.for_update {
            if !dialect.supports_for_update() {
                return Err(QueryError::unsupported(dialect.name(), "FOR UPDATE"));
            }
            ts.space().push(Token::For).space().push(Token::Update);
            if !lock.of.is_empty() {
                ts.space().push(Token::Raw("OF".into())).space();
                for (i, table) in lock.of.iter().enumerate() {
                    if i > 0 {
                        ts.comma().space();
                    }
                    ts.append(&table.to_tokens(ctx)?);
                }
            }
            match lock.wait {
                LockWait::Wait => {}
                LockWait::NoWait => {
                    ts.space().push(Token::Raw("NOWAIT".into()));
                }
                LockWait::SkipLocked => {
                    ts.space().push(Token::Raw("SKIP LOCKED".into()));
                }
            }
        }
        Ok(ts)
    }

    fn select_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = self.select_clause(ctx)?;
        if let Some(table) = &self.dml.insert_table {
            ts.space().push(Token::Into).space().append(&table.to_tokens(ctx)?);
        }
        ts.append(&self.select_tail(ctx)?);
        Ok(ts)
    }
}

impl Render for QueryBuilder {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        if self.is_empty() {
            return Ok(TokenStream::new());
        }
        let inner = ctx.enter_query(self.uses_namespace(), &self.aliases);

        let mut body = self.with_tokens(&inner)?;
        let dml = &self.dml;
        let statement = if dml.update_table.is_some() {
            self.update_tokens(&inner)?
        } else if dml.delete_from {
            self.delete_tokens(&inner)?
        } else if dml.insert_table.is_some() && !dml.select_into {
            self.insert_tokens(&inner)?
        } else {
            self.select_tokens(&inner)?
        };
        body.append(&statement);

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
        self.dialect
    }

    fn statement_kind(&self) -> &'static str {
        let dml = &self.dml;
        if dml.update_table.is_some() {
            "update"
        } else if dml.delete_from {
            "delete"
        } else if dml.insert_table.is_some() && !dml.select_into {
            "insert"
        } else {
            "select"
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::functions::{count, sum};
    use crate::sql::render::RenderOptions;
    use crate::sql::term::TermExt;
    use crate::sql::test_utils::validate_sql;

    fn sql(q: &QueryBuilder) -> String {
        q.get_sql().unwrap()
    }

    fn sql_for(q: &QueryBuilder, dialect: Dialect) -> String {
        q.get_sql_with(&RenderOptions::new().dialect(dialect)).unwrap()
    }

    #[test]
    fn test_simple_select() {
        let q = Query::from_(Table::new("abc")).select(["foo", "bar"]).unwrap();
        assert_eq!(sql(&q), "SELECT \"foo\",\"bar\" FROM \"abc\"");
        validate_sql(&sql(&q), Dialect::Ansi).unwrap();
    }

    #[test]
    fn test_empty_query_renders_nothing() {
        assert_eq!(sql(&Query::from_("abc")), "");
        assert_eq!(sql(&QueryBuilder::new(Dialect::Postgres)), "");
    }

    #[test]
    fn test_select_without_from() {
        let q = Query::select([Term::from(1) + 1]).unwrap();
        assert_eq!(sql(&q), "SELECT 1+1");

        let err = Query::select(["foo"]).unwrap_err();
        assert!(matches!(err, QueryError::Configuration(_)));
    }

    #[test]
    fn test_select_star_absorbs_fields() {
        let q = Query::from_("abc").select(["foo", "*", "bar"]).unwrap();
        assert_eq!(sql(&q), "SELECT * FROM \"abc\"");

        let t = Table::new("abc");
        let q = Query::from_(t.clone())
            .select([t.field("foo"), t.star(), t.field("bar")])
            .unwrap();
        assert_eq!(sql(&q), "SELECT * FROM \"abc\"");
    }

    #[test]
    fn test_select_is_idempotent() {
        let q = Query::from_("abc").select(["a"]).unwrap().where_(Term::field("a").eq(1));
        assert_eq!(sql(&q), sql(&q));
    }

    #[test]
    fn test_immutable_steps_change_identity() {
        let q1 = Query::from_("abc");
        let id1 = q1.id();
        let q2 = q1.select(["foo"]).unwrap();
        assert_ne!(q2.id(), id1);

        let m1 = Query::from_("abc").immutable(false);
        let id = m1.id();
        let m2 = m1.select(["foo"]).unwrap().where_(Term::field("foo").eq(1));
        assert_eq!(m2.id(), id);

        let fork = m2.fork();
        assert_ne!(fork.id(), m2.id());
        assert_eq!(sql(&fork), sql(&m2));
    }

    #[test]
    fn test_mutable_and_immutable_render_the_same() {
        let build = |immutable: bool| {
            Query::from_("abc")
                .immutable(immutable)
                .select(["a", "b"])
                .unwrap()
                .where_(Term::field("a").gt(1))
                .orderby(["b"], Order::Desc)
        };
        assert_eq!(sql(&build(true)), sql(&build(false)));
    }

    #[test]
    fn test_where_criteria_are_anded() {
        let q = Query::from_("abc")
            .select(["foo"])
            .unwrap()
            .where_(Term::field("a").eq(1))
            .where_(Criterion::empty())
            .where_(Term::field("b").eq("x"));
        assert_eq!(
            sql(&q),
            "SELECT \"foo\" FROM \"abc\" WHERE \"a\"=1 AND \"b\"='x'"
        );
    }

    #[test]
    fn test_distinct_and_distinct_on() {
        let q = Query::from_("abc").select(["foo"]).unwrap().distinct();
        assert_eq!(sql(&q), "SELECT DISTINCT \"foo\" FROM \"abc\"");

        let q = Dialect::Postgres
            .query()
            .from_("abc")
            .select(["a", "b"])
            .unwrap()
            .distinct_on(["a"]);
        assert_eq!(sql(&q), "SELECT DISTINCT ON(\"a\") \"a\",\"b\" FROM \"abc\"");

        let err = q.get_sql_with(&RenderOptions::new().dialect(Dialect::MySql)).unwrap_err();
        assert!(matches!(err, QueryError::Unsupported { .. }));
    }

    #[test]
    fn test_groupby_having_orderby() {
        let q = Query::from_("abc")
            .select([Term::field("foo"), sum(Term::field("bar"))])
            .unwrap()
            .groupby(["foo"])
            .having(sum(Term::field("bar")).gt(10))
            .orderby(["foo"], Order::Desc);
        assert_eq!(
            sql(&q),
            "SELECT \"foo\",SUM(\"bar\") FROM \"abc\" GROUP BY \"foo\" HAVING SUM(\"bar\")>10 ORDER BY \"foo\" DESC"
        );
    }

    #[test]
    fn test_groupby_alias_per_dialect() {
        let foo = Term::field("foo").as_("f");
        let q = Query::from_("abc")
            .select([foo.clone(), count("*")])
            .unwrap()
            .groupby([foo]);
        assert_eq!(
            sql(&q),
            "SELECT \"foo\" \"f\",COUNT(*) FROM \"abc\" GROUP BY \"f\""
        );
        assert_eq!(
            sql_for(&q, Dialect::MsSql),
            "SELECT \"foo\" \"f\",COUNT(*) FROM \"abc\" GROUP BY \"foo\""
        );
        let opts = RenderOptions::new().groupby_alias(false);
        assert_eq!(
            q.get_sql_with(&opts).unwrap(),
            "SELECT \"foo\" \"f\",COUNT(*) FROM \"abc\" GROUP BY \"foo\""
        );
    }

    #[test]
    fn test_rollup() {
        let q = Query::from_("abc")
            .select(["a", "b"])
            .unwrap()
            .groupby(["a"])
            .rollup(["b"])
            .unwrap();
        assert_eq!(
            sql(&q),
            "SELECT \"a\",\"b\" FROM \"abc\" GROUP BY \"a\",ROLLUP(\"b\")"
        );

        let q = Dialect::MySql
            .query()
            .from_("abc")
            .select(["a", "b"])
            .unwrap()
            .rollup(["a", "b"])
            .unwrap();
        assert_eq!(
            sql(&q),
            "SELECT `a`,`b` FROM `abc` GROUP BY `a`,`b` WITH ROLLUP"
        );
        let err = q.rollup(Vec::<&str>::new()).unwrap_err();
        assert!(matches!(err, QueryError::Grouping(_)));

        let err = Dialect::MySql
            .query()
            .from_("abc")
            .rollup(Vec::<&str>::new())
            .unwrap_err();
        assert!(matches!(err, QueryError::Grouping(_)));
    }

    #[test]
    fn test_pagination_per_dialect() {
        let q = Query::from_("abc").select(["foo"]).unwrap().limit(10).offset(5);
        assert_eq!(sql(&q), "SELECT \"foo\" FROM \"abc\" LIMIT 10 OFFSET 5");
        assert_eq!(
            sql_for(&q, Dialect::MsSql),
            "SELECT \"foo\" FROM \"abc\" ORDER BY (SELECT 0) OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"
        );
        assert_eq!(
            sql_for(&q, Dialect::Oracle),
            "SELECT foo FROM abc OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"
        );

        let ordered = q.orderby(["foo"], None);
        assert_eq!(
            sql_for(&ordered, Dialect::MsSql),
            "SELECT \"foo\" FROM \"abc\" ORDER BY \"foo\" OFFSET 5 ROWS FETCH NEXT 10 ROWS ONLY"
        );
    }

    #[test]
    fn test_zero_offset_is_dropped() {
        let q = Query::from_("abc").select(["foo"]).unwrap().offset(0);
        assert_eq!(sql(&q), "SELECT \"foo\" FROM \"abc\"");
    }

    #[test]
    fn test_top() {
        let q = Dialect::MsSql
            .query()
            .from_("abc")
            .select(["foo"])
            .unwrap()
            .top(10, true, true)
            .unwrap();
        assert_eq!(
            sql(&q),
            "SELECT TOP (10) PERCENT WITH TIES \"foo\" FROM \"abc\""
        );

        let err = Dialect::MsSql.query().top(101, true, false).unwrap_err();
        assert!(matches!(err, QueryError::Usage(_)));

        let err = q.get_sql_with(&RenderOptions::new().dialect(Dialect::Postgres)).unwrap_err();
        assert!(matches!(err, QueryError::Unsupported { .. }));
    }

    #[test]
    fn test_subquery_in_from_gets_sq_alias() {
        let inner = Query::from_("abc").select(["foo"]).unwrap();
        let q = Query::from_(inner.clone()).select([inner.field("foo")]).unwrap();
        assert_eq!(
            sql(&q),
            "SELECT \"sq0\".\"foo\" FROM (SELECT \"foo\" FROM \"abc\") \"sq0\""
        );
    }

    #[test]
    fn test_subquery_in_select_and_where() {
        let sub = Query::from_("b").select([count("*")]).unwrap().as_("n");
        let q = Query::from_("a").select([Term::from(sub)]).unwrap();
        assert_eq!(
            sql(&q),
            "SELECT (SELECT COUNT(*) FROM \"b\") \"n\" FROM \"a\""
        );

        let ids = Query::from_("b").select(["id"]).unwrap();
        let q = Query::from_("a")
            .select(["x"])
            .unwrap()
            .where_(Term::field("id").isin(ids));
        assert_eq!(
            sql(&q),
            "SELECT \"x\" FROM \"a\" WHERE \"id\" IN (SELECT \"id\" FROM \"b\")"
        );
    }

    #[test]
    fn test_multiple_from_sources_qualify_fields() {
        let a = Table::new("a");
        let b = Table::new("b");
        let q = Query::from_(a.clone())
            .from_(b.clone())
            .select([a.field("x"), b.field("y")])
            .unwrap()
            .where_(a.field("id").eq(b.field("id")));
        assert_eq!(
            sql(&q),
            "SELECT \"a\".\"x\",\"b\".\"y\" FROM \"a\",\"b\" WHERE \"a\".\"id\"=\"b\".\"id\""
        );
    }

    #[test]
    fn test_correlated_subquery_is_qualified() {
        let a = Table::new("a");
        let b = Table::new("b");
        let sub = Query::from_(b.clone())
            .select([b.field("id")])
            .unwrap()
            .where_(b.field("a_id").eq(a.field("id")));
        let q = Query::from_(a.clone())
            .select([a.field("id")])
            .unwrap()
            .where_(Criterion::exists(sub));
        assert_eq!(
            sql(&q),
            "SELECT \"id\" FROM \"a\" WHERE EXISTS (SELECT \"b\".\"id\" FROM \"b\" WHERE \"b\".\"a_id\"=\"a\".\"id\")"
        );
    }

    #[test]
    fn test_with_namespace_option() {
        let q = Query::from_("abc").select(["foo"]).unwrap();
        let opts = RenderOptions::new().with_namespace(true);
        assert_eq!(
            q.get_sql_with(&opts).unwrap(),
            "SELECT \"abc\".\"foo\" FROM \"abc\""
        );
    }

    #[test]
    fn test_cte() {
        let sub = Query::from_("efg").select(["fizz"]).unwrap();
        let cte = Table::new("an_alias");
        let q = Query::with_(sub, "an_alias")
            .from_(cte.clone())
            .select([cte.field("fizz")])
            .unwrap();
        assert_eq!(
            sql(&q),
            "WITH \"an_alias\" AS (SELECT \"fizz\" FROM \"efg\") SELECT \"fizz\" FROM \"an_alias\""
        );
    }

    #[test]
    fn test_recursive_cte() {
        let seed = Query::select([1]).unwrap();
        let q = QueryBuilder::new(Dialect::Postgres)
            .with_recursive(seed, "t", ["n"])
            .from_("t")
            .select(["n"])
            .unwrap();
        assert_eq!(
            sql(&q),
            "WITH RECURSIVE \"t\" (\"n\") AS (SELECT 1) SELECT \"n\" FROM \"t\""
        );
        assert_eq!(
            sql_for(&q, Dialect::MsSql),
            "WITH \"t\" (\"n\") AS (SELECT 1) SELECT \"n\" FROM \"t\""
        );
    }

    #[test]
    fn test_for_update() {
        let q = Query::from_("abc").select(["foo"]).unwrap().for_update();
        assert_eq!(sql(&q), "SELECT \"foo\" FROM \"abc\" FOR UPDATE");

        let q = Dialect::Postgres
            .query()
            .from_("abc")
            .select(["foo"])
            .unwrap()
            .for_update_with(["abc", "def"], LockWait::SkipLocked);
        assert_eq!(
            sql(&q),
            "SELECT \"foo\" FROM \"abc\" FOR UPDATE OF \"abc\", \"def\" SKIP LOCKED"
        );

        let err = q.get_sql_with(&RenderOptions::new().dialect(Dialect::Sqlite)).unwrap_err();
        assert!(matches!(err, QueryError::Unsupported { .. }));
    }

    #[test]
    fn test_select_into() {
        let q = Query::from_("abc")
            .select(["foo"])
            .unwrap()
            .into_table("efg")
            .unwrap();
        assert_eq!(sql(&q), "SELECT \"foo\" INTO \"efg\" FROM \"abc\"");
    }

    #[test]
    fn test_statement_kind() {
        assert_eq!(Query::from_("a").select(["b"]).unwrap().statement_kind(), "select");
        assert_eq!(Query::update("a").statement_kind(), "update");
    }
}
