//! INSERT, REPLACE, UPDATE and DELETE.
//!
//! These are staged on the same [`QueryBuilder`] as SELECT; the state here
//! decides which statement it renders as. Upserts follow the target
//! dialect: `ON CONFLICT` for PostgreSQL and SQLite, `ON DUPLICATE KEY
//! UPDATE` for MySQL.

use super::criterion::Criterion;
use super::dialect::{SqlDialect, UpsertStyle};
use super::query::{QueryBuilder, SelectItem};
use super::render::{Render, RenderCtx};
use super::term::{tokens_of, Namespace, Node, Table, Term};
use super::token::{Token, TokenStream};
use crate::error::{QueryError, Result};

// =============================================================================
// State
// =============================================================================

/// Which INSERT variant to emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InsertMode {
    #[default]
    Insert,
    /// `INSERT IGNORE` / `INSERT OR IGNORE`
    Ignore,
    /// `REPLACE INTO`
    Replace,
    /// SQLite `INSERT OR REPLACE INTO`
    InsertOrReplace,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum ConflictAction {
    Nothing,
    /// Field and new value; `None` takes the incoming row's value.
    Update(Vec<(Term, Option<Term>)>),
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct OnConflict {
    targets: Vec<Term>,
    target_where: Criterion,
    action: Option<ConflictAction>,
    update_where: Criterion,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub(crate) struct Dml {
    pub(crate) insert_table: Option<Table>,
    /// SELECT ... INTO rather than INSERT INTO.
    pub(crate) select_into: bool,
    pub(crate) columns: Vec<Term>,
    pub(crate) values: Vec<Vec<Term>>,
    pub(crate) insert_mode: InsertMode,
    pub(crate) update_table: Option<Table>,
    pub(crate) updates: Vec<(Term, Term)>,
    pub(crate) delete_from: bool,
    pub(crate) using: Vec<Table>,
    pub(crate) conflict: Option<OnConflict>,
    pub(crate) duplicate_updates: Vec<(Term, Term)>,
    pub(crate) returns: Vec<Term>,
    pub(crate) return_star: bool,
}

/// A column name resolved to an unqualified field.
fn column_term(item: SelectItem) -> Term {
    let term = item.into_term(None);
    match term.field_name() {
        Some(name) => Term::field(name),
        None => term,
    }
}

fn conflict_error(message: &str) -> QueryError {
    QueryError::configuration(message)
}

// =============================================================================
// Builder
// =============================================================================

impl QueryBuilder {
    /// `INSERT INTO <table>`, or `SELECT ... INTO <table>` once the select
    /// list is set.
    pub fn into_table(mut self, table: impl Into<Table>) -> Result<Self> {
        if self.dml.insert_table.is_some() {
            return Err(QueryError::configuration("INTO target is already set"));
        }
        if self.dml.update_table.is_some() || self.dml.delete_from {
            return Err(QueryError::configuration(
                "into_table() cannot be combined with UPDATE or DELETE",
            ));
        }
        self.dml.select_into = !self.selects.is_empty();
        self.dml.insert_table = Some(table.into());
        Ok(self.touch())
    }

    /// Set the INSERT target on a fresh builder.
    pub(crate) fn insert_target(mut self, table: impl Into<Table>) -> Self {
        self.dml.insert_table = Some(table.into());
        self
    }

    /// Column list of an INSERT.
    pub fn columns<I, S>(mut self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        if self.dml.insert_table.is_none() {
            return Err(QueryError::configuration("columns() requires an INSERT target"));
        }
        self.dml
            .columns
            .extend(columns.into_iter().map(|c| column_term(c.into())));
        Ok(self.touch())
    }

    /// Append one VALUES row.
    pub fn insert(self, row: Vec<Term>) -> Result<Self> {
        self.insert_rows([row])
    }

    /// Append several VALUES rows.
    pub fn insert_rows<I>(mut self, rows: I) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<Term>>,
    {
        if self.dml.insert_table.is_none() {
            return Err(QueryError::configuration("insert() requires an INTO target"));
        }
        if self.dml.select_into || !self.selects.is_empty() {
            return Err(QueryError::configuration(
                "cannot add VALUES to an INSERT that selects its rows",
            ));
        }
        self.dml.values.extend(rows);
        Ok(self.touch())
    }

    /// `REPLACE INTO ... VALUES (...)`
    pub fn replace(mut self, row: Vec<Term>) -> Result<Self> {
        self.dml.insert_mode = InsertMode::Replace;
        self.insert(row)
    }

    /// `INSERT IGNORE` (MySQL) or `INSERT OR IGNORE` (SQLite).
    pub fn ignore(mut self) -> Self {
        self.dml.insert_mode = InsertMode::Ignore;
        self.touch()
    }

    /// SQLite `INSERT OR REPLACE`.
    pub fn insert_or_replace(mut self) -> Self {
        self.dml.insert_mode = InsertMode::InsertOrReplace;
        self.touch()
    }

    /// `UPDATE <table>`
    ///
    /// A FROM source already on the builder becomes `UPDATE ... FROM`.
    pub fn update(self, table: impl Into<Table>) -> Result<Self> {
        if self.dml.update_table.is_some() {
            return Err(QueryError::configuration("UPDATE target is already set"));
        }
        if !self.selects.is_empty() || self.dml.delete_from || self.dml.insert_table.is_some() {
            return Err(QueryError::configuration(
                "update() cannot be combined with SELECT, INSERT or DELETE",
            ));
        }
        Ok(self.update_target(table).touch())
    }

    /// Set the UPDATE target on a fresh builder.
    pub(crate) fn update_target(mut self, table: impl Into<Table>) -> Self {
        self.dml.update_table = Some(table.into());
        self
    }

    /// `SET <field>=<value>`; may be called repeatedly.
    pub fn set(mut self, field: impl Into<SelectItem>, value: impl Into<Term>) -> Self {
        self.dml
            .updates
            .push((column_term(field.into()), value.into()));
        self.touch()
    }

    /// `DELETE FROM` the FROM source.
    pub fn delete(mut self) -> Result<Self> {
        if self.dml.insert_table.is_some() || self.dml.update_table.is_some() {
            return Err(QueryError::configuration(
                "delete() cannot be combined with INSERT or UPDATE",
            ));
        }
        if !self.selects.is_empty() {
            return Err(QueryError::configuration(
                "delete() cannot be combined with a select list",
            ));
        }
        self.dml.delete_from = true;
        Ok(self.touch())
    }

    /// PostgreSQL `DELETE ... USING <tables>`.
    pub fn using<I, T>(mut self, tables: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Table>,
    {
        self.dml.using.extend(tables.into_iter().map(Into::into));
        self.touch()
    }

    // === Upserts ===

    /// `ON CONFLICT [(targets)]`; finish with `do_nothing` or `do_update`.
    pub fn on_conflict<I, S>(mut self, targets: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        if self.dml.insert_table.is_none() {
            return Err(conflict_error("ON CONFLICT only applies to INSERT"));
        }
        let conflict = self.dml.conflict.get_or_insert_with(OnConflict::default);
        conflict
            .targets
            .extend(targets.into_iter().map(|t| column_term(t.into())));
        Ok(self.touch())
    }

    fn conflict_mut(&mut self) -> Result<&mut OnConflict> {
        self.dml
            .conflict
            .as_mut()
            .ok_or_else(|| conflict_error("call on_conflict() first"))
    }

    /// `DO NOTHING`
    pub fn do_nothing(mut self) -> Result<Self> {
        let conflict = self.conflict_mut()?;
        if let Some(ConflictAction::Update(_)) = conflict.action {
            return Err(conflict_error("cannot have two conflict handlers"));
        }
        conflict.action = Some(ConflictAction::Nothing);
        Ok(self.touch())
    }

    /// `DO UPDATE SET "f"=EXCLUDED."f"`
    pub fn do_update(self, field: impl Into<SelectItem>) -> Result<Self> {
        self.push_conflict_update(column_term(field.into()), None)
    }

    /// `DO UPDATE SET "f"=<value>`
    pub fn do_update_value(self, field: impl Into<SelectItem>, value: impl Into<Term>) -> Result<Self> {
        self.push_conflict_update(column_term(field.into()), Some(value.into()))
    }

    fn push_conflict_update(mut self, field: Term, value: Option<Term>) -> Result<Self> {
        let conflict = self.conflict_mut()?;
        let action = conflict
            .action
            .get_or_insert_with(|| ConflictAction::Update(Vec::new()));
        match action {
            ConflictAction::Nothing => {
                return Err(conflict_error("cannot have two conflict handlers"));
            }
            ConflictAction::Update(updates) => updates.push((field, value)),
        }
        Ok(self.touch())
    }

    /// Add a WHERE to the conflict clause.
    ///
    /// Before `do_update` it filters the conflict target (partial index);
    /// after it, it filters the update.
    pub fn conflict_where(mut self, criterion: impl Into<Criterion>) -> Result<Self> {
        let criterion = criterion.into();
        let conflict = self.conflict_mut()?;
        match conflict.action {
            Some(ConflictAction::Nothing) => {
                return Err(conflict_error("DO NOTHING does not support WHERE"));
            }
            _ if conflict.targets.is_empty() => {
                return Err(conflict_error("cannot have fieldless ON CONFLICT WHERE"));
            }
            Some(ConflictAction::Update(_)) => {
                conflict.update_where = std::mem::take(&mut conflict.update_where) & criterion;
            }
            None => {
                conflict.target_where = std::mem::take(&mut conflict.target_where) & criterion;
            }
        }
        Ok(self.touch())
    }

    /// MySQL `ON DUPLICATE KEY UPDATE <field>=<value>`.
    pub fn on_duplicate_key_update(mut self, field: impl Into<SelectItem>, value: impl Into<Term>) -> Result<Self> {
        if self.dml.insert_table.is_none() {
            return Err(conflict_error("ON DUPLICATE KEY UPDATE only applies to INSERT"));
        }
        self.dml
            .duplicate_updates
            .push((column_term(field.into()), value.into()));
        Ok(self.touch())
    }

    /// Skip rows that hit a duplicate key, as `INSERT IGNORE`.
    pub fn on_duplicate_key_ignore(mut self) -> Result<Self> {
        if self.dml.insert_table.is_none() {
            return Err(conflict_error("ON DUPLICATE KEY IGNORE only applies to INSERT"));
        }
        self.dml.insert_mode = InsertMode::Ignore;
        Ok(self.touch())
    }

    // === RETURNING ===

    /// `RETURNING <items>` on INSERT, UPDATE or DELETE.
    ///
    /// Tables are checked at render time, once every join is known.
    pub fn returning<I, S>(mut self, items: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        let dml = &self.dml;
        if dml.insert_table.is_none() && dml.update_table.is_none() && !dml.delete_from {
            return Err(QueryError::configuration(
                "RETURNING requires an INSERT, UPDATE or DELETE",
            ));
        }
        let ns = self.dml_namespace();
        for item in items {
            let term = item.into().into_term(ns.as_ref());
            if term.is_aggregate() == Some(true) {
                return Err(QueryError::configuration(
                    "aggregate functions are not allowed in RETURNING",
                ));
            }
            if self.dml.return_star {
                continue;
            }
            if term.is_star() && term.namespace().is_none() {
                self.dml.return_star = true;
                self.dml.returns = vec![term];
            } else {
                self.dml.returns.push(term);
            }
        }
        Ok(self.touch())
    }

    /// Namespace bare names resolve to in a DML statement.
    fn dml_namespace(&self) -> Option<Namespace> {
        self.dml
            .insert_table
            .as_ref()
            .or(self.dml.update_table.as_ref())
            .map(|t| Namespace::Table(t.clone()))
            .or_else(|| self.from_namespace())
    }

    // =========================================================================
    // Rendering
    // =========================================================================

    /// A column on the left of `=` or in a column list: never qualified.
    fn column_tokens(term: &Term, ctx: &RenderCtx) -> Result<TokenStream> {
        match term.node() {
            Node::Field { name, .. } => {
                let mut ts = TokenStream::new();
                ts.push(Token::Ident(name.clone()));
                Ok(ts)
            }
            _ => term.to_tokens(&ctx.nested().with_namespace(false)),
        }
    }

    fn assignment_tokens(field: &Term, value: &Term, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = Self::column_tokens(field, ctx)?;
        ts.push(Token::Eq).append(&value.to_tokens(&ctx.nested())?);
        Ok(ts)
    }

    pub(crate) fn insert_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let dialect = ctx.dialect;
        let dml = &self.dml;
        let mut ts = TokenStream::new();

        match dml.insert_mode {
            InsertMode::Insert => {
                ts.push(Token::Insert).space().push(Token::Into);
            }
            InsertMode::Ignore => {
                let kw = dialect
                    .insert_ignore_keyword()
                    .ok_or_else(|| QueryError::unsupported(dialect.name(), "INSERT IGNORE"))?;
                ts.push(Token::Insert)
                    .space()
                    .push(Token::Raw(kw.into()))
                    .space()
                    .push(Token::Into);
            }
            InsertMode::Replace => {
                if !dialect.supports_replace() {
                    return Err(QueryError::unsupported(dialect.name(), "REPLACE"));
                }
                ts.push(Token::Replace).space().push(Token::Into);
            }
            InsertMode::InsertOrReplace => {
                if !dialect.supports_insert_or_replace() {
                    return Err(QueryError::unsupported(dialect.name(), "INSERT OR REPLACE"));
                }
                ts.push(Token::Insert)
                    .space()
                    .push(Token::Or)
                    .space()
                    .push(Token::Replace)
                    .space()
                    .push(Token::Into);
            }
        }

        if let Some(table) = &dml.insert_table {
            ts.space().append(&table.to_tokens(ctx)?);
        }

        if !dml.columns.is_empty() {
            let columns = dml
                .columns
                .iter()
                .map(|c| Self::column_tokens(c, ctx))
                .collect::<Result<Vec<_>>>()?;
            ts.space().lparen().append_list(&columns).rparen();
        }

        if !dml.values.is_empty() {
            let rows = dml
                .values
                .iter()
                .map(|row| {
                    let mut r = TokenStream::new();
                    r.lparen().append_list(&tokens_of(row, &ctx.nested())?).rparen();
                    Ok(r)
                })
                .collect::<Result<Vec<_>>>()?;
            ts.space().push(Token::Values).space().append_list(&rows);
        } else {
            ts.space()
                .append(&self.select_clause(ctx)?)
                .append(&self.select_tail(ctx)?);
        }

        ts.append(&self.conflict_tokens(ctx)?);
        ts.append(&self.duplicate_key_tokens(ctx)?);
        ts.append(&self.returning_tokens(ctx)?);
        Ok(ts)
    }

    fn conflict_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        let Some(conflict) = &self.dml.conflict else {
            return Ok(ts);
        };
        let dialect = ctx.dialect;
        if dialect.upsert_style() != UpsertStyle::OnConflict {
            return Err(QueryError::unsupported(dialect.name(), "ON CONFLICT"));
        }
        let Some(action) = &conflict.action else {
            if conflict.targets.is_empty() {
                return Ok(ts);
            }
            return Err(conflict_error("no handler defined for ON CONFLICT"));
        };

        ts.space().push(Token::On).space().push(Token::Conflict);
        if !conflict.targets.is_empty() {
            ts.space().lparen();
            for (i, target) in conflict.targets.iter().enumerate() {
                if i > 0 {
                    ts.comma().space();
                }
                ts.append(&Self::column_tokens(target, ctx)?);
            }
            ts.rparen();
        }
        if !conflict.target_where.is_empty() {
            ts.keyword(Token::Where)
                .append(&conflict.target_where.to_tokens(&ctx.nested())?);
        }

        match action {
            ConflictAction::Nothing => {
                ts.keyword(Token::Do).push(Token::Nothing);
            }
            ConflictAction::Update(updates) => {
                if conflict.targets.is_empty() {
                    return Err(conflict_error("cannot have fieldless ON CONFLICT DO UPDATE"));
                }
                let value_ctx = ctx.with_namespace(true);
                let assignments = updates
                    .iter()
                    .map(|(field, value)| {
                        let value = match value {
                            Some(v) => v.clone(),
                            None => Term::excluded(field.field_name().unwrap_or_default()),
                        };
                        Self::assignment_tokens(field, &value, &value_ctx)
                    })
                    .collect::<Result<Vec<_>>>()?;
                ts.keyword(Token::Do)
                    .push(Token::Update)
                    .space()
                    .push(Token::Set)
                    .space()
                    .append_list(&assignments);
                if !conflict.update_where.is_empty() {
                    ts.keyword(Token::Where)
                        .append(&conflict.update_where.to_tokens(&value_ctx.nested())?);
                }
            }
        }
        Ok(ts)
    }

    fn duplicate_key_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        if self.dml.duplicate_updates.is_empty() {
            return Ok(ts);
        }
        let dialect = ctx.dialect;
        if dialect.upsert_style() != UpsertStyle::OnDuplicateKey {
            return Err(QueryError::unsupported(dialect.name(), "ON DUPLICATE KEY UPDATE"));
        }
        let assignments = self
            .dml
            .duplicate_updates
            .iter()
            .map(|(field, value)| Self::assignment_tokens(field, value, ctx))
            .collect::<Result<Vec<_>>>()?;
        ts.space()
            .push(Token::On)
            .space()
            .push(Token::Raw("DUPLICATE KEY".into()))
            .space()
            .push(Token::Update)
            .space()
            .append_list(&assignments);
        Ok(ts)
    }

    fn returning_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        let dml = &self.dml;
        if dml.returns.is_empty() {
            return Ok(ts);
        }
        if !ctx.dialect.supports_returning() {
            return Err(QueryError::unsupported(ctx.dialect.name(), "RETURNING"));
        }
        for term in &dml.returns {
            for ns in term.namespaces() {
                if let Namespace::Table(table) = ns {
                    let known = dml.insert_table.as_ref() == Some(table) || self.has_table(table);
                    if !known {
                        return Err(QueryError::configuration(format!(
                            "cannot return fields of table \"{}\", it is not part of the query",
                            table.table_name()
                        )));
                    }
                }
            }
        }
        let items = tokens_of(&dml.returns, &ctx.with_alias(true))?;
        ts.keyword(Token::Returning).append_list(&items);
        Ok(ts)
    }

    /// ` LIMIT n` for UPDATE and DELETE, which take no OFFSET.
    fn dml_limit_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();
        if let Some(limit) = self.limit {
            ts.space()
                .push(Token::Limit)
                .space()
                .push(Token::LitInt(i64::try_from(limit).unwrap_or(i64::MAX)));
        }
        ts
    }

    pub(crate) fn update_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Update);
        if let Some(table) = &self.dml.update_table {
            ts.space().append(&table.to_tokens(ctx)?);
        }
        ts.append(&self.join_tokens(ctx)?);

        let assignments = self
            .dml
            .updates
            .iter()
            .map(|(field, value)| Self::assignment_tokens(field, value, ctx))
            .collect::<Result<Vec<_>>>()?;
        ts.keyword(Token::Set).append_list(&assignments);

        ts.append(&self.from_tokens(ctx)?);
        ts.append(&self.where_tokens(ctx)?);
        ts.append(&self.orderby_tokens(ctx)?);
        ts.append(&self.dml_limit_tokens());
        ts.append(&self.returning_tokens(ctx)?);
        Ok(ts)
    }

    pub(crate) fn delete_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Delete);
        ts.append(&self.from_tokens(ctx)?);
        if !self.dml.using.is_empty() {
            let tables = self
                .dml
                .using
                .iter()
                .map(|t| t.to_tokens(ctx))
                .collect::<Result<Vec<_>>>()?;
            ts.keyword(Token::Using).append_list(&tables);
        }
        ts.append(&self.join_tokens(ctx)?);
        ts.append(&self.where_tokens(ctx)?);
        ts.append(&self.orderby_tokens(ctx)?);
        ts.append(&self.dml_limit_tokens());
        ts.append(&self.returning_tokens(ctx)?);
        Ok(ts)
    }
}
