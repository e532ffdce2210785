//! DDL (Data Definition Language) support.
//!
//! CREATE TABLE and DROP statements. Both render through [`Render`] like
//! every other statement, so quoting and dialect type names follow the
//! render options.
//!
//! # Examples
//!
//! ```
//! use querycraft::sql::ddl::Column;
//! use querycraft::sql::query::Query;
//! use querycraft::sql::render::Render;
//! use querycraft::sql::types::DataType;
//!
//! let stmt = Query::create_table("person")
//!     .columns([
//!         Column::new("id").data_type(DataType::Int32).nullable(false),
//!         Column::new("name").data_type(DataType::Varchar(Some(100))),
//!     ])
//!     .unwrap()
//!     .primary_key(["id"])
//!     .unwrap();
//!
//! assert_eq!(
//!     stmt.get_sql().unwrap(),
//!     "CREATE TABLE \"person\" (\"id\" INTEGER NOT NULL,\"name\" VARCHAR(100),PRIMARY KEY (\"id\"))"
//! );
//! ```

use super::dialect::{Dialect, SqlDialect};
use super::query::Selectable;
use super::render::{Render, RenderCtx};
use super::term::{Table, Term};
use super::token::{Token, TokenStream};
use crate::error::{QueryError, Result};

pub use super::types::DataType;

fn ident_list(names: &[String]) -> TokenStream {
    let items: Vec<TokenStream> = names
        .iter()
        .map(|n| {
            let mut ts = TokenStream::new();
            ts.push(Token::Ident(n.clone()));
            ts
        })
        .collect();
    let mut ts = TokenStream::new();
    ts.lparen().append_list(&items).rparen();
    ts
}

fn names<I, S>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    items.into_iter().map(Into::into).collect()
}

// ============================================================================
// Column Definition
// ============================================================================

/// Column definition for CREATE TABLE.
#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    name: String,
    data_type: Option<DataType>,
    nullable: Option<bool>,
    default: Option<Term>,
}

impl Column {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            nullable: None,
            default: None,
        }
    }

    pub fn data_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    /// `true` renders `NULL`, `false` renders `NOT NULL`.
    pub fn nullable(mut self, nullable: bool) -> Self {
        self.nullable = Some(nullable);
        self
    }

    pub fn default(mut self, value: impl Into<Term>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Ident(self.name.clone()));

        if let Some(dt) = &self.data_type {
            ts.space().push(Token::Raw(ctx.dialect.emit_data_type(dt)));
        }

        match self.nullable {
            Some(true) => {
                ts.space().push(Token::Null);
            }
            Some(false) => {
                ts.space().push(Token::Not).space().push(Token::Null);
            }
            None => {}
        }

        if let Some(default) = &self.default {
            ts.keyword(Token::Default)
                .append(&default.to_tokens(&ctx.nested())?);
        }
        Ok(ts)
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::new(name)
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::new(name)
    }
}

impl From<(&str, DataType)> for Column {
    fn from((name, data_type): (&str, DataType)) -> Self {
        Column::new(name).data_type(data_type)
    }
}

// ============================================================================
// Constraints
// ============================================================================

/// Referential action for foreign key constraints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReferenceOption {
    Cascade,
    NoAction,
    Restrict,
    SetNull,
    SetDefault,
}

impl ReferenceOption {
    fn keyword(self) -> &'static str {
        match self {
            ReferenceOption::Cascade => "CASCADE",
            ReferenceOption::NoAction => "NO ACTION",
            ReferenceOption::Restrict => "RESTRICT",
            ReferenceOption::SetNull => "SET NULL",
            ReferenceOption::SetDefault => "SET DEFAULT",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
struct ForeignKey {
    columns: Vec<String>,
    reference_table: Table,
    reference_columns: Vec<String>,
    on_delete: Option<ReferenceOption>,
    on_update: Option<ReferenceOption>,
}

// ============================================================================
// CREATE TABLE
// ============================================================================

/// CREATE TABLE statement.
///
/// A table is defined either by columns (with constraints) or by a query
/// (`AS SELECT`), never both.
#[derive(Debug, Clone)]
#[must_use = "DDL statements have no effect until rendered"]
pub struct CreateTable {
    table: Table,
    dialect: Option<Dialect>,
    temporary: bool,
    unlogged: bool,
    if_not_exists: bool,
    columns: Vec<Column>,
    unique: Vec<Vec<String>>,
    primary_key: Option<Vec<String>>,
    foreign_key: Option<ForeignKey>,
    as_select: Option<Selectable>,
}

impl CreateTable {
    pub fn new(table: impl Into<Table>) -> Self {
        Self {
            table: table.into(),
            dialect: None,
            temporary: false,
            unlogged: false,
            if_not_exists: false,
            columns: Vec::new(),
            unique: Vec::new(),
            primary_key: None,
            foreign_key: None,
            as_select: None,
        }
    }

    pub fn for_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn temporary(mut self) -> Self {
        self.temporary = true;
        self
    }

    /// PostgreSQL `UNLOGGED`.
    pub fn unlogged(mut self) -> Self {
        self.unlogged = true;
        self
    }

    pub fn if_not_exists(mut self) -> Self {
        self.if_not_exists = true;
        self
    }

    pub fn columns<I, C>(mut self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = C>,
        C: Into<Column>,
    {
        if self.as_select.is_some() {
            return Err(QueryError::configuration(
                "CREATE TABLE cannot have both columns and AS SELECT",
            ));
        }
        self.columns.extend(columns.into_iter().map(Into::into));
        Ok(self)
    }

    /// `UNIQUE (...)`; each call adds one constraint.
    pub fn unique<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.unique.push(names(columns));
        self
    }

    pub fn primary_key<I, S>(mut self, columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if self.primary_key.is_some() {
            return Err(QueryError::configuration("primary key is already set"));
        }
        self.primary_key = Some(names(columns));
        Ok(self)
    }

    /// `FOREIGN KEY (...) REFERENCES t (...) [ON DELETE ..] [ON UPDATE ..]`
    pub fn foreign_key<I, S, J, T>(
        mut self,
        columns: I,
        reference_table: impl Into<Table>,
        reference_columns: J,
        on_delete: Option<ReferenceOption>,
        on_update: Option<ReferenceOption>,
    ) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
        J: IntoIterator<Item = T>,
        T: Into<String>,
    {
        if self.foreign_key.is_some() {
            return Err(QueryError::configuration("foreign key is already set"));
        }
        self.foreign_key = Some(ForeignKey {
            columns: names(columns),
            reference_table: reference_table.into(),
            reference_columns: names(reference_columns),
            on_delete,
            on_update,
        });
        Ok(self)
    }

    /// `CREATE TABLE t AS (<query>)`
    pub fn as_select(mut self, query: impl Into<Selectable>) -> Result<Self> {
        if !self.columns.is_empty() {
            return Err(QueryError::configuration(
                "CREATE TABLE cannot have both columns and AS SELECT",
            ));
        }
        self.as_select = Some(query.into());
        Ok(self)
    }

    fn body_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut parts = Vec::new();
        for column in &self.columns {
            parts.push(column.to_tokens(ctx)?);
        }
        for group in &self.unique {
            let mut ts = TokenStream::new();
            ts.push(Token::Unique).space().append(&ident_list(group));
            parts.push(ts);
        }
        if let Some(pk) = &self.primary_key {
            let mut ts = TokenStream::new();
            ts.push(Token::Primary)
                .space()
                .push(Token::Key)
                .space()
                .append(&ident_list(pk));
            parts.push(ts);
        }
        if let Some(fk) = &self.foreign_key {
            let mut ts = TokenStream::new();
            ts.push(Token::Foreign)
                .space()
                .push(Token::Key)
                .space()
                .append(&ident_list(&fk.columns))
                .keyword(Token::References)
                .append(&fk.reference_table.to_tokens(ctx)?)
                .space()
                .append(&ident_list(&fk.reference_columns));
            if let Some(action) = fk.on_delete {
                ts.space()
                    .push(Token::On)
                    .space()
                    .push(Token::Delete)
                    .space()
                    .push(Token::Raw(action.keyword().into()));
            }
            if let Some(action) = fk.on_update {
                ts.space()
                    .push(Token::On)
                    .space()
                    .push(Token::Update)
                    .space()
                    .push(Token::Raw(action.keyword().into()));
            }
            parts.push(ts);
        }
        let mut ts = TokenStream::new();
        ts.lparen().append_list(&parts).rparen();
        Ok(ts)
    }
}

impl Render for CreateTable {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        if self.columns.is_empty() && self.as_select.is_none() {
            return Ok(ts);
        }

        ts.push(Token::Create).space();
        if self.temporary {
            ts.push(Token::Temporary).space();
        } else if self.unlogged {
            ts.push(Token::Unlogged).space();
        }
        ts.push(Token::Table).space();
        if self.if_not_exists {
            ts.push(Token::If)
                .space()
                .push(Token::Not)
                .space()
                .push(Token::Exists)
                .space();
        }
        ts.append(&self.table.to_tokens(ctx)?);

        match &self.as_select {
            Some(query) => {
                ts.keyword(Token::As)
                    .append(&query.to_tokens(&ctx.subquery(true).with_alias(false))?);
            }
            None => {
                ts.space().append(&self.body_tokens(ctx)?);
            }
        }
        Ok(ts)
    }

    fn default_dialect(&self) -> Dialect {
        self.dialect.unwrap_or_default()
    }

    fn statement_kind(&self) -> &'static str {
        "create table"
    }
}

// ============================================================================
// DROP
// ============================================================================

/// What a DROP statement removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropKind {
    Database,
    Table,
    View,
    Index,
    User,
}

impl DropKind {
    fn keyword(self) -> Token {
        match self {
            DropKind::Database => Token::Raw("DATABASE".into()),
            DropKind::Table => Token::Table,
            DropKind::View => Token::Raw("VIEW".into()),
            DropKind::Index => Token::Raw("INDEX".into()),
            DropKind::User => Token::Raw("USER".into()),
        }
    }
}

/// `DROP <kind> [IF EXISTS] <name>`
#[derive(Debug, Clone)]
#[must_use = "DDL statements have no effect until rendered"]
pub struct DropQuery {
    kind: DropKind,
    target: Table,
    if_exists: bool,
    dialect: Option<Dialect>,
}

impl DropQuery {
    pub fn new(kind: DropKind, target: impl Into<Table>) -> Self {
        Self {
            kind,
            target: target.into(),
            if_exists: false,
            dialect: None,
        }
    }

    pub fn for_dialect(mut self, dialect: Dialect) -> Self {
        self.dialect = Some(dialect);
        self
    }

    pub fn if_exists(mut self) -> Self {
        self.if_exists = true;
        self
    }

    pub fn kind(&self) -> DropKind {
        self.kind
    }
}

impl Render for DropQuery {
    fn to_tokens(&self, ctx: &RenderCtx) -> Result<TokenStream> {
        let mut ts = TokenStream::new();
        ts.push(Token::Drop).space().push(self.kind.keyword()).space();
        if self.if_exists {
            ts.push(Token::If).space().push(Token::Exists).space();
        }
        ts.append(&self.target.to_tokens(ctx)?);
        Ok(ts)
    }

    fn default_dialect(&self) -> Dialect {
        self.dialect.unwrap_or_default()
    }

    fn statement_kind(&self) -> &'static str {
        "drop"
    }
}
