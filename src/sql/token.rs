//! SQL Tokens - the atomic units of SQL output.
//!
//! Tokens are dialect-agnostic representations that serialize
//! to dialect-specific strings. Identifier quoting, literal encoding and
//! placeholder substitution all happen here, in one left-to-right pass,
//! so bound parameters are numbered in textual order across subqueries.

use super::dialect::{Dialect, SqlDialect};
use super::param::Parameterizer;
use crate::error::Result;
use super::value::Value;

/// SQL Token - every possible element in a SQL statement.
///
/// Adding a new variant here will cause compile errors everywhere
/// it needs to be handled (exhaustive matching).
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    // === Keywords ===
    Select,
    From,
    Where,
    And,
    Or,
    Xor,
    Not,
    As,
    On,
    Join,
    GroupBy,
    Having,
    OrderBy,
    Asc,
    Desc,
    Limit,
    Offset,
    Fetch,
    Next,
    Rows,
    Only,
    Top,
    Percent,
    Case,
    When,
    Then,
    Else,
    End,
    In,
    Between,
    Is,
    Like,
    Escape,
    Distinct,
    Union,
    Intersect,
    Except,
    /// Oracle's set difference keyword.
    SetMinus,
    All,
    With,
    Recursive,
    Null,
    Exists,
    Interval,
    For,

    // === Window Function Keywords ===
    Over,
    PartitionBy,
    Range,
    Unbounded,
    Preceding,
    Following,
    CurrentRow,
    Filter,

    // === DDL Keywords ===
    Create,
    Drop,
    Table,
    Temporary,
    Unlogged,
    Primary,
    Key,
    Foreign,
    References,
    Unique,
    Default,
    If,

    // === DML Keywords ===
    Insert,
    Into,
    Values,
    Update,
    Set,
    Delete,
    Returning,
    Using,
    Conflict,
    Do,
    Nothing,
    Replace,
    Ignore,

    // === Punctuation ===
    Comma,
    Dot,
    Star,
    LParen,
    RParen,
    LBracket,
    RBracket,

    // === Operators ===
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    Plus,
    Minus,
    Mul,
    Div,
    /// Operator spelled verbatim (`->`, `@>`, `~`, ...).
    Operator(&'static str),

    // === Whitespace ===
    Space,

    // === Dynamic Content ===
    /// Identifier quoted with the identifier quote character.
    Ident(String),
    /// Alias quoted with the alias quote character.
    Alias(String),
    /// Integer emitted verbatim, never parameterized (LIMIT, TOP, frame bounds).
    LitInt(i64),
    /// Literal value: rendered by the value wrapper or replaced by a placeholder.
    Value(Value),
    /// Literal value with an explicit parameter name.
    BoundValue { name: String, value: Value },
    /// A caller-supplied placeholder such as `?` or `:id`, emitted verbatim.
    Placeholder(String),

    // === Function Names ===
    /// Function name, remapped per dialect (e.g. `LENGTH` -> `LEN` on MSSQL).
    FunctionName(String),

    // === Escape Hatch ===
    /// Raw SQL passed directly to output without escaping.
    ///
    /// **Never pass user input to this variant.** Raw SQL is not sanitized.
    /// For user-provided values use [`Token::Value`], which is escaped by
    /// the dialect or bound as a parameter.
    Raw(String),
}

/// Output settings for one serialization pass.
///
/// Quote characters default to the dialect's own; a `None` quote character
/// leaves identifiers bare.
pub struct Serializer<'a> {
    dialect: Dialect,
    quote_char: Option<char>,
    alias_quote_char: Option<char>,
    params: Option<&'a mut Parameterizer>,
}

impl<'a> Serializer<'a> {
    pub fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            quote_char: dialect.quote_char(),
            alias_quote_char: dialect.alias_quote_char(),
            params: None,
        }
    }

    pub fn quote_char(mut self, quote_char: Option<char>) -> Self {
        self.quote_char = quote_char;
        self
    }

    pub fn alias_quote_char(mut self, alias_quote_char: Option<char>) -> Self {
        self.alias_quote_char = alias_quote_char;
        self
    }

    /// Route literal values into `params` instead of inlining them.
    pub fn parameterizer(mut self, params: &'a mut Parameterizer) -> Self {
        self.params = Some(params);
        self
    }

    fn value(&mut self, name: Option<&str>, value: &Value) -> Result<String> {
        match self.params.as_deref_mut() {
            Some(params) => params.placeholder(name, value.clone()),
            None => Ok(self.dialect.format_value(value)),
        }
    }
}

/// Quote `ident` with `quote`, doubling any embedded quote characters.
pub fn quote_with(ident: &str, quote: Option<char>) -> String {
    match quote {
        Some(q) => {
            let escaped = ident.replace(q, &format!("{q}{q}"));
            format!("{q}{escaped}{q}")
        }
        None => ident.to_string(),
    }
}

impl Token {
    fn keyword(&self) -> Option<&'static str> {
        let kw = match self {
            Token::Select => "SELECT",
            Token::From => "FROM",
            Token::Where => "WHERE",
            Token::And => "AND",
            Token::Or => "OR",
            Token::Xor => "XOR",
            Token::Not => "NOT",
            Token::As => "AS",
            Token::On => "ON",
            Token::Join => "JOIN",
            Token::GroupBy => "GROUP BY",
            Token::Having => "HAVING",
            Token::OrderBy => "ORDER BY",
            Token::Asc => "ASC",
            Token::Desc => "DESC",
            Token::Limit => "LIMIT",
            Token::Offset => "OFFSET",
            Token::Fetch => "FETCH",
            Token::Next => "NEXT",
            Token::Rows => "ROWS",
            Token::Only => "ONLY",
            Token::Top => "TOP",
            Token::Percent => "PERCENT",
            Token::Case => "CASE",
            Token::When => "WHEN",
            Token::Then => "THEN",
            Token::Else => "ELSE",
            Token::End => "END",
            Token::In => "IN",
            Token::Between => "BETWEEN",
            Token::Is => "IS",
            Token::Like => "LIKE",
            Token::Escape => "ESCAPE",
            Token::Distinct => "DISTINCT",
            Token::Union => "UNION",
            Token::Intersect => "INTERSECT",
            Token::Except => "EXCEPT",
            Token::SetMinus => "MINUS",
            Token::All => "ALL",
            Token::With => "WITH",
            Token::Recursive => "RECURSIVE",
            Token::Null => "NULL",
            Token::Exists => "EXISTS",
            Token::Interval => "INTERVAL",
            Token::For => "FOR",
            Token::Over => "OVER",
            Token::PartitionBy => "PARTITION BY",
            Token::Range => "RANGE",
            Token::Unbounded => "UNBOUNDED",
            Token::Preceding => "PRECEDING",
            Token::Following => "FOLLOWING",
            Token::CurrentRow => "CURRENT ROW",
            Token::Filter => "FILTER",
            Token::Create => "CREATE",
            Token::Drop => "DROP",
            Token::Table => "TABLE",
            Token::Temporary => "TEMPORARY",
            Token::Unlogged => "UNLOGGED",
            Token::Primary => "PRIMARY",
            Token::Key => "KEY",
            Token::Foreign => "FOREIGN",
            Token::References => "REFERENCES",
            Token::Unique => "UNIQUE",
            Token::Default => "DEFAULT",
            Token::If => "IF",
            Token::Insert => "INSERT",
            Token::Into => "INTO",
            Token::Values => "VALUES",
            Token::Update => "UPDATE",
            Token::Set => "SET",
            Token::Delete => "DELETE",
            Token::Returning => "RETURNING",
            Token::Using => "USING",
            Token::Conflict => "CONFLICT",
            Token::Do => "DO",
            Token::Nothing => "NOTHING",
            Token::Replace => "REPLACE",
            Token::Ignore => "IGNORE",
            _ => return None,
        };
        Some(kw)
    }

    /// Serialize this token using the dialect's default quoting and no parameters.
    pub fn serialize(&self, dialect: Dialect) -> String {
        // Inlined values never fail
        self.serialize_with(&mut Serializer::new(dialect))
            .unwrap_or_default()
    }

    /// Serialize this token with explicit output settings.
    ///
    /// Fails only when a parameterizer rejects a bound value.
    pub fn serialize_with(&self, out: &mut Serializer<'_>) -> Result<String> {
        if let Some(kw) = self.keyword() {
            return Ok(kw.into());
        }
        let text = match self {
            // Punctuation
            Token::Comma => ",".into(),
            Token::Dot => ".".into(),
            Token::Star => "*".into(),
            Token::LParen => "(".into(),
            Token::RParen => ")".into(),
            Token::LBracket => "[".into(),
            Token::RBracket => "]".into(),

            // Operators
            Token::Eq => "=".into(),
            Token::Ne => "<>".into(),
            Token::Lt => "<".into(),
            Token::Gt => ">".into(),
            Token::Lte => "<=".into(),
            Token::Gte => ">=".into(),
            Token::Plus => "+".into(),
            Token::Minus => "-".into(),
            Token::Mul => "*".into(),
            Token::Div => "/".into(),
            Token::Operator(op) => (*op).into(),

            Token::Space => " ".into(),

            // Dynamic - dialect-specific formatting
            Token::Ident(name) => quote_with(name, out.quote_char),
            Token::Alias(name) => quote_with(name, out.alias_quote_char),
            Token::LitInt(n) => n.to_string(),
            Token::Value(value) => out.value(None, value)?,
            Token::BoundValue { name, value } => out.value(Some(name), value)?,
            Token::Placeholder(p) => p.clone(),

            // Function names with dialect-specific remapping
            Token::FunctionName(name) => match out.dialect.remap_function(name) {
                Some(remapped) => remapped.into(),
                None => name.clone(),
            },

            Token::Raw(s) => s.clone(),

            // Keywords are handled above
            _ => String::new(),
        };
        Ok(text)
    }
}

/// A stream of tokens that can be serialized to SQL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TokenStream {
    tokens: Vec<Token>,
}

impl TokenStream {
    /// Create an empty token stream.
    pub fn new() -> Self {
        Self { tokens: vec![] }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Push a single token.
    pub fn push(&mut self, token: Token) -> &mut Self {
        self.tokens.push(token);
        self
    }

    /// Extend with multiple tokens.
    pub fn extend(&mut self, tokens: impl IntoIterator<Item = Token>) -> &mut Self {
        self.tokens.extend(tokens);
        self
    }

    /// Append another token stream.
    pub fn append(&mut self, other: &TokenStream) -> &mut Self {
        self.tokens.extend(other.tokens.iter().cloned());
        self
    }

    /// Append `other` wrapped in parentheses.
    pub fn append_parens(&mut self, other: &TokenStream) -> &mut Self {
        self.lparen().append(other).rparen()
    }

    /// Append streams separated by commas.
    pub fn append_list<'s>(&mut self, items: impl IntoIterator<Item = &'s TokenStream>) -> &mut Self {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.comma();
            }
            self.append(item);
        }
        self
    }

    /// Serialize all tokens using the dialect's defaults.
    pub fn serialize(&self, dialect: Dialect) -> String {
        self.serialize_with(&mut Serializer::new(dialect))
            .unwrap_or_default()
    }

    /// Serialize all tokens with explicit output settings.
    pub fn serialize_with(&self, out: &mut Serializer<'_>) -> Result<String> {
        self.tokens.iter().map(|t| t.serialize_with(out)).collect()
    }

    // Convenience methods for common tokens
    pub fn space(&mut self) -> &mut Self {
        self.push(Token::Space)
    }
    pub fn comma(&mut self) -> &mut Self {
        self.push(Token::Comma)
    }
    pub fn lparen(&mut self) -> &mut Self {
        self.push(Token::LParen)
    }
    pub fn rparen(&mut self) -> &mut Self {
        self.push(Token::RParen)
    }
    /// Push a keyword surrounded by spaces.
    pub fn keyword(&mut self, token: Token) -> &mut Self {
        self.space().push(token).space()
    }
}
