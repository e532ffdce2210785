//! TOML-based configuration for querycraft.
//!
//! Example configuration:
//! ```toml
//! [render]
//! dialect = "postgres"
//! quote_char = "\""
//! as_keyword = false
//! with_namespace = false
//! groupby_alias = true
//! orderby_alias = true
//! parameter_style = "dollar"
//!
//! [builder]
//! immutable = true
//! ```
//!
//! An empty `quote_char` leaves identifiers unquoted.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::sql::dialect::Dialect;
use crate::sql::param::{ParamStyle, Parameterizer};
use crate::sql::query::QueryBuilder;
use crate::sql::render::RenderOptions;

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Output options.
    pub render: RenderSettings,

    /// Builder defaults.
    pub builder: BuilderSettings,
}

/// Output options, mirroring [`RenderOptions`].
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct RenderSettings {
    /// Dialect name; aliases such as "pg" or "tsql" are accepted.
    pub dialect: String,

    /// Identifier quote override (one character, or empty for none).
    pub quote_char: Option<String>,

    /// Alias quote override (one character, or empty for none).
    pub alias_quote_char: Option<String>,

    pub as_keyword: bool,

    /// Qualify every field with its table.
    pub with_namespace: bool,

    pub groupby_alias: bool,

    pub orderby_alias: bool,

    /// Placeholder style for parameterized output.
    pub parameter_style: Option<String>,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            dialect: "ansi".to_string(),
            quote_char: None,
            alias_quote_char: None,
            as_keyword: false,
            with_namespace: false,
            groupby_alias: true,
            orderby_alias: true,
            parameter_style: None,
        }
    }
}

/// Builder defaults.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct BuilderSettings {
    /// Chained calls yield new builder values rather than the same handle.
    pub immutable: bool,
}

impl Default for BuilderSettings {
    fn default() -> Self {
        Self { immutable: true }
    }
}

impl Settings {
    /// Parse and validate settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, SettingsError> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Check every name-valued option.
    pub fn validate(&self) -> Result<(), SettingsError> {
        self.dialect()?;
        self.parameter_style()?;
        self.render_options()?;
        Ok(())
    }

    /// The configured dialect.
    pub fn dialect(&self) -> Result<Dialect, SettingsError> {
        self.render.dialect.parse().map_err(SettingsError::Invalid)
    }

    /// The configured placeholder style, if any.
    pub fn parameter_style(&self) -> Result<Option<ParamStyle>, SettingsError> {
        self.render
            .parameter_style
            .as_deref()
            .map(|s| s.parse().map_err(SettingsError::Invalid))
            .transpose()
    }

    /// Options for [`Render::get_sql_with`](crate::sql::render::Render::get_sql_with).
    pub fn render_options(&self) -> Result<RenderOptions, SettingsError> {
        let render = &self.render;
        let mut options = RenderOptions::new()
            .dialect(self.dialect()?)
            .as_keyword(render.as_keyword)
            .with_namespace(render.with_namespace)
            .groupby_alias(render.groupby_alias)
            .orderby_alias(render.orderby_alias);
        if let Some(quote) = &render.quote_char {
            options = options.quote_char(parse_quote_char("quote_char", quote)?);
        }
        if let Some(quote) = &render.alias_quote_char {
            options = options.alias_quote_char(parse_quote_char("alias_quote_char", quote)?);
        }
        Ok(options)
    }

    /// A fresh parameter sink for the configured style, if one is set.
    pub fn parameterizer(&self) -> Result<Option<Parameterizer>, SettingsError> {
        Ok(self.parameter_style()?.map(Parameterizer::new))
    }

    /// An empty builder for the configured dialect and mutability.
    pub fn query(&self) -> Result<QueryBuilder, SettingsError> {
        Ok(QueryBuilder::new(self.dialect()?).immutable(self.builder.immutable))
    }
}

fn parse_quote_char(key: &str, value: &str) -> Result<Option<char>, SettingsError> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (None, _) => Ok(None),
        (Some(c), None) => Ok(Some(c)),
        _ => Err(SettingsError::Invalid(format!(
            "{} must be a single character, got {:?}",
            key, value
        ))),
    }
}
