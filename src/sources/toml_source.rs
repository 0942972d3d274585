//! TOML document source.
//!
//! Same shape as [`Json`](crate::Json): the document, or one dot-notation
//! key inside it, as an untyped [`Value`]. Datetimes surface as strings.

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::env::ConfigEnv;
use crate::error::{ConfigError, SourceErrorKind};
use crate::source::ValueSource;
use crate::sources::{line_from_offset, select_key, DocumentOrigin};
use crate::value::Value;

/// A TOML document, or one key inside it, re-read on every evaluation.
#[derive(Clone)]
pub struct Toml {
    origin: DocumentOrigin,
    key: Option<String>,
    name: Option<String>,
}

impl Toml {
    /// Load TOML from a file read through `env`.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use lazyconf::env::MockEnv;
    /// use lazyconf::{Toml, ValueSource, ValueSourceExt};
    ///
    /// let env = Arc::new(MockEnv::new().with_file("app.toml", "[db]\nname = \"orders\""));
    /// let name = Toml::file(env, "app.toml").key("db.name").typed::<String>();
    ///
    /// assert_eq!(name.evaluate().unwrap(), "orders");
    /// ```
    pub fn file(env: Arc<dyn ConfigEnv>, path: impl Into<PathBuf>) -> Self {
        Self {
            origin: DocumentOrigin::File {
                path: path.into(),
                env,
            },
            key: None,
            name: None,
        }
    }

    /// Load TOML from inline content.
    pub fn string(content: impl Into<String>) -> Self {
        Self {
            origin: DocumentOrigin::String {
                content: content.into(),
                name: "<string>".to_string(),
            },
            key: None,
            name: None,
        }
    }

    /// Select a dot-notation key (e.g. `"database.host"`).
    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set a custom name for this source in error messages.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    fn source_name(&self) -> String {
        self.name
            .clone()
            .unwrap_or_else(|| self.origin.default_name())
    }
}

impl fmt::Debug for Toml {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Toml")
            .field("origin", &self.origin)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ValueSource<Value> for Toml {
    fn evaluate(&self) -> Result<Value, ConfigError> {
        let source_name = self.source_name();
        let content = self.origin.read(&source_name)?;
        let document = parse_toml(&content, &source_name)?;
        select_key(document, self.key.as_deref(), &source_name)
    }
}

fn parse_toml(content: &str, source_name: &str) -> Result<Value, ConfigError> {
    let table: toml::Table = toml::from_str(content).map_err(|e: toml::de::Error| {
        let (line, column) = e
            .span()
            .map(|s| {
                let line = line_from_offset(content, s.start);
                let last_newline = content[..s.start.min(content.len())]
                    .rfind('\n')
                    .map(|p| p + 1)
                    .unwrap_or(0);
                let column = (s.start.saturating_sub(last_newline) + 1) as u32;
                (Some(line), Some(column))
            })
            .unwrap_or((None, None));

        ConfigError::SourceError {
            source_name: source_name.to_string(),
            kind: SourceErrorKind::ParseError {
                message: e.message().to_string(),
                line,
                column,
            },
        }
    })?;

    Ok(Value::Table(
        table
            .into_iter()
            .map(|(k, v)| (k, toml_to_value(v)))
            .collect(),
    ))
}

fn toml_to_value(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Integer(i),
        toml::Value::Float(f) => Value::Float(f),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(arr) => Value::Array(arr.into_iter().map(toml_to_value).collect()),
        toml::Value::Table(table) => Value::Table(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_value(v)))
                .collect(),
        ),
    }
}
