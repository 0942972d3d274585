//! JSON document source.
//!
//! Yields an untyped [`Value`]; project it with
//! [`ValueSourceExt::typed`](crate::ValueSourceExt::typed).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lazyconf::env::MockEnv;
//! use lazyconf::{Json, ValueSource, ValueSourceExt};
//!
//! let env = Arc::new(MockEnv::new().with_file("app.json", r#"{"server": {"port": 8080}}"#));
//! let port = Json::file(env, "app.json").key("server.port").typed::<u16>();
//!
//! assert_eq!(port.evaluate().unwrap(), 8080);
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::env::ConfigEnv;
use crate::error::{ConfigError, SourceErrorKind};
use crate::source::ValueSource;
use crate::sources::{select_key, DocumentOrigin};
use crate::value::Value;

/// A JSON document, or one key inside it, re-read on every evaluation.
#[derive(Clone)]
pub struct Json {
    origin: DocumentOrigin,
    key: Option<String>,
    name: Option<String>,
}

impl Json {
    /// Load JSON from a file read through `env`.
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

    /// Load JSON from inline content.
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

impl fmt::Debug for Json {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Json")
            .field("origin", &self.origin)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

impl ValueSource<Value> for Json {
    fn evaluate(&self) -> Result<Value, ConfigError> {
        let source_name = self.source_name();
        let content = self.origin.read(&source_name)?;
        let document = parse_json(&content, &source_name)?;
        select_key(document, self.key.as_deref(), &source_name)
    }
}

fn parse_json(content: &str, source_name: &str) -> Result<Value, ConfigError> {
    let json: serde_json::Value =
        serde_json::from_str(content).map_err(|e| ConfigError::SourceError {
            source_name: source_name.to_string(),
            kind: SourceErrorKind::ParseError {
                message: e.to_string(),
                line: Some(e.line() as u32),
                column: Some(e.column() as u32),
            },
        })?;
    Ok(Value::from_json(&json))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::MockEnv;

    fn env_with(path: &str, content: &str) -> Arc<dyn ConfigEnv> {
        Arc::new(MockEnv::new().with_file(path, content))
    }

    #[test]
    fn test_json_file_key() {
        let env = env_with("config.json", r#"{"database": {"host": "localhost", "port": 5432}}"#);
        let host = Json::file(Arc::clone(&env), "config.json").key("database.host");
        let port = Json::file(env, "config.json").key("database.port");

        assert_eq!(host.evaluate().unwrap(), Value::String("localhost".to_string()));
        assert_eq!(port.evaluate().unwrap(), Value::Integer(5432));
    }

    #[test]
    fn test_json_whole_document() {
        let doc = Json::string(r#"[1, 2, 3]"#).evaluate().unwrap();
        assert_eq!(doc.as_array().map(<[Value]>::len), Some(3));
    }

    #[test]
    fn test_json_file_missing() {
        let env: Arc<dyn ConfigEnv> = Arc::new(MockEnv::new());
        let err = Json::file(env, "missing.json").evaluate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SourceError {
                kind: SourceErrorKind::NotFound { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_json_permission_denied() {
        let env: Arc<dyn ConfigEnv> =
            Arc::new(MockEnv::new().with_unreadable_file("secret.json"));
        let err = Json::file(env, "secret.json").evaluate().unwrap_err();
        assert!(matches!(
            err,
            ConfigError::SourceError {
                kind: SourceErrorKind::IoError { .. },
                ..
            }
        ));
    }

    #[test]
    fn test_json_parse_error_with_location() {
        let err = Json::string("{\n  \"host\": }").named("inline").evaluate().unwrap_err();
        match err {
            ConfigError::SourceError {
                source_name,
                kind: SourceErrorKind::ParseError { line, .. },
            } => {
                assert_eq!(source_name, "inline");
                assert_eq!(line, Some(2));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_json_missing_key() {
        let err = Json::string(r#"{"a": 1}"#).key("b").evaluate().unwrap_err();
        assert_eq!(err.to_string(), "<string>: missing key 'b'");
    }
}
