//! Leaf value sources.
//!
//! Leaves are where data enters the system: fixed literals, arbitrary
//! closures, environment variables and structured documents. Everything
//! that touches the outside world goes through [`crate::env::ConfigEnv`].

mod env_source;
mod function;
mod json_source;
mod literal;
#[cfg(feature = "toml")]
mod toml_source;

pub use env_source::Env;
pub use function::{from_fn, FnSource};
pub use json_source::Json;
pub use literal::{value, Literal};
#[cfg(feature = "toml")]
pub use toml_source::Toml;

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::env::ConfigEnv;
use crate::error::{ConfigError, SourceErrorKind};
use crate::value::Value;

/// Where a structured document comes from.
#[derive(Clone)]
pub(crate) enum DocumentOrigin {
    /// Read through the environment on every evaluation
    File {
        path: PathBuf,
        env: Arc<dyn ConfigEnv>,
    },
    /// Inline content
    String { content: String, name: String },
}

impl fmt::Debug for DocumentOrigin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DocumentOrigin::File { path, .. } => f.debug_tuple("File").field(path).finish(),
            DocumentOrigin::String { name, .. } => f.debug_tuple("String").field(name).finish(),
        }
    }
}

impl DocumentOrigin {
    pub(crate) fn default_name(&self) -> String {
        match self {
            DocumentOrigin::File { path, .. } => path.display().to_string(),
            DocumentOrigin::String { name, .. } => name.clone(),
        }
    }

    /// Fetch the raw text of the document.
    pub(crate) fn read(&self, source_name: &str) -> Result<String, ConfigError> {
        match self {
            DocumentOrigin::File { path, env } => env.read_file(path).map_err(|e| {
                let kind = if e.kind() == std::io::ErrorKind::NotFound {
                    SourceErrorKind::NotFound {
                        path: path.display().to_string(),
                    }
                } else {
                    SourceErrorKind::IoError {
                        message: e.to_string(),
                    }
                };
                ConfigError::SourceError {
                    source_name: source_name.to_string(),
                    kind,
                }
            }),
            DocumentOrigin::String { content, .. } => Ok(content.clone()),
        }
    }
}

/// Pick `key` out of a parsed document; `None` selects the whole document.
pub(crate) fn select_key(
    document: Value,
    key: Option<&str>,
    source_name: &str,
) -> Result<Value, ConfigError> {
    let Some(key) = key else {
        return Ok(document);
    };

    document
        .get_path(key)
        .cloned()
        .ok_or_else(|| ConfigError::SourceError {
            source_name: source_name.to_string(),
            kind: SourceErrorKind::MissingKey {
                path: key.to_string(),
            },
        })
}

/// Convert a byte offset into a 1-indexed line number.
#[cfg_attr(not(feature = "toml"), allow(dead_code))]
pub(crate) fn line_from_offset(content: &str, offset: usize) -> u32 {
    let end = offset.min(content.len());
    content.as_bytes()[..end]
        .iter()
        .filter(|&&b| b == b'\n')
        .count() as u32
        + 1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_from_offset() {
        let content = "a = 1\nb = 2\nc = 3";
        assert_eq!(line_from_offset(content, 0), 1);
        assert_eq!(line_from_offset(content, 6), 2);
        assert_eq!(line_from_offset(content, 100), 3);
    }

    #[test]
    fn test_inline_origin_reads_content() {
        let origin = DocumentOrigin::String {
            content: "{}".to_string(),
            name: "<string>".to_string(),
        };
        assert_eq!(origin.read("inline").unwrap(), "{}");
        assert_eq!(origin.default_name(), "<string>");
        assert_eq!(format!("{:?}", origin), "String(\"<string>\")");
    }

    #[test]
    fn test_file_origin_reads_through_env() {
        let env: Arc<dyn ConfigEnv> =
            Arc::new(crate::env::MockEnv::new().with_file("app.json", "{}"));
        let origin = DocumentOrigin::File {
            path: PathBuf::from("app.json"),
            env,
        };
        assert_eq!(origin.read("app.json").unwrap(), "{}");
        assert_eq!(format!("{:?}", origin), "File(\"app.json\")");
    }

    #[test]
    fn test_select_key_missing() {
        let err = select_key(Value::Null, Some("database.host"), "config.json").unwrap_err();
        assert_eq!(
            err.to_string(),
            "config.json: missing key 'database.host'"
        );
    }

    #[test]
    fn test_select_key_none_returns_document() {
        let doc = Value::Integer(3);
        assert_eq!(select_key(doc.clone(), None, "inline").unwrap(), doc);
    }
}
