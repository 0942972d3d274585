//! Error types for lazyconf value sources.
//!
//! Every failure travels back up a combinator chain as a [`ConfigError`].
//! Fallback chains aggregate their children into [`ConfigErrors`], a
//! non-empty list built on stillwater's `NonEmptyVec` and `Semigroup`.

use std::fmt;

use stillwater::{NonEmptyVec, Semigroup};
use thiserror::Error;

/// Kinds of leaf source failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceErrorKind {
    /// Environment variable is not set
    NotSet { name: String },
    /// Source file was not found
    NotFound { path: String },
    /// Source file could not be read
    IoError { message: String },
    /// Source content could not be parsed
    ParseError {
        message: String,
        line: Option<u32>,
        column: Option<u32>,
    },
    /// Document parsed, but the requested key is absent
    MissingKey { path: String },
    /// Other source-specific error
    Other { message: String },
}

impl fmt::Display for SourceErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceErrorKind::NotSet { name } => {
                write!(f, "environment variable {} is not set", name)
            }
            SourceErrorKind::NotFound { path } => write!(f, "file not found: {}", path),
            SourceErrorKind::IoError { message } => write!(f, "I/O error: {}", message),
            SourceErrorKind::ParseError {
                message,
                line,
                column,
            } => {
                write!(f, "parse error: {}", message)?;
                if let Some(l) = line {
                    write!(f, " at line {}", l)?;
                    if let Some(c) = column {
                        write!(f, ", column {}", c)?;
                    }
                }
                Ok(())
            }
            SourceErrorKind::MissingKey { path } => write!(f, "missing key '{}'", path),
            SourceErrorKind::Other { message } => write!(f, "{}", message),
        }
    }
}

/// Errors produced while evaluating a value source.
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    /// A leaf source could not produce a value
    #[error("{source_name}: {kind}")]
    SourceError {
        source_name: String,
        kind: SourceErrorKind,
    },

    /// Every source of a fallback chain failed
    #[error("no source in the fallback chain produced a value: {}", .errors.joined())]
    AllFailed { errors: Box<ConfigErrors> },

    /// A fallback chain was built without any sources
    #[error("no configuration sources provided")]
    NoSources,

    /// An untyped value does not have the requested type
    #[error("expected {expected}, got {actual}: {message}")]
    TypeMismatch {
        expected: String,
        actual: String,
        message: String,
    },

    /// A textual value could not be parsed into the requested type
    #[error("[{source_name}] expected {expected_type}, got \"{actual_value}\": {message}")]
    ParseError {
        source_name: String,
        expected_type: String,
        actual_value: String,
        message: String,
    },

    /// The gating tag was never registered
    #[error("tag '{tag}' is not registered")]
    TagUnset { tag: String },

    /// The gating tag holds a different value
    #[error("tag '{tag}' is '{actual}', expected '{expected}'")]
    TagMismatch {
        tag: String,
        expected: String,
        actual: String,
    },

    /// A named cache slot already holds a value of another type
    #[error("cache slot {key} does not hold a value of type {expected_type}")]
    CacheTypeConflict { key: String, expected_type: String },
}

impl ConfigError {
    /// Build a leaf failure with a free-form message.
    pub fn other(source_name: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::SourceError {
            source_name: source_name.into(),
            kind: SourceErrorKind::Other {
                message: message.into(),
            },
        }
    }

    /// Check if this error comes from an unmet tag gate.
    pub fn is_tag_error(&self) -> bool {
        matches!(
            self,
            ConfigError::TagUnset { .. } | ConfigError::TagMismatch { .. }
        )
    }

    /// The child errors of a fallback chain, if this is one.
    pub fn causes(&self) -> Option<&ConfigErrors> {
        match self {
            ConfigError::AllFailed { errors } => Some(&**errors),
            _ => None,
        }
    }
}

/// A non-empty collection of configuration errors.
///
/// Uses `NonEmptyVec` from stillwater to guarantee at least one error exists.
#[derive(Debug, Clone)]
pub struct ConfigErrors(pub NonEmptyVec<ConfigError>);

impl ConfigErrors {
    /// Create from a single error.
    pub fn single(error: ConfigError) -> Self {
        Self(NonEmptyVec::singleton(error))
    }

    /// Try to create from a vec, returning None if empty.
    pub fn from_vec(errors: Vec<ConfigError>) -> Option<Self> {
        NonEmptyVec::from_vec(errors).map(Self)
    }

    /// Get the first error (always exists).
    pub fn first(&self) -> &ConfigError {
        self.0.head()
    }

    /// Number of errors.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty (always false, but required for API consistency).
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Iterate over errors in the order they were recorded.
    pub fn iter(&self) -> impl Iterator<Item = &ConfigError> {
        self.0.iter()
    }

    fn joined(&self) -> String {
        self.iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl Semigroup for ConfigErrors {
    fn combine(self, other: Self) -> Self {
        Self(self.0.combine(other.0))
    }
}

impl fmt::Display for ConfigErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Configuration errors ({}):", self.len())?;
        for error in self.iter() {
            writeln!(f, "  {}", error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn failure(message: &str) -> ConfigError {
        ConfigError::other("test", message)
    }

    #[test]
    fn test_source_error_display() {
        let err = ConfigError::SourceError {
            source_name: "env:APP_HOST".to_string(),
            kind: SourceErrorKind::NotSet {
                name: "APP_HOST".to_string(),
            },
        };
        assert_eq!(
            err.to_string(),
            "env:APP_HOST: environment variable APP_HOST is not set"
        );
    }

    #[test]
    fn test_parse_error_kind_display() {
        let kind = SourceErrorKind::ParseError {
            message: "unexpected token".to_string(),
            line: Some(3),
            column: Some(7),
        };
        assert_eq!(
            kind.to_string(),
            "parse error: unexpected token at line 3, column 7"
        );
    }

    #[test]
    fn test_all_failed_mentions_every_child() {
        let errors = ConfigErrors::from_vec(vec![failure("A"), failure("B")]).unwrap();
        let err = ConfigError::AllFailed {
            errors: Box::new(errors),
        };
        let msg = err.to_string();
        assert!(msg.contains("test: A"));
        assert!(msg.contains("test: B"));
        assert!(msg.find("A").unwrap() < msg.find("B").unwrap());
    }

    #[test]
    fn test_config_errors_single() {
        let errors = ConfigErrors::single(ConfigError::NoSources);
        assert_eq!(errors.len(), 1);
        assert!(!errors.is_empty());
    }

    #[test]
    fn test_config_errors_from_empty_vec() {
        assert!(ConfigErrors::from_vec(Vec::new()).is_none());
    }

    #[test]
    fn test_config_errors_combine_keeps_order() {
        let combined =
            ConfigErrors::single(failure("first")).combine(ConfigErrors::single(failure("second")));
        assert_eq!(combined.len(), 2);
        assert_eq!(combined.first().to_string(), "test: first");
    }

    #[test]
    fn test_is_tag_error() {
        assert!(ConfigError::TagUnset {
            tag: "env".to_string()
        }
        .is_tag_error());
        assert!(!ConfigError::NoSources.is_tag_error());
    }

    #[test]
    fn test_causes() {
        let errors = ConfigErrors::single(failure("A"));
        let err = ConfigError::AllFailed {
            errors: Box::new(errors),
        };
        assert_eq!(err.causes().map(ConfigErrors::len), Some(1));
        assert!(ConfigError::NoSources.causes().is_none());
    }
}
