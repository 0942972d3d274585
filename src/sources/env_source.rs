//! Environment variable source.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lazyconf::env::MockEnv;
//! use lazyconf::{Env, ValueSource, ValueSourceExt};
//!
//! let env = Arc::new(MockEnv::new().with_env("APP_PORT", "8080"));
//! let port = Env::var(env, "PORT").prefix("APP_").parse::<u16>();
//!
//! assert_eq!(port.evaluate().unwrap(), 8080);
//! ```

use std::fmt;
use std::sync::Arc;

use crate::env::{ConfigEnv, RealEnv};
use crate::error::{ConfigError, SourceErrorKind};
use crate::source::ValueSource;

/// A single environment variable, read on every evaluation.
#[derive(Clone)]
pub struct Env {
    env: Arc<dyn ConfigEnv>,
    prefix: String,
    name: String,
    allow_empty: bool,
}

impl Env {
    /// Read `name` through the given environment.
    pub fn var(env: Arc<dyn ConfigEnv>, name: impl Into<String>) -> Self {
        Self {
            env,
            prefix: String::new(),
            name: name.into(),
            allow_empty: true,
        }
    }

    /// Read `name` from the process environment.
    pub fn real(name: impl Into<String>) -> Self {
        Self::var(Arc::new(RealEnv::new()), name)
    }

    /// Prepend a prefix to the variable name.
    ///
    /// `Env::real("PORT").prefix("APP_")` reads `APP_PORT`.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Treat a variable set to the empty string as not set.
    pub fn non_empty(mut self) -> Self {
        self.allow_empty = false;
        self
    }

    /// The full variable name, prefix included.
    pub fn full_name(&self) -> String {
        format!("{}{}", self.prefix, self.name)
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("name", &self.full_name())
            .field("allow_empty", &self.allow_empty)
            .finish_non_exhaustive()
    }
}

impl ValueSource<String> for Env {
    fn evaluate(&self) -> Result<String, ConfigError> {
        let full_name = self.full_name();
        match self.env.get_env(&full_name) {
            Some(value) if self.allow_empty || !value.is_empty() => Ok(value),
            _ => Err(ConfigError::SourceError {
                source_name: format!("env:{}", full_name),
                kind: SourceErrorKind::NotSet { name: full_name },
            }),
        }
    }
}
