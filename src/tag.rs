//! Tag registry and tag-gated sources.
//!
//! A tag is a named string committed at construction time, typically the
//! deployment environment. [`Tagged`] sources only succeed while the
//! registry holds the expected value, which makes them the building block
//! for per-environment fallback chains:
//!
//! ```
//! use std::sync::Arc;
//! use lazyconf::prelude::*;
//!
//! let tags = Arc::new(TagRegistry::new());
//! let _environment = register_tag(&tags, "environment", value("staging".to_string()));
//!
//! let database = first_of![
//!     tag(&tags, "environment", "dev", value("my_dev_db")),
//!     tag(&tags, "environment", "staging", value("my_staging_db")),
//!     tag(&tags, "environment", "prod", value("my_prod_db")),
//! ];
//! assert_eq!(database.evaluate().unwrap(), "my_staging_db");
//! ```

use std::sync::Arc;

use dashmap::DashMap;
use tracing::{debug, info};

use crate::error::ConfigError;
use crate::source::ValueSource;

/// Concurrent map from tag name to its committed value.
///
/// Registering a name again replaces the previous value.
#[derive(Debug, Default)]
pub struct TagRegistry {
    tags: DashMap<String, String>,
}

impl TagRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit `value` under `name`, returning the value it replaced.
    pub fn register(&self, name: impl Into<String>, value: impl Into<String>) -> Option<String> {
        let name = name.into();
        let value = value.into();
        info!(tag = %name, value = %value, "tag registered");
        self.tags.insert(name, value)
    }

    /// The value committed under `name`.
    pub fn get(&self, name: &str) -> Option<String> {
        self.tags.get(name).map(|entry| entry.value().clone())
    }

    /// Succeed iff `name` is registered with exactly `expected`.
    ///
    /// # Errors
    ///
    /// `TagUnset` when the name was never registered, `TagMismatch` when it
    /// holds another value.
    pub fn check(&self, name: &str, expected: &str) -> Result<(), ConfigError> {
        match self.get(name) {
            None => Err(ConfigError::TagUnset {
                tag: name.to_string(),
            }),
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(ConfigError::TagMismatch {
                tag: name.to_string(),
                expected: expected.to_string(),
                actual,
            }),
        }
    }

    /// Number of registered tags.
    pub fn len(&self) -> usize {
        self.tags.len()
    }

    /// Check if no tag was registered.
    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }
}

/// The source handed back by [`register_tag`].
///
/// Evaluating it reruns the registered source; it does not read the registry.
#[derive(Debug, Clone)]
pub struct RegisteredTag<S> {
    name: String,
    inner: S,
}

impl<S> RegisteredTag<S> {
    /// The tag name this source was registered under.
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<S: ValueSource<String>> ValueSource<String> for RegisteredTag<S> {
    fn evaluate(&self) -> Result<String, ConfigError> {
        self.inner.evaluate()
    }
}

/// Evaluate `source` now and commit its value under `name`.
///
/// # Errors
///
/// Returns the source's error; nothing is registered in that case.
pub fn try_register_tag<S>(
    registry: &TagRegistry,
    name: impl Into<String>,
    source: S,
) -> Result<RegisteredTag<S>, ConfigError>
where
    S: ValueSource<String>,
{
    let name = name.into();
    let value = source.evaluate().map_err(|error| {
        debug!(tag = %name, %error, "tag source failed");
        error
    })?;
    registry.register(name.clone(), value);
    Ok(RegisteredTag {
        name,
        inner: source,
    })
}

/// Evaluate `source` now and commit its value under `name`.
///
/// # Panics
///
/// Panics if the source fails: a tag that cannot be resolved at startup
/// leaves the configuration undefined.
pub fn register_tag<S>(registry: &TagRegistry, name: impl Into<String>, source: S) -> RegisteredTag<S>
where
    S: ValueSource<String>,
{
    let name = name.into();
    match try_register_tag(registry, name.clone(), source) {
        Ok(registered) => registered,
        Err(error) => panic!("failed to register tag '{}': {}", name, error),
    }
}

/// A source that only succeeds when a tag holds an expected value.
#[derive(Debug, Clone)]
pub struct Tagged<S> {
    registry: Arc<TagRegistry>,
    tag: String,
    expected: String,
    inner: S,
}

impl<S> Tagged<S> {
    /// Gate `inner` on tag `name` being `expected`.
    pub fn new(
        registry: &Arc<TagRegistry>,
        name: impl Into<String>,
        expected: impl Into<String>,
        inner: S,
    ) -> Self {
        Self {
            registry: Arc::clone(registry),
            tag: name.into(),
            expected: expected.into(),
            inner,
        }
    }
}

impl<T, S: ValueSource<T>> ValueSource<T> for Tagged<S> {
    fn evaluate(&self) -> Result<T, ConfigError> {
        self.registry.check(&self.tag, &self.expected)?;
        self.inner.evaluate()
    }
}

/// Gate `source` on tag `name` being `expected`; see [`Tagged`].
pub fn tag<S>(
    registry: &Arc<TagRegistry>,
    name: impl Into<String>,
    expected: impl Into<String>,
    source: S,
) -> Tagged<S> {
    Tagged::new(registry, name, expected, source)
}
