//! Shared state for one configuration.
//!
//! A `ConfigContext` bundles the memoization cache, the tag registry and the
//! I/O environment that a set of fields is built against. Contexts are cheap
//! to clone (all state is behind `Arc`) and two independently constructed
//! contexts never see each other's cached values or tags.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use lazyconf::env::MockEnv;
//! use lazyconf::prelude::*;
//!
//! let ctx = ConfigContext::with_env(Arc::new(MockEnv::new().with_env("my_env", "staging")));
//!
//! let environment = ctx.register_tag("environment", ctx.env_var("my_env"));
//! let database = first_of![
//!     ctx.tag("environment", "dev", value("my_dev_db")),
//!     ctx.tag("environment", "staging", value("my_staging_db")),
//!     ctx.tag("environment", "prod", value("my_prod_db")),
//! ];
//!
//! assert_eq!(environment.must(), "staging");
//! assert_eq!(database.must(), "my_staging_db");
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::cache::{CacheKey, Cached, ValueCache};
use crate::env::{ConfigEnv, RealEnv};
use crate::error::ConfigError;
use crate::source::ValueSource;
use crate::sources::{Env, Json};
#[cfg(feature = "toml")]
use crate::sources::Toml;
use crate::tag::{self, RegisteredTag, TagRegistry, Tagged};

/// Cache, tag registry and environment shared by a set of value sources.
#[derive(Clone)]
pub struct ConfigContext {
    cache: Arc<ValueCache>,
    tags: Arc<TagRegistry>,
    env: Arc<dyn ConfigEnv>,
}

impl Default for ConfigContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigContext {
    /// Create a context over the process environment.
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Create a context over a custom environment.
    ///
    /// This enables dependency injection for testing.
    pub fn with_env(env: Arc<dyn ConfigEnv>) -> Self {
        Self::builder().env(env).build()
    }

    /// Create a builder for a context.
    pub fn builder() -> ConfigContextBuilder {
        ConfigContextBuilder::new()
    }

    /// The memoization cache.
    pub fn cache(&self) -> &Arc<ValueCache> {
        &self.cache
    }

    /// The tag registry.
    pub fn tags(&self) -> &Arc<TagRegistry> {
        &self.tags
    }

    /// The I/O environment.
    pub fn env(&self) -> &Arc<dyn ConfigEnv> {
        &self.env
    }

    /// Memoize `source` under a fresh slot.
    pub fn cached<S>(&self, source: S) -> Cached<S> {
        Cached::new(source, &self.cache)
    }

    /// Memoize `source` under a caller-chosen slot.
    ///
    /// See [`ValueSourceExt::cached_as`](crate::ValueSourceExt::cached_as)
    /// for the re-entrancy restriction on single-flight contexts.
    pub fn cached_as<S>(&self, key: impl Into<CacheKey>, source: S) -> Cached<S> {
        Cached::with_key(source, &self.cache, key)
    }

    /// Evaluate `source` now and commit its value as tag `name`.
    ///
    /// # Panics
    ///
    /// Panics if the source fails.
    pub fn register_tag<S>(&self, name: impl Into<String>, source: S) -> RegisteredTag<S>
    where
        S: ValueSource<String>,
    {
        tag::register_tag(&self.tags, name, source)
    }

    /// Evaluate `source` now and commit its value as tag `name`.
    ///
    /// # Errors
    ///
    /// Returns the source's error; nothing is registered in that case.
    pub fn try_register_tag<S>(
        &self,
        name: impl Into<String>,
        source: S,
    ) -> Result<RegisteredTag<S>, ConfigError>
    where
        S: ValueSource<String>,
    {
        tag::try_register_tag(&self.tags, name, source)
    }

    /// Gate `source` on tag `name` being `expected`.
    pub fn tag<S>(
        &self,
        name: impl Into<String>,
        expected: impl Into<String>,
        source: S,
    ) -> Tagged<S> {
        Tagged::new(&self.tags, name, expected, source)
    }

    /// An environment variable read through this context's environment.
    pub fn env_var(&self, name: impl Into<String>) -> Env {
        Env::var(Arc::clone(&self.env), name)
    }

    /// A JSON file read through this context's environment.
    pub fn json_file(&self, path: impl Into<PathBuf>) -> Json {
        Json::file(Arc::clone(&self.env), path)
    }

    /// A TOML file read through this context's environment.
    #[cfg(feature = "toml")]
    pub fn toml_file(&self, path: impl Into<PathBuf>) -> Toml {
        Toml::file(Arc::clone(&self.env), path)
    }
}

impl fmt::Debug for ConfigContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigContext")
            .field("cache", &self.cache)
            .field("tags", &self.tags.len())
            .finish_non_exhaustive()
    }
}

/// Builder for [`ConfigContext`].
///
/// ```
/// use lazyconf::ConfigContext;
///
/// let ctx = ConfigContext::builder().single_flight(true).build();
/// assert!(ctx.cache().is_single_flight());
/// ```
#[derive(Default)]
pub struct ConfigContextBuilder {
    env: Option<Arc<dyn ConfigEnv>>,
    single_flight: bool,
}

impl ConfigContextBuilder {
    /// Create a builder with the process environment and a last-write-wins cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom environment for leaf I/O.
    pub fn env(mut self, env: Arc<dyn ConfigEnv>) -> Self {
        self.env = Some(env);
        self
    }

    /// De-duplicate concurrent cache misses per key.
    pub fn single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    /// Build the context.
    pub fn build(self) -> ConfigContext {
        let cache = if self.single_flight {
            ValueCache::single_flight()
        } else {
            ValueCache::new()
        };
        ConfigContext {
            cache: Arc::new(cache),
            tags: Arc::new(TagRegistry::new()),
            env: self.env.unwrap_or_else(|| Arc::new(RealEnv::new())),
        }
    }
}
