//! The `ValueSource` trait and its fluent combinator extension.
//!
//! A value source is a deferred, possibly-failing computation. Nothing runs
//! until [`ValueSource::evaluate`] is called, and non-memoizing sources rerun
//! their computation on every call.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::cache::{Cached, CacheKey, ValueCache};
use crate::eager::Eager;
use crate::error::ConfigError;
use crate::fallback::FirstOf;
use crate::tag::{TagRegistry, Tagged};
use crate::typed::{Parsed, TypeOf};
use crate::value::Value;

/// A deferred computation producing a `T` or a [`ConfigError`].
///
/// Sources are shared freely between threads; every implementation must be
/// `Send + Sync`.
///
/// # Example Implementation
///
/// ```
/// use lazyconf::{ConfigError, ValueSource};
///
/// struct Hostname;
///
/// impl ValueSource<String> for Hostname {
///     fn evaluate(&self) -> Result<String, ConfigError> {
///         std::env::var("HOSTNAME").map_err(|e| ConfigError::other("hostname", e.to_string()))
///     }
/// }
/// ```
pub trait ValueSource<T>: Send + Sync {
    /// Run the computation.
    fn evaluate(&self) -> Result<T, ConfigError>;

    /// Evaluate, aborting the program if the value is unavailable.
    ///
    /// Use this where the application cannot proceed without the value.
    /// Code that can retry or degrade should call [`ValueSource::evaluate`].
    ///
    /// # Panics
    ///
    /// Panics with the error's message when evaluation fails.
    fn must(&self) -> T {
        match self.evaluate() {
            Ok(value) => value,
            Err(error) => panic!("required configuration value unavailable: {}", error),
        }
    }
}

/// A type-erased value source.
pub type BoxedSource<T> = Box<dyn ValueSource<T>>;

impl<T, S: ValueSource<T> + ?Sized> ValueSource<T> for Box<S> {
    fn evaluate(&self) -> Result<T, ConfigError> {
        (**self).evaluate()
    }
}

impl<T, S: ValueSource<T> + ?Sized> ValueSource<T> for Arc<S> {
    fn evaluate(&self) -> Result<T, ConfigError> {
        (**self).evaluate()
    }
}

impl<T, S: ValueSource<T> + ?Sized> ValueSource<T> for &S {
    fn evaluate(&self) -> Result<T, ConfigError> {
        (**self).evaluate()
    }
}

/// Fluent combinators available on every value source.
///
/// ```
/// use std::sync::Arc;
/// use lazyconf::prelude::*;
///
/// let cache = Arc::new(ValueCache::new());
/// let port = from_fn(|| Err::<u16, _>(ConfigError::other("probe", "no port")))
///     .or(value(8080))
///     .cached(&cache);
///
/// assert_eq!(port.evaluate().unwrap(), 8080);
/// ```
pub trait ValueSourceExt<T>: ValueSource<T> + Sized {
    /// Erase the concrete type.
    fn boxed(self) -> BoxedSource<T>
    where
        Self: 'static,
    {
        Box::new(self)
    }

    /// Fall back to `other` when this source fails.
    fn or<O>(self, other: O) -> FirstOf<T>
    where
        Self: 'static,
        O: ValueSource<T> + 'static,
    {
        FirstOf::new(vec![self.boxed(), other.boxed()])
    }

    /// Memoize successful results in `cache` under a fresh, unique slot.
    fn cached(self, cache: &Arc<ValueCache>) -> Cached<Self> {
        Cached::new(self, cache)
    }

    /// Memoize successful results in `cache` under a caller-chosen slot.
    ///
    /// Every wrapper using the same key on the same cache shares one value.
    /// On a single-flight cache, `self` must not evaluate another wrapper
    /// with the same key: the per-key gate is not re-entrant.
    fn cached_as(self, cache: &Arc<ValueCache>, key: impl Into<CacheKey>) -> Cached<Self> {
        Cached::with_key(self, cache, key)
    }

    /// Evaluate now and replay the captured outcome on every later call.
    fn eager(self) -> Eager<T>
    where
        T: Clone,
    {
        Eager::new(self)
    }

    /// Only succeed when tag `name` is registered with value `expected`.
    fn tagged(
        self,
        registry: &Arc<TagRegistry>,
        name: impl Into<String>,
        expected: impl Into<String>,
    ) -> Tagged<Self> {
        Tagged::new(registry, name, expected, self)
    }

    /// Parse a textual value with `FromStr`.
    fn parse<U>(self) -> Parsed<Self, U>
    where
        Self: ValueSource<String>,
    {
        Parsed::new(self)
    }

    /// Transform a successful value with `f`; errors pass through untouched.
    fn map<U, F>(self, f: F) -> Mapped<Self, F, T>
    where
        F: Fn(T) -> U + Send + Sync,
    {
        Mapped::new(self, f)
    }

    /// Project an untyped [`Value`] into `U`.
    fn typed<U>(self) -> TypeOf<Self, U>
    where
        Self: ValueSource<Value>,
    {
        TypeOf::new(self)
    }
}

impl<T, S: ValueSource<T>> ValueSourceExt<T> for S {}

/// A source whose successful value is passed through a function.
pub struct Mapped<S, F, T> {
    inner: S,
    f: F,
    _marker: PhantomData<fn() -> T>,
}

impl<S, F, T> Mapped<S, F, T> {
    /// Wrap `inner`, applying `f` to each successful value.
    pub fn new(inner: S, f: F) -> Self {
        Self {
            inner,
            f,
            _marker: PhantomData,
        }
    }
}

impl<S: Clone, F: Clone, T> Clone for Mapped<S, F, T> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone(), self.f.clone())
    }
}

impl<S: fmt::Debug, F, T> fmt::Debug for Mapped<S, F, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapped")
            .field("inner", &self.inner)
            .finish_non_exhaustive()
    }
}

impl<T, U, S, F> ValueSource<U> for Mapped<S, F, T>
where
    S: ValueSource<T>,
    F: Fn(T) -> U + Send + Sync,
{
    fn evaluate(&self) -> Result<U, ConfigError> {
        self.inner.evaluate().map(&self.f)
    }
}
