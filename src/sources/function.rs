//! Closure-backed sources.
//!
//! `FnSource` is the adapter through which arbitrary I/O enters the system.
//! No assumptions are made about the closure's latency or idempotence.

use std::fmt;

use crate::error::ConfigError;
use crate::source::ValueSource;

/// A source that delegates to a closure on every evaluation.
#[derive(Clone)]
pub struct FnSource<F> {
    f: F,
}

impl<F> fmt::Debug for FnSource<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnSource").finish_non_exhaustive()
    }
}

impl<T, F> ValueSource<T> for FnSource<F>
where
    F: Fn() -> Result<T, ConfigError> + Send + Sync,
{
    fn evaluate(&self) -> Result<T, ConfigError> {
        (self.f)()
    }
}

/// Adapt a closure into a value source.
///
/// The closure's result is returned unmodified.
///
/// ```
/// use lazyconf::{from_fn, ConfigError, ValueSource};
///
/// let home = from_fn(|| {
///     std::env::var("HOME").map_err(|e| ConfigError::other("env:HOME", e.to_string()))
/// });
/// # let _ = home.evaluate();
/// ```
pub fn from_fn<T, F>(f: F) -> FnSource<F>
where
    F: Fn() -> Result<T, ConfigError> + Send + Sync,
{
    FnSource { f }
}
