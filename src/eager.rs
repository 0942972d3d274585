//! Eager evaluation.
//!
//! Sources are lazy by default. [`Eager`] runs its inner source once, at
//! construction, and replays the captured outcome afterwards. The caller
//! building it blocks for as long as the computation takes.

use std::time::Instant;

use tracing::debug;

use crate::error::ConfigError;
use crate::source::ValueSource;

/// A source holding the outcome of a computation that already ran.
#[derive(Debug, Clone)]
pub struct Eager<T> {
    outcome: Result<T, ConfigError>,
}

impl<T> Eager<T> {
    /// Evaluate `source` immediately and capture the result or the error.
    pub fn new<S: ValueSource<T>>(source: S) -> Self {
        let started = Instant::now();
        let outcome = source.evaluate();
        debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            ok = outcome.is_ok(),
            "eager source evaluated"
        );
        Self { outcome }
    }

    /// Wrap an outcome computed elsewhere.
    pub fn from_result(outcome: Result<T, ConfigError>) -> Self {
        Self { outcome }
    }

    /// The captured outcome.
    pub fn outcome(&self) -> &Result<T, ConfigError> {
        &self.outcome
    }
}

impl<T: Clone + Send + Sync> ValueSource<T> for Eager<T> {
    fn evaluate(&self) -> Result<T, ConfigError> {
        self.outcome.clone()
    }
}

/// Evaluate `source` now; see [`Eager`].
pub fn eager<T, S: ValueSource<T>>(source: S) -> Eager<T> {
    Eager::new(source)
}
