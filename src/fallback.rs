//! Fallback chains.
//!
//! [`FirstOf`] tries its sources strictly in order and returns the first
//! success; later sources are not evaluated. When every source fails the
//! chain fails with [`ConfigError::AllFailed`], keeping each child error in
//! the order it was attempted. An empty chain fails with
//! [`ConfigError::NoSources`].

use tracing::debug;

use crate::error::{ConfigError, ConfigErrors};
use crate::source::{BoxedSource, ValueSource, ValueSourceExt};

/// An ordered list of alternative sources.
pub struct FirstOf<T> {
    sources: Vec<BoxedSource<T>>,
}

impl<T> FirstOf<T> {
    /// Build a chain from boxed sources.
    pub fn new(sources: Vec<BoxedSource<T>>) -> Self {
        Self { sources }
    }

    /// Append another alternative to the end of the chain.
    pub fn or<S>(mut self, source: S) -> Self
    where
        S: ValueSource<T> + 'static,
    {
        self.sources.push(source.boxed());
        self
    }

    /// Number of alternatives.
    pub fn len(&self) -> usize {
        self.sources.len()
    }

    /// Check if the chain has no alternatives.
    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<T> std::fmt::Debug for FirstOf<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirstOf")
            .field("len", &self.sources.len())
            .finish()
    }
}

impl<T> ValueSource<T> for FirstOf<T> {
    fn evaluate(&self) -> Result<T, ConfigError> {
        let mut errors = Vec::with_capacity(self.sources.len());

        for source in &self.sources {
            match source.evaluate() {
                Ok(value) => return Ok(value),
                Err(error) => errors.push(error),
            }
        }

        match ConfigErrors::from_vec(errors) {
            Some(errors) => {
                debug!(attempted = errors.len(), "fallback chain exhausted");
                Err(ConfigError::AllFailed {
                    errors: Box::new(errors),
                })
            }
            None => Err(ConfigError::NoSources),
        }
    }
}

/// Build a fallback chain from boxed sources.
///
/// The [`first_of!`](crate::first_of!) macro boxes its arguments for you.
pub fn first_of<T>(sources: Vec<BoxedSource<T>>) -> FirstOf<T> {
    FirstOf::new(sources)
}

/// Build a [`FirstOf`] chain from any number of sources of the same type.
///
/// ```
/// use lazyconf::{first_of, from_fn, value, ConfigError, ValueSource};
///
/// let db = first_of![
///     from_fn(|| Err::<&str, _>(ConfigError::other("vault", "sealed"))),
///     value("fallback_db"),
/// ];
/// assert_eq!(db.evaluate().unwrap(), "fallback_db");
/// ```
#[macro_export]
macro_rules! first_of {
    ($($source:expr),* $(,)?) => {
        $crate::FirstOf::new(vec![$($crate::ValueSourceExt::boxed($source)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{from_fn, value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn failing(message: &'static str) -> impl ValueSource<String> {
        from_fn(move || Err::<String, _>(ConfigError::other("test", message)))
    }

    #[test]
    fn test_first_element_errors() {
        let source = crate::first_of![failing("test value error"), value("hello world".to_string())];
        assert_eq!(source.evaluate().unwrap(), "hello world");
    }

    #[test]
    fn test_short_circuits_after_success() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = crate::first_of![
            value("hello world".to_string()),
            from_fn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok("never".to_string())
            }),
        ];

        assert_eq!(source.evaluate().unwrap(), "hello world");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_all_fail_aggregates_in_order() {
        let source = crate::first_of![failing("A"), failing("B")];
        let err = source.evaluate().unwrap_err();

        let causes: Vec<String> = err
            .causes()
            .unwrap()
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(causes, vec!["test: A", "test: B"]);

        let message = err.to_string();
        assert!(message.contains("test: A"));
        assert!(message.contains("test: B"));
    }

    #[test]
    fn test_empty_chain_fails() {
        let source: FirstOf<String> = first_of(Vec::new());
        assert!(source.is_empty());
        assert!(matches!(source.evaluate(), Err(ConfigError::NoSources)));
    }

    #[test]
    fn test_or_appends() {
        let source = FirstOf::new(vec![failing("A").boxed()])
            .or(failing("B"))
            .or(value("C".to_string()));
        assert_eq!(source.len(), 3);
        assert_eq!(source.evaluate().unwrap(), "C");
    }

    #[test]
    fn test_nested_chain_error_is_preserved() {
        let inner = crate::first_of![failing("A")];
        let outer = crate::first_of![inner, failing("B")];
        let err = outer.evaluate().unwrap_err();
        let causes = err.causes().unwrap();
        assert!(matches!(causes.first(), ConfigError::AllFailed { .. }));
        assert_eq!(causes.len(), 2);
    }
}
