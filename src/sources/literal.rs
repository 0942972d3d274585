//! Constant sources.

use crate::error::ConfigError;
use crate::source::ValueSource;

/// A source that always succeeds with the same value.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal<T> {
    value: T,
}

impl<T> Literal<T> {
    /// Wrap a fixed value.
    pub fn new(value: T) -> Self {
        Self { value }
    }

    /// The value this literal yields.
    pub fn get(&self) -> &T {
        &self.value
    }
}

impl<T: Clone + Send + Sync> ValueSource<T> for Literal<T> {
    fn evaluate(&self) -> Result<T, ConfigError> {
        Ok(self.value.clone())
    }
}

/// Create a source that always yields `v`.
///
/// ```
/// use lazyconf::{value, ValueSource};
///
/// assert_eq!(value("my_dev_db").evaluate().unwrap(), "my_dev_db");
/// ```
pub fn value<T: Clone + Send + Sync>(v: T) -> Literal<T> {
    Literal::new(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_literal_is_stable() {
        let source = value(String::from("hello world"));
        for _ in 0..3 {
            assert_eq!(source.evaluate().unwrap(), "hello world");
        }
        assert_eq!(source.get(), "hello world");
    }

    #[derive(Debug, Clone, PartialEq, Default)]
    struct Endpoint {
        host: String,
        port: u16,
    }

    #[test]
    fn test_literal_of_struct() {
        let endpoint = Endpoint {
            host: "localhost".to_string(),
            port: 8080,
        };
        assert_eq!(value(endpoint.clone()).evaluate().unwrap(), endpoint);
        assert_eq!(value(Some(3)).evaluate().unwrap(), Some(3));
    }
}
