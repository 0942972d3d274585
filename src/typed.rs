//! Typed projection of untyped and textual values.
//!
//! Structured documents yield untyped [`Value`]s. [`TypeOf`] checks one
//! against a concrete Rust type by deserializing the value directly, and
//! [`Parsed`] turns textual values (environment variables) into typed ones
//! with `FromStr`.

use std::any::type_name;
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;

use serde::de::DeserializeOwned;

use crate::error::ConfigError;
use crate::source::ValueSource;
use crate::value::Value;

/// Check an untyped value against `T`.
///
/// # Errors
///
/// Returns `TypeMismatch` naming the expected Rust type and the actual
/// value type.
pub fn project<T: DeserializeOwned>(value: &Value) -> Result<T, ConfigError> {
    T::deserialize(value.clone()).map_err(|e| ConfigError::TypeMismatch {
        expected: type_name::<T>().to_string(),
        actual: value.type_name().to_string(),
        message: e.to_string(),
    })
}

/// An untyped source viewed as a source of `T`.
pub struct TypeOf<S, T> {
    inner: S,
    _marker: PhantomData<fn() -> T>,
}

impl<S, T> TypeOf<S, T> {
    /// Wrap an untyped source.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }
}

impl<S: Clone, T> Clone for TypeOf<S, T> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone())
    }
}

impl<S: fmt::Debug, T> fmt::Debug for TypeOf<S, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeOf")
            .field("inner", &self.inner)
            .field("target", &type_name::<T>())
            .finish()
    }
}

impl<S, T> ValueSource<T> for TypeOf<S, T>
where
    S: ValueSource<Value>,
    T: DeserializeOwned,
{
    fn evaluate(&self) -> Result<T, ConfigError> {
        let value = self.inner.evaluate()?;
        project(&value)
    }
}

/// View an untyped source as a source of `T`.
///
/// ```
/// use lazyconf::{type_of, value, Value, ValueSource};
///
/// assert_eq!(type_of::<i64, _>(value(Value::from(123))).evaluate().unwrap(), 123);
/// assert!(type_of::<String, _>(value(Value::from(123))).evaluate().is_err());
/// ```
pub fn type_of<T, S>(source: S) -> TypeOf<S, T>
where
    S: ValueSource<Value>,
    T: DeserializeOwned,
{
    TypeOf::new(source)
}

/// Evaluate an untyped source as `T`, aborting if that is impossible.
///
/// # Panics
///
/// Panics if the source fails or its value is not a `T`.
pub fn assert_type<T, S>(source: S) -> T
where
    S: ValueSource<Value>,
    T: DeserializeOwned,
{
    type_of::<T, S>(source).must()
}

/// A textual source parsed into `U` with `FromStr`.
pub struct Parsed<S, U> {
    inner: S,
    name: String,
    _marker: PhantomData<fn() -> U>,
}

impl<S, U> Parsed<S, U> {
    /// Wrap a textual source.
    pub fn new(inner: S) -> Self {
        Self {
            inner,
            name: "value".to_string(),
            _marker: PhantomData,
        }
    }

    /// Set the name used in parse errors.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

impl<S: Clone, U> Clone for Parsed<S, U> {
    fn clone(&self) -> Self {
        Self::new(self.inner.clone()).named(self.name.clone())
    }
}

impl<S: fmt::Debug, U> fmt::Debug for Parsed<S, U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parsed")
            .field("inner", &self.inner)
            .field("name", &self.name)
            .field("target", &type_name::<U>())
            .finish()
    }
}

impl<S, U> ValueSource<U> for Parsed<S, U>
where
    S: ValueSource<String>,
    U: FromStr,
    U::Err: fmt::Display,
{
    fn evaluate(&self) -> Result<U, ConfigError> {
        let raw = self.inner.evaluate()?;
        raw.parse::<U>().map_err(|e| ConfigError::ParseError {
            source_name: self.name.clone(),
            expected_type: type_name::<U>().to_string(),
            actual_value: raw.clone(),
            message: e.to_string(),
        })
    }
}
