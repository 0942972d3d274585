//! Convenient re-exports for common lazyconf usage.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use lazyconf::env::MockEnv;
//! use lazyconf::prelude::*;
//!
//! struct AppConfig {
//!     environment: RegisteredTag<Env>,
//!     database_name: FirstOf<&'static str>,
//!     slow_message: Cached<FnSource<fn() -> Result<String, ConfigError>>>,
//! }
//!
//! fn slow() -> Result<String, ConfigError> {
//!     std::thread::sleep(Duration::from_millis(10));
//!     Ok("hello universe".to_string())
//! }
//!
//! let ctx = ConfigContext::with_env(Arc::new(MockEnv::new().with_env("my_env", "staging")));
//! let config = AppConfig {
//!     environment: ctx.register_tag("environment", ctx.env_var("my_env")),
//!     database_name: first_of![
//!         ctx.tag("environment", "dev", value("my_dev_db")),
//!         ctx.tag("environment", "staging", value("my_staging_db")),
//!     ],
//!     slow_message: ctx.cached(from_fn(slow as fn() -> Result<String, ConfigError>)),
//! };
//!
//! assert_eq!(config.environment.must(), "staging");
//! assert_eq!(config.database_name.must(), "my_staging_db");
//! assert_eq!(config.slow_message.must(), "hello universe");
//! ```

// ============================================================================
// Core abstraction
// ============================================================================

/// The deferred, possibly-failing computation everything else composes.
pub use crate::source::ValueSource;

/// Fluent combinators (`or`, `cached`, `eager`, `tagged`, `parse`, `typed`).
pub use crate::source::{BoxedSource, Mapped, ValueSourceExt};

// ============================================================================
// Error types
// ============================================================================

/// A single evaluation failure.
pub use crate::error::ConfigError;

/// Non-empty, ordered collection of errors; the cause list of a failed chain.
pub use crate::error::ConfigErrors;

/// Detail of a leaf failure.
pub use crate::error::SourceErrorKind;

/// Trait for combining error lists. `ConfigErrors` implements it.
pub use stillwater::Semigroup;

// ============================================================================
// Leaves
// ============================================================================

pub use crate::sources::{from_fn, value, Env, FnSource, Json, Literal};

#[cfg(feature = "toml")]
pub use crate::sources::Toml;

/// Untyped values produced by document sources.
pub use crate::value::Value;

// ============================================================================
// Combinators and shared state
// ============================================================================

pub use crate::cache::{cached, CacheKey, Cached, ValueCache};
pub use crate::context::{ConfigContext, ConfigContextBuilder};
pub use crate::eager::{eager, Eager};
pub use crate::fallback::FirstOf;
pub use crate::tag::{register_tag, tag, try_register_tag, RegisteredTag, TagRegistry, Tagged};
pub use crate::typed::{assert_type, type_of, Parsed, TypeOf};

/// `first_of` the function and `first_of!` the macro.
pub use crate::first_of;

// ============================================================================
// Testing
// ============================================================================

/// Environment abstraction and its in-memory test double.
pub use crate::env::{ConfigEnv, MockEnv, RealEnv};
