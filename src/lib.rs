//! Lazyconf: composable, lazily-evaluated configuration values.
//!
//! A configuration field is a [`ValueSource`]: a deferred computation that
//! yields a value or a [`ConfigError`]. Small leaves (literals, closures,
//! environment variables, documents) are wrapped by combinators to build
//! each field's final source.
//!
//! # Core Concepts
//!
//! - **Laziness**: nothing runs until `evaluate()` is called, and plain
//!   sources rerun their computation every time
//! - **Fallback**: [`FirstOf`] returns the first success and aggregates every
//!   failure when all alternatives fail
//! - **Memoization**: [`Cached`] stores successful results in an explicit
//!   [`ValueCache`]; failures are retried
//! - **Eager capture**: [`Eager`] runs its source once, at construction
//! - **Tag gating**: [`Tagged`] sources only succeed when a registered tag
//!   (e.g. the deployment environment) holds an expected value
//! - **Typed projection**: [`TypeOf`] checks untyped document values
//!   against Rust types
//!
//! # Quick Start
//!
//! ```
//! use lazyconf::prelude::*;
//!
//! let ctx = ConfigContext::new();
//! ctx.register_tag("environment", value("staging".to_string()));
//!
//! let database = first_of![
//!     ctx.tag("environment", "prod", value("prod_db")),
//!     ctx.tag("environment", "staging", value("staging_db")),
//! ];
//! let pool_size = from_fn(|| Ok(16u32)).cached(ctx.cache());
//!
//! assert_eq!(database.must(), "staging_db");
//! assert_eq!(pool_size.evaluate().unwrap(), 16);
//! ```
//!
//! # Recoverable and fatal access
//!
//! [`ValueSource::evaluate`] returns a `Result` the caller may retry, fall
//! back from or degrade on. [`ValueSource::must`], [`assert_type`] and
//! [`register_tag`] abort with a panic instead; each has a recoverable
//! counterpart (`evaluate`, [`type_of`], [`try_register_tag`]).
//!
//! # Shared state
//!
//! The memoization cache and the tag registry are explicit objects, usually
//! reached through a [`ConfigContext`]. Independent contexts never share
//! cached values or tags, which keeps tests isolated.
//!
//! # Module Structure
//!
//! - [`prelude`]: Convenient re-exports for common usage
//! - [`source`]: `ValueSource` trait and `ValueSourceExt` combinators
//! - [`sources`]: Leaves: `value`, `from_fn`, `Env`, `Json`, `Toml`
//! - [`fallback`]: `FirstOf` chains and the `first_of!` macro
//! - [`cache`]: `ValueCache`, `CacheKey` and `Cached`
//! - [`eager`]: `Eager`
//! - [`tag`]: `TagRegistry`, `register_tag` and `Tagged`
//! - [`typed`]: `TypeOf`, `assert_type` and `Parsed`
//! - [`context`]: `ConfigContext`
//! - [`mod@env`]: `ConfigEnv` trait and `MockEnv` for testing
//! - [`error`]: `ConfigError`, `ConfigErrors`
//! - [`value`]: `Value` enum for untyped data

pub mod cache;
pub mod context;
pub mod eager;
pub mod env;
pub mod error;
pub mod fallback;
pub mod prelude;
pub mod source;
pub mod sources;
pub mod tag;
pub mod typed;
pub mod value;

// Re-exports for convenience
pub use cache::{cached, CacheKey, Cached, ValueCache};
pub use context::{ConfigContext, ConfigContextBuilder};
pub use eager::{eager, Eager};
pub use env::{ConfigEnv, MockEnv, RealEnv};
pub use error::{ConfigError, ConfigErrors, SourceErrorKind};
pub use fallback::{first_of, FirstOf};
pub use source::{BoxedSource, Mapped, ValueSource, ValueSourceExt};
pub use tag::{register_tag, tag, try_register_tag, RegisteredTag, TagRegistry, Tagged};
pub use typed::{assert_type, project, type_of, Parsed, TypeOf};
pub use value::Value;

// Re-export sources
pub use sources::{from_fn, value, Env, FnSource, Json, Literal};
#[cfg(feature = "toml")]
pub use sources::Toml;

// Re-export stillwater types used by the error API
pub use stillwater::{NonEmptyVec, Semigroup};
