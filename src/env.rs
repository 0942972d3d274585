//! ConfigEnv trait for testable I/O.
//!
//! Leaf sources never touch `std::env` or `std::fs` directly. They go through
//! a shared `ConfigEnv`, so tests can swap in [`MockEnv`] and independent
//! contexts can see different environments.

use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::RwLock;

/// Environment trait for leaf source I/O.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use lazyconf::env::MockEnv;
/// use lazyconf::{ConfigContext, ValueSource};
///
/// let env = MockEnv::new().with_env("APP_ENV", "staging");
/// let ctx = ConfigContext::with_env(Arc::new(env));
///
/// assert_eq!(ctx.env_var("APP_ENV").evaluate().unwrap(), "staging");
/// ```
pub trait ConfigEnv: Send + Sync {
    /// Read a file's contents as a UTF-8 string.
    ///
    /// # Errors
    ///
    /// Returns `io::Error` if:
    /// - File does not exist (`ErrorKind::NotFound`)
    /// - File is not valid UTF-8
    /// - Permission denied
    /// - Other I/O errors
    fn read_file(&self, path: &Path) -> io::Result<String>;

    /// Get an environment variable by name.
    ///
    /// Returns `None` if the variable is not set.
    fn get_env(&self, name: &str) -> Option<String>;
}

impl<E: ConfigEnv + ?Sized> ConfigEnv for Arc<E> {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        (**self).read_file(path)
    }

    fn get_env(&self, name: &str) -> Option<String> {
        (**self).get_env(name)
    }
}

/// Production environment using standard library I/O.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealEnv;

impl RealEnv {
    /// Create a new real environment.
    pub fn new() -> Self {
        Self
    }
}

impl ConfigEnv for RealEnv {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn get_env(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

/// Mock file state for testing.
#[derive(Debug, Clone)]
enum MockFile {
    Content(String),
    NotFound,
    PermissionDenied,
}

/// Mock environment for testing value sources.
///
/// All mutators take `&self`, so a `MockEnv` shared behind an `Arc` can be
/// changed while sources built on it are alive.
///
/// # Example
///
/// ```
/// use lazyconf::env::MockEnv;
///
/// let env = MockEnv::new()
///     .with_file("config.json", r#"{"database": {"host": "localhost"}}"#)
///     .with_env("APP_DATABASE_HOST", "prod-db.example.com")
///     .with_env("APP_LOG_LEVEL", "debug");
/// ```
#[derive(Debug, Default)]
pub struct MockEnv {
    files: RwLock<HashMap<PathBuf, MockFile>>,
    env_vars: RwLock<HashMap<String, String>>,
}

impl MockEnv {
    /// Create a new empty mock environment.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a file with content.
    pub fn with_file(self, path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        self.set_file(path, content);
        self
    }

    /// Add a file that will return "not found" error.
    pub fn with_missing_file(self, path: impl Into<PathBuf>) -> Self {
        self.files.write().insert(path.into(), MockFile::NotFound);
        self
    }

    /// Add a file that will return "permission denied" error.
    pub fn with_unreadable_file(self, path: impl Into<PathBuf>) -> Self {
        self.files
            .write()
            .insert(path.into(), MockFile::PermissionDenied);
        self
    }

    /// Set an environment variable.
    pub fn with_env(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_env(name, value);
        self
    }

    /// Set multiple environment variables from an iterator.
    pub fn with_envs<I, K, V>(self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut env_vars = self.env_vars.write();
        for (k, v) in vars {
            env_vars.insert(k.into(), v.into());
        }
        drop(env_vars);
        self
    }

    /// Replace a file's content after creation.
    pub fn set_file(&self, path: impl Into<PathBuf>, content: impl Into<String>) {
        self.files
            .write()
            .insert(path.into(), MockFile::Content(content.into()));
    }

    /// Remove a file from the mock environment.
    pub fn remove_file(&self, path: impl AsRef<Path>) {
        self.files.write().remove(path.as_ref());
    }

    /// Update an environment variable.
    pub fn set_env(&self, name: impl Into<String>, value: impl Into<String>) {
        self.env_vars.write().insert(name.into(), value.into());
    }

    /// Remove an environment variable.
    pub fn remove_env(&self, name: &str) {
        self.env_vars.write().remove(name);
    }
}

impl ConfigEnv for MockEnv {
    fn read_file(&self, path: &Path) -> io::Result<String> {
        let files = self.files.read();

        match files.get(path) {
            Some(MockFile::Content(content)) => Ok(content.clone()),
            Some(MockFile::NotFound) | None => Err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("mock file not found: {}", path.display()),
            )),
            Some(MockFile::PermissionDenied) => Err(io::Error::new(
                io::ErrorKind::PermissionDenied,
                format!("mock permission denied: {}", path.display()),
            )),
        }
    }

    fn get_env(&self, name: &str) -> Option<String> {
        self.env_vars.read().get(name).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_real_env_reads_manifest() {
        let env = RealEnv::new();
        // Cargo.toml should exist in the project root
        let content = env.read_file(Path::new("Cargo.toml")).unwrap();
        assert!(content.contains("lazyconf"));
        assert!(env.read_file(Path::new("nonexistent.toml")).is_err());
    }

    #[test]
    fn test_mock_env_files() {
        let env = MockEnv::new()
            .with_file("config.json", "{}")
            .with_file("other.toml", "port = 8080");

        assert_eq!(env.read_file(Path::new("config.json")).unwrap(), "{}");
        assert_eq!(
            env.read_file(Path::new("other.toml")).unwrap(),
            "port = 8080"
        );
    }

    #[test]
    fn test_mock_env_missing_file() {
        let env = MockEnv::new().with_missing_file("gone.toml");

        let result = env.read_file(Path::new("gone.toml"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);

        let result = env.read_file(Path::new("never-added.toml"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_mock_env_permission_denied() {
        let env = MockEnv::new().with_unreadable_file("secret.toml");

        let result = env.read_file(Path::new("secret.toml"));
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::PermissionDenied);
    }

    #[test]
    fn test_mock_env_vars() {
        let env = MockEnv::new()
            .with_env("APP_HOST", "localhost")
            .with_envs([("APP_PORT", "8080"), ("OTHER_VAR", "value")]);

        assert_eq!(env.get_env("APP_HOST"), Some("localhost".to_string()));
        assert_eq!(env.get_env("APP_PORT"), Some("8080".to_string()));
        assert_eq!(env.get_env("OTHER_VAR"), Some("value".to_string()));
        assert_eq!(env.get_env("MISSING"), None);
    }

    #[test]
    fn test_mock_env_mutations() {
        let env = MockEnv::new()
            .with_file("config.toml", "original")
            .with_env("VAR", "original");

        env.set_file("config.toml", "modified");
        assert_eq!(env.read_file(Path::new("config.toml")).unwrap(), "modified");

        env.set_env("VAR", "modified");
        assert_eq!(env.get_env("VAR"), Some("modified".to_string()));

        env.remove_file("config.toml");
        assert!(env.read_file(Path::new("config.toml")).is_err());

        env.remove_env("VAR");
        assert_eq!(env.get_env("VAR"), None);
    }

    #[test]
    fn test_arc_env_forwards() {
        let env: Arc<dyn ConfigEnv> = Arc::new(MockEnv::new().with_env("A", "1"));
        assert_eq!(env.get_env("A"), Some("1".to_string()));
    }
}
