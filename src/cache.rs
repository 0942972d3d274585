//! Memoization of value sources.
//!
//! A [`ValueCache`] is an explicit store handed to [`Cached`] wrappers, never
//! a process global. Each wrapper owns a [`CacheKey`]: either a fresh opaque
//! token allocated at construction, or a name the caller chooses.
//!
//! # Concurrency
//!
//! The default store gives at-least-once materialization: two threads that
//! miss the same key at the same time may both run the inner computation,
//! and the last successful store wins. A store built with
//! [`ValueCache::single_flight`] serializes misses per key, so a successful
//! computation runs exactly once. Failures are never stored.
//!
//! Per-key gates are not re-entrant: in a single-flight cache, a computation
//! must not evaluate another wrapper bound to its own key, or it deadlocks.

use std::any::{type_name, Any};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::Mutex;
use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::source::ValueSource;

type Slot = Arc<dyn Any + Send + Sync>;

/// Identifies one memoized slot inside a [`ValueCache`].
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A caller-chosen name, shared by every wrapper that uses it
    Named(Arc<str>),
    /// An opaque token, unique within the cache that issued it
    Token(u64),
}

impl CacheKey {
    /// Create a named key.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        CacheKey::Named(name.into())
    }
}

impl From<&str> for CacheKey {
    fn from(name: &str) -> Self {
        CacheKey::named(name)
    }
}

impl From<String> for CacheKey {
    fn from(name: String) -> Self {
        CacheKey::named(name)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Named(name) => write!(f, "'{}'", name),
            CacheKey::Token(token) => write!(f, "#{}", token),
        }
    }
}

/// Concurrent store of memoized values.
///
/// Entries live as long as the cache; there is no eviction.
pub struct ValueCache {
    entries: DashMap<CacheKey, Slot>,
    in_flight: Option<DashMap<CacheKey, Arc<Mutex<()>>>>,
    next_token: AtomicU64,
}

impl Default for ValueCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueCache {
    /// Create a cache with last-write-wins semantics on concurrent misses.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            in_flight: None,
            next_token: AtomicU64::new(0),
        }
    }

    /// Create a cache that runs a key's computation at most once per success.
    ///
    /// Concurrent callers missing the same key wait for the first one. A
    /// failed computation releases the waiters, who then retry in turn. The
    /// gate for a key is dropped once its value is stored.
    pub fn single_flight() -> Self {
        Self {
            in_flight: Some(DashMap::new()),
            ..Self::new()
        }
    }

    /// Whether misses are de-duplicated per key.
    pub fn is_single_flight(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Allocate a key no other wrapper on this cache will receive.
    pub fn allocate_key(&self) -> CacheKey {
        CacheKey::Token(self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    /// Number of stored values.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check if `key` holds a value.
    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.contains_key(key)
    }

    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `CacheTypeConflict` if the slot holds a value of another type.
    pub fn get<T>(&self, key: &CacheKey) -> Result<Option<T>, ConfigError>
    where
        T: Clone + Send + Sync + 'static,
    {
        // Clone the slot out so the shard lock is released before downcasting.
        let slot = self.entries.get(key).map(|entry| Arc::clone(entry.value()));
        match slot {
            None => Ok(None),
            Some(slot) => slot
                .downcast_ref::<T>()
                .cloned()
                .map(Some)
                .ok_or_else(|| ConfigError::CacheTypeConflict {
                    key: key.to_string(),
                    expected_type: type_name::<T>().to_string(),
                }),
        }
    }

    /// Store `value` under `key`, replacing any previous value.
    pub fn insert<T>(&self, key: CacheKey, value: T)
    where
        T: Send + Sync + 'static,
    {
        self.entries.insert(key, Arc::new(value));
    }

    /// Return the stored value for `key`, or compute and store it.
    ///
    /// `compute` runs without any cache lock held. Its error is returned
    /// as-is and leaves the slot empty.
    pub fn get_or_try_insert<T, F>(&self, key: &CacheKey, compute: F) -> Result<T, ConfigError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<T, ConfigError>,
    {
        if let Some(value) = self.get::<T>(key)? {
            trace!(key = %key, "cache hit");
            return Ok(value);
        }

        let Some(in_flight) = &self.in_flight else {
            return self.compute_and_store(key, compute);
        };

        let gate = Arc::clone(in_flight.entry(key.clone()).or_default().value());
        let _guard = gate.lock();

        // Another caller may have filled the slot while we waited.
        if let Some(value) = self.get::<T>(key)? {
            trace!(key = %key, "cache hit after wait");
            in_flight.remove(key);
            return Ok(value);
        }
        let value = self.compute_and_store(key, compute)?;
        in_flight.remove(key);
        Ok(value)
    }

    #[cfg(test)]
    fn pending_gates(&self) -> usize {
        self.in_flight.as_ref().map_or(0, DashMap::len)
    }

    fn compute_and_store<T, F>(&self, key: &CacheKey, compute: F) -> Result<T, ConfigError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Result<T, ConfigError>,
    {
        debug!(key = %key, "cache miss");
        match compute() {
            Ok(value) => {
                self.insert(key.clone(), value.clone());
                debug!(key = %key, "cached value stored");
                Ok(value)
            }
            Err(error) => {
                debug!(key = %key, %error, "cached computation failed, nothing stored");
                Err(error)
            }
        }
    }
}

impl fmt::Debug for ValueCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValueCache")
            .field("len", &self.len())
            .field("single_flight", &self.is_single_flight())
            .finish()
    }
}

/// A source whose successful result is memoized in a [`ValueCache`].
///
/// Clones share the same slot.
#[derive(Debug, Clone)]
pub struct Cached<S> {
    inner: S,
    cache: Arc<ValueCache>,
    key: CacheKey,
}

impl<S> Cached<S> {
    /// Wrap `inner` with a freshly allocated slot.
    pub fn new(inner: S, cache: &Arc<ValueCache>) -> Self {
        Self {
            key: cache.allocate_key(),
            inner,
            cache: Arc::clone(cache),
        }
    }

    /// Wrap `inner` with a caller-chosen slot.
    ///
    /// With a single-flight cache, `inner` must not evaluate another
    /// wrapper using the same key.
    pub fn with_key(inner: S, cache: &Arc<ValueCache>, key: impl Into<CacheKey>) -> Self {
        Self {
            inner,
            cache: Arc::clone(cache),
            key: key.into(),
        }
    }

    /// The slot this wrapper reads and fills.
    pub fn key(&self) -> &CacheKey {
        &self.key
    }
}

impl<T, S> ValueSource<T> for Cached<S>
where
    S: ValueSource<T>,
    T: Clone + Send + Sync + 'static,
{
    fn evaluate(&self) -> Result<T, ConfigError> {
        self.cache
            .get_or_try_insert(&self.key, || self.inner.evaluate())
    }
}

/// Memoize `source` in `cache` under a fresh slot.
pub fn cached<S>(source: S, cache: &Arc<ValueCache>) -> Cached<S> {
    Cached::new(source, cache)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::{from_fn, value};
    use std::sync::atomic::AtomicUsize;

    fn counting(calls: &Arc<AtomicUsize>, result: &'static str) -> impl ValueSource<String> + Clone {
        let calls = Arc::clone(calls);
        from_fn(move || {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(result.to_string())
        })
    }

    #[test]
    fn test_hit_skips_inner() {
        let cache = Arc::new(ValueCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let source = cached(counting(&calls, "hello universe"), &cache);

        assert_eq!(source.evaluate().unwrap(), "hello universe");
        assert_eq!(source.evaluate().unwrap(), "hello universe");
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.contains(source.key()));
    }

    #[test]
    fn test_failure_is_not_cached() {
        let cache = Arc::new(ValueCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = cached(
            from_fn(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                if n == 0 {
                    Err(ConfigError::other("flaky", "first call fails"))
                } else {
                    Ok(n)
                }
            }),
            &cache,
        );

        assert!(source.evaluate().is_err());
        assert!(cache.is_empty());
        assert_eq!(source.evaluate().unwrap(), 1);
        assert_eq!(source.evaluate().unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_distinct_wrappers_never_collide() {
        let cache = Arc::new(ValueCache::new());
        let a = cached(value("a".to_string()), &cache);
        let b = cached(value("b".to_string()), &cache);

        assert_ne!(a.key(), b.key());
        assert_eq!(a.evaluate().unwrap(), "a");
        assert_eq!(b.evaluate().unwrap(), "b");
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_clones_share_slot() {
        let cache = Arc::new(ValueCache::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let source = cached(counting(&calls, "x"), &cache);
        let clone = source.clone();

        source.evaluate().unwrap();
        clone.evaluate().unwrap();
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_named_keys_are_shared() {
        let cache = Arc::new(ValueCache::new());
        let first = Cached::with_key(value(1u32), &cache, "db.pool_size");
        let second = Cached::with_key(value(2u32), &cache, "db.pool_size");

        assert_eq!(first.evaluate().unwrap(), 1);
        assert_eq!(second.evaluate().unwrap(), 1);
    }

    #[test]
    fn test_named_key_type_conflict() {
        let cache = Arc::new(ValueCache::new());
        Cached::with_key(value(1u32), &cache, "slot").evaluate().unwrap();

        let err = Cached::with_key(value("text".to_string()), &cache, "slot")
            .evaluate()
            .unwrap_err();
        assert!(matches!(err, ConfigError::CacheTypeConflict { .. }));
        assert!(err.to_string().contains("'slot'"));
    }

    #[test]
    fn test_independent_caches_are_isolated() {
        let first = Arc::new(ValueCache::new());
        let second = Arc::new(ValueCache::new());
        Cached::with_key(value(1u32), &first, "shared").evaluate().unwrap();

        assert!(second.is_empty());
        assert_eq!(
            Cached::with_key(value(2u32), &second, "shared")
                .evaluate()
                .unwrap(),
            2
        );
    }

    #[test]
    fn test_single_flight_runs_once_under_contention() {
        let cache = Arc::new(ValueCache::single_flight());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = Arc::new(cached(
            from_fn(move || {
                counter.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(50));
                Ok(42u64)
            }),
            &cache,
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let source = Arc::clone(&source);
                std::thread::spawn(move || source.evaluate().unwrap())
            })
            .collect();

        for handle in handles {
            assert_eq!(handle.join().unwrap(), 42);
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.pending_gates(), 0);
    }

    #[test]
    fn test_single_flight_failure_is_retried_by_waiter() {
        let cache = Arc::new(ValueCache::single_flight());
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let source = Arc::new(cached(
            from_fn(move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                std::thread::sleep(std::time::Duration::from_millis(30));
                if n == 0 {
                    Err(ConfigError::other("flaky", "first call fails"))
                } else {
                    Ok(n)
                }
            }),
            &cache,
        ));

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let source = Arc::clone(&source);
                std::thread::spawn(move || source.evaluate())
            })
            .collect();
        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(results.iter().filter(|r| r.is_err()).count(), 1);
        assert!(results.iter().filter_map(|r| r.as_ref().ok()).all(|v| *v == 1));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.len(), 1);

        assert_eq!(source.evaluate().unwrap(), 1);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(cache.pending_gates(), 0);
    }

    #[test]
    fn test_single_flight_failure_alone_stores_nothing() {
        let cache = Arc::new(ValueCache::single_flight());
        let source = cached(
            from_fn(|| Err::<u32, _>(ConfigError::other("vault", "sealed"))),
            &cache,
        );

        assert!(source.evaluate().is_err());
        assert!(source.evaluate().is_err());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_single_flight_drops_gate_after_store() {
        let cache = Arc::new(ValueCache::single_flight());
        for i in 0..10u32 {
            cached(value(i), &cache).evaluate().unwrap();
        }
        assert_eq!(cache.len(), 10);
        assert_eq!(cache.pending_gates(), 0);
    }

    #[test]
    fn test_cache_key_display() {
        assert_eq!(CacheKey::named("db").to_string(), "'db'");
        assert_eq!(CacheKey::Token(3).to_string(), "#3");
    }
}
