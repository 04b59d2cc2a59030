//! In-memory TTL cache shared by the pipeline stages.
//!
//! Entries expire a fixed duration after insertion and are evicted lazily
//! on access. The cache is cheap to clone and safe to share across tasks;
//! concurrent refreshes of the same key may race, in which case the last
//! writer wins.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

struct CacheEntry<V> {
    value: V,
    stored_at: Instant,
}

/// A thread-safe map whose entries expire after a fixed TTL.
pub struct TtlCache<K, V> {
    entries: Arc<RwLock<HashMap<K, CacheEntry<V>>>>,
    ttl: Duration,
}

impl<K, V> Clone for TtlCache<K, V> {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            ttl: self.ttl,
        }
    }
}

impl<K, V> TtlCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    /// Create an empty cache whose entries live for `ttl`.
    ///
    /// A zero TTL makes every entry expire immediately, effectively
    /// disabling the cache.
    #[must_use]
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    /// Look up a live entry, evicting it first if it has expired.
    pub fn get(&self, key: &K) -> Option<V> {
        {
            let entries = self.entries.read().expect("acquire read lock on cache");
            match entries.get(key) {
                Some(entry) if entry.stored_at.elapsed() < self.ttl => {
                    return Some(entry.value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Entry was present but stale; evict it. Re-check under the write
        // lock since another task may have refreshed it in between.
        let mut entries = self.entries.write().expect("acquire write lock on cache");
        if let Some(entry) = entries.get(key) {
            if entry.stored_at.elapsed() < self.ttl {
                return Some(entry.value.clone());
            }
            entries.remove(key);
        }
        None
    }

    /// Insert or replace an entry, restarting its TTL.
    pub fn insert(&self, key: K, value: V) {
        let mut entries = self.entries.write().expect("acquire write lock on cache");
        entries.insert(
            key,
            CacheEntry {
                value,
                stored_at: Instant::now(),
            },
        );
    }

    /// Remove an entry, returning its value if it was present (live or not).
    pub fn remove(&self, key: &K) -> Option<V> {
        let mut entries = self.entries.write().expect("acquire write lock on cache");
        entries.remove(key).map(|entry| entry.value)
    }

    /// Number of stored entries, counting stale ones not yet evicted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .expect("acquire read lock on cache")
            .len()
    }

    /// Whether the cache holds no entries at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached value for `key`, or run `refresh` to produce one
    /// and cache it. The lock is not held while `refresh` runs, so two
    /// tasks may refresh concurrently; both get a consistent value and the
    /// later insert wins.
    pub async fn get_or_refresh<F, Fut, E>(&self, key: K, refresh: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }

        tracing::debug!("Cache miss, refreshing entry");
        let value = refresh().await?;
        self.insert(key, value.clone());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_insert_and_get() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"b".to_string()), None);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_expired_entries_are_evicted() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(20));
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), Some(1));

        std::thread::sleep(Duration::from_millis(30));
        assert_eq!(cache.get(&"a".to_string()), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_zero_ttl_disables_cache() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::ZERO);
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[test]
    fn test_insert_restarts_ttl() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(40));
        cache.insert("a".to_string(), 1);
        std::thread::sleep(Duration::from_millis(25));
        cache.insert("a".to_string(), 2);
        std::thread::sleep(Duration::from_millis(25));
        assert_eq!(cache.get(&"a".to_string()), Some(2));
    }

    #[test]
    fn test_remove() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        cache.insert("a".to_string(), 1);
        assert_eq!(cache.remove(&"a".to_string()), Some(1));
        assert_eq!(cache.get(&"a".to_string()), None);
    }

    #[tokio::test]
    async fn test_get_or_refresh_caches_value() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..3 {
            let value: Result<u32, String> = cache
                .get_or_refresh("token".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await;
            assert_eq!(value, Ok(42));
        }

        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_get_or_refresh_propagates_errors_without_caching() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_secs(60));
        let calls = AtomicUsize::new(0);

        for _ in 0..2 {
            let value: Result<u32, String> = cache
                .get_or_refresh("token".to_string(), || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Err("boom".to_string())
                })
                .await;
            assert_eq!(value, Err("boom".to_string()));
        }

        // Failures are not cached, so every call re-runs the refresh
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_get_or_refresh_reuses_after_expiry() {
        let cache: TtlCache<String, u32> = TtlCache::new(Duration::from_millis(20));
        let calls = AtomicUsize::new(0);

        let refresh = || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok::<u32, String>(7)
        };

        cache.get_or_refresh("k".to_string(), refresh).await.unwrap();
        std::thread::sleep(Duration::from_millis(30));
        cache.get_or_refresh("k".to_string(), refresh).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }
}
