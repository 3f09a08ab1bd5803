//! TTL cache for slowly-changing reference lists.
//!
//! Bounded LRU with per-entry expiry. Concurrent get/insert are safe; there
//! is no cross-key coordination because none is needed - entries are
//! independent.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry<V> {
    value: V,
    expires_at: Instant,
}

pub struct TtlCache<V> {
    inner: Mutex<LruCache<String, Entry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity.max(1)).expect("capacity >= 1");
        Self {
            inner: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Fresh value for the key, if present. Expired entries count as misses
    /// and are evicted on access.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut cache = self.inner.lock().expect("cache lock poisoned");
        match cache.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Some(entry.value.clone()),
            Some(_) => {
                cache.pop(key);
                None
            }
            None => None,
        }
    }

    pub fn insert(&self, key: impl Into<String>, value: V, ttl: Duration) {
        let mut cache = self.inner.lock().expect("cache lock poisoned");
        cache.put(
            key.into(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.inner.lock().expect("cache lock poisoned").len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_hit_within_ttl() {
        let cache = TtlCache::new(8);
        cache.insert("suppliers", "liste".to_string(), Duration::from_secs(60));
        assert_eq!(cache.get("suppliers"), Some("liste".to_string()));
    }

    #[test]
    fn test_expired_entry_is_miss() {
        let cache = TtlCache::new(8);
        cache.insert("suppliers", "liste".to_string(), Duration::from_secs(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("suppliers"), None);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_capacity_bounded() {
        let cache = TtlCache::new(2);
        cache.insert("a", 1u32, Duration::from_secs(60));
        cache.insert("b", 2u32, Duration::from_secs(60));
        cache.insert("c", 3u32, Duration::from_secs(60));
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.get("a"), None);
    }

    #[test]
    fn test_concurrent_access() {
        let cache = Arc::new(TtlCache::new(64));
        let mut handles = Vec::new();
        for t in 0..4 {
            let cache = Arc::clone(&cache);
            handles.push(std::thread::spawn(move || {
                for i in 0..100 {
                    let key = format!("k{}", i % 8);
                    cache.insert(key.clone(), t * 1000 + i, Duration::from_secs(60));
                    let _ = cache.get(&key);
                }
            }));
        }
        for h in handles {
            h.join().expect("worker panicked");
        }
    }
}
