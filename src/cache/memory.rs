use async_trait::async_trait;
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::CacheBackend;

/// In-process LRU backend.
///
/// `LruCache::get` needs `&mut` to update recency, so reads and writes share one
/// mutex. The lock is never held across an await point.
pub struct MemoryCache {
    entries: Mutex<LruCache<String, String>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MemoryCache {
    /// A capacity of zero is raised to one.
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    /// `(hits, misses)` since creation
    pub fn stats(&self) -> (u64, u64) {
        (
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
        )
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>> {
        let value = self.lock().get(key).cloned();
        let counter = if value.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        Ok(value)
    }

    async fn set(&self, key: &str, value: String) -> anyhow::Result<()> {
        self.lock().put(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> anyhow::Result<()> {
        self.lock().pop(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_remove() {
        let cache = MemoryCache::new(8);
        assert_eq!(cache.get("a").await.unwrap(), None);
        cache.set("a", "1".to_string()).await.unwrap();
        assert_eq!(cache.get("a").await.unwrap().as_deref(), Some("1"));
        cache.remove("a").await.unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.stats(), (1, 1));
    }

    #[tokio::test]
    async fn test_evicts_least_recently_used() {
        let cache = MemoryCache::new(2);
        cache.set("a", "1".to_string()).await.unwrap();
        cache.set("b", "2".to_string()).await.unwrap();
        // touch `a` so `b` becomes the eviction candidate
        cache.get("a").await.unwrap();
        cache.set("c", "3".to_string()).await.unwrap();
        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").await.unwrap().is_none());
        assert!(cache.get("a").await.unwrap().is_some());
    }

    #[test]
    fn test_zero_capacity_is_raised() {
        assert_eq!(MemoryCache::new(0).capacity(), 1);
    }
}
