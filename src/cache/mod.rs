//! Expiring key/value caches.
//!
//! `TtlCache` is the seam; `MemoryCache` lives in process and
//! `crate::storage::SqliteCache` survives restarts.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

pub trait TtlCache<V>: Send + Sync {
    /// The stored value, unless it is missing or expired.
    fn get(&self, key: &str) -> anyhow::Result<Option<V>>;
    fn put(&self, key: &str, value: V, ttl: Duration) -> anyhow::Result<()>;
}

/// Bounded in-memory cache; least recently used entries go first when full.
pub struct MemoryCache<V> {
    entries: Mutex<LruCache<String, (V, Instant)>>,
}

impl<V> MemoryCache<V> {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl<V: Clone + Send> TtlCache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> anyhow::Result<Option<V>> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        let Some((value, expires_at)) = entries.get(key) else {
            return Ok(None);
        };
        if Instant::now() < *expires_at {
            return Ok(Some(value.clone()));
        }
        entries.pop(key);
        Ok(None)
    }

    fn put(&self, key: &str, value: V, ttl: Duration) -> anyhow::Result<()> {
        let mut entries = self
            .entries
            .lock()
            .map_err(|_| anyhow::anyhow!("memory cache lock poisoned"))?;
        entries.put(key.to_string(), (value, Instant::now() + ttl));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hit_before_expiry() {
        let cache = MemoryCache::new(4);
        cache.put("chart", vec![1, 2, 3], Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("chart").unwrap(), Some(vec![1, 2, 3]));
        assert_eq!(cache.get("other").unwrap(), None);
    }

    #[test]
    fn test_expired_entry_is_a_miss() {
        let cache = MemoryCache::new(4);
        cache.put("chart", 1u32, Duration::ZERO).unwrap();
        assert_eq!(cache.get("chart").unwrap(), None);
    }

    #[test]
    fn test_capacity_evicts_least_recent() {
        let cache = MemoryCache::new(2);
        let ttl = Duration::from_secs(60);
        cache.put("a", 1, ttl).unwrap();
        cache.put("b", 2, ttl).unwrap();
        assert_eq!(cache.get("a").unwrap(), Some(1));
        cache.put("c", 3, ttl).unwrap();
        assert_eq!(cache.get("b").unwrap(), None);
        assert_eq!(cache.get("a").unwrap(), Some(1));
        assert_eq!(cache.get("c").unwrap(), Some(3));
    }

    #[test]
    fn test_zero_capacity_still_holds_one() {
        let cache = MemoryCache::new(0);
        cache.put("a", 1, Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("a").unwrap(), Some(1));
    }
}
