use std::hash::Hash;
use std::time::Duration;

use moka::sync::Cache;

/// Time-bounded read cache owned by a service. Writers invalidate explicitly;
/// readers may observe values up to `ttl` old.
#[derive(Clone)]
pub struct TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Cache<K, V>,
    ttl: Duration,
}

impl<K, V> TtlCache<K, V>
where
    K: Hash + Eq + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new(ttl: Duration) -> Self {
        let inner = Cache::builder()
            .max_capacity(1_024)
            .time_to_live(ttl)
            .build();
        Self { inner, ttl }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.get(key)
    }

    pub fn insert(&self, key: K, value: V) {
        self.inner.insert(key, value);
    }

    pub fn invalidate(&self, key: &K) {
        self.inner.invalidate(key);
    }

    pub fn invalidate_all(&self) {
        self.inner.invalidate_all();
    }
}

/// Cache holding a single value, such as a full table listing.
pub type SlotCache<V> = TtlCache<(), V>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalidation_clears_cached_value() {
        let cache: SlotCache<Vec<u32>> = TtlCache::new(Duration::from_secs(60));
        cache.insert((), vec![1, 2, 3]);
        assert_eq!(cache.get(&()), Some(vec![1, 2, 3]));

        cache.invalidate(&());
        assert_eq!(cache.get(&()), None);
    }

    #[test]
    fn entries_expire_after_ttl() {
        let cache: TtlCache<&'static str, u32> = TtlCache::new(Duration::from_millis(20));
        cache.insert("stats", 7);
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(cache.get(&"stats"), None);
    }
}
