//! Generic in-memory result cache with TTL and LRU eviction
//!
//! Thread-safe, generic over key/value types. An entry older than its TTL is
//! treated as absent: the cache never hands back a value past
//! `written_at + ttl`. Tracks hit/miss metrics for diagnostics.
use std::collections::{HashMap, VecDeque};
use std::hash::Hash;
use std::sync::RwLock;
use std::time::{Duration, Instant};

/// TTL and capacity for one cache class.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    pub ttl: Duration,
    /// Maximum number of entries (LRU eviction when exceeded).
    pub capacity: usize,
}

impl CacheConfig {
    /// Cheap aggregate-balance results (refreshed daily).
    pub fn holdings(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            capacity: 10_000,
        }
    }

    /// Pass-collection verdicts.
    pub fn pass_status(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            capacity: 10_000,
        }
    }

    /// Deep-scan verdicts, gating how often the expensive scan reruns.
    pub fn deep_scan(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            capacity: 10_000,
        }
    }

    /// Detected token standards. A contract's standard never changes, so
    /// the TTL is long; it exists only to keep the cache self-correcting.
    pub fn standard(ttl_secs: u64) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            capacity: 1_000,
        }
    }

    pub fn custom(ttl_secs: u64, capacity: usize) -> Self {
        Self {
            ttl: Duration::from_secs(ttl_secs),
            capacity,
        }
    }
}

struct Entry<V> {
    value: V,
    written_at: Instant,
}

impl<V> Entry<V> {
    fn is_expired(&self, ttl: Duration) -> bool {
        self.written_at.elapsed() > ttl
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheMetrics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub inserts: u64,
}

pub struct TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    config: CacheConfig,
    data: RwLock<HashMap<K, Entry<V>>>,
    access_order: RwLock<VecDeque<K>>,
    metrics: RwLock<CacheMetrics>,
}

impl<K, V> TtlCache<K, V>
where
    K: Clone + Eq + Hash,
    V: Clone,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            data: RwLock::new(HashMap::new()),
            access_order: RwLock::new(VecDeque::new()),
            metrics: RwLock::new(CacheMetrics::default()),
        }
    }

    /// Fresh value for `key`, or `None` when missing or past its TTL.
    /// Expired entries are evicted lazily here.
    pub fn get(&self, key: &K) -> Option<V> {
        let mut data = self.data.write().unwrap();

        let found = data
            .get(key)
            .map(|entry| (entry.is_expired(self.config.ttl), entry.value.clone()));

        match found {
            Some((true, _)) => {
                data.remove(key);
                drop(data);
                self.remove_from_access_order(key);

                let mut metrics = self.metrics.write().unwrap();
                metrics.misses += 1;
                metrics.expirations += 1;
                None
            }
            Some((false, value)) => {
                drop(data);
                self.touch_access_order(key);

                self.metrics.write().unwrap().hits += 1;
                Some(value)
            }
            None => {
                self.metrics.write().unwrap().misses += 1;
                None
            }
        }
    }

    /// Last written value regardless of freshness. Used only by the pass
    /// resolver's anti-flapping fallback, where a stale verdict is still
    /// the best available "previous externally-known state".
    pub fn get_stale(&self, key: &K) -> Option<V> {
        self.data
            .read()
            .unwrap()
            .get(key)
            .map(|entry| entry.value.clone())
    }

    pub fn insert(&self, key: K, value: V) {
        let mut data = self.data.write().unwrap();

        if data.len() >= self.config.capacity && !data.contains_key(&key) {
            self.evict_lru(&mut data);
        }

        data.insert(
            key.clone(),
            Entry {
                value,
                written_at: Instant::now(),
            },
        );
        drop(data);
        self.touch_access_order(&key);

        self.metrics.write().unwrap().inserts += 1;
    }

    pub fn remove(&self, key: &K) {
        self.data.write().unwrap().remove(key);
        self.remove_from_access_order(key);
    }

    pub fn clear(&self) {
        self.data.write().unwrap().clear();
        self.access_order.write().unwrap().clear();
    }

    pub fn len(&self) -> usize {
        self.data.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.metrics.read().unwrap().clone()
    }

    fn evict_lru(&self, data: &mut HashMap<K, Entry<V>>) {
        let mut access_order = self.access_order.write().unwrap();
        if let Some(lru_key) = access_order.pop_front() {
            data.remove(&lru_key);
            self.metrics.write().unwrap().evictions += 1;
        }
    }

    fn touch_access_order(&self, key: &K) {
        let mut access_order = self.access_order.write().unwrap();
        access_order.retain(|k| k != key);
        access_order.push_back(key.clone());
    }

    fn remove_from_access_order(&self, key: &K) {
        self.access_order.write().unwrap().retain(|k| k != key);
    }
}
