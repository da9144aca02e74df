//! An in-process TTL cache. Entries live only as long as the process; no
//! disk I/O, so it's the right default for a CLI run or short-lived service.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use rules_common::Value;
use rules_eval::adapters::{CacheProvider, CacheStats};
use rustc_hash::FxHashMap;

struct Entry {
    value: Value,
    inserted_at: Instant,
    ttl: Duration,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.inserted_at.elapsed() > self.ttl
    }
}

pub struct MemoryCache {
    entries: Mutex<FxHashMap<String, Entry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl MemoryCache {
    pub fn new() -> Self {
        MemoryCache {
            entries: Mutex::new(FxHashMap::default()),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }
}

impl Default for MemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheProvider for MemoryCache {
    fn get(&self, key: &str) -> Option<Value> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                self.evictions.fetch_add(1, Ordering::Relaxed);
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(entry.value.clone())
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(key.to_string(), Entry { value, inserted_at: Instant::now(), ttl });
    }

    fn evict(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap();
        if entries.remove(key).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
    }

    fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.clear();
    }

    fn stats(&self) -> CacheStats {
        let entries = self.entries.lock().unwrap();
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            approximate_size: entries.len() as u64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_then_get_returns_value_before_ttl_elapses() {
        let cache = MemoryCache::new();
        cache.put("k", Value::Number(1.into()), Duration::from_secs(60));
        assert_eq!(cache.get("k"), Some(Value::Number(1.into())));
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn expired_entry_is_evicted_on_read() {
        let cache = MemoryCache::new();
        cache.put("k", Value::Number(1.into()), Duration::from_millis(0));
        std::thread::sleep(Duration::from_millis(5));
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn clear_removes_all_entries() {
        let cache = MemoryCache::new();
        cache.put("a", Value::Null, Duration::from_secs(60));
        cache.put("b", Value::Null, Duration::from_secs(60));
        cache.clear();
        assert_eq!(cache.stats().approximate_size, 0);
    }
}
