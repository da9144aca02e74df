//! A write-through JSON-file cache, grounded on the pack's own
//! `PersistentCache`: the whole table loads into memory at construction and
//! every mutation flushes it back out as pretty-printed JSON.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use rules_common::Value;
use rules_eval::adapters::{CacheProvider, CacheStats};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::json_bridge::{from_json, to_json};

#[derive(Serialize, Deserialize, Clone)]
struct StoredEntry {
    value: serde_json::Value,
    inserted_at_ms: u64,
    ttl_ms: u64,
}

impl StoredEntry {
    fn is_expired(&self) -> bool {
        now_ms().saturating_sub(self.inserted_at_ms) > self.ttl_ms
    }
}

fn now_ms() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis() as u64
}

pub struct FileCache {
    path: PathBuf,
    entries: Mutex<FxHashMap<String, StoredEntry>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl FileCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = Self::load_from_disk(&path).unwrap_or_default();
        FileCache {
            path,
            entries: Mutex::new(entries),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    fn load_from_disk(path: &Path) -> Option<FxHashMap<String, StoredEntry>> {
        let contents = fs::read_to_string(path).ok()?;
        serde_json::from_str(&contents).ok()
    }

    fn flush(&self, entries: &FxHashMap<String, StoredEntry>) {
        if let Some(parent) = self.path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to create cache directory");
                return;
            }
        }
        match serde_json::to_string_pretty(entries) {
            Ok(json) => {
                if let Err(e) = fs::write(&self.path, json) {
                    tracing::warn!(path = %self.path.display(), error = %e, "failed to flush cache to disk");
                }
            }
            Err(e) => tracing::warn!(error = %e, "failed to serialize cache entries"),
        }
    }
}

impl CacheProvider for FileCache {
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
                Some(from_json(&entry.value))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    fn put(&self, key: &str, value: Value, ttl: Duration) {
        let mut entries = self.entries.lock().unwrap();
        entries.insert(
            key.to_string(),
            StoredEntry { value: to_json(&value), inserted_at_ms: now_ms(), ttl_ms: ttl.as_millis() as u64 },
        );
        self.flush(&entries);
    }

    fn evict(&self, key: &str) {
        let mut entries = self.entries.lock().unwrap();
        if entries.remove(key).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            self.flush(&entries);
        }
    }

    fn clear(&self) {
        let mut entries = self.entries.lock().unwrap();
        entries.clear();
        self.flush(&entries);
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

    fn temp_path(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join("rules_adapters_cache_tests");
        fs::create_dir_all(&dir).unwrap();
        dir.join(format!("{name}.json"))
    }

    #[test]
    fn put_persists_across_instances() {
        let path = temp_path("persist");
        let _ = fs::remove_file(&path);

        let cache = FileCache::new(path.clone());
        cache.put("k", Value::String("v".to_string()), Duration::from_secs(60));
        drop(cache);

        let cache2 = FileCache::new(path.clone());
        assert_eq!(cache2.get("k"), Some(Value::String("v".to_string())));
        let _ = fs::remove_file(&path);
    }

    #[test]
    fn malformed_file_starts_empty() {
        let path = temp_path("malformed");
        fs::write(&path, "not json").unwrap();
        let cache = FileCache::new(path.clone());
        assert_eq!(cache.stats().approximate_size, 0);
        let _ = fs::remove_file(&path);
    }
}
