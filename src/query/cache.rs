use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Thread-safe query result cache with TTL expiry and tag-based invalidation.
///
/// Values are serialized responses. Each entry carries the tags it was
/// inserted with so a revalidation request can drop every entry derived
/// from, say, one station or one endpoint.
///
/// Every invalidation bumps a generation counter. A result computed before an
/// invalidation is stored with [`QueryCache::insert_since`] and is dropped if
/// the generation moved in the meantime.
#[derive(Clone)]
pub struct QueryCache {
    entries: Arc<Mutex<HashMap<String, CacheEntry>>>,
    generation: Arc<AtomicU64>,
    ttl: Duration,
}

struct CacheEntry {
    value: String,
    tags: Vec<String>,
    inserted_at: Instant,
}

impl QueryCache {
    /// Create a new cache with the given TTL in seconds.
    /// A TTL of 0 disables caching (all lookups miss).
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            ttl: Duration::from_secs(ttl_secs),
        }
    }

    /// Look up a cached value by key. Returns `None` if missing or expired.
    pub fn get(&self, key: &str) -> Option<String> {
        if self.ttl.is_zero() {
            return None;
        }
        self.entries.lock().get(key).and_then(|entry| {
            if entry.inserted_at.elapsed() > self.ttl {
                None
            } else {
                Some(entry.value.clone())
            }
        })
    }

    /// Current invalidation generation. Read it before computing a result
    /// that will be passed to [`Self::insert_since`].
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Acquire)
    }

    /// Insert a value into the cache under `key`, labelled with `tags`.
    pub fn insert(&self, key: String, value: String, tags: &[&str]) {
        self.insert_since(self.generation(), key, value, tags);
    }

    /// Insert a value computed at `generation`. Nothing is stored if an
    /// invalidation happened since; returns whether the value was stored.
    pub fn insert_since(&self, generation: u64, key: String, value: String, tags: &[&str]) -> bool {
        if self.ttl.is_zero() {
            return false;
        }
        let mut entries = self.entries.lock();
        // Invalidations bump the generation while holding this lock.
        if self.generation.load(Ordering::Acquire) != generation {
            return false;
        }
        entries.insert(
            key,
            CacheEntry {
                value,
                tags: tags.iter().map(|t| (*t).to_string()).collect(),
                inserted_at: Instant::now(),
            },
        );
        true
    }

    /// Drop every entry labelled with `tag`. Returns the number removed.
    pub fn invalidate_tag(&self, tag: &str) -> usize {
        let mut entries = self.entries.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let before = entries.len();
        entries.retain(|_, entry| !entry.tags.iter().any(|t| t == tag));
        before - entries.len()
    }

    /// Drop every entry. Returns the number removed.
    pub fn clear(&self) -> usize {
        let mut entries = self.entries.lock();
        self.generation.fetch_add(1, Ordering::AcqRel);
        let removed = entries.len();
        entries.clear();
        removed
    }

    /// Remove expired entries from the cache.
    pub fn cleanup_expired(&self) {
        let mut entries = self.entries.lock();
        entries.retain(|_, entry| entry.inserted_at.elapsed() <= self.ttl);
    }

    /// Returns the number of entries currently in the cache.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if the cache contains no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
