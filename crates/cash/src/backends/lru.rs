//! Bounded in-process tier with least-recently-used eviction.

use async_trait::async_trait;
use cash_backends_core::{Backend, BackendError, BackendResult, BackendStats};
use lru::LruCache;
use parking_lot::Mutex;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// In-process tier holding at most `capacity` entries.
///
/// Loads refresh recency; storing into a full cache drops the least recently
/// used entry.
pub struct LruBackend {
    entries: Mutex<LruCache<String, Vec<u8>>>,
    hits: AtomicU64,
    misses: AtomicU64,
    evictions: AtomicU64,
}

impl LruBackend {
    /// Create a tier bounded to `capacity` entries. Zero is rejected.
    pub fn new(capacity: usize) -> BackendResult<Self> {
        let capacity = NonZeroUsize::new(capacity)
            .ok_or_else(|| BackendError::custom("lru capacity must be greater than zero"))?;
        Ok(Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        })
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.lock().cap().get()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for LruBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let entries = self.entries.lock();
        f.debug_struct("LruBackend")
            .field("capacity", &entries.cap())
            .field("len", &entries.len())
            .finish()
    }
}

#[async_trait]
impl Backend for LruBackend {
    fn name(&self) -> &str {
        "lru"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn load(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        let found = self.entries.lock().get(key).cloned();
        match found {
            Some(value) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "LRU hit");
                Ok(Some(value))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "LRU miss");
                Ok(None)
            }
        }
    }

    async fn store(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        let evicted = self.entries.lock().push(key.to_string(), value.to_vec());
        // `push` also hands back the old value when the key was already present.
        if let Some((old_key, _)) = evicted {
            if old_key != key {
                self.evictions.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, evicted = %old_key, "LRU eviction");
            }
        }
        debug!(key = key, bytes = value.len(), "LRU store");
        Ok(())
    }

    async fn delete(&self, key: &str) -> BackendResult<()> {
        self.entries.lock().pop(key);
        debug!(key = key, "LRU delete");
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        BackendStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.len() as u64,
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
