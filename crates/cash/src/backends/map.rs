//! Unbounded concurrent map tier.

use async_trait::async_trait;
use cash_backends_core::{Backend, BackendResult, BackendStats};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::debug;

/// In-process tier backed by a sharded concurrent map.
///
/// Entries never expire and are never evicted.
#[derive(Debug, Default)]
pub struct MapBackend {
    entries: DashMap<String, Vec<u8>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl MapBackend {
    /// Create an empty map tier.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the map is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Backend for MapBackend {
    fn name(&self) -> &str {
        "map"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn load(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        match self.entries.get(key) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "Map hit");
                Ok(Some(entry.value().clone()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "Map miss");
                Ok(None)
            }
        }
    }

    async fn store(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        self.entries.insert(key.to_string(), value.to_vec());
        debug!(key = key, bytes = value.len(), "Map store");
        Ok(())
    }

    async fn delete(&self, key: &str) -> BackendResult<()> {
        self.entries.remove(key);
        debug!(key = key, "Map delete");
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        BackendStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            entries: self.entries.len() as u64,
            evictions: 0,
        }
    }
}
