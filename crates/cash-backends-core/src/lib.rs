//! Backend tier contract for the cash tiered cache.
//!
//! A backend is one store in the configured tier chain. It maps canonical
//! string keys to opaque bytes and knows nothing about values, codecs or the
//! other tiers. The orchestrator in the `cash` crate owns the ordering,
//! fallback and promotion rules; a backend only answers for its own key space.

#![warn(missing_docs)]

mod error;
mod nil;

pub use error::{BackendError, BackendResult};
pub use nil::NilBackend;

use async_trait::async_trait;

/// Cache tier trait.
///
/// Implementations must be safe for concurrent use: the orchestrator shares a
/// single instance between every caller for the lifetime of the process and
/// never serializes access on its behalf.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Tier name used in logs and error reports.
    fn name(&self) -> &str;

    /// Whether this tier is cheap enough to receive promoted values.
    ///
    /// In-process tiers return `true`, networked tiers return `false`.
    fn is_local(&self) -> bool;

    /// Load the bytes stored under `key`.
    ///
    /// `Ok(None)` means the key is absent. Any `Err` is a hard failure and
    /// stops the tier walk.
    async fn load(&self, key: &str) -> BackendResult<Option<Vec<u8>>>;

    /// Store `value` under `key`, replacing any previous entry.
    async fn store(&self, key: &str, value: &[u8]) -> BackendResult<()>;

    /// Delete `key`. Deleting an absent key succeeds.
    async fn delete(&self, key: &str) -> BackendResult<()>;

    /// Usage counters. Tiers that do not track usage report zeros.
    fn stats(&self) -> BackendStats {
        BackendStats::default()
    }
}

/// Backend usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackendStats {
    /// Loads that found a value.
    pub hits: u64,
    /// Loads that found nothing.
    pub misses: u64,
    /// Entries currently held, when the tier can tell.
    pub entries: u64,
    /// Entries dropped to stay within capacity.
    pub evictions: u64,
}

impl BackendStats {
    /// Fraction of loads that hit (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_stats_hit_rate() {
        let stats = BackendStats {
            hits: 80,
            misses: 20,
            ..Default::default()
        };
        assert!((stats.hit_rate() - 0.8).abs() < 0.001);

        let empty = BackendStats::default();
        assert!((empty.hit_rate() - 0.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_backend_is_object_safe() {
        let tiers: Vec<Box<dyn Backend>> = vec![Box::new(NilBackend::new())];
        for tier in &tiers {
            assert!(tier.load("k").await.unwrap().is_none());
            assert_eq!(tier.stats(), BackendStats::default());
        }
    }
}
