use async_trait::async_trait;

use crate::{Backend, BackendResult};

/// No-op tier: every load misses, every write succeeds.
///
/// Useful as a disabled-cache placeholder. It reports itself as local so a
/// chain made only of nil tiers never attempts promotion work elsewhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NilBackend;

impl NilBackend {
    /// Create a no-op tier.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Backend for NilBackend {
    fn name(&self) -> &str {
        "nil"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn load(&self, _key: &str) -> BackendResult<Option<Vec<u8>>> {
        Ok(None)
    }

    async fn store(&self, _key: &str, _value: &[u8]) -> BackendResult<()> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> BackendResult<()> {
        Ok(())
    }
}
