//! Building a cache from its configuration file.

use std::sync::Arc;

use cash_backends_core::{Backend, NilBackend};
use cash_common_config::{CashConfig, CodecConfig, TierConfig};
use tracing::info;

use crate::backends::{LruBackend, MapBackend, RedisBackend, RedisOptions};
use crate::cash::{Cash, CashOptions};
use crate::codec::{Codec, DeflateCodec, Lz4Codec, ZstdCodec};
use crate::error::{CashError, CashResult};

/// Instantiate a codec from its settings.
pub fn build_codec(config: &CodecConfig) -> Arc<dyn Codec> {
    match *config {
        CodecConfig::Deflate { level: None } => Arc::new(DeflateCodec::new()),
        CodecConfig::Deflate { level: Some(level) } => Arc::new(DeflateCodec::with_level(level)),
        CodecConfig::Zstd { level } => Arc::new(level.map_or_else(ZstdCodec::default, ZstdCodec::with_level)),
        CodecConfig::Lz4 { level } => Arc::new(level.map_or_else(Lz4Codec::default, Lz4Codec::with_level)),
    }
}

/// Instantiate a tier from its settings.
pub fn build_tier(config: &TierConfig) -> CashResult<Arc<dyn Backend>> {
    let tier: Arc<dyn Backend> = match config {
        TierConfig::Nil => Arc::new(NilBackend::new()),
        TierConfig::Map => Arc::new(MapBackend::new()),
        TierConfig::Lru { size } => Arc::new(
            LruBackend::new(*size).map_err(|e| CashError::Config(format!("lru tier: {}", e)))?,
        ),
        TierConfig::Redis(redis) => Arc::new(
            RedisBackend::new(RedisOptions::from(redis))
                .map_err(|e| CashError::Config(format!("redis tier: {}", e)))?,
        ),
    };
    Ok(tier)
}

impl Cash {
    /// Build a cache with the codecs and tiers of `config`, in file order.
    pub fn from_config(config: &CashConfig) -> CashResult<Self> {
        let codecs = config.codecs.iter().map(build_codec).collect();
        let backends = config
            .tiers
            .iter()
            .map(build_tier)
            .collect::<CashResult<Vec<_>>>()?;

        info!(
            codecs = config.codecs.len(),
            tiers = backends.len(),
            local_tiers = config.local_tier_count(),
            "Cache configured"
        );
        Ok(Cash::new(CashOptions { codecs, backends }))
    }
}
