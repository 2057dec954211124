//! Configuration types.

use serde::{Deserialize, Serialize};

/// Default Redis key namespace.
pub const DEFAULT_KEY_PREFIX: &str = "cash:";

/// Default Redis entry lifetime: seven days.
pub const DEFAULT_TTL_SECS: u64 = 7 * 24 * 60 * 60;

/// Root configuration: the codec chain and the tier chain, both ordered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CashConfig {
    /// Byte transforms applied to serialized values, in encode order.
    pub codecs: Vec<CodecConfig>,
    /// Cache tiers, in lookup order.
    pub tiers: Vec<TierConfig>,
}

impl CashConfig {
    /// Number of tiers that will receive promoted values.
    pub fn local_tier_count(&self) -> usize {
        self.tiers.iter().filter(|t| t.is_local()).count()
    }
}

/// One tier in the chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TierConfig {
    /// Always-miss placeholder.
    Nil,
    /// Unbounded concurrent map.
    Map,
    /// Bounded in-process cache with least-recently-used eviction.
    Lru {
        /// Maximum number of entries.
        size: usize,
    },
    /// Networked Redis tier.
    Redis(RedisTierConfig),
}

impl TierConfig {
    /// Short name of the tier kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Nil => "nil",
            Self::Map => "map",
            Self::Lru { .. } => "lru",
            Self::Redis(_) => "redis",
        }
    }

    /// Whether the tier runs in-process.
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::Redis(_))
    }
}

/// Redis tier settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedisTierConfig {
    /// Connection URL, e.g. `redis://127.0.0.1/`.
    pub url: String,
    /// Namespace prepended to every key. Defaults to [`DEFAULT_KEY_PREFIX`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_prefix: Option<String>,
    /// Entry lifetime in seconds. Defaults to [`DEFAULT_TTL_SECS`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ttl_secs: Option<u64>,
    /// Limit on establishing the connection.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connect_timeout_ms: Option<u64>,
    /// Limit on each command round trip.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command_timeout_ms: Option<u64>,
}

impl RedisTierConfig {
    /// Settings for `url` with every option at its default.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: None,
            ttl_secs: None,
            connect_timeout_ms: None,
            command_timeout_ms: None,
        }
    }

    /// Effective key prefix. An empty prefix counts as unset.
    pub fn key_prefix(&self) -> &str {
        self.key_prefix
            .as_deref()
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or(DEFAULT_KEY_PREFIX)
    }

    /// Effective TTL in seconds. Zero counts as unset.
    pub fn ttl_secs(&self) -> u64 {
        self.ttl_secs.filter(|&ttl| ttl > 0).unwrap_or(DEFAULT_TTL_SECS)
    }
}

/// One codec in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CodecConfig {
    /// Raw deflate, level 0-9.
    Deflate {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u32>,
    },
    /// Zstandard, level 1-22.
    Zstd {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<i32>,
    },
    /// LZ4 frame, level 0-16.
    Lz4 {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        level: Option<u32>,
    },
}

impl CodecConfig {
    /// Short name of the codec kind.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Deflate { .. } => "deflate",
            Self::Zstd { .. } => "zstd",
            Self::Lz4 { .. } => "lz4",
        }
    }
}
