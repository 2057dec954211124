//! Networked Redis tier.

use async_trait::async_trait;
use cash_backends_core::{Backend, BackendError, BackendResult, BackendStats};
use cash_common_config::{RedisTierConfig, DEFAULT_KEY_PREFIX, DEFAULT_TTL_SECS};
use redis::aio::ConnectionManager;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::debug;

/// Redis tier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedisOptions {
    /// Connection URL.
    pub url: String,
    /// Namespace prepended to every key.
    pub key_prefix: String,
    /// Lifetime of every stored entry.
    pub ttl: Duration,
    /// Limit on establishing the connection. `None` waits indefinitely.
    pub connect_timeout: Option<Duration>,
    /// Limit on each command. `None` waits indefinitely.
    pub command_timeout: Option<Duration>,
}

impl RedisOptions {
    /// Options for `url` with the default prefix and a seven day TTL.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            key_prefix: DEFAULT_KEY_PREFIX.to_string(),
            ttl: Duration::from_secs(DEFAULT_TTL_SECS),
            connect_timeout: None,
            command_timeout: None,
        }
    }

    /// Set the key prefix.
    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    /// Set the entry lifetime.
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Set the connect timeout.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the per-command timeout.
    pub fn with_command_timeout(mut self, timeout: Duration) -> Self {
        self.command_timeout = Some(timeout);
        self
    }
}

impl From<&RedisTierConfig> for RedisOptions {
    fn from(config: &RedisTierConfig) -> Self {
        Self {
            url: config.url.clone(),
            key_prefix: config.key_prefix().to_string(),
            ttl: Duration::from_secs(config.ttl_secs()),
            connect_timeout: config.connect_timeout_ms.map(Duration::from_millis),
            command_timeout: config.command_timeout_ms.map(Duration::from_millis),
        }
    }
}

/// Remote tier storing entries in Redis with a fixed expiry.
///
/// The connection is opened on first use and shared by every caller
/// afterwards; the manager reconnects on its own after a dropped link.
pub struct RedisBackend {
    client: redis::Client,
    connection: OnceCell<ConnectionManager>,
    options: RedisOptions,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl RedisBackend {
    /// Create a tier for `options`. Only the URL is checked here; no
    /// connection is made until the first command.
    ///
    /// An empty key prefix or a zero TTL falls back to the defaults.
    pub fn new(mut options: RedisOptions) -> BackendResult<Self> {
        if options.key_prefix.is_empty() {
            options.key_prefix = DEFAULT_KEY_PREFIX.to_string();
        }
        if options.ttl.is_zero() {
            options.ttl = Duration::from_secs(DEFAULT_TTL_SECS);
        }

        let client = redis::Client::open(options.url.as_str())
            .map_err(|e| BackendError::Connection(e.to_string()))?;

        Ok(Self {
            client,
            connection: OnceCell::new(),
            options,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        })
    }

    /// Effective settings.
    pub fn options(&self) -> &RedisOptions {
        &self.options
    }

    /// Build a full key with prefix.
    fn key(&self, key: &str) -> String {
        format!("{}{}", self.options.key_prefix, key)
    }

    async fn connection(&self) -> BackendResult<ConnectionManager> {
        let manager = self
            .connection
            .get_or_try_init(|| async {
                let connect = ConnectionManager::new(self.client.clone());
                let manager = with_timeout(self.options.connect_timeout, connect)
                    .await?
                    .map_err(|e| BackendError::Connection(e.to_string()))?;
                debug!(url = %self.options.url, "Redis connected");
                Ok::<_, BackendError>(manager)
            })
            .await?;
        Ok(manager.clone())
    }

    async fn query<T>(&self, cmd: redis::Cmd) -> BackendResult<T>
    where
        T: redis::FromRedisValue + Send,
    {
        let mut conn = self.connection().await?;
        with_timeout(self.options.command_timeout, cmd.query_async(&mut conn))
            .await?
            .map_err(command_error)
    }
}

async fn with_timeout<F: Future>(limit: Option<Duration>, fut: F) -> BackendResult<F::Output> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, fut)
            .await
            .map_err(|_| BackendError::Timeout(limit)),
        None => Ok(fut.await),
    }
}

fn command_error(err: redis::RedisError) -> BackendError {
    if err.is_io_error() || err.is_connection_dropped() || err.is_connection_refusal() {
        BackendError::Connection(err.to_string())
    } else {
        BackendError::Command(err.to_string())
    }
}

/// Absent keys and empty payloads both count as a miss.
fn reply_to_entry(reply: Option<Vec<u8>>) -> Option<Vec<u8>> {
    reply.filter(|bytes| !bytes.is_empty())
}

impl std::fmt::Debug for RedisBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisBackend")
            .field("options", &self.options)
            .field("connected", &self.connection.initialized())
            .finish()
    }
}

#[async_trait]
impl Backend for RedisBackend {
    fn name(&self) -> &str {
        "redis"
    }

    fn is_local(&self) -> bool {
        false
    }

    async fn load(&self, key: &str) -> BackendResult<Option<Vec<u8>>> {
        let full_key = self.key(key);
        let mut cmd = redis::cmd("GET");
        cmd.arg(&full_key);
        let reply: Option<Vec<u8>> = self.query(cmd).await?;

        match reply_to_entry(reply) {
            Some(bytes) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "Redis hit");
                Ok(Some(bytes))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                debug!(key = key, "Redis miss");
                Ok(None)
            }
        }
    }

    async fn store(&self, key: &str, value: &[u8]) -> BackendResult<()> {
        let full_key = self.key(key);
        let ttl_secs = self.options.ttl.as_secs().max(1);
        let mut cmd = redis::cmd("SET");
        cmd.arg(&full_key).arg(value).arg("EX").arg(ttl_secs);
        self.query::<()>(cmd).await?;

        debug!(key = key, ttl_secs = ttl_secs, "Redis store");
        Ok(())
    }

    async fn delete(&self, key: &str) -> BackendResult<()> {
        let full_key = self.key(key);
        let mut cmd = redis::cmd("DEL");
        cmd.arg(&full_key);
        self.query::<()>(cmd).await?;

        debug!(key = key, "Redis delete");
        Ok(())
    }

    fn stats(&self) -> BackendStats {
        BackendStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = RedisOptions::new("redis://127.0.0.1/");
        assert_eq!(options.key_prefix, "cash:");
        assert_eq!(options.ttl, Duration::from_secs(7 * 24 * 60 * 60));
        assert!(options.connect_timeout.is_none());
        assert!(options.command_timeout.is_none());
    }

    #[test]
    fn test_options_from_config() {
        let mut config = RedisTierConfig::new("redis://cache:6379/");
        config.key_prefix = Some("app:".into());
        config.ttl_secs = Some(60);
        config.command_timeout_ms = Some(250);

        let options = RedisOptions::from(&config);
        assert_eq!(options.url, "redis://cache:6379/");
        assert_eq!(options.key_prefix, "app:");
        assert_eq!(options.ttl, Duration::from_secs(60));
        assert_eq!(options.connect_timeout, None);
        assert_eq!(options.command_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn test_keys_are_prefixed() {
        let backend = RedisBackend::new(RedisOptions::new("redis://127.0.0.1/")).unwrap();
        assert_eq!(backend.key("x"), "cash:x");

        let backend = RedisBackend::new(
            RedisOptions::new("redis://127.0.0.1/").with_key_prefix("other/"),
        )
        .unwrap();
        assert_eq!(backend.key("networkId=nid"), "other/networkId=nid");
        assert!(!backend.is_local());
        assert_eq!(backend.name(), "redis");
    }

    #[test]
    fn test_zero_ttl_and_empty_prefix_fall_back_to_defaults() {
        let options = RedisOptions::new("redis://127.0.0.1/")
            .with_key_prefix("")
            .with_ttl(Duration::ZERO);
        let backend = RedisBackend::new(options).unwrap();

        assert_eq!(backend.options().key_prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(backend.options().ttl, Duration::from_secs(DEFAULT_TTL_SECS));
        assert_eq!(backend.key("x"), "cash:x");

        let mut config = RedisTierConfig::new("redis://127.0.0.1/");
        config.key_prefix = Some(String::new());
        config.ttl_secs = Some(0);
        let backend = RedisBackend::new(RedisOptions::from(&config)).unwrap();
        assert_eq!(backend.options().key_prefix, DEFAULT_KEY_PREFIX);
        assert_eq!(backend.options().ttl, Duration::from_secs(DEFAULT_TTL_SECS));
    }

    #[test]
    fn test_invalid_url_rejected() {
        let err = RedisBackend::new(RedisOptions::new("not a redis url")).unwrap_err();
        assert!(matches!(err, BackendError::Connection(_)));
    }

    #[test]
    fn test_empty_reply_is_miss() {
        assert_eq!(reply_to_entry(None), None);
        assert_eq!(reply_to_entry(Some(Vec::new())), None);
        assert_eq!(reply_to_entry(Some(b"v".to_vec())), Some(b"v".to_vec()));
    }

    #[tokio::test]
    async fn test_with_timeout_reports_limit() {
        let limit = Duration::from_millis(10);
        let err = with_timeout(Some(limit), tokio::time::sleep(Duration::from_secs(5)))
            .await
            .unwrap_err();
        assert!(matches!(err, BackendError::Timeout(d) if d == limit));

        assert_eq!(with_timeout(None, async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn test_unreachable_server_is_transient_error() {
        let options = RedisOptions::new("redis://127.0.0.1:1/")
            .with_connect_timeout(Duration::from_millis(300));
        let backend = RedisBackend::new(options).unwrap();

        let err = backend.load("k").await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err}");
        assert_eq!(backend.stats(), BackendStats::default());
    }
}
