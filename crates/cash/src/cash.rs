//! Tiered cache orchestrator.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use cash_backends_core::Backend;
use cash_common_log::spans::{operation_span, record_error, tier_span, Timer};
use tracing::{debug, warn, Instrument};

use crate::codec::{Codec, CodecChain};
use crate::error::{CashError, CashResult, MultiError};
use crate::key::CashKey;
use crate::value::{CashValue, OutputSlot};

/// Construction options for [`Cash`].
///
/// Both lists default to empty: no codecs means values are stored exactly as
/// serialized, no backends means every load misses and every write succeeds.
#[derive(Clone, Default)]
pub struct CashOptions {
    /// Byte transforms, in encode order.
    pub codecs: Vec<Arc<dyn Codec>>,
    /// Tiers, in lookup order.
    pub backends: Vec<Arc<dyn Backend>>,
}

impl CashOptions {
    /// Create empty options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a codec to the chain.
    pub fn codec(mut self, codec: impl Codec + 'static) -> Self {
        self.codecs.push(Arc::new(codec));
        self
    }

    /// Append a tier to the chain.
    pub fn backend(mut self, backend: impl Backend + 'static) -> Self {
        self.backends.push(Arc::new(backend));
        self
    }

    /// Append an already shared tier, keeping a handle for direct access.
    pub fn shared_backend(mut self, backend: Arc<dyn Backend>) -> Self {
        self.backends.push(backend);
        self
    }

    /// Build the cache.
    pub fn build(self) -> Cash {
        Cash::new(self)
    }
}

impl fmt::Debug for CashOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CashOptions")
            .field("codecs", &self.codecs.iter().map(|c| c.name()).collect::<Vec<_>>())
            .field("backends", &self.backends.iter().map(|b| b.name()).collect::<Vec<_>>())
            .finish()
    }
}

/// Read-through, write-through cache over an ordered list of tiers.
///
/// Loads walk the tiers in order and stop at the first hit. A hit in a
/// remote tier is copied into every local tier. Writes and deletes go to
/// every targeted tier and report all failures together.
///
/// The tier and codec lists are fixed at construction, so a `Cash` can be
/// shared freely (it is cheap to clone). Concurrent `load_or_store` calls for
/// the same missing key are not coalesced: each runs its own compute.
#[derive(Clone)]
pub struct Cash {
    codecs: CodecChain,
    tiers: Arc<[Arc<dyn Backend>]>,
}

#[derive(Clone, Copy)]
enum Write<'b> {
    Store(&'b [u8]),
    Delete,
}

impl Write<'_> {
    fn name(&self) -> &'static str {
        match self {
            Write::Store(_) => "store",
            Write::Delete => "delete",
        }
    }
}

impl Cash {
    /// Create a cache from `options`.
    pub fn new(options: CashOptions) -> Self {
        Self {
            codecs: CodecChain::new(options.codecs),
            tiers: options.backends.into(),
        }
    }

    /// Start building a cache.
    pub fn builder() -> CashOptions {
        CashOptions::new()
    }

    /// Tiers in lookup order.
    pub fn tiers(&self) -> &[Arc<dyn Backend>] {
        &self.tiers
    }

    /// The codec chain.
    pub fn codecs(&self) -> &CodecChain {
        &self.codecs
    }

    /// Serialize `value` and run it through the codec chain.
    pub fn encode_value<V: CashValue>(&self, value: &V) -> CashResult<Vec<u8>> {
        let bytes = value.cash_encode().map_err(CashError::Encode)?;
        Ok(self.codecs.encode(bytes)?)
    }

    /// Undo the codec chain and deserialize.
    pub fn decode_value<V: CashValue>(&self, bytes: &[u8]) -> CashResult<V> {
        let plain = self.codecs.decode(bytes.to_vec())?;
        V::cash_decode(&plain).map_err(CashError::Decode)
    }

    /// Load `key` into `out`.
    ///
    /// Fails with [`CashError::NotFound`] when no tier holds the key, in
    /// which case `out` is left untouched. A tier error stops the walk and
    /// is returned as is; later tiers are not consulted.
    pub async fn load<'a, K, V, O>(&self, key: &K, out: O) -> CashResult<()>
    where
        K: CashKey + ?Sized,
        V: CashValue + 'a,
        O: OutputSlot<'a, V>,
    {
        let out = out.into_slot()?;
        let key = key.cash_key();
        async {
            let (bytes, _) = self.lookup(&key).await?.ok_or(CashError::NotFound)?;
            *out = self.decode_value(&bytes)?;
            Ok::<_, CashError>(())
        }
        .instrument(operation_span("load", &key))
        .await
    }

    /// Load `key` and return the value.
    pub async fn get<K, V>(&self, key: &K) -> CashResult<V>
    where
        K: CashKey + ?Sized,
        V: CashValue,
    {
        let key = key.cash_key();
        async {
            let (bytes, _) = self.lookup(&key).await?.ok_or(CashError::NotFound)?;
            self.decode_value(&bytes)
        }
        .instrument(operation_span("get", &key))
        .await
    }

    /// Load `key` into `out`, computing and storing it on a miss.
    ///
    /// - Hit in a local tier: `out` is filled, nothing is written.
    /// - Hit only in a remote tier: `out` is filled and the fetched bytes are
    ///   written to every local tier. Promotion is best-effort: a failed
    ///   local write is returned, but `out` already holds the value.
    /// - Miss: `compute` runs once, its value goes into `out`, then it is
    ///   stored in every tier.
    ///
    /// An error from `compute` is returned unchanged. A tier error during
    /// the lookup is returned without running `compute`.
    pub async fn load_or_store<'a, K, V, O, F, Fut, E>(
        &self,
        key: &K,
        out: O,
        compute: F,
    ) -> Result<(), E>
    where
        K: CashKey + ?Sized,
        V: CashValue + 'a,
        O: OutputSlot<'a, V>,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
        E: From<CashError>,
    {
        let out = out.into_slot()?;
        let key = key.cash_key();
        async {
            if let Some((bytes, local)) = self.lookup(&key).await? {
                *out = self.decode_value(&bytes)?;
                if !local {
                    debug!(key = %key, "Promoting remote hit");
                    self.fan_out(&key, Write::Store(&bytes), true)
                        .await
                        .map_err(CashError::from)?;
                }
                return Ok(());
            }

            debug!(key = %key, "Miss, computing");
            let timer = Timer::start("compute");
            let value = compute().await?;
            timer.finish();

            let encoded = self.encode_value(&value);
            *out = value;
            let bytes = encoded.map_err(|e| CashError::from(MultiError::from(e)))?;
            self.fan_out(&key, Write::Store(&bytes), false)
                .await
                .map_err(CashError::from)?;
            Ok::<_, E>(())
        }
        .instrument(operation_span("load_or_store", &key))
        .await
    }

    /// Store `value` in every tier.
    pub async fn store<K, V>(&self, key: &K, value: &V) -> Result<(), MultiError>
    where
        K: CashKey + ?Sized,
        V: CashValue,
    {
        self.store_in(key.cash_key(), value, false).await
    }

    /// Store `value` in local tiers only.
    pub async fn store_local<K, V>(&self, key: &K, value: &V) -> Result<(), MultiError>
    where
        K: CashKey + ?Sized,
        V: CashValue,
    {
        self.store_in(key.cash_key(), value, true).await
    }

    /// Delete `key` from every tier.
    pub async fn delete<K>(&self, key: &K) -> Result<(), MultiError>
    where
        K: CashKey + ?Sized,
    {
        let key = key.cash_key();
        self.fan_out(&key, Write::Delete, false)
            .instrument(operation_span("delete", &key))
            .await
    }

    /// Delete `key` from local tiers only.
    pub async fn delete_local<K>(&self, key: &K) -> Result<(), MultiError>
    where
        K: CashKey + ?Sized,
    {
        let key = key.cash_key();
        self.fan_out(&key, Write::Delete, true)
            .instrument(operation_span("delete_local", &key))
            .await
    }

    async fn store_in<V: CashValue>(
        &self,
        key: String,
        value: &V,
        local_only: bool,
    ) -> Result<(), MultiError> {
        let op = if local_only { "store_local" } else { "store" };
        let bytes = self.encode_value(value)?;
        self.fan_out(&key, Write::Store(&bytes), local_only)
            .instrument(operation_span(op, &key))
            .await
    }

    /// First tier holding `key`, with its bytes and locality.
    async fn lookup(&self, key: &str) -> CashResult<Option<(Vec<u8>, bool)>> {
        for tier in self.tiers.iter() {
            let span = tier_span(tier.name(), "load");
            let found = tier
                .load(key)
                .instrument(span.clone())
                .await
                .map_err(|e| {
                    record_error(&span, &e);
                    CashError::backend(tier.name(), e)
                })?;

            if let Some(bytes) = found {
                debug!(key = key, tier = tier.name(), "Hit");
                return Ok(Some((bytes, tier.is_local())));
            }
        }
        debug!(key = key, "Miss in every tier");
        Ok(None)
    }

    /// Apply `write` to every targeted tier, collecting failures in order.
    async fn fan_out(&self, key: &str, write: Write<'_>, local_only: bool) -> Result<(), MultiError> {
        let mut errors = MultiError::new();
        let targets = self
            .tiers
            .iter()
            .filter(|tier| !local_only || tier.is_local());

        for tier in targets {
            let span = tier_span(tier.name(), write.name());
            let result = match write {
                Write::Store(bytes) => tier.store(key, bytes).instrument(span.clone()).await,
                Write::Delete => tier.delete(key).instrument(span.clone()).await,
            };
            if let Err(e) = result {
                record_error(&span, &e);
                span.in_scope(|| {
                    warn!(key = key, tier = tier.name(), error = %e, "Tier {} failed", write.name())
                });
                errors.push(CashError::backend(tier.name(), e));
            }
        }
        errors.into_result()
    }
}

impl Default for Cash {
    fn default() -> Self {
        Self::new(CashOptions::default())
    }
}

impl fmt::Debug for Cash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Cash")
            .field("codecs", &self.codecs)
            .field("tiers", &self.tiers.iter().map(|t| t.name()).collect::<Vec<_>>())
            .finish()
    }
}
