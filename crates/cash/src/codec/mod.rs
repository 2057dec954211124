//! Reversible byte transforms applied around value serialization.

mod compress;

pub use compress::{DeflateCodec, Lz4Codec, ZstdCodec};

use std::fmt;
use std::sync::Arc;

/// Codec stage failure.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error("{codec} encode failed: {source}")]
    Encode {
        codec: &'static str,
        #[source]
        source: std::io::Error,
    },

    #[error("{codec} decode failed: {source}")]
    Decode {
        codec: &'static str,
        #[source]
        source: std::io::Error,
    },
}

/// A reversible byte transform.
///
/// Implementations must satisfy `decode(encode(x)) == x` for every byte
/// sequence, including the empty one, and must be usable from many threads.
pub trait Codec: Send + Sync {
    /// Codec name used in errors.
    fn name(&self) -> &'static str;

    /// Apply the transform.
    fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError>;

    /// Undo the transform.
    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError>;
}

/// Ordered codec list.
///
/// Encoding runs the codecs front to back; decoding runs them back to front
/// so the last transform applied is the first one undone.
#[derive(Clone, Default)]
pub struct CodecChain {
    codecs: Vec<Arc<dyn Codec>>,
}

impl CodecChain {
    /// Build a chain from codecs in encode order.
    pub fn new(codecs: Vec<Arc<dyn Codec>>) -> Self {
        Self { codecs }
    }

    /// Number of stages.
    pub fn len(&self) -> usize {
        self.codecs.len()
    }

    /// Whether the chain is the identity transform.
    pub fn is_empty(&self) -> bool {
        self.codecs.is_empty()
    }

    /// Run every stage in order.
    pub fn encode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        self.codecs
            .iter()
            .try_fold(bytes, |acc, codec| codec.encode(&acc))
    }

    /// Undo every stage in reverse order.
    pub fn decode(&self, bytes: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        self.codecs
            .iter()
            .rev()
            .try_fold(bytes, |acc, codec| codec.decode(&acc))
    }
}

impl fmt::Debug for CodecChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.codecs.iter().map(|c| c.name()))
            .finish()
    }
}
