//! Compression codecs.

use std::io::{Read, Write};

use flate2::read::DeflateDecoder;
use flate2::write::DeflateEncoder;
use flate2::Compression;
use once_cell::sync::OnceCell;

use super::{Codec, CodecError};

fn encode_err(codec: &'static str) -> impl FnOnce(std::io::Error) -> CodecError {
    move |source| CodecError::Encode { codec, source }
}

fn decode_err(codec: &'static str) -> impl FnOnce(std::io::Error) -> CodecError {
    move |source| CodecError::Decode { codec, source }
}

/// Raw deflate compression.
///
/// The effective level is resolved on first use and fixed for the lifetime
/// of the instance; an unset level means the library default.
#[derive(Debug, Default)]
pub struct DeflateCodec {
    level: Option<u32>,
    resolved: OnceCell<Compression>,
}

impl DeflateCodec {
    const NAME: &'static str = "deflate";

    /// Codec using the default compression level.
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec using `level` (0-9, clamped).
    pub fn with_level(level: u32) -> Self {
        Self {
            level: Some(level),
            resolved: OnceCell::new(),
        }
    }

    /// Effective compression level.
    pub fn level(&self) -> u32 {
        self.compression().level()
    }

    fn compression(&self) -> Compression {
        *self.resolved.get_or_init(|| match self.level {
            Some(level) => Compression::new(level.min(9)),
            None => Compression::default(),
        })
    }
}

impl Codec for DeflateCodec {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = DeflateEncoder::new(Vec::new(), self.compression());
        encoder.write_all(bytes).map_err(encode_err(Self::NAME))?;
        encoder.finish().map_err(encode_err(Self::NAME))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(bytes.len() * 2);
        DeflateDecoder::new(bytes)
            .read_to_end(&mut out)
            .map_err(decode_err(Self::NAME))?;
        Ok(out)
    }
}

/// Zstandard compression.
#[derive(Debug, Clone, Copy)]
pub struct ZstdCodec {
    level: i32,
}

impl ZstdCodec {
    const NAME: &'static str = "zstd";

    /// Codec using `level` (1-22).
    pub fn with_level(level: i32) -> Self {
        Self { level }
    }
}

impl Default for ZstdCodec {
    fn default() -> Self {
        Self { level: 3 }
    }
}

impl Codec for ZstdCodec {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::stream::encode_all(bytes, self.level).map_err(encode_err(Self::NAME))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        zstd::stream::decode_all(bytes).map_err(decode_err(Self::NAME))
    }
}

/// LZ4 frame compression.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Codec {
    level: u32,
}

impl Lz4Codec {
    const NAME: &'static str = "lz4";

    /// Codec using `level` (0-16, 0 is the library default).
    pub fn with_level(level: u32) -> Self {
        Self { level }
    }
}

impl Codec for Lz4Codec {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn encode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut encoder = lz4::EncoderBuilder::new()
            .level(self.level)
            .build(Vec::new())
            .map_err(encode_err(Self::NAME))?;
        encoder.write_all(bytes).map_err(encode_err(Self::NAME))?;
        let (out, result) = encoder.finish();
        result.map_err(encode_err(Self::NAME))?;
        Ok(out)
    }

    fn decode(&self, bytes: &[u8]) -> Result<Vec<u8>, CodecError> {
        let mut out = Vec::with_capacity(bytes.len() * 2);
        lz4::Decoder::new(bytes)
            .and_then(|mut decoder| decoder.read_to_end(&mut out))
            .map_err(decode_err(Self::NAME))?;
        Ok(out)
    }
}
