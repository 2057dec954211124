//! Tiered read-through/write-through cache.
//!
//! A [`Cash`] sits in front of an ordered list of tiers (in-process maps,
//! bounded LRU caches, Redis). Reads walk the tiers front to back and stop at
//! the first hit; a value found only in a remote tier is promoted into the
//! local ones. Writes go to every tier and report each failure.
//!
//! Values are serialized through [`CashValue`] and then run through an
//! optional [`CodecChain`] of reversible byte transforms such as compression.
//!
//! ```no_run
//! use cash::backends::{LruBackend, MapBackend};
//! use cash::{Cash, CashError};
//!
//! # async fn demo() -> Result<(), CashError> {
//! let cash = Cash::builder()
//!     .backend(LruBackend::new(1024).expect("non-zero capacity"))
//!     .backend(MapBackend::new())
//!     .build();
//!
//! let mut greeting = String::new();
//! cash.load_or_store("greeting", &mut greeting, || async {
//!     Ok::<_, CashError>("hi".to_string())
//! })
//! .await?;
//! # Ok(())
//! # }
//! ```

pub mod backends;
pub mod codec;
pub mod config;
pub mod error;
pub mod key;
pub mod value;

mod cash;

pub use crate::cash::{Cash, CashOptions};
pub use codec::{Codec, CodecChain, CodecError, DeflateCodec, Lz4Codec, ZstdCodec};
pub use error::{CashError, CashResult, MultiError};
pub use key::{CashKey, MapCashKey};
pub use value::{CashValue, OutputSlot, ValueError};

pub use cash_backends_core::{Backend, BackendError, BackendStats, NilBackend};
pub use cash_common_config::{CashConfig, CodecConfig, ConfigLoader, TierConfig};
