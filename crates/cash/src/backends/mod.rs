//! Concrete cache tiers.
//!
//! [`MapBackend`] and [`LruBackend`] live in-process and receive promoted
//! values. [`RedisBackend`] is networked and is only written on a full store.

mod lru;
mod map;
mod redis;

pub use self::lru::LruBackend;
pub use self::map::MapBackend;
pub use self::redis::{RedisBackend, RedisOptions};

pub use cash_backends_core::{Backend, BackendError, BackendResult, BackendStats, NilBackend};
