//! Configuration types for cash.
//!
//! A `cash.yaml` file describes the ordered codec chain and the ordered tier
//! chain. The `cash` crate turns a [`CashConfig`] into a running cache.

pub mod env;
pub mod loader;
pub mod types;

pub use env::*;
pub use loader::*;
pub use types::*;
