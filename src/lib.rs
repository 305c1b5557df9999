//! Cache Aside - typed cache-aside access over a remote key-value store
//!
//! Provides get/set/remove, compute-if-absent with fixed or sliding
//! lifetimes, and pattern invalidation on top of a pluggable [`Store`].

pub mod config;
pub mod error;
pub mod handle;
pub mod provider;
pub mod store;
pub mod tasks;

pub use config::{Backend, Config};
pub use error::{CacheError, Result};
pub use handle::StoreHandle;
pub use provider::{CacheProvider, CacheValue, Lifetime};
pub use store::{InMemoryStore, RedisStore, Store, StoreExt};
pub use tasks::spawn_cleanup_task;
