//! Store Module
//!
//! The capability interface the provider consumes, plus the backends that
//! implement it. The trait speaks raw JSON strings so it stays object safe;
//! [`StoreExt`] layers typed access on top.

mod entry;
mod memory;
mod redis;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::{CacheError, Result};

pub use entry::StoreEntry;
pub use memory::InMemoryStore;
pub use self::redis::RedisStore;

// == Store Trait ==
/// Remote key-value backend with per-entry expiration.
///
/// Implementations own expiration and memory management. All methods may be
/// called concurrently through a shared reference.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Store: Send + Sync {
    /// Overwrites `key` with no expiration.
    async fn set_raw(&self, key: &str, value: &str) -> Result<()>;

    /// Overwrites `key`, expiring `lifetime` after the write.
    async fn set_raw_with_lifetime(&self, key: &str, value: &str, lifetime: Duration)
        -> Result<()>;

    /// Returns the stored payload, or `None` when missing or expired.
    async fn get_raw(&self, key: &str) -> Result<Option<String>>;

    /// Returns true if a non-expired entry exists for `key`.
    async fn contains(&self, key: &str) -> Result<bool>;

    /// Deletes `key`. Missing keys are not an error.
    async fn remove(&self, key: &str) -> Result<()>;

    /// Deletes every key matching the glob `pattern`, returning how many went.
    ///
    /// Best-effort: keys written during the scan may survive it.
    async fn remove_with_pattern(&self, pattern: &str) -> Result<usize>;
}

// == Typed Extension ==
/// Typed get/set over any [`Store`], using JSON as the codec.
pub trait StoreExt: Store {
    /// Gets a typed value, failing with `Deserialization` on a type mismatch.
    fn get<'a, T>(
        &'a self,
        key: &'a str,
    ) -> impl Future<Output = Result<Option<T>>> + Send
    where
        T: DeserializeOwned + Send,
    {
        async move {
            match self.get_raw(key).await? {
                Some(data) => serde_json::from_str(&data)
                    .map(Some)
                    .map_err(|source| CacheError::Deserialization {
                        key: key.to_string(),
                        source,
                    }),
                None => Ok(None),
            }
        }
    }

    /// Sets a typed value with no expiration.
    fn set<'a, T>(
        &'a self,
        key: &'a str,
        value: &'a T,
    ) -> impl Future<Output = Result<()>> + Send
    where
        T: Serialize + Send + Sync,
    {
        async move {
            let data = encode(key, value)?;
            self.set_raw(key, &data).await
        }
    }

    /// Sets a typed value expiring `lifetime` after the write.
    fn set_with_lifetime<'a, T>(
        &'a self,
        key: &'a str,
        value: &'a T,
        lifetime: Duration,
    ) -> impl Future<Output = Result<()>> + Send
    where
        T: Serialize + Send + Sync,
    {
        async move {
            let data = encode(key, value)?;
            self.set_raw_with_lifetime(key, &data, lifetime).await
        }
    }
}

impl<S: Store + ?Sized> StoreExt for S {}

fn encode<T: Serialize>(key: &str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|source| CacheError::Serialization {
        key: key.to_string(),
        source,
    })
}

/// Joins an optional namespace prefix onto a key or pattern.
pub(crate) fn prefixed(prefix: Option<&str>, key: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, key),
        None => key.to_string(),
    }
}
