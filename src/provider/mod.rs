//! Cache Provider Module
//!
//! Typed cache-aside facade over a shared [`Store`]. The provider keeps no
//! state besides the store handle; every read is a store round trip and all
//! expiry is left to the store.

mod lifetime;


use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;

use crate::error::{BoxError, CacheError, Result};
use crate::store::{Store, StoreExt};

pub use lifetime::Lifetime;

// == Cache Value ==
/// Bound for every type the provider reads or computes.
///
/// `T::default()` doubles as the absent marker: a stored value equal to it
/// reads as a miss and is never written by the ensure/update protocols. Use
/// `Option<T>` when the zero value itself must be cacheable.
pub trait CacheValue: Serialize + DeserializeOwned + Default + PartialEq + Send + Sync {}

impl<T> CacheValue for T where
    T: Serialize + DeserializeOwned + Default + PartialEq + Send + Sync
{
}

fn is_absent<T: CacheValue>(value: &T) -> bool {
    *value == T::default()
}

// == Cache Provider ==
/// Cache-aside access layer with compute-if-absent.
///
/// Cheap to clone; clones share the same store. Safe to call from many tasks
/// at once, but concurrent `ensure*` calls on the same missing key may each
/// compute and write, the last write winning. Nothing here locks a key.
///
/// # Example
/// ```ignore
/// let provider = CacheProvider::new(Arc::new(InMemoryStore::new()));
/// let report: Report = provider
///     .ensure_with_exact_lifetime("report:today", Duration::from_secs(60), || async {
///         build_report().await
///     })
///     .await?;
/// ```
#[derive(Clone)]
pub struct CacheProvider {
    store: Arc<dyn Store>,
}

impl fmt::Debug for CacheProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheProvider")
            .field("store", &"<dyn Store>")
            .finish()
    }
}

impl CacheProvider {
    // == Constructor ==
    /// Creates a provider over a shared store handle.
    ///
    /// The provider never closes or reconfigures the store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Returns the underlying store handle.
    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    // == Add ==
    /// Overwrites `key` with `value`, no expiration.
    pub async fn add<T>(&self, key: &str, value: &T) -> Result<()>
    where
        T: Serialize + Send + Sync,
    {
        Lifetime::None.write(self.store.as_ref(), key, value).await
    }

    /// Overwrites `key` with `value`, expiring `duration` after the write.
    pub async fn add_with_exact_lifetime<T>(
        &self,
        key: &str,
        value: &T,
        duration: Duration,
    ) -> Result<()>
    where
        T: Serialize + Send + Sync,
    {
        Lifetime::Exact(duration)
            .write(self.store.as_ref(), key, value)
            .await
    }

    /// Overwrites `key` with `value` under a sliding expiration.
    ///
    /// Written exactly like [`add_with_exact_lifetime`](Self::add_with_exact_lifetime);
    /// extending the deadline on reads is up to the store.
    pub async fn add_with_sliding_lifetime<T>(
        &self,
        key: &str,
        value: &T,
        duration: Duration,
    ) -> Result<()>
    where
        T: Serialize + Send + Sync,
    {
        Lifetime::Sliding(duration)
            .write(self.store.as_ref(), key, value)
            .await
    }

    // == Contains ==
    /// Returns true if the store holds a live entry for `key`.
    pub async fn contains(&self, key: &str) -> Result<bool> {
        self.store.contains(key).await
    }

    // == Get ==
    /// Returns the value under `key`, or `T::default()` when missing.
    ///
    /// Fails with [`CacheError::Deserialization`] if the stored payload is not a `T`.
    pub async fn get<T: CacheValue>(&self, key: &str) -> Result<T> {
        let value: Option<T> = self.store.as_ref().get(key).await?;
        Ok(value.unwrap_or_default())
    }

    // == Remove ==
    /// Deletes `key`; a missing key is not an error.
    pub async fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(key).await
    }

    /// Deletes every key matching the glob `pattern`, returning the count.
    ///
    /// This is a keyspace scan in the store and not atomic: a matching key
    /// written while it runs may survive.
    pub async fn remove_key_with_pattern(&self, pattern: &str) -> Result<usize> {
        let removed = self.store.remove_with_pattern(pattern).await?;
        debug!(pattern, removed, "Invalidated keys by pattern");
        Ok(removed)
    }

    // == Ensure ==
    /// Returns the cached value for `key`, computing and storing it on a miss.
    ///
    /// The computed value is stored without expiration.
    pub async fn ensure<T, F, Fut, E>(&self, key: &str, compute: F) -> Result<T>
    where
        T: CacheValue,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
        E: Into<BoxError>,
    {
        self.ensure_with(key, Lifetime::None, compute).await
    }

    /// Like [`ensure`](Self::ensure), storing with a fixed lifetime.
    pub async fn ensure_with_exact_lifetime<T, F, Fut, E>(
        &self,
        key: &str,
        duration: Duration,
        compute: F,
    ) -> Result<T>
    where
        T: CacheValue,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
        E: Into<BoxError>,
    {
        self.ensure_with(key, Lifetime::Exact(duration), compute).await
    }

    /// Like [`ensure`](Self::ensure), storing with a sliding lifetime.
    pub async fn ensure_with_sliding_lifetime<T, F, Fut, E>(
        &self,
        key: &str,
        duration: Duration,
        compute: F,
    ) -> Result<T>
    where
        T: CacheValue,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
        E: Into<BoxError>,
    {
        self.ensure_with(key, Lifetime::Sliding(duration), compute).await
    }

    /// Compute-if-absent under an explicit [`Lifetime`].
    ///
    /// A miss is read a second time before computing. This only narrows the
    /// window in which a concurrent writer is missed; it is not a lock. A value
    /// found by the second read is written back with `lifetime`. If `compute`
    /// fails nothing is written and the failure is returned as
    /// [`CacheError::Compute`].
    pub async fn ensure_with<T, F, Fut, E>(
        &self,
        key: &str,
        lifetime: Lifetime,
        compute: F,
    ) -> Result<T>
    where
        T: CacheValue,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
        E: Into<BoxError>,
    {
        if let Some(value) = self.read_present::<T>(key).await? {
            debug!(key, "Cache hit");
            return Ok(value);
        }

        let value = match self.read_present::<T>(key).await? {
            Some(value) => {
                debug!(key, "Cache hit on second read");
                value
            }
            None => {
                debug!(key, "Cache miss, computing");
                run_compute(key, compute).await?
            }
        };

        if is_absent(&value) {
            debug!(key, "Computed value is absent, not storing");
        } else {
            lifetime.write(self.store.as_ref(), key, &value).await?;
        }

        Ok(value)
    }

    // == Update ==
    /// Recomputes `key` unconditionally and stores the result with a sliding lifetime.
    ///
    /// The cached value is never consulted. An absent result is returned but
    /// not written, leaving any existing entry in place.
    pub async fn update_with_sliding_lifetime<T, F, Fut, E>(
        &self,
        key: &str,
        duration: Duration,
        compute: F,
    ) -> Result<T>
    where
        T: CacheValue,
        F: FnOnce() -> Fut + Send,
        Fut: Future<Output = std::result::Result<T, E>> + Send,
        E: Into<BoxError>,
    {
        let value = run_compute(key, compute).await?;

        if is_absent(&value) {
            debug!(key, "Updated value is absent, keeping existing entry");
        } else {
            Lifetime::Sliding(duration)
                .write(self.store.as_ref(), key, &value)
                .await?;
        }

        Ok(value)
    }

    async fn read_present<T: CacheValue>(&self, key: &str) -> Result<Option<T>> {
        let value: Option<T> = self.store.as_ref().get(key).await?;
        Ok(value.filter(|value| !is_absent(value)))
    }
}

async fn run_compute<T, F, Fut, E>(key: &str, compute: F) -> Result<T>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = std::result::Result<T, E>>,
    E: Into<BoxError>,
{
    compute().await.map_err(|err| CacheError::Compute {
        key: key.to_string(),
        source: err.into(),
    })
}
