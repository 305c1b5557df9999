//! Expiration policies and their translation into store writes.

use std::time::Duration;

use serde::Serialize;

use crate::error::Result;
use crate::store::{Store, StoreExt};

// == Lifetime ==
/// How long a written entry stays readable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifetime {
    /// Never expires
    None,
    /// Expires a fixed duration after the write
    Exact(Duration),
    /// Expires a duration after the last read; the store owns the refresh
    Sliding(Duration),
}

impl Lifetime {
    /// Duration handed to the store, if any.
    ///
    /// Sliding and exact lifetimes are written the same way: the store
    /// interface has a single TTL write, so refresh-on-read is left to the
    /// backend.
    pub fn ttl(&self) -> Option<Duration> {
        match self {
            Lifetime::None => None,
            Lifetime::Exact(duration) | Lifetime::Sliding(duration) => Some(*duration),
        }
    }

    // == Write ==
    /// Writes `value` under `key` with this lifetime.
    pub(crate) async fn write<S, T>(&self, store: &S, key: &str, value: &T) -> Result<()>
    where
        S: Store + ?Sized,
        T: Serialize + Send + Sync,
    {
        match self.ttl() {
            Some(ttl) => store.set_with_lifetime(key, value, ttl).await,
            None => store.set(key, value).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ttl_translation() {
        let ten = Duration::from_secs(10);

        assert_eq!(Lifetime::None.ttl(), None);
        assert_eq!(Lifetime::Exact(ten).ttl(), Some(ten));
        assert_eq!(Lifetime::Sliding(ten).ttl(), Some(ten));
    }
}
