//! Redis Store Module
//!
//! [`Store`] over a Redis server through a multiplexed `ConnectionManager`.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::{AsyncCommands, Client};
use tracing::{debug, info};

use super::{prefixed, Store};
use crate::config::Config;
use crate::error::Result;

/// Keys requested per SCAN round trip.
const SCAN_BATCH: usize = 100;

// == Redis Store ==
/// Redis-backed store.
///
/// Clones share one multiplexed connection. Lifetimes are written with
/// millisecond precision (`PSETEX`), and pattern removal walks the keyspace
/// with `SCAN`, so it is not atomic.
#[derive(Clone)]
pub struct RedisStore {
    connection: ConnectionManager,
    key_prefix: Option<String>,
}

impl fmt::Debug for RedisStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedisStore")
            .field("key_prefix", &self.key_prefix)
            .field("connection", &"<ConnectionManager>")
            .finish()
    }
}

impl RedisStore {
    // == Constructor ==
    /// Connects using the URL, prefix and timeouts from `config`.
    pub async fn connect(config: &Config) -> Result<Self> {
        let client = Client::open(config.redis_url.as_str())?;

        let manager_config = ConnectionManagerConfig::new()
            .set_connection_timeout(config.connect_timeout)
            .set_response_timeout(config.response_timeout);
        let connection = ConnectionManager::new_with_config(client, manager_config).await?;

        info!(
            "Connected to Redis at {} (key prefix: {:?})",
            config.redis_url, config.key_prefix
        );

        Ok(Self {
            connection,
            key_prefix: config.key_prefix.clone(),
        })
    }

    /// Connects to `url` with the remaining settings at their defaults.
    pub async fn with_url(url: impl Into<String>) -> Result<Self> {
        let config = Config {
            redis_url: url.into(),
            ..Config::default()
        };
        Self::connect(&config).await
    }

    fn key(&self, key: &str) -> String {
        prefixed(self.key_prefix.as_deref(), key)
    }
}

#[async_trait]
impl Store for RedisStore {
    async fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.set(self.key(key), value).await?;
        Ok(())
    }

    async fn set_raw_with_lifetime(
        &self,
        key: &str,
        value: &str,
        lifetime: Duration,
    ) -> Result<()> {
        let mut conn = self.connection.clone();
        // Redis rejects a zero expiry
        let millis = (lifetime.as_millis() as u64).max(1);
        let _: () = conn.pset_ex(self.key(key), value, millis).await?;
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(self.key(key)).await?;
        Ok(value)
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(self.key(key)).await?;
        Ok(exists)
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let mut conn = self.connection.clone();
        let _: usize = conn.del(self.key(key)).await?;
        Ok(())
    }

    async fn remove_with_pattern(&self, pattern: &str) -> Result<usize> {
        let full_pattern = self.key(pattern);
        let mut conn = self.connection.clone();
        let mut cursor = 0u64;
        let mut removed = 0usize;

        loop {
            let (next_cursor, keys): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(&full_pattern)
                .arg("COUNT")
                .arg(SCAN_BATCH)
                .query_async(&mut conn)
                .await?;

            if !keys.is_empty() {
                let deleted: usize = conn.del(&keys).await?;
                removed += deleted;
            }

            cursor = next_cursor;
            if cursor == 0 {
                break;
            }
        }

        debug!(pattern = %full_pattern, removed, "Removed keys by pattern");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoreExt;

    // These tests require a running Redis instance:
    // cargo test -- --ignored

    async fn test_store() -> RedisStore {
        let config = Config::default().with_key_prefix("cache_aside_test");
        RedisStore::connect(&config).await.unwrap()
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_set_and_get() {
        let store = test_store().await;

        store.set("key1", &"value1").await.unwrap();

        let result: Option<String> = store.get("key1").await.unwrap();
        assert_eq!(result, Some("value1".to_string()));
        assert!(store.contains("key1").await.unwrap());

        store.remove("key1").await.unwrap();
        assert!(!store.contains("key1").await.unwrap());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_lifetime_expires() {
        let store = test_store().await;

        store
            .set_with_lifetime("short", &7, Duration::from_millis(200))
            .await
            .unwrap();
        assert_eq!(store.get::<i32>("short").await.unwrap(), Some(7));

        tokio::time::sleep(Duration::from_millis(400)).await;
        assert!(store.get::<i32>("short").await.unwrap().is_none());
    }

    #[tokio::test]
    #[ignore = "Requires running Redis instance"]
    async fn test_redis_remove_with_pattern() {
        let store = test_store().await;

        store.set("user:1", &1).await.unwrap();
        store.set("user:2", &2).await.unwrap();
        store.set("order:1", &3).await.unwrap();

        let removed = store.remove_with_pattern("user:*").await.unwrap();
        assert_eq!(removed, 2);
        assert!(store.contains("order:1").await.unwrap());

        store.remove("order:1").await.unwrap();
    }

    #[tokio::test]
    async fn test_redis_unreachable_is_store_unavailable() {
        let config = Config {
            redis_url: "redis://127.0.0.1:1".to_string(),
            connect_timeout: Duration::from_millis(200),
            ..Config::default()
        };

        let err = RedisStore::connect(&config).await.unwrap_err();
        assert!(err.is_store_unavailable());
    }

    #[test]
    fn test_invalid_url_is_store_unavailable() {
        let err = tokio_test::block_on(RedisStore::with_url("not-a-url")).unwrap_err();
        assert!(err.is_store_unavailable());
    }
}
