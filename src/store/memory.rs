//! In-Memory Store Module
//!
//! Process-local [`Store`] backed by a HashMap with lazy TTL expiration.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use glob::Pattern;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;

use super::{prefixed, Store, StoreEntry};
use crate::error::{CacheError, Result};

// == In-Memory Store ==
/// HashMap-backed store with per-entry deadlines.
///
/// Expired entries are dropped when read, or in bulk by
/// [`cleanup_expired`](Self::cleanup_expired).
#[derive(Debug, Default)]
pub struct InMemoryStore {
    /// Key-value storage
    entries: RwLock<HashMap<String, StoreEntry>>,
    /// Namespace prefix applied to keys and patterns
    key_prefix: Option<String>,
}

impl InMemoryStore {
    // == Constructor ==
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that namespaces every key under `prefix`.
    pub fn with_key_prefix(prefix: impl Into<String>) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            key_prefix: Some(prefix.into()),
        }
    }

    fn key(&self, key: &str) -> String {
        prefixed(self.key_prefix.as_deref(), key)
    }

    async fn insert(&self, key: &str, value: &str, lifetime: Option<Duration>) {
        let entry = StoreEntry::new(value.to_string(), lifetime);
        self.entries.write().await.insert(self.key(key), entry);
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the store.
    ///
    /// Returns the number of entries removed.
    pub async fn cleanup_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.write().await;
        let before = entries.len();

        entries.retain(|_, entry| !entry.is_expired_at(now));

        before - entries.len()
    }

    // == Length ==
    /// Returns the number of live entries.
    pub async fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .read()
            .await
            .values()
            .filter(|entry| !entry.is_expired_at(now))
            .count()
    }

    // == Is Empty ==
    /// Returns true if no live entry remains.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl Store for InMemoryStore {
    async fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        self.insert(key, value, None).await;
        Ok(())
    }

    async fn set_raw_with_lifetime(
        &self,
        key: &str,
        value: &str,
        lifetime: Duration,
    ) -> Result<()> {
        self.insert(key, value, Some(lifetime)).await;
        Ok(())
    }

    async fn get_raw(&self, key: &str) -> Result<Option<String>> {
        let key = self.key(key);

        {
            let entries = self.entries.read().await;
            match entries.get(&key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        // Expired: drop it unless a fresh write landed in between
        let mut entries = self.entries.write().await;
        if entries.get(&key).is_some_and(StoreEntry::is_expired) {
            entries.remove(&key);
            debug!(key = %key, "Dropped expired entry on read");
        }
        Ok(entries.get(&key).map(|entry| entry.value.clone()))
    }

    async fn contains(&self, key: &str) -> Result<bool> {
        let entries = self.entries.read().await;
        Ok(entries
            .get(&self.key(key))
            .is_some_and(|entry| !entry.is_expired()))
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.entries.write().await.remove(&self.key(key));
        Ok(())
    }

    async fn remove_with_pattern(&self, pattern: &str) -> Result<usize> {
        let full_pattern = self.key(pattern);
        let matcher = Pattern::new(&full_pattern).map_err(|e| {
            CacheError::InvalidPattern(format!("'{}': {}", pattern, e))
        })?;

        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|key, _| !matcher.matches(key));
        let removed = before - entries.len();

        debug!(pattern = %full_pattern, removed, "Removed keys by pattern");
        Ok(removed)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_store_new() {
        let store = InMemoryStore::new();
        assert_eq!(store.len().await, 0);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_store_set_and_get() {
        let store = InMemoryStore::new();

        store.set_raw("key1", "value1").await.unwrap();
        let value = store.get_raw("key1").await.unwrap();

        assert_eq!(value.as_deref(), Some("value1"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_store_get_nonexistent() {
        let store = InMemoryStore::new();

        assert!(store.get_raw("nonexistent").await.unwrap().is_none());
        assert!(!store.contains("nonexistent").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_remove_is_idempotent() {
        let store = InMemoryStore::new();

        store.set_raw("key1", "value1").await.unwrap();
        store.remove("key1").await.unwrap();
        store.remove("key1").await.unwrap();

        assert!(store.is_empty().await);
        assert!(store.get_raw("key1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_store_overwrite() {
        let store = InMemoryStore::new();

        store.set_raw("key1", "value1").await.unwrap();
        store.set_raw("key1", "value2").await.unwrap();

        assert_eq!(store.get_raw("key1").await.unwrap().as_deref(), Some("value2"));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_lifetime_expiration() {
        let store = InMemoryStore::new();

        store
            .set_raw_with_lifetime("key1", "value1", Duration::from_secs(1))
            .await
            .unwrap();
        assert!(store.contains("key1").await.unwrap());

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert!(!store.contains("key1").await.unwrap());
        assert!(store.get_raw("key1").await.unwrap().is_none());
        // The read dropped it
        assert_eq!(store.entries.read().await.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_overwrite_without_lifetime_clears_deadline() {
        let store = InMemoryStore::new();

        store
            .set_raw_with_lifetime("key1", "value1", Duration::from_secs(1))
            .await
            .unwrap();
        store.set_raw("key1", "value2").await.unwrap();

        tokio::time::advance(Duration::from_secs(5)).await;
        assert_eq!(store.get_raw("key1").await.unwrap().as_deref(), Some("value2"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_store_cleanup_expired() {
        let store = InMemoryStore::new();

        store
            .set_raw_with_lifetime("key1", "value1", Duration::from_secs(1))
            .await
            .unwrap();
        store
            .set_raw_with_lifetime("key2", "value2", Duration::from_secs(10))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_millis(1100)).await;

        assert_eq!(store.cleanup_expired().await, 1);
        assert_eq!(store.len().await, 1);
        assert!(store.get_raw("key2").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_store_remove_with_pattern() {
        let store = InMemoryStore::new();

        store.set_raw("user:1", "a").await.unwrap();
        store.set_raw("user:2:profile", "b").await.unwrap();
        store.set_raw("session:1", "c").await.unwrap();
        store.set_raw("users", "d").await.unwrap();

        let removed = store.remove_with_pattern("user:*").await.unwrap();

        assert_eq!(removed, 2);
        assert!(!store.contains("user:1").await.unwrap());
        assert!(!store.contains("user:2:profile").await.unwrap());
        assert!(store.contains("session:1").await.unwrap());
        assert!(store.contains("users").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_remove_with_pattern_single_char() {
        let store = InMemoryStore::new();

        store.set_raw("h1", "a").await.unwrap();
        store.set_raw("h22", "b").await.unwrap();

        assert_eq!(store.remove_with_pattern("h?").await.unwrap(), 1);
        assert!(store.contains("h22").await.unwrap());
    }

    #[tokio::test]
    async fn test_store_invalid_pattern() {
        let store = InMemoryStore::new();

        let result = store.remove_with_pattern("user:[").await;
        assert!(matches!(result, Err(CacheError::InvalidPattern(_))));
    }

    #[tokio::test]
    async fn test_store_key_prefix_isolates_namespaces() {
        let store = InMemoryStore::with_key_prefix("tenant-a");

        store.set_raw("user:1", "a").await.unwrap();
        assert!(store.entries.read().await.contains_key("tenant-a:user:1"));

        store
            .entries
            .write()
            .await
            .insert("other:user:2".to_string(), StoreEntry::new("b".into(), None));

        assert_eq!(store.remove_with_pattern("user:*").await.unwrap(), 1);
        assert!(store.entries.read().await.contains_key("other:user:2"));
    }
}
