//! Store Handle Module
//!
//! Owns the store connection and its background work for whoever builds it.
//! Providers only borrow the shared store; dropping the handle stops the
//! sweeper but leaves any outstanding provider usable.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::{Backend, Config};
use crate::error::Result;
use crate::provider::CacheProvider;
use crate::store::{InMemoryStore, RedisStore, Store};
use crate::tasks::spawn_cleanup_task;

// == Store Handle ==
/// Scoped owner of a configured store.
pub struct StoreHandle {
    store: Arc<dyn Store>,
    backend: Option<Backend>,
    cleanup: Option<JoinHandle<()>>,
}

impl StoreHandle {
    // == Connect ==
    /// Builds the backend selected by `config`.
    ///
    /// The in-memory backend gets a cleanup task, so this must run inside a
    /// tokio runtime.
    pub async fn connect(config: &Config) -> Result<Self> {
        match config.backend {
            Backend::Memory => {
                let store = Arc::new(match &config.key_prefix {
                    Some(prefix) => InMemoryStore::with_key_prefix(prefix.clone()),
                    None => InMemoryStore::new(),
                });
                let cleanup = spawn_cleanup_task(store.clone(), config.cleanup_interval);
                info!("In-memory store initialized");

                Ok(Self {
                    store,
                    backend: Some(Backend::Memory),
                    cleanup: Some(cleanup),
                })
            }
            Backend::Redis => {
                let store = RedisStore::connect(config).await?;

                Ok(Self {
                    store: Arc::new(store),
                    backend: Some(Backend::Redis),
                    cleanup: None,
                })
            }
        }
    }

    /// Wraps a store built elsewhere. No background work is attached.
    pub fn from_store(store: Arc<dyn Store>) -> Self {
        Self {
            store,
            backend: None,
            cleanup: None,
        }
    }

    /// Backend this handle was connected with, if built from config.
    pub fn backend(&self) -> Option<Backend> {
        self.backend
    }

    /// Shared store handle.
    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    /// New provider over the shared store.
    pub fn provider(&self) -> CacheProvider {
        CacheProvider::new(self.store())
    }
}

impl Drop for StoreHandle {
    fn drop(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup.abort();
            warn!("Cleanup task aborted");
        }
    }
}
