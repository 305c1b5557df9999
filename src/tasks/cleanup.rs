//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries out of an
//! [`InMemoryStore`]. Reads already skip expired entries; the sweep only
//! reclaims memory for keys nobody reads again.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::store::InMemoryStore;

/// Spawns a background task that periodically removes expired entries.
///
/// The task loops until aborted, sleeping `cleanup_interval_secs` between
/// sweeps.
///
/// # Example
/// ```ignore
/// let store = Arc::new(InMemoryStore::new());
/// let cleanup_handle = spawn_cleanup_task(store.clone(), 1);
/// // Later, during shutdown:
/// cleanup_handle.abort();
/// ```
pub fn spawn_cleanup_task(store: Arc<InMemoryStore>, cleanup_interval_secs: u64) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs.max(1));

    tokio::spawn(async move {
        info!(
            "Starting TTL cleanup task with interval of {} seconds",
            interval.as_secs()
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = store.cleanup_expired().await;

            if removed > 0 {
                info!("TTL cleanup: removed {} expired entries", removed);
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
