//! TTL Cleanup Task
//!
//! Background task that periodically sweeps expired entries out of every
//! partition. This is the active counterpart of the lazy expiry check done
//! on reads; both paths exist on purpose and are tested independently.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::cache::CacheStore;

/// Spawns a background task that periodically deletes expired cache entries.
///
/// The task loops forever, sleeping for `cleanup_interval_secs` between
/// sweeps, and takes a write lock on the store only for the sweep itself.
/// The returned handle can be aborted during shutdown.
pub fn spawn_cleanup_task(
    store: Arc<RwLock<CacheStore>>,
    cleanup_interval_secs: u64,
) -> JoinHandle<()> {
    let interval = Duration::from_secs(cleanup_interval_secs);

    tokio::spawn(async move {
        info!(
            interval_secs = cleanup_interval_secs,
            "starting TTL cleanup task"
        );

        loop {
            tokio::time::sleep(interval).await;

            let removed = {
                let mut store = store.write().await;
                store.cleanup()
            };

            if removed > 0 {
                info!(removed, "TTL cleanup removed expired entries");
            } else {
                debug!("TTL cleanup: no expired entries found");
            }
        }
    })
}
