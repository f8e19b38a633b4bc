//! Interval purge keeping the store bounded even with no request traffic.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::now_ms;
use crate::store::PostStore;

/// Spawn the fire-and-forget purge loop.
///
/// Failures are caught, logged, and skipped; the next tick retries. The loop
/// must never take the host process down with it.
pub fn spawn_purge_task(store: Arc<dyn PostStore>, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        // The first tick fires immediately and doubles as a startup sweep.
        loop {
            ticker.tick().await;
            match store.purge_expired(now_ms()) {
                Ok(0) => {}
                Ok(n) => tracing::debug!("Purged {} expired posts", n),
                Err(e) => tracing::warn!("Background purge failed: {:#}", e),
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PostCandidate;
    use crate::store::MemoryStore;

    #[tokio::test(start_paused = true)]
    async fn purges_on_interval_without_request_traffic() {
        let store = Arc::new(MemoryStore::new(1));
        store
            .create(PostCandidate {
                id: None,
                lat: Some(0.0),
                lng: Some(0.0),
                text: Some("soon gone".to_string()),
                mood: None,
                timestamp: 0,
            })
            .unwrap();

        let handle = spawn_purge_task(store.clone(), Duration::from_secs(300));
        tokio::time::sleep(Duration::from_secs(301)).await;

        // The interval task already swept the expired post, so a manual purge
        // finds nothing left to remove.
        assert_eq!(store.purge_expired(now_ms()).unwrap(), 0);
        handle.abort();
    }
}
