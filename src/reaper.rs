use crate::state::RoomRegistry;
use std::sync::Arc;
use std::time::Duration;

/// Spawn a background task that drops rooms nobody has used for `max_idle`
pub fn spawn_idle_room_reaper(
    registry: Arc<RoomRegistry>,
    max_idle: Duration,
    every: Duration,
) -> tokio::task::JoinHandle<()> {
    tracing::info!(
        "Idle room eviction enabled: after {:?}, checked every {:?}",
        max_idle,
        every
    );

    tokio::spawn(async move {
        loop {
            tokio::time::sleep(every).await;

            let removed = registry.evict_idle(max_idle).await;
            if removed > 0 {
                tracing::info!(
                    "Evicted {} idle rooms, {} remaining",
                    removed,
                    registry.room_count().await
                );
            }
        }
    })
}
