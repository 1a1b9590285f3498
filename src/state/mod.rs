mod room;

pub use room::{status_for, ConnectionHandle, Room, OUTBOUND_QUEUE_CAPACITY};

use crate::challenge::{ChallengeCatalog, ChallengeSupplier};
use crate::error::{RoomError, RoomResult};
use crate::protocol::RoomSnapshot;
use crate::types::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};

/// Shared handle to one room; the mutex serializes everything that touches it
pub type SharedRoom = Arc<Mutex<Room>>;

/// Process-wide room registry.
///
/// The map lock is only held to find, insert or evict rooms. Work on a single
/// room happens under that room's own mutex, so rooms never contend.
pub struct RoomRegistry {
    rooms: RwLock<HashMap<RoomId, SharedRoom>>,
    challenges: Arc<dyn ChallengeSupplier>,
}

impl RoomRegistry {
    pub fn new(challenges: Arc<dyn ChallengeSupplier>) -> Self {
        Self {
            rooms: RwLock::new(HashMap::new()),
            challenges,
        }
    }

    /// Create an empty room with a freshly drawn challenge
    pub async fn create_room(&self, category: ChallengeCategory) -> RoomId {
        let challenge = self.challenges.next_challenge(category);

        let mut rooms = self.rooms.write().await;
        let room_id = loop {
            let id = ulid::Ulid::new().to_string();
            if !rooms.contains_key(&id) {
                break id;
            }
        };

        rooms.insert(
            room_id.clone(),
            Arc::new(Mutex::new(Room::new(room_id.clone(), challenge))),
        );
        tracing::info!("Created {} room {} ({} rooms)", category, room_id, rooms.len());
        room_id
    }

    /// Reserve a seat in a room, returning the player's id
    pub async fn authorize_join(
        &self,
        room_id: &str,
        requested: Option<PlayerId>,
    ) -> RoomResult<PlayerId> {
        let room = self.get_room(room_id).await.ok_or(RoomError::RoomNotFound)?;
        let player_id = room.lock().await.authorize(requested)?;
        tracing::info!("Authorized player {} for room {}", player_id, room_id);
        Ok(player_id)
    }

    pub async fn get_room(&self, room_id: &str) -> Option<SharedRoom> {
        self.rooms.read().await.get(room_id).cloned()
    }

    pub async fn room_snapshot(&self, room_id: &str) -> RoomResult<RoomSnapshot> {
        let room = self.get_room(room_id).await.ok_or(RoomError::RoomNotFound)?;
        let snapshot = room.lock().await.snapshot();
        Ok(snapshot)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.read().await.len()
    }

    /// Remove rooms nobody is connected to and that saw no activity for `max_idle`.
    /// Returns how many were removed.
    ///
    /// Room mutexes are awaited without the map lock. The write lock is taken
    /// only for the removal pass, which re-checks each candidate with
    /// `try_lock` and skips any room that is busy or has woken up.
    pub async fn evict_idle(&self, max_idle: Duration) -> usize {
        let rooms: Vec<(RoomId, SharedRoom)> = self
            .rooms
            .read()
            .await
            .iter()
            .map(|(id, room)| (id.clone(), room.clone()))
            .collect();

        let mut candidates = Vec::new();
        for (id, room) in rooms {
            if room.lock().await.is_idle(max_idle) {
                candidates.push(id);
            }
        }
        if candidates.is_empty() {
            return 0;
        }

        let mut rooms = self.rooms.write().await;
        let mut evicted = 0;
        for id in candidates {
            let still_idle = match rooms.get(&id).map(|room| room.try_lock()) {
                Some(Ok(mut room)) if room.is_idle(max_idle) => {
                    room.close();
                    true
                }
                _ => false,
            };
            if still_idle {
                rooms.remove(&id);
                evicted += 1;
                tracing::debug!("Evicted idle room {}", id);
            }
        }
        evicted
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(Arc::new(ChallengeCatalog::builtin()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::ServerEvent;
    use tokio::sync::mpsc::channel;

    struct FixedChallenge;

    impl ChallengeSupplier for FixedChallenge {
        fn next_challenge(&self, category: ChallengeCategory) -> Challenge {
            match category {
                ChallengeCategory::Regex => Challenge::Regex {
                    pattern: "a+b".into(),
                },
                ChallengeCategory::Strings => Challenge::Strings {
                    options: vec!["ab".into(), "aab".into()],
                },
            }
        }
    }

    fn registry() -> RoomRegistry {
        RoomRegistry::new(Arc::new(FixedChallenge))
    }

    #[tokio::test]
    async fn test_create_room_pins_challenge() {
        let registry = registry();
        let room_id = registry.create_room(ChallengeCategory::Strings).await;

        let room = registry.get_room(&room_id).await.expect("room exists");
        let room = room.lock().await;
        assert_eq!(room.id(), room_id);
        assert_eq!(
            room.challenge(),
            &Challenge::Strings {
                options: vec!["ab".into(), "aab".into()]
            }
        );
        assert!(room.authorized_players().is_empty());
        assert_eq!(room.connected_count(), 0);
    }

    #[tokio::test]
    async fn test_room_ids_are_unique() {
        let registry = registry();
        let a = registry.create_room(ChallengeCategory::Regex).await;
        let b = registry.create_room(ChallengeCategory::Regex).await;
        assert_ne!(a, b);
        assert_eq!(registry.room_count().await, 2);
    }

    #[tokio::test]
    async fn test_authorize_unknown_room() {
        let registry = registry();
        let result = registry.authorize_join("nope", None).await;
        assert_eq!(result, Err(RoomError::RoomNotFound));
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_third_player_rejected() {
        let registry = registry();
        let room_id = registry.create_room(ChallengeCategory::Regex).await;

        let p1 = registry.authorize_join(&room_id, None).await.unwrap();
        let p2 = registry.authorize_join(&room_id, None).await.unwrap();
        let third = registry.authorize_join(&room_id, None).await;
        assert_eq!(third, Err(RoomError::RoomFull));

        let room = registry.get_room(&room_id).await.unwrap();
        assert_eq!(room.lock().await.authorized_players(), &[p1, p2]);
    }

    #[tokio::test]
    async fn test_racing_for_last_seat() {
        let registry = Arc::new(registry());
        let room_id = registry.create_room(ChallengeCategory::Regex).await;
        registry.authorize_join(&room_id, None).await.unwrap();

        let mut tasks = Vec::new();
        for _ in 0..16 {
            let registry = registry.clone();
            let room_id = room_id.clone();
            tasks.push(tokio::spawn(async move {
                registry.authorize_join(&room_id, None).await
            }));
        }

        let mut winners = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(_) => winners += 1,
                Err(e) => assert_eq!(e, RoomError::RoomFull),
            }
        }
        assert_eq!(winners, 1);

        let room = registry.get_room(&room_id).await.unwrap();
        assert_eq!(room.lock().await.authorized_players().len(), ROOM_CAPACITY);
    }

    #[tokio::test]
    async fn test_snapshot() {
        let registry = registry();
        let room_id = registry.create_room(ChallengeCategory::Regex).await;
        registry.authorize_join(&room_id, None).await.unwrap();

        let snapshot = registry.room_snapshot(&room_id).await.unwrap();
        assert_eq!(snapshot.room_id, room_id);
        assert_eq!(snapshot.question_type, ChallengeCategory::Regex);
        assert_eq!(snapshot.authorized_players, 1);

        assert_eq!(
            registry.room_snapshot("missing").await,
            Err(RoomError::RoomNotFound)
        );
    }

    #[tokio::test]
    async fn test_evict_idle_spares_occupied_rooms() {
        let registry = registry();
        let empty = registry.create_room(ChallengeCategory::Regex).await;
        let occupied = registry.create_room(ChallengeCategory::Strings).await;

        let player = registry.authorize_join(&occupied, None).await.unwrap();
        let (tx, _rx) = channel::<ServerEvent>(OUTBOUND_QUEUE_CAPACITY);
        registry
            .get_room(&occupied)
            .await
            .unwrap()
            .lock()
            .await
            .attach(player, ConnectionHandle::new(tx))
            .unwrap();

        // Nothing has been idle for an hour
        assert_eq!(registry.evict_idle(Duration::from_secs(3600)).await, 0);

        let stale = registry.get_room(&empty).await.unwrap();
        assert_eq!(registry.evict_idle(Duration::ZERO).await, 1);
        assert!(registry.get_room(&empty).await.is_none());
        assert!(registry.get_room(&occupied).await.is_some());

        // Anyone still holding the evicted room sees it as gone
        assert_eq!(
            stale.lock().await.authorize(None),
            Err(RoomError::RoomNotFound)
        );
    }

    #[tokio::test]
    async fn test_evict_idle_does_not_block_lookups() {
        let registry = Arc::new(registry());
        let busy = registry.create_room(ChallengeCategory::Regex).await;
        let other = registry.create_room(ChallengeCategory::Regex).await;

        let busy_room = registry.get_room(&busy).await.unwrap();
        let guard = busy_room.lock().await;

        let evictor = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.evict_idle(Duration::ZERO).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        // The sweep is parked on the busy room, but the map is still readable
        let lookup =
            tokio::time::timeout(Duration::from_millis(500), registry.get_room(&other)).await;
        assert!(matches!(lookup, Ok(Some(_))));
        assert!(!evictor.is_finished());

        drop(guard);
        assert_eq!(evictor.await.unwrap(), 2);
        assert_eq!(registry.room_count().await, 0);
    }

    #[tokio::test]
    async fn test_evict_idle_skips_room_that_woke_up() {
        let registry = Arc::new(registry());
        let room_id = registry.create_room(ChallengeCategory::Regex).await;
        let room = registry.get_room(&room_id).await.unwrap();
        let player = room.lock().await.authorize(None).unwrap();

        // Hold the room so the sweep waits on it, then connect before releasing
        let mut guard = room.lock().await;
        let evictor = {
            let registry = registry.clone();
            tokio::spawn(async move { registry.evict_idle(Duration::ZERO).await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;

        let (tx, _rx) = channel::<ServerEvent>(OUTBOUND_QUEUE_CAPACITY);
        guard.attach(player, ConnectionHandle::new(tx)).unwrap();
        drop(guard);

        assert_eq!(evictor.await.unwrap(), 0);
        assert!(registry.get_room(&room_id).await.is_some());
    }
}
