//! Room directory.
//!
//! Exclusively owns room metadata. Deletion is a cross-component operation
//! and lives in [`crate::service::ChatService`]; this component only offers
//! the metadata CRUD plus the protected-room check.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::domain::{DirectoryError, Room, RoomId};

/// Rooms that always exist and can never be deleted: (id, display name).
const PROTECTED_ROOMS: &[(&str, &str)] = &[
    ("general", "General"),
    ("development", "Development"),
    ("random", "Random"),
];

/// Directory of all rooms, keyed by room id.
pub struct RoomDirectory {
    rooms: Mutex<HashMap<RoomId, Room>>,
}

impl RoomDirectory {
    /// Create the directory with the protected rooms already present.
    ///
    /// Called exactly once per process lifetime, before any join/leave
    /// traffic is accepted.
    pub fn with_protected_rooms(created_at: i64) -> Self {
        let mut rooms = HashMap::new();
        for (id, name) in PROTECTED_ROOMS {
            let room_id =
                RoomId::new((*id).to_string()).expect("protected room ids are valid by construction");
            let room = Room::new(room_id.clone(), (*name).to_string(), None, None, created_at);
            rooms.insert(room_id, room);
        }
        Self {
            rooms: Mutex::new(rooms),
        }
    }

    /// Room ids of the protected set.
    pub fn protected_room_ids() -> Vec<RoomId> {
        PROTECTED_ROOMS
            .iter()
            .map(|(id, _)| {
                RoomId::new((*id).to_string()).expect("protected room ids are valid by construction")
            })
            .collect()
    }

    /// Whether the given id belongs to the protected set.
    pub fn is_protected(room_id: &RoomId) -> bool {
        PROTECTED_ROOMS.iter().any(|(id, _)| *id == room_id.as_str())
    }

    /// Insert a new room. Fails with [`DirectoryError::RoomAlreadyExists`]
    /// if the id is taken.
    pub async fn create(&self, room: Room) -> Result<Room, DirectoryError> {
        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(&room.id) {
            return Err(DirectoryError::RoomAlreadyExists(
                room.id.as_str().to_string(),
            ));
        }
        rooms.insert(room.id.clone(), room.clone());
        tracing::info!("Room '{}' created", room.id);
        Ok(room)
    }

    /// Look up a room's metadata.
    pub async fn get(&self, room_id: &RoomId) -> Option<Room> {
        let rooms = self.rooms.lock().await;
        rooms.get(room_id).cloned()
    }

    /// Whether a room exists.
    pub async fn exists(&self, room_id: &RoomId) -> bool {
        let rooms = self.rooms.lock().await;
        rooms.contains_key(room_id)
    }

    /// All rooms, in no particular order.
    pub async fn list(&self) -> Vec<Room> {
        let rooms = self.rooms.lock().await;
        rooms.values().cloned().collect()
    }

    /// Remove a room's metadata, returning it if present.
    ///
    /// Does not check the protected set; [`crate::service::ChatService`]
    /// does that before starting the deletion sequence.
    pub async fn remove(&self, room_id: &RoomId) -> Option<Room> {
        let mut rooms = self.rooms.lock().await;
        let removed = rooms.remove(room_id);
        if removed.is_some() {
            tracing::info!("Room '{}' removed", room_id);
        }
        removed
    }

    /// Number of rooms.
    pub async fn count(&self) -> usize {
        let rooms = self.rooms.lock().await;
        rooms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn room_id(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn ad_hoc_room(id: &str) -> Room {
        Room::new(room_id(id), id.to_string(), None, None, 1_000)
    }

    #[tokio::test]
    async fn test_with_protected_rooms_creates_fixed_set() {
        // given / when (operation):
        let directory = RoomDirectory::with_protected_rooms(1_000);

        // then (expected result):
        assert_eq!(directory.count().await, 3);
        for id in ["general", "development", "random"] {
            let room = directory.get(&room_id(id)).await.unwrap();
            assert!(room.created_by.is_none());
        }
        assert_eq!(
            directory.get(&room_id("general")).await.unwrap().name,
            "General"
        );
    }

    #[tokio::test]
    async fn test_create_with_duplicate_id() {
        // given (precondition):
        let directory = RoomDirectory::with_protected_rooms(1_000);

        // when (operation):
        let result = directory.create(ad_hoc_room("general")).await;

        // then (expected result):
        assert_eq!(
            result.unwrap_err(),
            DirectoryError::RoomAlreadyExists("general".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_and_remove_ad_hoc_room() {
        // given (precondition):
        let directory = RoomDirectory::with_protected_rooms(1_000);

        // when (operation):
        directory.create(ad_hoc_room("hr-lounge")).await.unwrap();

        // then (expected result):
        assert!(directory.exists(&room_id("hr-lounge")).await);
        assert_eq!(directory.count().await, 4);

        let removed = directory.remove(&room_id("hr-lounge")).await;
        assert!(removed.is_some());
        assert!(!directory.exists(&room_id("hr-lounge")).await);
    }

    #[test]
    fn test_is_protected_for_fixed_set_only() {
        // given / when / then (expected result):
        assert!(RoomDirectory::is_protected(&room_id("general")));
        assert!(RoomDirectory::is_protected(&room_id("development")));
        assert!(RoomDirectory::is_protected(&room_id("random")));
        assert!(!RoomDirectory::is_protected(&room_id("hr-lounge")));
    }
}
