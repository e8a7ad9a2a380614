//! Message history store.
//!
//! One bounded [`RoomHistory`] per room, each behind its own lock so that
//! appends to unrelated rooms never contend. The outer map lock is held only
//! long enough to clone the per-room handle.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;

use crate::domain::{HistoryError, Message, RoomHistory, RoomId};

/// Per-room message histories, keyed by room id.
pub struct HistoryStore {
    histories: Mutex<HashMap<RoomId, Arc<Mutex<RoomHistory>>>>,
}

impl HistoryStore {
    /// Create the store with empty histories for the given rooms.
    pub fn with_rooms(room_ids: &[RoomId]) -> Self {
        let mut histories = HashMap::new();
        for room_id in room_ids {
            histories.insert(room_id.clone(), Arc::new(Mutex::new(RoomHistory::new())));
        }
        Self {
            histories: Mutex::new(histories),
        }
    }

    /// Create an empty history for a newly created room. Idempotent.
    pub async fn create(&self, room_id: &RoomId) {
        let mut histories = self.histories.lock().await;
        histories
            .entry(room_id.clone())
            .or_insert_with(|| Arc::new(Mutex::new(RoomHistory::new())));
    }

    async fn history_of(&self, room_id: &RoomId) -> Result<Arc<Mutex<RoomHistory>>, HistoryError> {
        let histories = self.histories.lock().await;
        histories
            .get(room_id)
            .cloned()
            .ok_or_else(|| HistoryError::RoomNotFound(room_id.as_str().to_string()))
    }

    /// Append a message at the tail of a room's history, evicting the oldest
    /// entry under capacity pressure.
    ///
    /// Atomic with respect to concurrent appends to the same room; histories
    /// of different rooms are fully independent.
    pub async fn append(&self, room_id: &RoomId, message: Message) -> Result<(), HistoryError> {
        let history = self.history_of(room_id).await?;
        let mut history = history.lock().await;
        history.push(message);
        Ok(())
    }

    /// Read up to `limit` messages ending `offset` back from the most
    /// recent. Out-of-range indices are clamped, not errors.
    pub async fn read(
        &self,
        room_id: &RoomId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>, HistoryError> {
        let history = self.history_of(room_id).await?;
        let history = history.lock().await;
        Ok(history.read(limit, offset))
    }

    /// Drop a room's entire history. Used by room deletion.
    pub async fn discard(&self, room_id: &RoomId) {
        let mut histories = self.histories.lock().await;
        if histories.remove(room_id).is_some() {
            tracing::debug!("History for room '{}' discarded", room_id);
        }
    }

    /// Number of messages currently retained for a room.
    pub async fn len(&self, room_id: &RoomId) -> Result<usize, HistoryError> {
        let history = self.history_of(room_id).await?;
        let history = history.lock().await;
        Ok(history.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{HISTORY_CAPACITY, UserId};

    fn room_id(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn message(room: &RoomId, body: &str) -> Message {
        Message::text(
            room.clone(),
            &UserId::new("u1".to_string()).unwrap(),
            "Alice",
            body.to_string(),
            1_000,
        )
    }

    #[tokio::test]
    async fn test_append_and_read_in_order() {
        // given (precondition):
        let general = room_id("general");
        let store = HistoryStore::with_rooms(&[general.clone()]);

        // when (operation):
        store.append(&general, message(&general, "a")).await.unwrap();
        store.append(&general, message(&general, "b")).await.unwrap();

        // then (expected result):
        let messages = store.read(&general, 50, 0).await.unwrap();
        let bodies: Vec<&str> = messages.iter().map(|m| m.body.as_str()).collect();
        assert_eq!(bodies, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_append_with_unknown_room() {
        // given (precondition):
        let store = HistoryStore::with_rooms(&[]);
        let unknown = room_id("nowhere");

        // when (operation):
        let result = store.append(&unknown, message(&unknown, "hi")).await;

        // then (expected result):
        assert_eq!(
            result.unwrap_err(),
            HistoryError::RoomNotFound("nowhere".to_string())
        );
    }

    #[tokio::test]
    async fn test_capacity_bound_holds_under_many_appends() {
        // given (precondition):
        let general = room_id("general");
        let store = HistoryStore::with_rooms(&[general.clone()]);

        // when (operation): append one more than capacity
        for i in 0..=HISTORY_CAPACITY {
            store
                .append(&general, message(&general, &format!("msg-{i}")))
                .await
                .unwrap();
        }

        // then (expected result): oldest evicted, newest retained
        assert_eq!(store.len(&general).await.unwrap(), HISTORY_CAPACITY);
        let messages = store.read(&general, 200, 0).await.unwrap();
        assert_eq!(messages.len(), HISTORY_CAPACITY);
        assert_eq!(messages.first().unwrap().body, "msg-1");
        assert_eq!(
            messages.last().unwrap().body,
            format!("msg-{HISTORY_CAPACITY}")
        );
    }

    #[tokio::test]
    async fn test_discard_then_read_reports_room_not_found() {
        // given (precondition):
        let general = room_id("general");
        let store = HistoryStore::with_rooms(&[general.clone()]);
        store.append(&general, message(&general, "a")).await.unwrap();

        // when (operation):
        store.discard(&general).await;

        // then (expected result): no stale messages observable
        assert_eq!(
            store.read(&general, 50, 0).await.unwrap_err(),
            HistoryError::RoomNotFound("general".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_is_idempotent() {
        // given (precondition):
        let general = room_id("general");
        let store = HistoryStore::with_rooms(&[general.clone()]);
        store.append(&general, message(&general, "a")).await.unwrap();

        // when (operation): create again for an existing room
        store.create(&general).await;

        // then (expected result): existing history untouched
        assert_eq!(store.len(&general).await.unwrap(), 1);
    }
}
