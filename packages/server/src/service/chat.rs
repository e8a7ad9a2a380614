//! Chat orchestration service.
//!
//! The explicitly constructed service object handed to every connection
//! handler and control-surface handler. It owns no state of its own; it
//! sequences the registry, directory, history store and broadcaster so that
//! each transport event or administrative command becomes one consistent
//! transition.

use std::sync::Arc;

use crate::domain::{
    BroadcastError, ConnectionId, DEFAULT_READ_LIMIT, DirectoryError, HistoryError, Message,
    RegistryError, Room, RoomId, Session, UserId,
};
use crate::service::{Broadcaster, ConnectionRegistry, HistoryStore, RoomDirectory};
use tamariba_shared::time::Clock;

pub struct ChatService {
    registry: Arc<ConnectionRegistry>,
    directory: Arc<RoomDirectory>,
    history: Arc<HistoryStore>,
    broadcaster: Arc<Broadcaster>,
    clock: Arc<dyn Clock>,
}

impl ChatService {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        directory: Arc<RoomDirectory>,
        history: Arc<HistoryStore>,
        broadcaster: Arc<Broadcaster>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            directory,
            history,
            broadcaster,
            clock,
        }
    }

    /// Register a newly authenticated connection.
    ///
    /// The identity provider has already supplied the user id; a connection
    /// it rejects never reaches this point.
    pub async fn connect(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: String,
    ) -> Result<Session, RegistryError> {
        let session = self
            .registry
            .register(connection_id, user_id, display_name, self.clock.now_millis())
            .await?;
        tracing::info!(
            "Connection '{}' registered as user '{}'",
            connection_id,
            session.user_id
        );
        Ok(session)
    }

    /// Tear down a connection: announce and unsubscribe from every joined
    /// room, then remove the session. Triggered by graceful close, error,
    /// or transport-enforced timeout alike.
    pub async fn disconnect(&self, connection_id: ConnectionId) -> Option<Session> {
        let session = self.registry.lookup(connection_id).await?;

        for room_id in &session.rooms {
            let announcement = Message::system(
                room_id.clone(),
                format!("{} left the room", session.display_name),
                self.clock.now_millis(),
            );
            if let Err(e) = self
                .broadcaster
                .publish(room_id, &announcement, Some(connection_id))
                .await
            {
                tracing::warn!("Failed to announce leave in room '{}': {}", room_id, e);
            }
            self.broadcaster
                .force_unsubscribe(connection_id, room_id)
                .await;
        }

        let removed = self.registry.unregister(connection_id).await;
        tracing::info!("Connection '{}' disconnected", connection_id);
        removed
    }

    /// Join a room. On a fresh join the other members get a system
    /// announcement; the joiner gets the room's recent history back.
    pub async fn join(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<Vec<Message>, BroadcastError> {
        let newly_joined = self.broadcaster.subscribe(connection_id, room_id).await?;

        if newly_joined
            && let Some(session) = self.registry.lookup(connection_id).await
        {
            let announcement = Message::system(
                room_id.clone(),
                format!("{} joined the room", session.display_name),
                self.clock.now_millis(),
            );
            if let Err(e) = self
                .broadcaster
                .publish(room_id, &announcement, Some(connection_id))
                .await
            {
                tracing::warn!("Failed to announce join in room '{}': {}", room_id, e);
            }
        }

        // Recent history for the joiner; an empty page if the room just
        // lost the deletion race.
        Ok(self
            .history
            .read(room_id, DEFAULT_READ_LIMIT, 0)
            .await
            .unwrap_or_default())
    }

    /// Leave a room, announcing it to the remaining members.
    pub async fn leave(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<(), BroadcastError> {
        let session = self.registry.lookup(connection_id).await;
        let was_member = self.broadcaster.unsubscribe(connection_id, room_id).await?;

        if was_member && let Some(session) = session {
            let announcement = Message::system(
                room_id.clone(),
                format!("{} left the room", session.display_name),
                self.clock.now_millis(),
            );
            if let Err(e) = self.broadcaster.publish(room_id, &announcement, None).await {
                tracing::warn!("Failed to announce leave in room '{}': {}", room_id, e);
            }
        }
        Ok(())
    }

    /// Append a message to the room's history and fan it out to every other
    /// subscriber. The sender is excluded so clients can render locally
    /// without receiving an echo.
    pub async fn send_message(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
        body: String,
    ) -> Result<Message, BroadcastError> {
        let session = self
            .registry
            .lookup(connection_id)
            .await
            .ok_or(BroadcastError::SessionNotFound(connection_id))?;
        if !self.directory.exists(room_id).await {
            return Err(BroadcastError::RoomNotFound(room_id.as_str().to_string()));
        }

        let message = Message::text(
            room_id.clone(),
            &session.user_id,
            &session.display_name,
            body,
            self.clock.now_millis(),
        );

        self.history
            .append(room_id, message.clone())
            .await
            .map_err(|e| match e {
                HistoryError::RoomNotFound(id) => BroadcastError::RoomNotFound(id),
            })?;
        self.broadcaster
            .publish(room_id, &message, Some(connection_id))
            .await?;
        Ok(message)
    }

    /// Change a session's display name.
    pub async fn rename(
        &self,
        connection_id: ConnectionId,
        display_name: String,
    ) -> Result<(), RegistryError> {
        self.registry
            .set_display_name(connection_id, display_name)
            .await
    }

    /// Upgrade a session once an external auth check succeeds. Idempotent.
    pub async fn verify_identity(
        &self,
        connection_id: ConnectionId,
        external_id: String,
    ) -> Result<(), RegistryError> {
        self.registry
            .set_verified_identity(connection_id, external_id)
            .await
    }

    /// Create an ad-hoc room together with its empty history.
    pub async fn create_room(
        &self,
        room_id: RoomId,
        name: String,
        description: Option<String>,
        created_by: Option<UserId>,
    ) -> Result<Room, DirectoryError> {
        let room = Room::new(
            room_id,
            name,
            description,
            created_by,
            self.clock.now_millis(),
        );
        // History first, metadata second: a sender who sees the room in the
        // directory must never find its history missing. On a duplicate id
        // the history already exists and `create` leaves it untouched.
        self.history.create(&room.id).await;
        self.directory.create(room).await
    }

    /// Delete a non-protected room.
    ///
    /// Members are unsubscribed first, then the history is discarded, then
    /// the metadata removed — a dangling membership pointing at a vanished
    /// room must never be observable.
    pub async fn delete_room(&self, room_id: &RoomId) -> Result<(), DirectoryError> {
        if RoomDirectory::is_protected(room_id) {
            return Err(DirectoryError::ProtectedRoom(room_id.as_str().to_string()));
        }
        if !self.directory.exists(room_id).await {
            return Err(DirectoryError::RoomNotFound(room_id.as_str().to_string()));
        }

        for member in self.registry.members_of(room_id).await {
            self.broadcaster
                .force_unsubscribe(member.connection_id, room_id)
                .await;
        }
        self.history.discard(room_id).await;
        self.directory.remove(room_id).await;
        tracing::info!("Room '{}' deleted", room_id);
        Ok(())
    }

    /// Read a page of a room's history.
    pub async fn read_history(
        &self,
        room_id: &RoomId,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<Message>, HistoryError> {
        self.history.read(room_id, limit, offset).await
    }

    /// All rooms, for the connect-time welcome frame and the control
    /// surface.
    pub async fn list_rooms(&self) -> Vec<Room> {
        self.directory.list().await
    }

    /// One room's metadata.
    pub async fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        self.directory.get(room_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MockTransport;
    use tamariba_shared::time::FixedClock;

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    fn room_id(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn service_with(transport: MockTransport) -> ChatService {
        let registry = Arc::new(ConnectionRegistry::new());
        let directory = Arc::new(RoomDirectory::with_protected_rooms(1_000));
        let history = Arc::new(HistoryStore::with_rooms(
            &RoomDirectory::protected_room_ids(),
        ));
        let broadcaster = Arc::new(Broadcaster::new(
            registry.clone(),
            directory.clone(),
            Arc::new(transport),
        ));
        ChatService::new(
            registry,
            directory,
            history,
            broadcaster,
            Arc::new(FixedClock::new(1_000)),
        )
    }

    fn permissive_transport() -> MockTransport {
        let mut transport = MockTransport::new();
        transport.expect_send().returning(|_, _| Ok(()));
        transport.expect_subscribe().return_const(());
        transport.expect_unsubscribe().return_const(());
        transport
    }

    #[tokio::test]
    async fn test_delete_protected_room_leaves_state_unchanged() {
        // given (precondition): a member and a message in "general"
        let chat = service_with(permissive_transport());
        let connection_id = ConnectionId::generate();
        chat.connect(connection_id, user("u1"), "Alice".to_string())
            .await
            .unwrap();
        let general = room_id("general");
        chat.join(connection_id, &general).await.unwrap();
        chat.send_message(connection_id, &general, "hi".to_string())
            .await
            .unwrap();

        // when (operation):
        let result = chat.delete_room(&general).await;

        // then (expected result): rejection, membership and history intact
        assert_eq!(
            result.unwrap_err(),
            DirectoryError::ProtectedRoom("general".to_string())
        );
        let session = chat.registry.lookup(connection_id).await.unwrap();
        assert!(session.is_member_of(&general));
        assert_eq!(chat.read_history(&general, 50, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_delete_room_clears_membership_and_history() {
        // given (precondition): an ad-hoc room with one member and a message
        let chat = service_with(permissive_transport());
        let connection_id = ConnectionId::generate();
        chat.connect(connection_id, user("u1"), "Alice".to_string())
            .await
            .unwrap();
        let lounge = room_id("lounge");
        chat.create_room(lounge.clone(), "Lounge".to_string(), None, Some(user("u1")))
            .await
            .unwrap();
        chat.join(connection_id, &lounge).await.unwrap();
        chat.send_message(connection_id, &lounge, "hi".to_string())
            .await
            .unwrap();

        // when (operation):
        chat.delete_room(&lounge).await.unwrap();

        // then (expected result): no session still references the room and
        // no stale messages are readable
        let session = chat.registry.lookup(connection_id).await.unwrap();
        assert!(!session.is_member_of(&lounge));
        assert_eq!(
            chat.read_history(&lounge, 50, 0).await.unwrap_err(),
            HistoryError::RoomNotFound("lounge".to_string())
        );
        assert_eq!(
            chat.delete_room(&lounge).await.unwrap_err(),
            DirectoryError::RoomNotFound("lounge".to_string())
        );
    }

    #[tokio::test]
    async fn test_create_room_twice_keeps_existing_history() {
        // given (precondition): an ad-hoc room with one message
        let chat = service_with(permissive_transport());
        let connection_id = ConnectionId::generate();
        chat.connect(connection_id, user("u1"), "Alice".to_string())
            .await
            .unwrap();
        let lounge = room_id("lounge");
        chat.create_room(lounge.clone(), "Lounge".to_string(), None, None)
            .await
            .unwrap();
        chat.join(connection_id, &lounge).await.unwrap();
        chat.send_message(connection_id, &lounge, "hi".to_string())
            .await
            .unwrap();

        // when (operation): create again with the same id
        let result = chat
            .create_room(lounge.clone(), "Lounge again".to_string(), None, None)
            .await;

        // then (expected result): duplicate rejected, history untouched
        assert_eq!(
            result.unwrap_err(),
            DirectoryError::RoomAlreadyExists("lounge".to_string())
        );
        assert_eq!(chat.read_history(&lounge, 50, 0).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_send_message_to_unknown_room() {
        // given (precondition):
        let chat = service_with(permissive_transport());
        let connection_id = ConnectionId::generate();
        chat.connect(connection_id, user("u1"), "Alice".to_string())
            .await
            .unwrap();

        // when (operation):
        let result = chat
            .send_message(connection_id, &room_id("nowhere"), "hi".to_string())
            .await;

        // then (expected result): clear room-not-found, no side effects
        assert_eq!(
            result.unwrap_err(),
            BroadcastError::RoomNotFound("nowhere".to_string())
        );
    }

    #[tokio::test]
    async fn test_disconnect_removes_session_and_membership() {
        // given (precondition):
        let chat = service_with(permissive_transport());
        let connection_id = ConnectionId::generate();
        chat.connect(connection_id, user("u1"), "Alice".to_string())
            .await
            .unwrap();
        let general = room_id("general");
        chat.join(connection_id, &general).await.unwrap();

        // when (operation):
        let removed = chat.disconnect(connection_id).await;

        // then (expected result):
        assert!(removed.is_some());
        assert!(chat.registry.lookup(connection_id).await.is_none());
        assert!(chat.registry.members_of(&general).await.is_empty());
        assert!(chat.disconnect(connection_id).await.is_none());
    }

    #[tokio::test]
    async fn test_join_returns_recent_history() {
        // given (precondition): an existing message in "general"
        let chat = service_with(permissive_transport());
        let sender = ConnectionId::generate();
        chat.connect(sender, user("u1"), "Alice".to_string())
            .await
            .unwrap();
        let general = room_id("general");
        chat.join(sender, &general).await.unwrap();
        chat.send_message(sender, &general, "hello".to_string())
            .await
            .unwrap();

        // when (operation): a second connection joins
        let joiner = ConnectionId::generate();
        chat.connect(joiner, user("u2"), "Bob".to_string())
            .await
            .unwrap();
        let snapshot = chat.join(joiner, &general).await.unwrap();

        // then (expected result):
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].body, "hello");
    }
}
