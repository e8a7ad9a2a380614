//! Room broadcaster.
//!
//! Fan-out of a message to every subscriber of a room. Resolution of the
//! subscriber set always goes through the connection registry; there is no
//! separately stored membership that could drift from it.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    BroadcastError, ConnectionId, Message, RoomId, Transport,
};
use crate::service::{ConnectionRegistry, RoomDirectory};

/// One room member as reported by [`Broadcaster::room_members`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct RoomMember {
    pub user_id: String,
    pub display_name: String,
}

/// Best-effort fan-out over the transport.
pub struct Broadcaster {
    registry: Arc<ConnectionRegistry>,
    directory: Arc<RoomDirectory>,
    transport: Arc<dyn Transport>,
}

impl Broadcaster {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        directory: Arc<RoomDirectory>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            registry,
            directory,
            transport,
        }
    }

    /// Subscribe a connection to a room.
    ///
    /// Requires a registered session and an existing room. Idempotent:
    /// subscribing twice is a no-op success, and the transport is only
    /// instructed when the joined-room set actually changed.
    pub async fn subscribe(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<bool, BroadcastError> {
        if !self.directory.exists(room_id).await {
            return Err(BroadcastError::RoomNotFound(room_id.as_str().to_string()));
        }
        let newly_joined = self
            .registry
            .join_room(connection_id, room_id)
            .await
            .map_err(|_| BroadcastError::SessionNotFound(connection_id))?;
        if newly_joined {
            self.transport.subscribe(connection_id, room_id).await;
        }
        // Deletion may have completed between the existence check and the
        // join; roll the membership back rather than leave it dangling on a
        // vanished room.
        if !self.directory.exists(room_id).await {
            if let Ok(true) = self.registry.leave_room(connection_id, room_id).await {
                self.transport.unsubscribe(connection_id, room_id).await;
            }
            return Err(BroadcastError::RoomNotFound(room_id.as_str().to_string()));
        }
        if newly_joined {
            tracing::debug!("Connection '{}' subscribed to room '{}'", connection_id, room_id);
        }
        Ok(newly_joined)
    }

    /// Unsubscribe a connection from a room. Symmetric inverse of
    /// [`Broadcaster::subscribe`]; idempotent.
    pub async fn unsubscribe(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<bool, BroadcastError> {
        // Membership is removed before the room is consulted: an entry for a
        // room that vanished mid-join must always be cleanable through this
        // path, not only by a full disconnect.
        let was_member = self
            .registry
            .leave_room(connection_id, room_id)
            .await
            .map_err(|_| BroadcastError::SessionNotFound(connection_id))?;
        if was_member {
            self.transport.unsubscribe(connection_id, room_id).await;
            tracing::debug!(
                "Connection '{}' unsubscribed from room '{}'",
                connection_id,
                room_id
            );
            return Ok(true);
        }
        if !self.directory.exists(room_id).await {
            return Err(BroadcastError::RoomNotFound(room_id.as_str().to_string()));
        }
        Ok(false)
    }

    /// Remove a connection's membership during room deletion, without the
    /// room-existence check (metadata may already be on its way out).
    pub(crate) async fn force_unsubscribe(&self, connection_id: ConnectionId, room_id: &RoomId) {
        if let Ok(was_member) = self.registry.leave_room(connection_id, room_id).await
            && was_member
        {
            self.transport.unsubscribe(connection_id, room_id).await;
        }
    }

    /// Serialize `message` once and deliver it to every current subscriber
    /// of the room, except `exclude` if given.
    ///
    /// A subscriber whose transport send fails is logged and skipped; one
    /// failing subscriber never prevents delivery to the others. Returns the
    /// number of successful deliveries.
    ///
    /// A publish that races with room deletion fails with `RoomNotFound`.
    pub async fn publish(
        &self,
        room_id: &RoomId,
        message: &Message,
        exclude: Option<ConnectionId>,
    ) -> Result<usize, BroadcastError> {
        if !self.directory.exists(room_id).await {
            return Err(BroadcastError::RoomNotFound(room_id.as_str().to_string()));
        }

        let payload =
            serde_json::to_string(message).map_err(|e| BroadcastError::Encode(e.to_string()))?;

        let mut delivered = 0;
        for member in self.registry.members_of(room_id).await {
            if Some(member.connection_id) == exclude {
                continue;
            }
            match self.transport.send(member.connection_id, &payload).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to deliver to connection '{}' in room '{}': {}",
                        member.connection_id,
                        room_id,
                        e
                    );
                }
            }
        }
        Ok(delivered)
    }

    /// Current members of a room as (user id, display name) pairs, computed
    /// by scanning active sessions.
    pub async fn room_members(&self, room_id: &RoomId) -> Result<Vec<RoomMember>, BroadcastError> {
        if !self.directory.exists(room_id).await {
            return Err(BroadcastError::RoomNotFound(room_id.as_str().to_string()));
        }
        let mut members: Vec<RoomMember> = self
            .registry
            .members_of(room_id)
            .await
            .into_iter()
            .map(|s| RoomMember {
                user_id: s.user_id.as_str().to_string(),
                display_name: s.display_name,
            })
            .collect();
        // Stable output for clients and tests
        members.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(members)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{MockTransport, TransportError, UserId};

    fn room_id(id: &str) -> RoomId {
        RoomId::new(id.to_string()).unwrap()
    }

    fn user(id: &str) -> UserId {
        UserId::new(id.to_string()).unwrap()
    }

    async fn registered(registry: &ConnectionRegistry, user_id: &str) -> ConnectionId {
        let connection_id = ConnectionId::generate();
        registry
            .register(connection_id, user(user_id), user_id.to_string(), 1_000)
            .await
            .unwrap();
        connection_id
    }

    fn broadcaster_with(transport: MockTransport) -> (Broadcaster, Arc<ConnectionRegistry>) {
        let registry = Arc::new(ConnectionRegistry::new());
        let directory = Arc::new(RoomDirectory::with_protected_rooms(1_000));
        let broadcaster = Broadcaster::new(registry.clone(), directory, Arc::new(transport));
        (broadcaster, registry)
    }

    #[tokio::test]
    async fn test_subscribe_with_unknown_room() {
        // given (precondition):
        let (broadcaster, registry) = broadcaster_with(MockTransport::new());
        let connection_id = registered(&registry, "u1").await;

        // when (operation):
        let result = broadcaster.subscribe(connection_id, &room_id("nowhere")).await;

        // then (expected result): rejected, and no membership left behind
        assert_eq!(
            result.unwrap_err(),
            BroadcastError::RoomNotFound("nowhere".to_string())
        );
        let session = registry.lookup(connection_id).await.unwrap();
        assert!(session.rooms.is_empty());
    }

    #[tokio::test]
    async fn test_unsubscribe_cleans_membership_for_vanished_room() {
        // given (precondition): a membership entry whose room was deleted
        // after the join, the state a lost subscribe/delete race leaves
        let mut transport = MockTransport::new();
        transport.expect_unsubscribe().times(1).return_const(());
        let (broadcaster, registry) = broadcaster_with(transport);
        let connection_id = registered(&registry, "u1").await;
        let gone = room_id("gone");
        registry.join_room(connection_id, &gone).await.unwrap();

        // when (operation):
        let was_member = broadcaster.unsubscribe(connection_id, &gone).await.unwrap();

        // then (expected result): the stale entry is removable without a
        // full disconnect
        assert!(was_member);
        let session = registry.lookup(connection_id).await.unwrap();
        assert!(!session.is_member_of(&gone));
    }

    #[tokio::test]
    async fn test_unsubscribe_with_unknown_room_and_no_membership() {
        // given (precondition):
        let (broadcaster, registry) = broadcaster_with(MockTransport::new());
        let connection_id = registered(&registry, "u1").await;

        // when (operation):
        let result = broadcaster
            .unsubscribe(connection_id, &room_id("nowhere"))
            .await;

        // then (expected result):
        assert_eq!(
            result.unwrap_err(),
            BroadcastError::RoomNotFound("nowhere".to_string())
        );
    }

    #[tokio::test]
    async fn test_subscribe_with_unknown_session() {
        // given (precondition):
        let (broadcaster, _registry) = broadcaster_with(MockTransport::new());
        let connection_id = ConnectionId::generate();

        // when (operation):
        let result = broadcaster.subscribe(connection_id, &room_id("general")).await;

        // then (expected result):
        assert_eq!(
            result.unwrap_err(),
            BroadcastError::SessionNotFound(connection_id)
        );
    }

    #[tokio::test]
    async fn test_subscribe_twice_instructs_transport_once() {
        // given (precondition): transport expects exactly one subscribe call
        let mut transport = MockTransport::new();
        transport.expect_subscribe().times(1).return_const(());
        let (broadcaster, registry) = broadcaster_with(transport);
        let connection_id = registered(&registry, "u1").await;
        let general = room_id("general");

        // when (operation):
        let first = broadcaster.subscribe(connection_id, &general).await.unwrap();
        let second = broadcaster.subscribe(connection_id, &general).await.unwrap();

        // then (expected result): joined-room set identical to a single join
        assert!(first);
        assert!(!second);
        let session = registry.lookup(connection_id).await.unwrap();
        assert_eq!(session.rooms.len(), 1);
    }

    #[tokio::test]
    async fn test_publish_excludes_sender_and_skips_failures() {
        // given (precondition): three members, one of whom has a dead transport
        let registry = Arc::new(ConnectionRegistry::new());
        let directory = Arc::new(RoomDirectory::with_protected_rooms(1_000));
        let sender = registered(&registry, "u1").await;
        let healthy = registered(&registry, "u2").await;
        let broken = registered(&registry, "u3").await;

        let mut transport = MockTransport::new();
        transport.expect_subscribe().return_const(());
        transport
            .expect_send()
            .returning(move |connection, _payload| {
                assert_ne!(connection, sender, "sender must be excluded");
                if connection == broken {
                    Err(TransportError::ConnectionGone(connection))
                } else {
                    Ok(())
                }
            });

        let broadcaster = Broadcaster::new(registry.clone(), directory, Arc::new(transport));
        let general = room_id("general");
        for connection in [sender, healthy, broken] {
            broadcaster.subscribe(connection, &general).await.unwrap();
        }

        // when (operation):
        let message = Message::text(
            general.clone(),
            &user("u1"),
            "Alice",
            "hi".to_string(),
            1_000,
        );
        let delivered = broadcaster
            .publish(&general, &message, Some(sender))
            .await
            .unwrap();

        // then (expected result): one healthy recipient, one failure skipped
        assert_eq!(delivered, 1);
    }

    #[tokio::test]
    async fn test_publish_against_deleted_room_loses_the_race() {
        // given (precondition): no such room
        let (broadcaster, _registry) = broadcaster_with(MockTransport::new());
        let gone = room_id("gone");
        let message = Message::text(gone.clone(), &user("u1"), "Alice", "hi".to_string(), 1_000);

        // when (operation):
        let result = broadcaster.publish(&gone, &message, None).await;

        // then (expected result):
        assert_eq!(
            result.unwrap_err(),
            BroadcastError::RoomNotFound("gone".to_string())
        );
    }

    #[tokio::test]
    async fn test_room_members_reports_identity_pairs() {
        // given (precondition):
        let mut transport = MockTransport::new();
        transport.expect_subscribe().return_const(());
        let (broadcaster, registry) = broadcaster_with(transport);
        let a = registered(&registry, "u1").await;
        let b = registered(&registry, "u2").await;
        registry
            .set_display_name(a, "Alice".to_string())
            .await
            .unwrap();
        registry.set_display_name(b, "Bob".to_string()).await.unwrap();
        let general = room_id("general");
        broadcaster.subscribe(a, &general).await.unwrap();
        broadcaster.subscribe(b, &general).await.unwrap();

        // when (operation):
        let members = broadcaster.room_members(&general).await.unwrap();

        // then (expected result):
        assert_eq!(
            members,
            vec![
                RoomMember {
                    user_id: "u1".to_string(),
                    display_name: "Alice".to_string()
                },
                RoomMember {
                    user_id: "u2".to_string(),
                    display_name: "Bob".to_string()
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_unsubscribe_twice_is_idempotent() {
        // given (precondition):
        let mut transport = MockTransport::new();
        transport.expect_subscribe().times(1).return_const(());
        transport.expect_unsubscribe().times(1).return_const(());
        let (broadcaster, registry) = broadcaster_with(transport);
        let connection_id = registered(&registry, "u1").await;
        let general = room_id("general");
        broadcaster.subscribe(connection_id, &general).await.unwrap();

        // when (operation):
        let first = broadcaster.unsubscribe(connection_id, &general).await.unwrap();
        let second = broadcaster.unsubscribe(connection_id, &general).await.unwrap();

        // then (expected result):
        assert!(first);
        assert!(!second);
        let session = registry.lookup(connection_id).await.unwrap();
        assert!(session.rooms.is_empty());
    }
}
