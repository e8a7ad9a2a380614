//! Presence queries and server-initiated notification pushes.

use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;

use crate::domain::{BroadcastError, Message, NotifyError, RoomId, Transport, UserId};
use crate::service::{Broadcaster, ConnectionRegistry};
use tamariba_shared::time::Clock;

/// Where a notification should be delivered.
///
/// The discriminator must be exactly `user` or `room`; anything else is
/// rejected before any resolution is attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationTarget {
    User,
    Room,
}

impl FromStr for NotificationTarget {
    type Err = NotifyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "user" => Ok(Self::User),
            "room" => Ok(Self::Room),
            other => Err(NotifyError::InvalidTargetType(other.to_string())),
        }
    }
}

/// Envelope pushed to each resolved connection of a user target.
#[derive(Debug, Serialize)]
struct NotificationEnvelope<'a> {
    kind: &'static str,
    event: &'a str,
    payload: &'a Value,
}

/// Presence and notification emitter.
pub struct Notifier {
    registry: Arc<ConnectionRegistry>,
    broadcaster: Arc<Broadcaster>,
    transport: Arc<dyn Transport>,
    clock: Arc<dyn Clock>,
}

impl Notifier {
    pub fn new(
        registry: Arc<ConnectionRegistry>,
        broadcaster: Arc<Broadcaster>,
        transport: Arc<dyn Transport>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            registry,
            broadcaster,
            transport,
            clock,
        }
    }

    /// Whether the user has at least one registered connection. Any
    /// registered connection counts, verified or not.
    pub async fn is_online(&self, user_id: &UserId) -> bool {
        !self.registry.sessions_for_user(user_id).await.is_empty()
    }

    /// Total active sessions. A user connected from two devices counts
    /// twice, matching the registry's connection-keyed model.
    pub async fn online_count(&self) -> usize {
        self.registry.session_count().await
    }

    /// Push `{event, payload}` to every session of a user.
    ///
    /// Zero matches is not an error; it delivers to nobody and reports 0.
    /// Individual transport failures are logged and skipped.
    pub async fn notify_user(
        &self,
        user_id: &UserId,
        event: &str,
        payload: &Value,
    ) -> Result<usize, NotifyError> {
        let envelope = NotificationEnvelope {
            kind: "notification",
            event,
            payload,
        };
        let serialized =
            serde_json::to_string(&envelope).map_err(|e| NotifyError::Encode(e.to_string()))?;

        let mut delivered = 0;
        for session in self.registry.sessions_for_user(user_id).await {
            match self.transport.send(session.connection_id, &serialized).await {
                Ok(()) => delivered += 1,
                Err(e) => {
                    tracing::warn!(
                        "Failed to notify user '{}' on connection '{}': {}",
                        user_id,
                        session.connection_id,
                        e
                    );
                }
            }
        }
        tracing::debug!(
            "Notified user '{}' with event '{}' on {} connection(s)",
            user_id,
            event,
            delivered
        );
        Ok(delivered)
    }

    /// Wrap `{event, payload}` in a notification-kind message and publish it
    /// to every subscriber of the room.
    pub async fn notify_room(
        &self,
        room_id: &RoomId,
        event: &str,
        payload: &Value,
    ) -> Result<usize, NotifyError> {
        let body = serde_json::json!({ "event": event, "payload": payload }).to_string();
        let message = Message::notification(room_id.clone(), body, self.clock.now_millis());
        self.broadcaster
            .publish(room_id, &message, None)
            .await
            .map_err(|e| match e {
                BroadcastError::Encode(reason) => NotifyError::Encode(reason),
                _ => NotifyError::RoomNotFound(room_id.as_str().to_string()),
            })
    }
}
