//! Chat message entity.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ids::{RoomId, UserId};

/// Sender identity used for server-originated messages
const SYSTEM_SENDER_ID: &str = "system";
const SYSTEM_SENDER_NAME: &str = "System";

/// What kind of event a message records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    /// Ordinary chat text sent by a client
    Text,
    /// Server-originated room announcement (joins, leaves)
    System,
    /// Server-initiated push wrapping `{event, payload}`
    Notification,
}

/// An immutable record of one chat event.
///
/// Once appended to a room's history a message is never mutated, only
/// evicted by capacity pressure.
#[derive(Debug, Clone, Serialize)]
pub struct Message {
    pub id: Uuid,
    pub room_id: RoomId,
    pub kind: MessageKind,
    pub body: String,
    pub sender_id: String,
    pub sender_name: String,
    /// Unix timestamp (UTC, milliseconds)
    pub timestamp: i64,
}

impl Message {
    /// Build an ordinary chat message sent by a client.
    pub fn text(
        room_id: RoomId,
        sender_id: &UserId,
        sender_name: &str,
        body: String,
        timestamp: i64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            kind: MessageKind::Text,
            body,
            sender_id: sender_id.as_str().to_string(),
            sender_name: sender_name.to_string(),
            timestamp,
        }
    }

    /// Build a server-originated room announcement.
    pub fn system(room_id: RoomId, body: String, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            kind: MessageKind::System,
            body,
            sender_id: SYSTEM_SENDER_ID.to_string(),
            sender_name: SYSTEM_SENDER_NAME.to_string(),
            timestamp,
        }
    }

    /// Build a server-initiated notification push.
    pub fn notification(room_id: RoomId, body: String, timestamp: i64) -> Self {
        Self {
            id: Uuid::new_v4(),
            room_id,
            kind: MessageKind::Notification,
            body,
            sender_id: SYSTEM_SENDER_ID.to_string(),
            sender_name: SYSTEM_SENDER_NAME.to_string(),
            timestamp,
        }
    }
}
