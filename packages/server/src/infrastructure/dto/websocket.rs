//! WebSocket wire format.
//!
//! Client-to-server commands are tagged JSON objects. Server-to-client
//! traffic is either a serialized [`crate::domain::Message`] (chat, system
//! and notification deliveries, tagged by their `kind` field) or one of the
//! control frames below, tagged by `type`.

use serde::{Deserialize, Serialize};

use crate::domain::{ConnectionId, Message};

/// Commands a client may send over the socket.
#[derive(Debug, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ClientCommand {
    /// Subscribe to a room
    Join { room: String },
    /// Unsubscribe from a room
    Leave { room: String },
    /// Send a chat message to a room
    Chat { room: String, body: String },
    /// Change the display name
    Rename { name: String },
    /// Report a completed external identity verification
    Verify { external_id: String },
}

/// Discriminator for server-to-client control frames.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum FrameType {
    Connected,
    History,
    Error,
}

/// Room info included in the welcome frame.
#[derive(Debug, Serialize)]
pub struct RoomInfo {
    pub id: String,
    pub name: String,
}

/// First frame sent after a successful connect.
#[derive(Debug, Serialize)]
pub struct ConnectedFrame {
    pub r#type: FrameType,
    pub connection_id: ConnectionId,
    pub rooms: Vec<RoomInfo>,
}

/// Recent history pushed to a client right after it joins a room.
#[derive(Debug, Serialize)]
pub struct HistoryFrame {
    pub r#type: FrameType,
    pub room: String,
    pub messages: Vec<Message>,
}

/// Error report for a rejected command.
#[derive(Debug, Serialize)]
pub struct ErrorFrame {
    pub r#type: FrameType,
    pub message: String,
}

impl ErrorFrame {
    pub fn new(message: String) -> Self {
        Self {
            r#type: FrameType::Error,
            message,
        }
    }
}
