//! HTTP control-surface wire format.
//!
//! Timestamps cross this boundary as RFC 3339 strings; everything internal
//! stays in UTC milliseconds.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{DEFAULT_READ_LIMIT, Message, MessageKind, Room};
use crate::service::RoomMember;
use tamariba_shared::time::millis_to_rfc3339;

/// Room summary for list and detail responses.
#[derive(Debug, Serialize)]
pub struct RoomDto {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
    pub created_at: String,
}

impl From<Room> for RoomDto {
    fn from(room: Room) -> Self {
        Self {
            id: room.id.as_str().to_string(),
            name: room.name,
            description: room.description,
            created_by: room.created_by.map(|u| u.as_str().to_string()),
            created_at: millis_to_rfc3339(room.created_at),
        }
    }
}

/// One member of a room.
#[derive(Debug, Serialize)]
pub struct RoomMemberDto {
    pub user_id: String,
    pub display_name: String,
}

impl From<RoomMember> for RoomMemberDto {
    fn from(member: RoomMember) -> Self {
        Self {
            user_id: member.user_id,
            display_name: member.display_name,
        }
    }
}

/// Response for the room-members endpoint.
#[derive(Debug, Serialize)]
pub struct RoomMembersDto {
    pub room: RoomDto,
    pub members: Vec<RoomMemberDto>,
}

/// One message in a history page.
#[derive(Debug, Serialize)]
pub struct MessageDto {
    pub id: String,
    pub room_id: String,
    pub kind: MessageKind,
    pub body: String,
    pub sender_id: String,
    pub sender_name: String,
    pub timestamp: String,
}

impl From<Message> for MessageDto {
    fn from(message: Message) -> Self {
        Self {
            id: message.id.to_string(),
            room_id: message.room_id.as_str().to_string(),
            kind: message.kind,
            body: message.body,
            sender_id: message.sender_id,
            sender_name: message.sender_name,
            timestamp: millis_to_rfc3339(message.timestamp),
        }
    }
}

/// Body for room creation.
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub created_by: Option<String>,
}

/// Query parameters for a history page.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_limit")]
    pub limit: usize,
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    DEFAULT_READ_LIMIT
}

/// Body for an online-status check.
#[derive(Debug, Deserialize)]
pub struct OnlineStatusRequest {
    pub user_ids: Vec<String>,
}

/// One online-status result.
#[derive(Debug, Serialize)]
pub struct OnlineStatusDto {
    pub user_id: String,
    pub is_online: bool,
}

/// Response for an online-status check.
#[derive(Debug, Serialize)]
pub struct OnlineStatusResponse {
    pub results: Vec<OnlineStatusDto>,
}

/// Body for an administrative notification push.
#[derive(Debug, Deserialize)]
pub struct NotificationRequest {
    pub target_type: String,
    pub target_id: String,
    pub event_name: String,
    #[serde(default)]
    pub payload: Value,
}

/// Echo of a pushed notification, with the delivery count.
#[derive(Debug, Serialize)]
pub struct NotificationResponse {
    pub target_type: String,
    pub target_id: String,
    pub event_name: String,
    pub payload: Value,
    pub delivered: usize,
}
