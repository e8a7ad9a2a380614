//! Room entity.

use serde::Serialize;

use super::ids::{RoomId, UserId};

/// A named broadcast channel.
#[derive(Debug, Clone, Serialize)]
pub struct Room {
    /// Unique, stable identifier
    pub id: RoomId,
    /// Human-readable display name
    pub name: String,
    /// Optional description
    pub description: Option<String>,
    /// Creator identity; `None` for system-created rooms
    pub created_by: Option<UserId>,
    /// Unix timestamp when created (UTC, milliseconds)
    pub created_at: i64,
}

impl Room {
    pub fn new(
        id: RoomId,
        name: String,
        description: Option<String>,
        created_by: Option<UserId>,
        created_at: i64,
    ) -> Self {
        Self {
            id,
            name,
            description,
            created_by,
            created_at,
        }
    }
}
