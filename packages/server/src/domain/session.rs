//! Connection session entity.

use std::collections::HashSet;

use super::ids::{ConnectionId, RoomId, UserId};

/// One live transport connection bound to a user identity.
///
/// A session exists in the registry if and only if the underlying transport
/// connection is open; removal is atomic with transport teardown.
#[derive(Debug, Clone)]
pub struct Session {
    /// Handle of the underlying transport connection
    pub connection_id: ConnectionId,
    /// Stable, externally issued user identity
    pub user_id: UserId,
    /// Mutable display name
    pub display_name: String,
    /// Set once an external auth check succeeds; `None` until then
    pub verified_identity: Option<String>,
    /// Rooms this connection is currently subscribed to
    pub rooms: HashSet<RoomId>,
    /// Unix timestamp when connected (UTC, milliseconds)
    pub connected_at: i64,
}

impl Session {
    /// Create a new session with an empty joined-room set.
    pub fn new(
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: String,
        connected_at: i64,
    ) -> Self {
        Self {
            connection_id,
            user_id,
            display_name,
            verified_identity: None,
            rooms: HashSet::new(),
            connected_at,
        }
    }

    /// Whether this connection is subscribed to the given room.
    pub fn is_member_of(&self, room_id: &RoomId) -> bool {
        self.rooms.contains(room_id)
    }
}
