//! Connection registry.
//!
//! Exclusively owns the connection-to-session mapping. This is a leaf
//! component: it never touches room metadata, history, or the transport, so
//! the transport-facing boundary is responsible for unsubscribing a
//! connection from its rooms before calling [`ConnectionRegistry::unregister`].

use std::collections::{HashMap, HashSet};

use tokio::sync::Mutex;

use crate::domain::{ConnectionId, RegistryError, RoomId, Session, UserId};

/// Registry of all live sessions, keyed by connection handle.
pub struct ConnectionRegistry {
    sessions: Mutex<HashMap<ConnectionId, Session>>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
        }
    }

    /// Create a session for a newly authenticated connection.
    ///
    /// Fails with [`RegistryError::DuplicateConnection`] if the handle is
    /// already registered.
    pub async fn register(
        &self,
        connection_id: ConnectionId,
        user_id: UserId,
        display_name: String,
        connected_at: i64,
    ) -> Result<Session, RegistryError> {
        let mut sessions = self.sessions.lock().await;
        if sessions.contains_key(&connection_id) {
            return Err(RegistryError::DuplicateConnection(connection_id));
        }

        let session = Session::new(connection_id, user_id, display_name, connected_at);
        sessions.insert(connection_id, session.clone());
        tracing::debug!("Session registered for connection '{}'", connection_id);
        Ok(session)
    }

    /// Look up the session for a connection, if any.
    pub async fn lookup(&self, connection_id: ConnectionId) -> Option<Session> {
        let sessions = self.sessions.lock().await;
        sessions.get(&connection_id).cloned()
    }

    /// Change a session's display name.
    pub async fn set_display_name(
        &self,
        connection_id: ConnectionId,
        display_name: String,
    ) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&connection_id)
            .ok_or(RegistryError::SessionNotFound(connection_id))?;
        session.display_name = display_name;
        Ok(())
    }

    /// Mark a session as externally verified. Idempotent.
    pub async fn set_verified_identity(
        &self,
        connection_id: ConnectionId,
        external_id: String,
    ) -> Result<(), RegistryError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&connection_id)
            .ok_or(RegistryError::SessionNotFound(connection_id))?;
        session.verified_identity = Some(external_id);
        Ok(())
    }

    /// Remove the session for a connection, returning it if it existed.
    ///
    /// The caller must have already unsubscribed the connection from every
    /// room it belonged to.
    pub async fn unregister(&self, connection_id: ConnectionId) -> Option<Session> {
        let mut sessions = self.sessions.lock().await;
        let removed = sessions.remove(&connection_id);
        if removed.is_some() {
            tracing::debug!("Session unregistered for connection '{}'", connection_id);
        }
        removed
    }

    /// All sessions belonging to a user. A user connected from two devices
    /// yields two sessions.
    ///
    /// O(active sessions) scan; connection counts are small for this
    /// single-process design.
    pub async fn sessions_for_user(&self, user_id: &UserId) -> Vec<Session> {
        let sessions = self.sessions.lock().await;
        sessions
            .values()
            .filter(|s| &s.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Add a room to a session's joined-room set.
    ///
    /// Returns `true` if the set changed, `false` if the room was already
    /// joined, so callers can keep subscribe idempotent.
    pub async fn join_room(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<bool, RegistryError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&connection_id)
            .ok_or(RegistryError::SessionNotFound(connection_id))?;
        Ok(session.rooms.insert(room_id.clone()))
    }

    /// Remove a room from a session's joined-room set.
    ///
    /// Returns `true` if the set changed.
    pub async fn leave_room(
        &self,
        connection_id: ConnectionId,
        room_id: &RoomId,
    ) -> Result<bool, RegistryError> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .get_mut(&connection_id)
            .ok_or(RegistryError::SessionNotFound(connection_id))?;
        Ok(session.rooms.remove(room_id))
    }

    /// All sessions whose joined-room set contains the given room, computed
    /// by scanning — membership has no second source of truth that could
    /// drift from this registry.
    pub async fn members_of(&self, room_id: &RoomId) -> Vec<Session> {
        let sessions = self.sessions.lock().await;
        sessions
            .values()
            .filter(|s| s.is_member_of(room_id))
            .cloned()
            .collect()
    }

    /// Number of active sessions (connections, not distinct users).
    pub async fn session_count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.len()
    }

    /// Number of distinct user identities with at least one session.
    pub async fn distinct_user_count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        let users: HashSet<&str> = sessions.values().map(|s| s.user_id.as_str()).collect();
        users.len()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
