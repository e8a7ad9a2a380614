//! Read-only aggregate views for the control surface.

use std::sync::Arc;

use serde::Serialize;

use crate::service::{ConnectionRegistry, RoomDirectory};

/// Point-in-time aggregate counts.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Active connections (a user on two devices counts twice)
    pub connected_connections: usize,
    /// Distinct user identities with at least one session
    pub authenticated_users: usize,
    /// Total rooms, protected ones included
    pub room_count: usize,
}

/// Statistics façade over the registry and the room directory.
pub struct StatsService {
    registry: Arc<ConnectionRegistry>,
    directory: Arc<RoomDirectory>,
}

impl StatsService {
    pub fn new(registry: Arc<ConnectionRegistry>, directory: Arc<RoomDirectory>) -> Self {
        Self {
            registry,
            directory,
        }
    }

    pub async fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connected_connections: self.registry.session_count().await,
            authenticated_users: self.registry.distinct_user_count().await,
            room_count: self.directory.count().await,
        }
    }
}
