//! Transport abstraction.
//!
//! The transport owns the physical sockets; the core only sees opaque
//! connection handles and these primitives. Sends are treated as
//! fire-and-forget by callers that fan out to many subscribers: a failure
//! for one connection is reported, not raised.

use async_trait::async_trait;
use thiserror::Error;

use super::ids::{ConnectionId, RoomId};

/// Failure to deliver a payload to one connection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("connection '{0}' has no live transport")]
    ConnectionGone(ConnectionId),
    #[error("send to connection '{0}' failed: {1}")]
    SendFailed(ConnectionId, String),
}

/// Send/subscribe/unsubscribe primitives exposed per connection.
///
/// Implemented by the WebSocket infrastructure in production and mocked in
/// unit tests.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    /// Deliver an already-serialized payload to one connection.
    async fn send(&self, connection: ConnectionId, payload: &str) -> Result<(), TransportError>;

    /// Add the connection to the room's delivery group.
    async fn subscribe(&self, connection: ConnectionId, room_id: &RoomId);

    /// Remove the connection from the room's delivery group.
    async fn unsubscribe(&self, connection: ConnectionId, room_id: &RoomId);
}
