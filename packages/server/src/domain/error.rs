//! Error types for the messaging core.
//!
//! Every variant here is returned as an explicit result value to the caller
//! (connection handler or control surface), never raised as an uncaught
//! fault. Per-subscriber transport failures during a broadcast are recovered
//! locally by the broadcaster and do not appear here.

use thiserror::Error;

use super::ids::ConnectionId;

/// Connection registry failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("connection '{0}' is already registered")]
    DuplicateConnection(ConnectionId),
    #[error("no session registered for connection '{0}'")]
    SessionNotFound(ConnectionId),
}

/// Room directory failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DirectoryError {
    #[error("room '{0}' already exists")]
    RoomAlreadyExists(String),
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("room '{0}' is protected and cannot be deleted")]
    ProtectedRoom(String),
}

/// History store failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum HistoryError {
    #[error("no history for room '{0}'")]
    RoomNotFound(String),
}

/// Broadcaster failures (session/room resolution; individual subscriber
/// send failures are logged and skipped instead).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BroadcastError {
    #[error("no session registered for connection '{0}'")]
    SessionNotFound(ConnectionId),
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("failed to encode message: {0}")]
    Encode(String),
}

/// Notification emitter failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NotifyError {
    #[error("invalid notification target type '{0}', expected 'user' or 'room'")]
    InvalidTargetType(String),
    #[error("room '{0}' not found")]
    RoomNotFound(String),
    #[error("failed to encode notification: {0}")]
    Encode(String),
}
