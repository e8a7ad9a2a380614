//! Identifier value types.
//!
//! `ConnectionId` is an opaque handle issued at the transport boundary; the
//! core only ever compares it for equality and never derives meaning from it.
//! `UserId` and `RoomId` are externally supplied strings validated on entry.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

/// Maximum length for user-supplied identifiers
const MAX_ID_LENGTH: usize = 64;

/// Validation error for user-supplied identifiers
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidId {
    #[error("identifier must not be empty")]
    Empty,
    #[error("identifier '{0}' exceeds {MAX_ID_LENGTH} characters")]
    TooLong(String),
}

/// Opaque handle for one live transport connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    /// Issue a fresh connection handle. Called at the transport boundary,
    /// never by the core.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Stable user identity issued by the external identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(String);

impl UserId {
    pub fn new(value: String) -> Result<Self, InvalidId> {
        validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique, stable room identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoomId(String);

impl RoomId {
    pub fn new(value: String) -> Result<Self, InvalidId> {
        validate(&value)?;
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

fn validate(value: &str) -> Result<(), InvalidId> {
    if value.is_empty() {
        return Err(InvalidId::Empty);
    }
    if value.chars().count() > MAX_ID_LENGTH {
        return Err(InvalidId::TooLong(value.to_string()));
    }
    Ok(())
}
