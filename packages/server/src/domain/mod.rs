//! Domain model for the real-time messaging core.
//!
//! Value types, entities, the transport abstraction, and the error taxonomy.
//! Everything here is free of I/O; the service layer composes these types
//! behind per-collection locks.

mod error;
mod history;
mod ids;
mod message;
mod room;
mod session;
mod transport;

pub use error::{BroadcastError, DirectoryError, HistoryError, NotifyError, RegistryError};
pub use history::{DEFAULT_READ_LIMIT, HISTORY_CAPACITY, RoomHistory};
pub use ids::{ConnectionId, InvalidId, RoomId, UserId};
pub use message::{Message, MessageKind};
pub use room::Room;
pub use session::Session;
#[cfg(test)]
pub use transport::MockTransport;
pub use transport::{Transport, TransportError};
