//! Service layer: the messaging core components.
//!
//! Dependency order, leaves first: [`RoomDirectory`] and [`HistoryStore`]
//! stand alone; [`ConnectionRegistry`] is a leaf over session state;
//! [`Broadcaster`] composes registry, directory and transport; [`Notifier`]
//! composes registry and broadcaster; [`StatsService`] reads across all of
//! them. [`ChatService`] sequences the cross-component operations.

mod broadcaster;
mod chat;
mod directory;
mod history;
mod notifier;
mod registry;
mod stats;

pub use broadcaster::{Broadcaster, RoomMember};
pub use chat::ChatService;
pub use directory::RoomDirectory;
pub use history::HistoryStore;
pub use notifier::{NotificationTarget, Notifier};
pub use registry::ConnectionRegistry;
pub use stats::{StatsService, StatsSnapshot};
