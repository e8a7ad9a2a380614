//! Server state shared by all request handlers.

use std::sync::Arc;

use crate::infrastructure::transport::ChannelTransport;
use crate::service::{Broadcaster, ChatService, Notifier, StatsService};

/// Shared application state.
///
/// Constructed once at startup and injected into every handler; there is no
/// ambient global.
pub struct AppState {
    /// Chat orchestration (connect/disconnect/join/leave/send/rename)
    pub chat: Arc<ChatService>,
    /// Room fan-out and membership queries
    pub broadcaster: Arc<Broadcaster>,
    /// Presence queries and notification pushes
    pub notifier: Arc<Notifier>,
    /// Read-only aggregate views
    pub stats: Arc<StatsService>,
    /// Concrete transport, used by the WebSocket handler to attach and
    /// detach connection channels
    pub transport: Arc<ChannelTransport>,
}
