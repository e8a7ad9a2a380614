//! Channel-backed Transport implementation.
//!
//! The WebSocket itself is created and split in the UI layer
//! (`src/ui/handler/websocket.rs`); this implementation receives each
//! connection's `UnboundedSender` and uses it for delivery, keeping socket
//! ownership and message delivery separated. Sends are non-blocking channel
//! pushes, so a slow consumer never stalls a broadcast.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use tokio::sync::{Mutex, mpsc};

use crate::domain::{ConnectionId, RoomId, Transport, TransportError};

/// Sender half of a connection's outbound channel
pub type PusherChannel = mpsc::UnboundedSender<String>;

/// In-process transport over per-connection mpsc channels.
pub struct ChannelTransport {
    /// Outbound sender for each open connection
    senders: Mutex<HashMap<ConnectionId, PusherChannel>>,
    /// Delivery groups, one per room
    groups: Mutex<HashMap<RoomId, HashSet<ConnectionId>>>,
}

impl ChannelTransport {
    pub fn new() -> Self {
        Self {
            senders: Mutex::new(HashMap::new()),
            groups: Mutex::new(HashMap::new()),
        }
    }

    /// Attach a newly opened connection's outbound channel.
    pub async fn open(&self, connection_id: ConnectionId, sender: PusherChannel) {
        let mut senders = self.senders.lock().await;
        senders.insert(connection_id, sender);
        tracing::debug!("Transport opened for connection '{}'", connection_id);
    }

    /// Detach a closed connection, removing it from every delivery group.
    pub async fn close(&self, connection_id: ConnectionId) {
        let mut senders = self.senders.lock().await;
        senders.remove(&connection_id);
        drop(senders);

        let mut groups = self.groups.lock().await;
        groups.retain(|_, members| {
            members.remove(&connection_id);
            !members.is_empty()
        });
        tracing::debug!("Transport closed for connection '{}'", connection_id);
    }
}

impl Default for ChannelTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for ChannelTransport {
    async fn send(&self, connection: ConnectionId, payload: &str) -> Result<(), TransportError> {
        let senders = self.senders.lock().await;
        let sender = senders
            .get(&connection)
            .ok_or(TransportError::ConnectionGone(connection))?;
        sender
            .send(payload.to_string())
            .map_err(|e| TransportError::SendFailed(connection, e.to_string()))
    }

    async fn subscribe(&self, connection: ConnectionId, room_id: &RoomId) {
        let mut groups = self.groups.lock().await;
        groups.entry(room_id.clone()).or_default().insert(connection);
    }

    async fn unsubscribe(&self, connection: ConnectionId, room_id: &RoomId) {
        let mut groups = self.groups.lock().await;
        if let Some(members) = groups.get_mut(room_id) {
            members.remove(&connection);
            if members.is_empty() {
                groups.remove(room_id);
            }
        }
    }
}
