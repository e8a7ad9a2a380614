//! Server execution logic.

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::infrastructure::transport::ChannelTransport;
use crate::service::{Broadcaster, ChatService, Notifier, StatsService};

use super::{
    handler::{
        http::{
            check_online_status, create_room, delete_room, get_room_members, get_room_messages,
            get_rooms, get_stats, health_check, send_notification,
        },
        websocket::websocket_handler,
    },
    signal::shutdown_signal,
    state::AppState,
};

/// Real-time room messaging server.
///
/// Encapsulates the wired service graph and runs the axum application over
/// it.
pub struct Server {
    chat: Arc<ChatService>,
    broadcaster: Arc<Broadcaster>,
    notifier: Arc<Notifier>,
    stats: Arc<StatsService>,
    transport: Arc<ChannelTransport>,
}

impl Server {
    pub fn new(
        chat: Arc<ChatService>,
        broadcaster: Arc<Broadcaster>,
        notifier: Arc<Notifier>,
        stats: Arc<StatsService>,
        transport: Arc<ChannelTransport>,
    ) -> Self {
        Self {
            chat,
            broadcaster,
            notifier,
            stats,
            transport,
        }
    }

    /// Run the server until shutdown.
    ///
    /// # Arguments
    ///
    /// * `host` - The host address to bind to (e.g., "127.0.0.1")
    /// * `port` - The port number to bind to (e.g., 8080)
    ///
    /// # Errors
    ///
    /// Returns an error if the server fails to bind to the specified address
    /// or if there's an error during server execution.
    pub async fn run(self, host: String, port: u16) -> Result<(), Box<dyn std::error::Error>> {
        let app_state = Arc::new(AppState {
            chat: self.chat,
            broadcaster: self.broadcaster,
            notifier: self.notifier,
            stats: self.stats,
            transport: self.transport,
        });

        let app = Router::new()
            // WebSocket endpoint
            .route("/ws", get(websocket_handler))
            // HTTP control surface
            .route("/api/health", get(health_check))
            .route("/api/stats", get(get_stats))
            .route("/api/rooms", get(get_rooms).post(create_room))
            .route(
                "/api/rooms/{room_id}",
                axum::routing::delete(delete_room),
            )
            .route("/api/rooms/{room_id}/members", get(get_room_members))
            .route("/api/rooms/{room_id}/messages", get(get_room_messages))
            .route("/api/presence/check", post(check_online_status))
            .route("/api/notifications", post(send_notification))
            .layer(TraceLayer::new_for_http())
            .with_state(app_state);

        let bind_addr = format!("{}:{}", host, port);
        let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

        tracing::info!(
            "Room messaging server listening on {}",
            listener.local_addr()?
        );
        tracing::info!("Connect to: ws://{}/ws", bind_addr);
        tracing::info!("Press Ctrl+C to shutdown gracefully");

        axum::serve(listener, app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        tracing::info!("Server shutdown complete");

        Ok(())
    }
}
