//! WebSocket connection handlers.
//!
//! The identity provider is assumed to have authenticated the caller before
//! the upgrade; the query parameters carry the resulting stable user id.

use std::sync::Arc;

use axum::{
    extract::{
        Query, State,
        ws::{Message as WsMessage, WebSocket, WebSocketUpgrade},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures_util::{sink::SinkExt, stream::StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;

use crate::{
    domain::{ConnectionId, RoomId, Transport, UserId},
    infrastructure::dto::websocket::{
        ClientCommand, ConnectedFrame, ErrorFrame, FrameType, HistoryFrame, RoomInfo,
    },
    ui::state::AppState,
};

/// Query parameters for a WebSocket connection
#[derive(Debug, Deserialize)]
pub struct ConnectQuery {
    pub user_id: String,
    pub display_name: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
) -> Result<impl IntoResponse, StatusCode> {
    // A connection whose identity cannot be established never enters the
    // registry
    let user_id = match UserId::new(query.user_id.clone()) {
        Ok(id) => id,
        Err(e) => {
            tracing::warn!("Invalid user_id '{}': {}", query.user_id, e);
            return Err(StatusCode::BAD_REQUEST);
        }
    };
    let display_name = query.display_name.unwrap_or(query.user_id);

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id, display_name)))
}

/// Spawns a task that forwards messages from the rx channel to the WebSocket
/// sender. This is the only writer of the socket after the welcome frame.
fn pusher_loop(
    mut rx: mpsc::UnboundedReceiver<String>,
    mut sender: futures_util::stream::SplitSink<WebSocket, WsMessage>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if sender.send(WsMessage::Text(msg.into())).await.is_err() {
                break;
            }
        }
    })
}

async fn handle_socket(
    socket: WebSocket,
    state: Arc<AppState>,
    user_id: UserId,
    display_name: String,
) {
    // The connection handle is issued here, at the transport boundary
    let connection_id = ConnectionId::generate();
    let (tx, rx) = mpsc::unbounded_channel();
    state.transport.open(connection_id, tx).await;

    if let Err(e) = state
        .chat
        .connect(connection_id, user_id, display_name)
        .await
    {
        tracing::warn!("Rejecting connection '{}': {}", connection_id, e);
        state.transport.close(connection_id).await;
        return;
    }

    let (mut sender, mut receiver) = socket.split();

    // Welcome frame: connection handle plus the room list
    let rooms = state.chat.list_rooms().await;
    let welcome = ConnectedFrame {
        r#type: FrameType::Connected,
        connection_id,
        rooms: rooms
            .into_iter()
            .map(|r| RoomInfo {
                id: r.id.as_str().to_string(),
                name: r.name,
            })
            .collect(),
    };
    match serde_json::to_string(&welcome) {
        Ok(json) => {
            if sender.send(WsMessage::Text(json.into())).await.is_err() {
                tracing::warn!("Failed to send welcome frame to '{}'", connection_id);
                state.chat.disconnect(connection_id).await;
                state.transport.close(connection_id).await;
                return;
            }
        }
        Err(e) => {
            tracing::error!("Failed to encode welcome frame: {}", e);
        }
    }

    let mut send_task = pusher_loop(rx, sender);

    let recv_state = state.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(msg) = receiver.next().await {
            let msg = match msg {
                Ok(msg) => msg,
                Err(e) => {
                    tracing::warn!("WebSocket error on '{}': {}", connection_id, e);
                    break;
                }
            };

            match msg {
                WsMessage::Text(text) => {
                    handle_command(&recv_state, connection_id, &text).await;
                }
                WsMessage::Close(_) => {
                    tracing::info!("Connection '{}' requested close", connection_id);
                    break;
                }
                // Ping/pong is handled by the protocol layer
                _ => {}
            }
        }
    });

    // Whichever task finishes first — close, error, or timeout enforced by
    // the protocol layer — tears the other down
    tokio::select! {
        _ = &mut recv_task => send_task.abort(),
        _ = &mut send_task => recv_task.abort(),
    };

    // Disconnection deterministically unsubscribes from every joined room
    // and removes the session, then the transport channel
    state.chat.disconnect(connection_id).await;
    state.transport.close(connection_id).await;
}

/// Parse and dispatch one client command, reporting failures back over the
/// connection's own channel.
async fn handle_command(state: &Arc<AppState>, connection_id: ConnectionId, text: &str) {
    let command = match serde_json::from_str::<ClientCommand>(text) {
        Ok(command) => command,
        Err(e) => {
            tracing::warn!("Unparseable command from '{}': {}", connection_id, e);
            send_error(state, connection_id, format!("unrecognized command: {e}")).await;
            return;
        }
    };

    match command {
        ClientCommand::Join { room } => {
            let Some(room_id) = parse_room(state, connection_id, room).await else {
                return;
            };
            match state.chat.join(connection_id, &room_id).await {
                Ok(messages) => {
                    let frame = HistoryFrame {
                        r#type: FrameType::History,
                        room: room_id.as_str().to_string(),
                        messages,
                    };
                    match serde_json::to_string(&frame) {
                        Ok(json) => {
                            if let Err(e) = state.transport.send(connection_id, &json).await {
                                tracing::warn!("Failed to push history frame: {}", e);
                            }
                        }
                        Err(e) => tracing::error!("Failed to encode history frame: {}", e),
                    }
                }
                Err(e) => send_error(state, connection_id, e.to_string()).await,
            }
        }
        ClientCommand::Leave { room } => {
            let Some(room_id) = parse_room(state, connection_id, room).await else {
                return;
            };
            if let Err(e) = state.chat.leave(connection_id, &room_id).await {
                send_error(state, connection_id, e.to_string()).await;
            }
        }
        ClientCommand::Chat { room, body } => {
            let Some(room_id) = parse_room(state, connection_id, room).await else {
                return;
            };
            if let Err(e) = state.chat.send_message(connection_id, &room_id, body).await {
                send_error(state, connection_id, e.to_string()).await;
            }
        }
        ClientCommand::Rename { name } => {
            if let Err(e) = state.chat.rename(connection_id, name).await {
                send_error(state, connection_id, e.to_string()).await;
            }
        }
        ClientCommand::Verify { external_id } => {
            if let Err(e) = state.chat.verify_identity(connection_id, external_id).await {
                send_error(state, connection_id, e.to_string()).await;
            }
        }
    }
}

async fn parse_room(
    state: &Arc<AppState>,
    connection_id: ConnectionId,
    room: String,
) -> Option<RoomId> {
    match RoomId::new(room) {
        Ok(room_id) => Some(room_id),
        Err(e) => {
            send_error(state, connection_id, e.to_string()).await;
            None
        }
    }
}

async fn send_error(state: &Arc<AppState>, connection_id: ConnectionId, message: String) {
    let frame = ErrorFrame::new(message);
    match serde_json::to_string(&frame) {
        Ok(json) => {
            if let Err(e) = state.transport.send(connection_id, &json).await {
                tracing::debug!("Failed to push error frame to '{}': {}", connection_id, e);
            }
        }
        Err(e) => tracing::error!("Failed to encode error frame: {}", e),
    }
}
