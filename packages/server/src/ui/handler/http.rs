//! HTTP control-surface endpoint handlers.

use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    domain::{DirectoryError, NotifyError, RoomId, UserId},
    infrastructure::dto::http::{
        CreateRoomRequest, HistoryQuery, MessageDto, NotificationRequest, NotificationResponse,
        OnlineStatusDto, OnlineStatusRequest, OnlineStatusResponse, RoomDto, RoomMemberDto,
        RoomMembersDto,
    },
    service::{NotificationTarget, StatsSnapshot},
    ui::state::AppState,
};

/// Health check endpoint
pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok"}))
}

/// Get aggregate counts
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsSnapshot> {
    Json(state.stats.snapshot().await)
}

/// Get list of rooms
pub async fn get_rooms(State(state): State<Arc<AppState>>) -> Json<Vec<RoomDto>> {
    let mut rooms = state.chat.list_rooms().await;
    // Stable ordering for clients; the directory itself guarantees none
    rooms.sort_by(|a, b| a.id.as_str().cmp(b.id.as_str()));
    Json(rooms.into_iter().map(RoomDto::from).collect())
}

/// Create an ad-hoc room
pub async fn create_room(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<RoomDto>), StatusCode> {
    let room_id = RoomId::new(request.id).map_err(|_| StatusCode::BAD_REQUEST)?;
    let created_by = match request.created_by {
        Some(value) => Some(UserId::new(value).map_err(|_| StatusCode::BAD_REQUEST)?),
        None => None,
    };

    match state
        .chat
        .create_room(room_id, request.name, request.description, created_by)
        .await
    {
        Ok(room) => Ok((StatusCode::CREATED, Json(RoomDto::from(room)))),
        Err(DirectoryError::RoomAlreadyExists(id)) => {
            tracing::warn!("Room '{}' already exists. Rejecting creation.", id);
            Err(StatusCode::CONFLICT)
        }
        Err(_) => Err(StatusCode::INTERNAL_SERVER_ERROR),
    }
}

/// Delete a non-protected room
pub async fn delete_room(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> StatusCode {
    let Ok(room_id) = RoomId::new(room_id) else {
        return StatusCode::BAD_REQUEST;
    };
    match state.chat.delete_room(&room_id).await {
        Ok(()) => StatusCode::NO_CONTENT,
        Err(DirectoryError::ProtectedRoom(id)) => {
            tracing::warn!("Refused to delete protected room '{}'", id);
            StatusCode::FORBIDDEN
        }
        Err(DirectoryError::RoomNotFound(_)) => StatusCode::NOT_FOUND,
        Err(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Get current members of a room
pub async fn get_room_members(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<RoomMembersDto>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let Some(room) = state.chat.get_room(&room_id).await else {
        return Err(StatusCode::NOT_FOUND);
    };
    let members = state
        .broadcaster
        .room_members(&room_id)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Ok(Json(RoomMembersDto {
        room: RoomDto::from(room),
        members: members.into_iter().map(RoomMemberDto::from).collect(),
    }))
}

/// Get a page of a room's message history
pub async fn get_room_messages(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MessageDto>>, StatusCode> {
    let room_id = RoomId::new(room_id).map_err(|_| StatusCode::BAD_REQUEST)?;

    let messages = state
        .chat
        .read_history(&room_id, query.limit, query.offset)
        .await
        .map_err(|_| StatusCode::NOT_FOUND)?;

    Ok(Json(messages.into_iter().map(MessageDto::from).collect()))
}

/// Check online status for a list of user ids
pub async fn check_online_status(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OnlineStatusRequest>,
) -> Json<OnlineStatusResponse> {
    let mut results = Vec::with_capacity(request.user_ids.len());
    for user_id in request.user_ids {
        // A malformed id can never be registered, so it is simply offline
        let is_online = match UserId::new(user_id.clone()) {
            Ok(parsed) => state.notifier.is_online(&parsed).await,
            Err(_) => false,
        };
        results.push(OnlineStatusDto { user_id, is_online });
    }
    Json(OnlineStatusResponse { results })
}

/// Push a server-initiated notification to a user or a room
pub async fn send_notification(
    State(state): State<Arc<AppState>>,
    Json(request): Json<NotificationRequest>,
) -> Result<Json<NotificationResponse>, StatusCode> {
    // Validate the discriminator before any resolution work
    let target: NotificationTarget = request.target_type.parse().map_err(|e: NotifyError| {
        tracing::warn!("Rejected notification: {}", e);
        StatusCode::BAD_REQUEST
    })?;

    let delivered = match target {
        NotificationTarget::User => {
            let user_id =
                UserId::new(request.target_id.clone()).map_err(|_| StatusCode::BAD_REQUEST)?;
            state
                .notifier
                .notify_user(&user_id, &request.event_name, &request.payload)
                .await
                .map_err(|_| StatusCode::INTERNAL_SERVER_ERROR)?
        }
        NotificationTarget::Room => {
            let room_id =
                RoomId::new(request.target_id.clone()).map_err(|_| StatusCode::BAD_REQUEST)?;
            state
                .notifier
                .notify_room(&room_id, &request.event_name, &request.payload)
                .await
                .map_err(|e| match e {
                    NotifyError::RoomNotFound(_) => StatusCode::NOT_FOUND,
                    _ => StatusCode::INTERNAL_SERVER_ERROR,
                })?
        }
    };

    Ok(Json(NotificationResponse {
        target_type: request.target_type,
        target_id: request.target_id,
        event_name: request.event_name,
        payload: request.payload,
        delivered,
    }))
}
