//! HTTP endpoints for room setup.
//!
//! Rooms are created and seats handed out over plain HTTP; the live part of a
//! game runs over `/connect_player` (see [`crate::ws`]).

use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

use crate::error::{RoomError, RoomResult};
use crate::protocol::{
    AddPlayerRequest, AddPlayerResponse, CreateRoomQuery, CreateRoomResponse, RoomSnapshot,
};
use crate::state::RoomRegistry;
use crate::types::ChallengeCategory;
use crate::ws;

/// All routes, without transport layers (CORS, tracing)
pub fn router(registry: Arc<RoomRegistry>) -> Router {
    Router::new()
        .route("/create_room", get(create_room))
        .route("/add_player", post(add_player))
        .route("/rooms/{room_id}", get(get_room))
        .route("/connect_player", get(ws::ws_handler))
        .with_state(registry)
}

/// Create a room for a question type.
///
/// GET /create_room?question_type=regex|strings
pub async fn create_room(
    State(registry): State<Arc<RoomRegistry>>,
    Query(query): Query<CreateRoomQuery>,
) -> RoomResult<Json<CreateRoomResponse>> {
    let category: ChallengeCategory = query
        .question_type
        .as_deref()
        .ok_or(RoomError::InvalidCategory)?
        .parse()?;

    let room_id = registry.create_room(category).await;
    Ok(Json(CreateRoomResponse { room_id }))
}

/// Reserve one of the room's two seats.
///
/// POST /add_player `{"roomId": "...", "playerId": "optional"}`
pub async fn add_player(
    State(registry): State<Arc<RoomRegistry>>,
    body: Result<Json<AddPlayerRequest>, JsonRejection>,
) -> RoomResult<Json<AddPlayerResponse>> {
    let Json(request) = body.map_err(|e| RoomError::BadRequest(e.body_text()))?;

    let player_id = registry
        .authorize_join(&request.room_id, request.player_id)
        .await?;
    Ok(Json(AddPlayerResponse { player_id }))
}

/// Current occupancy of a room.
///
/// GET /rooms/{room_id}
pub async fn get_room(
    State(registry): State<Arc<RoomRegistry>>,
    Path(room_id): Path<String>,
) -> RoomResult<Json<RoomSnapshot>> {
    registry.room_snapshot(&room_id).await.map(Json)
}
