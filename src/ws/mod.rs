pub mod channel;
pub mod session;

use axum::{
    extract::{
        ws::{rejection::WebSocketUpgradeRejection, WebSocketUpgrade},
        Query, State,
    },
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use crate::error::{RoomError, RoomResult};
use crate::protocol::SessionQuery;
use crate::state::RoomRegistry;

/// WebSocket upgrade handler.
///
/// The request is checked against the room before the upgrade is attempted,
/// so unknown rooms and unauthorized players never get a live connection.
pub async fn ws_handler(
    State(registry): State<Arc<RoomRegistry>>,
    Query(params): Query<SessionQuery>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> RoomResult<Response> {
    tracing::info!(
        "Session request: room={:?}, player={:?}",
        params.room_id,
        params.player_id
    );

    let (room_id, player_id) = params.ids().ok_or(RoomError::MissingIds)?;
    let room = registry
        .get_room(&room_id)
        .await
        .ok_or(RoomError::RoomNotFound)?;
    room.lock().await.check_joinable(&player_id)?;

    let ws = ws.map_err(|e| RoomError::UpgradeFailed(e.body_text()))?;

    let failed_room = room_id.clone();
    Ok(ws
        .on_failed_upgrade(move |e| {
            tracing::error!("WebSocket upgrade failed for room {}: {}", failed_room, e);
        })
        .on_upgrade(move |socket| session::run(socket, room, room_id, player_id))
        .into_response())
}
