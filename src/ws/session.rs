//! Per-connection session loop
//!
//! Attach to the room, then shuttle events both ways until the socket goes
//! away, then detach. The socket belongs to this task alone; the room only
//! holds the sending half of `outbound`. If the same player reconnects, the
//! room drops that sending half and this loop ends.

use axum::extract::ws::WebSocket;
use tokio::sync::mpsc;

use super::channel::{Connection, Inbound};
use crate::protocol::ClientFrame;
use crate::state::{ConnectionHandle, SharedRoom, OUTBOUND_QUEUE_CAPACITY};
use crate::types::{PlayerId, RoomId};

pub async fn run(socket: WebSocket, room: SharedRoom, room_id: RoomId, player_id: PlayerId) {
    let mut connection = Connection::new(socket);
    let (tx, mut outbound) = mpsc::channel(OUTBOUND_QUEUE_CAPACITY);
    let handle = ConnectionHandle::new(tx);
    let connection_id = handle.id();

    // Validation ran before the upgrade, but the room may have been evicted
    // since then
    let attached = room.lock().await.attach(player_id.clone(), handle);
    if let Err(e) = attached {
        tracing::warn!(
            "Dropping session for {} in room {}: {}",
            player_id,
            room_id,
            e
        );
        connection.close().await;
        return;
    }

    loop {
        tokio::select! {
            event = outbound.recv() => {
                let Some(event) = event else {
                    tracing::debug!("Connection for {} replaced by a newer one", player_id);
                    break;
                };
                if let Err(e) = connection.send_event(&event).await {
                    tracing::debug!("Send to {} failed: {}", player_id, e);
                    break;
                }
            }

            frame = connection.next_frame() => {
                match frame {
                    Inbound::Text(text) => {
                        tracing::debug!("Received frame from {}: {}", player_id, text);
                        match serde_json::from_str::<ClientFrame>(&text) {
                            Ok(guess) => room.lock().await.relay_guess(guess),
                            Err(e) => tracing::warn!(
                                "Ignoring malformed frame from {} in room {}: {}",
                                player_id,
                                room_id,
                                e
                            ),
                        }
                    }
                    Inbound::Ping(data) => {
                        if connection.pong(data).await.is_err() {
                            break;
                        }
                    }
                    Inbound::Ignored => {}
                    Inbound::Closed => break,
                }
            }
        }
    }

    room.lock().await.detach(&player_id, connection_id);
    connection.close().await;
    tracing::info!("Session closed for {} in room {}", player_id, room_id);
}
