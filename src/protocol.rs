use crate::types::*;
use serde::{Deserialize, Serialize};

/// Events pushed to players over a live session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "UPPERCASE")]
pub enum ServerEvent {
    Status { status: RoomStatus },
    Question(Challenge),
    PlayerGuess(PlayerGuess),
}

impl ServerEvent {
    pub fn status(status: RoomStatus) -> Self {
        ServerEvent::Status { status }
    }
}

/// Inbound frames are bare guesses, no envelope
pub type ClientFrame = PlayerGuess;

// ========== HTTP boundary ==========

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateRoomQuery {
    #[serde(alias = "questionType")]
    pub question_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: RoomId,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPlayerRequest {
    #[serde(alias = "RoomID")]
    pub room_id: RoomId,
    /// Optional caller-chosen id; minted when absent or blank
    #[serde(default, alias = "PlayerID")]
    pub player_id: Option<PlayerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddPlayerResponse {
    pub player_id: PlayerId,
}

/// Query string of the session upgrade route
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionQuery {
    #[serde(alias = "RoomID")]
    pub room_id: Option<String>,
    #[serde(alias = "PlayerID")]
    pub player_id: Option<String>,
}

impl SessionQuery {
    /// Both ids, trimmed, or `None` if either is missing or blank
    pub fn ids(&self) -> Option<(RoomId, PlayerId)> {
        let room_id = self.room_id.as_deref().map(str::trim).filter(|s| !s.is_empty())?;
        let player_id = self
            .player_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())?;
        Some((room_id.to_string(), player_id.to_string()))
    }
}

/// Read-only summary of a room
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub room_id: RoomId,
    pub question_type: ChallengeCategory,
    pub authorized_players: usize,
    pub connected_players: usize,
    pub status: Option<RoomStatus>,
    pub created_at: String,
}
