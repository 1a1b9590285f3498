//! Request errors and their HTTP mapping
//!
//! Every rejection a client can see carries one stable reason code in a
//! `{"error": "<code>"}` body.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

pub type RoomResult<T> = Result<T, RoomError>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    #[error("question type missing or not one of regex/strings")]
    InvalidCategory,

    #[error("room id and player id are both required")]
    MissingIds,

    #[error("room not found")]
    RoomNotFound,

    #[error("room already has two players")]
    RoomFull,

    #[error("player id already taken in this room")]
    PlayerIdTaken,

    #[error("player is not authorized for this room")]
    PlayerNotAuthorized,

    #[error("websocket upgrade failed: {0}")]
    UpgradeFailed(String),

    #[error("bad request: {0}")]
    BadRequest(String),
}

impl RoomError {
    /// Stable reason code sent to clients
    pub fn code(&self) -> &'static str {
        match self {
            RoomError::InvalidCategory => "InvalidOrMissingType",
            RoomError::MissingIds => "MissingIds",
            RoomError::RoomNotFound => "InvalidRoomId",
            RoomError::RoomFull => "RoomFull",
            RoomError::PlayerIdTaken => "PlayerIdTaken",
            RoomError::PlayerNotAuthorized => "PlayerNotAuthorized",
            RoomError::UpgradeFailed(_) => "UpgradeFailed",
            RoomError::BadRequest(_) => "BadRequest",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RoomError::InvalidCategory
            | RoomError::MissingIds
            | RoomError::UpgradeFailed(_)
            | RoomError::BadRequest(_) => StatusCode::BAD_REQUEST,
            RoomError::RoomNotFound => StatusCode::NOT_FOUND,
            RoomError::PlayerNotAuthorized => StatusCode::FORBIDDEN,
            RoomError::RoomFull | RoomError::PlayerIdTaken => StatusCode::CONFLICT,
        }
    }
}

impl IntoResponse for RoomError {
    fn into_response(self) -> Response {
        tracing::warn!("Request rejected: {} ({})", self.code(), self);
        (
            self.status_code(),
            Json(serde_json::json!({ "error": self.code() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reason_codes_are_stable() {
        assert_eq!(RoomError::InvalidCategory.code(), "InvalidOrMissingType");
        assert_eq!(RoomError::RoomNotFound.code(), "InvalidRoomId");
        assert_eq!(RoomError::RoomFull.code(), "RoomFull");
        assert_eq!(RoomError::MissingIds.code(), "MissingIds");
        assert_eq!(RoomError::PlayerNotAuthorized.code(), "PlayerNotAuthorized");
        assert_eq!(
            RoomError::UpgradeFailed("no upgrade header".into()).code(),
            "UpgradeFailed"
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(RoomError::RoomFull.status_code(), StatusCode::CONFLICT);
        assert_eq!(RoomError::RoomNotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            RoomError::PlayerNotAuthorized.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(RoomError::MissingIds.status_code(), StatusCode::BAD_REQUEST);
    }
}
