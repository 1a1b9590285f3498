use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RoomError;

/// Opaque ID types for type safety
pub type RoomId = String;
pub type PlayerId = String;
pub type ConnectionId = ulid::Ulid;

/// Number of seats in every room
pub const ROOM_CAPACITY: usize = 2;

/// Kind of puzzle a room is built around
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChallengeCategory {
    Regex,
    Strings,
}

impl ChallengeCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChallengeCategory::Regex => "regex",
            ChallengeCategory::Strings => "strings",
        }
    }
}

impl fmt::Display for ChallengeCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChallengeCategory {
    type Err = RoomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regex" => Ok(ChallengeCategory::Regex),
            "strings" => Ok(ChallengeCategory::Strings),
            _ => Err(RoomError::InvalidCategory),
        }
    }
}

/// The puzzle pinned to a room at creation.
///
/// Serialized as the `data` of a QUESTION event:
/// `{"questionType":"regex","pattern":"..."}` or
/// `{"questionType":"strings","options":[...]}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "questionType", rename_all = "lowercase")]
pub enum Challenge {
    Regex { pattern: String },
    Strings { options: Vec<String> },
}

impl Challenge {
    pub fn category(&self) -> ChallengeCategory {
        match self {
            Challenge::Regex { .. } => ChallengeCategory::Regex,
            Challenge::Strings { .. } => ChallengeCategory::Strings,
        }
    }
}

/// Room occupancy as seen by connected players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RoomStatus {
    Waiting,
    Player2Connected,
}

/// A player's answer. Relayed to the room exactly as received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerGuess {
    #[serde(rename = "playerId", alias = "PlayerID")]
    pub player_id: String,
    #[serde(alias = "Guess")]
    pub guess: String,
    #[serde(rename = "type", alias = "Type")]
    pub kind: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing() {
        assert_eq!(
            "regex".parse::<ChallengeCategory>().unwrap(),
            ChallengeCategory::Regex
        );
        assert_eq!(
            "strings".parse::<ChallengeCategory>().unwrap(),
            ChallengeCategory::Strings
        );
        assert_eq!(
            "Regex".parse::<ChallengeCategory>().unwrap_err(),
            RoomError::InvalidCategory
        );
        assert!("".parse::<ChallengeCategory>().is_err());
    }

    #[test]
    fn test_challenge_wire_shape() {
        let regex = Challenge::Regex {
            pattern: r"\d{3}\w".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&regex).unwrap(),
            serde_json::json!({"questionType": "regex", "pattern": r"\d{3}\w"})
        );

        let strings = Challenge::Strings {
            options: vec!["aa".to_string(), "bb".to_string()],
        };
        assert_eq!(
            serde_json::to_value(&strings).unwrap(),
            serde_json::json!({"questionType": "strings", "options": ["aa", "bb"]})
        );
        assert_eq!(strings.category(), ChallengeCategory::Strings);
    }

    #[test]
    fn test_status_names() {
        assert_eq!(
            serde_json::to_string(&RoomStatus::Waiting).unwrap(),
            "\"WAITING\""
        );
        assert_eq!(
            serde_json::to_string(&RoomStatus::Player2Connected).unwrap(),
            "\"PLAYER2CONNECTED\""
        );
    }

    #[test]
    fn test_guess_accepts_legacy_field_names() {
        let guess: PlayerGuess =
            serde_json::from_str(r#"{"PlayerID":"p1","Guess":"a+","Type":"regex"}"#).unwrap();
        assert_eq!(guess.player_id, "p1");
        assert_eq!(guess.guess, "a+");
        assert_eq!(guess.kind, "regex");

        assert_eq!(
            serde_json::to_value(&guess).unwrap(),
            serde_json::json!({"playerId": "p1", "guess": "a+", "type": "regex"})
        );
    }
}
