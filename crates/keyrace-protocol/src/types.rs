//! Core wire types for Keyrace's protocol.
//!
//! Everything in this module travels on the wire between the browser
//! client and the race server, so the serde attributes here ARE the
//! contract: field names are camelCase and enum values are the exact
//! strings the client was written against.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A unique identifier for a player within one room membership.
///
/// Newtype over `String` — player ids are short random strings minted
/// per connection-session, not durable accounts. Wrapping them keeps a
/// `PlayerId` from being confused with a `RoomId` or a raw name.
///
/// `#[serde(transparent)]` serializes the id as a plain JSON string,
/// so `PlayerId("p_x1".into())` becomes just `"p_x1"` on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A unique identifier for a room (one race instance).
///
/// Short uppercase alphanumeric string, generated at room creation and
/// immutable afterwards. Same transparent-string encoding as [`PlayerId`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Game configuration
// ---------------------------------------------------------------------------

/// Which character set a race draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameMode {
    /// Latin letters, filtered by [`CaseMode`].
    English,
    /// Zhuyin (bopomofo) symbols. Case mode is ignored.
    Zhuyin,
}

/// Letter-case selection for English races.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaseMode {
    Lowercase,
    Uppercase,
    Mixed,
}

/// Hand restriction — a local display preference carried in the config
/// but deliberately excluded from matchmaking and server-side
/// sequence generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HandMode {
    All,
    Left,
    Right,
}

/// The settings a race is played under.
///
/// `mode`, `duration`, and `case_mode` are shared race parameters —
/// they shape the char sequence every player sees and form the
/// quick-match key. `active_rows` and `hand_mode` are per-player
/// keyboard preferences that ride along for the lobby display only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameConfig {
    pub mode: GameMode,
    /// Race length in seconds. Time is the sole terminal trigger.
    pub duration: u64,
    pub case_mode: CaseMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub active_rows: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hand_mode: Option<HandMode>,
}

impl GameConfig {
    /// Returns `true` if `other` is compatible for quick-match placement.
    ///
    /// Only the three shared race parameters participate; row/hand
    /// restrictions are local preferences and never split the pool.
    pub fn matches(&self, other: &GameConfig) -> bool {
        self.mode == other.mode
            && self.duration == other.duration
            && self.case_mode == other.case_mode
    }
}

// ---------------------------------------------------------------------------
// Room lifecycle
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// ```text
/// waiting ──(all ready)──→ playing ──(duration timer)──→ finished
///    ↑                                                       │
///    └───────────────── (all ready again) ───────────────────┘
/// ```
///
/// `finished` is terminal for a round, not for the room: clearing ready
/// flags lets players re-ready and loop straight back into `playing`
/// without a separate back-to-lobby state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomStatus {
    Waiting,
    Playing,
    Finished,
}

impl RoomStatus {
    /// Returns `true` if the room is accepting new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if a race is in progress.
    pub fn is_playing(&self) -> bool {
        matches!(self, Self::Playing)
    }
}

impl fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Playing => write!(f, "playing"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// One player's full in-room state.
///
/// Sent whole in `room:joined`, `player:joined`, and `game:end`.
/// `score`/`errors` only ever increase during a round; `current_index`
/// advances only on correct input, which keeps race positions monotonic
/// and directly comparable across players.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: PlayerId,
    /// Current transport connection identifier. Changes on reconnect.
    pub socket_id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    pub score: u32,
    pub errors: u32,
    /// Position in the shared char sequence this player has completed.
    pub current_index: usize,
    /// Only meaningful while the room is `waiting`.
    pub is_ready: bool,
    /// `false` while the player's socket is detached but the grace
    /// period has not yet evicted them.
    pub is_connected: bool,
}

/// A per-player progress snapshot, broadcast in `game:update`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameUpdate {
    pub player_id: PlayerId,
    pub score: u32,
    pub errors: u32,
    pub current_index: usize,
}

// ---------------------------------------------------------------------------
// RoomSummary — the lobby projection
// ---------------------------------------------------------------------------

/// What the lobby sees of a room.
///
/// Never includes the char sequence or per-player stats — the lobby
/// only needs occupancy and settings to decide whether to join.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSummary {
    pub id: RoomId,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
    pub status: RoomStatus,
    pub game_config: GameConfig,
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! The client was written against exact JSON shapes, so these tests
    //! pin the serde output: a rename drift here breaks the browser
    //! without any compile error on our side.

    use super::*;

    fn english_config() -> GameConfig {
        GameConfig {
            mode: GameMode::English,
            duration: 60,
            case_mode: CaseMode::Lowercase,
            active_rows: None,
            hand_mode: None,
        }
    }

    // =====================================================================
    // Identity types
    // =====================================================================

    #[test]
    fn test_player_id_serializes_as_plain_string() {
        let json = serde_json::to_string(&PlayerId("p_abc".into())).unwrap();
        assert_eq!(json, "\"p_abc\"");
    }

    #[test]
    fn test_room_id_deserializes_from_plain_string() {
        let rid: RoomId = serde_json::from_str("\"A1B2C3D\"").unwrap();
        assert_eq!(rid, RoomId("A1B2C3D".into()));
    }

    // =====================================================================
    // GameConfig
    // =====================================================================

    #[test]
    fn test_game_config_wire_field_names() {
        let config = GameConfig {
            hand_mode: Some(HandMode::Left),
            active_rows: Some(vec![1, 2]),
            ..english_config()
        };
        let json: serde_json::Value = serde_json::to_value(&config).unwrap();

        assert_eq!(json["mode"], "English");
        assert_eq!(json["duration"], 60);
        assert_eq!(json["caseMode"], "lowercase");
        assert_eq!(json["handMode"], "left");
        assert_eq!(json["activeRows"], serde_json::json!([1, 2]));
    }

    #[test]
    fn test_game_config_optional_fields_omitted_when_absent() {
        let json: serde_json::Value =
            serde_json::to_value(&english_config()).unwrap();
        assert!(json.get("activeRows").is_none());
        assert!(json.get("handMode").is_none());
    }

    #[test]
    fn test_game_config_deserializes_without_optional_fields() {
        let json = r#"{"mode":"Zhuyin","duration":30,"caseMode":"mixed"}"#;
        let config: GameConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.mode, GameMode::Zhuyin);
        assert_eq!(config.active_rows, None);
    }

    #[test]
    fn test_config_matches_ignores_hand_and_rows() {
        let base = english_config();
        let with_prefs = GameConfig {
            hand_mode: Some(HandMode::Right),
            active_rows: Some(vec![2, 3]),
            ..english_config()
        };
        assert!(base.matches(&with_prefs));
    }

    #[test]
    fn test_config_matches_rejects_different_duration() {
        let base = english_config();
        let longer = GameConfig {
            duration: 120,
            ..english_config()
        };
        assert!(!base.matches(&longer));
    }

    #[test]
    fn test_config_matches_rejects_different_case_mode() {
        let base = english_config();
        let upper = GameConfig {
            case_mode: CaseMode::Uppercase,
            ..english_config()
        };
        assert!(!base.matches(&upper));
    }

    // =====================================================================
    // RoomStatus
    // =====================================================================

    #[test]
    fn test_room_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&RoomStatus::Waiting).unwrap(),
            "\"waiting\""
        );
        assert_eq!(
            serde_json::to_string(&RoomStatus::Playing).unwrap(),
            "\"playing\""
        );
        assert_eq!(
            serde_json::to_string(&RoomStatus::Finished).unwrap(),
            "\"finished\""
        );
    }

    #[test]
    fn test_room_status_is_joinable_only_while_waiting() {
        assert!(RoomStatus::Waiting.is_joinable());
        assert!(!RoomStatus::Playing.is_joinable());
        assert!(!RoomStatus::Finished.is_joinable());
    }

    // =====================================================================
    // Player / RoomSummary
    // =====================================================================

    #[test]
    fn test_player_wire_field_names() {
        let player = Player {
            id: PlayerId("p_1".into()),
            socket_id: "conn-9".into(),
            name: "ada".into(),
            avatar: None,
            score: 5,
            errors: 2,
            current_index: 5,
            is_ready: false,
            is_connected: true,
        };
        let json: serde_json::Value = serde_json::to_value(&player).unwrap();

        assert_eq!(json["socketId"], "conn-9");
        assert_eq!(json["currentIndex"], 5);
        assert_eq!(json["isReady"], false);
        assert_eq!(json["isConnected"], true);
        assert!(json.get("avatar").is_none());
    }

    #[test]
    fn test_game_update_round_trip() {
        let update = GameUpdate {
            player_id: PlayerId("p_1".into()),
            score: 10,
            errors: 1,
            current_index: 10,
        };
        let bytes = serde_json::to_vec(&update).unwrap();
        let decoded: GameUpdate = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(update, decoded);
    }

    #[test]
    fn test_room_summary_wire_field_names() {
        let summary = RoomSummary {
            id: RoomId("R1".into()),
            name: "speed demons".into(),
            player_count: 2,
            max_players: 4,
            status: RoomStatus::Waiting,
            game_config: english_config(),
        };
        let json: serde_json::Value = serde_json::to_value(&summary).unwrap();

        assert_eq!(json["playerCount"], 2);
        assert_eq!(json["maxPlayers"], 4);
        assert_eq!(json["status"], "waiting");
    }
}
