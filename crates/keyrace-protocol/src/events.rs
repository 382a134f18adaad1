//! The event vocabulary that clients and the server exchange.
//!
//! Each event serializes as a singly tagged JSON object:
//!
//! ```json
//! { "type": "room:create", "name": "speed demons", "config": {...}, "playerName": "ada" }
//! ```
//!
//! The `type` strings and camelCase field names mirror the browser
//! client's socket contract, so they must not drift.

use serde::{Deserialize, Serialize};

use crate::{GameConfig, GameUpdate, Player, PlayerId, RoomId, RoomSummary};

// ---------------------------------------------------------------------------
// Client → Server
// ---------------------------------------------------------------------------

/// Events a client may send to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientEvent {
    /// Create a room and join it as the sole player.
    #[serde(rename = "room:create")]
    RoomCreate {
        name: String,
        config: GameConfig,
        player_name: String,
    },

    /// Join a specific waiting room.
    #[serde(rename = "room:join")]
    RoomJoin { room_id: RoomId, player_name: String },

    /// Leave the current room. Ignored if the caller is in no room.
    #[serde(rename = "room:leave")]
    RoomLeave,

    /// Request the current lobby listing.
    #[serde(rename = "room:list")]
    RoomList,

    /// Automatic placement into a compatible room, or a fresh one.
    #[serde(rename = "room:quickMatch")]
    RoomQuickMatch {
        config: GameConfig,
        player_name: String,
    },

    /// Toggle the caller's ready flag.
    #[serde(rename = "player:ready")]
    PlayerReady { is_ready: bool },

    /// One keystroke of race progress. Ignored unless the caller's
    /// room is `playing`.
    #[serde(rename = "game:input")]
    GameInput {
        #[serde(rename = "char")]
        character: char,
        is_correct: bool,
    },

    /// Reclaim a still-held player slot after a transport drop, using
    /// the session token issued in `room:joined`.
    #[serde(rename = "session:resume")]
    SessionResume { token: String },
}

// ---------------------------------------------------------------------------
// Server → Client
// ---------------------------------------------------------------------------

/// Events the server may send to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerEvent {
    /// Reply to a successful create/join/quick-match/resume. The
    /// `session_token` is the durable secret for [`ClientEvent::SessionResume`].
    #[serde(rename = "room:joined")]
    RoomJoined {
        room: RoomSummary,
        players: Vec<Player>,
        session_token: String,
    },

    /// Acknowledges an explicit leave.
    #[serde(rename = "room:left")]
    RoomLeft,

    /// The lobby listing: every waiting room, occupancy, and settings.
    #[serde(rename = "room:list")]
    RoomList { rooms: Vec<RoomSummary> },

    /// A new player entered the recipient's room.
    #[serde(rename = "player:joined")]
    PlayerJoined { player: Player },

    /// A player was removed from the recipient's room (explicit leave
    /// or grace-period eviction).
    #[serde(rename = "player:left")]
    PlayerLeft { player_id: PlayerId },

    /// A room member toggled their ready flag.
    #[serde(rename = "player:ready")]
    PlayerReady { player_id: PlayerId, is_ready: bool },

    /// A room member's transport dropped; their slot is held for the
    /// grace period.
    #[serde(rename = "player:disconnected")]
    PlayerDisconnected { player_id: PlayerId },

    /// A disconnected member reclaimed their slot.
    #[serde(rename = "player:reconnected")]
    PlayerReconnected { player_id: PlayerId },

    /// The race begins: the shared sequence and the wall-clock start
    /// in milliseconds since the Unix epoch.
    #[serde(rename = "game:start")]
    GameStart {
        char_sequence: Vec<char>,
        start_time: u64,
    },

    /// Per-player progress snapshot for everyone in the room.
    #[serde(rename = "game:update")]
    GameUpdate { updates: Vec<GameUpdate> },

    /// The duration timer fired: final standings and the race length.
    #[serde(rename = "game:end")]
    GameEnd { players: Vec<Player>, duration: u64 },

    /// A request could not be honored. Sent only to the offending
    /// connection, never broadcast.
    #[serde(rename = "error")]
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CaseMode, GameMode, RoomStatus};

    fn config() -> GameConfig {
        GameConfig {
            mode: GameMode::English,
            duration: 60,
            case_mode: CaseMode::Lowercase,
            active_rows: None,
            hand_mode: None,
        }
    }

    fn player(id: &str) -> Player {
        Player {
            id: PlayerId(id.into()),
            socket_id: "conn-1".into(),
            name: "ada".into(),
            avatar: None,
            score: 0,
            errors: 0,
            current_index: 0,
            is_ready: false,
            is_connected: true,
        }
    }

    // =====================================================================
    // ClientEvent tag + field shapes
    // =====================================================================

    #[test]
    fn test_room_create_json_format() {
        let ev = ClientEvent::RoomCreate {
            name: "speed demons".into(),
            config: config(),
            player_name: "ada".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "room:create");
        assert_eq!(json["name"], "speed demons");
        assert_eq!(json["playerName"], "ada");
        assert_eq!(json["config"]["mode"], "English");
    }

    #[test]
    fn test_room_join_json_format() {
        let ev = ClientEvent::RoomJoin {
            room_id: RoomId("A1B2C3D".into()),
            player_name: "bob".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "room:join");
        assert_eq!(json["roomId"], "A1B2C3D");
    }

    #[test]
    fn test_room_leave_has_no_payload_fields() {
        let json: serde_json::Value =
            serde_json::to_value(&ClientEvent::RoomLeave).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "room:leave" }));
    }

    #[test]
    fn test_quick_match_round_trip() {
        let ev = ClientEvent::RoomQuickMatch {
            config: config(),
            player_name: "ada".into(),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_game_input_uses_char_field_name() {
        // The wire field is "char" (a Rust keyword), mapped to `character`.
        let ev = ClientEvent::GameInput {
            character: 'q',
            is_correct: true,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "game:input");
        assert_eq!(json["char"], "q");
        assert_eq!(json["isCorrect"], true);
    }

    #[test]
    fn test_game_input_decodes_from_client_json() {
        let json = r#"{"type":"game:input","char":"x","isCorrect":false}"#;
        let ev: ClientEvent = serde_json::from_str(json).unwrap();
        assert_eq!(
            ev,
            ClientEvent::GameInput {
                character: 'x',
                is_correct: false,
            }
        );
    }

    #[test]
    fn test_session_resume_round_trip() {
        let ev = ClientEvent::SessionResume {
            token: "aabbccdd".into(),
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ClientEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_unknown_client_event_type_is_rejected() {
        let json = r#"{"type":"room:teleport","destination":"moon"}"#;
        let result: Result<ClientEvent, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    // =====================================================================
    // ServerEvent tag + field shapes
    // =====================================================================

    #[test]
    fn test_room_joined_json_format() {
        let ev = ServerEvent::RoomJoined {
            room: RoomSummary {
                id: RoomId("R1".into()),
                name: "speed demons".into(),
                player_count: 1,
                max_players: 4,
                status: RoomStatus::Waiting,
                game_config: config(),
            },
            players: vec![player("p_1")],
            session_token: "deadbeef".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "room:joined");
        assert_eq!(json["room"]["maxPlayers"], 4);
        assert_eq!(json["players"][0]["id"], "p_1");
        assert_eq!(json["sessionToken"], "deadbeef");
    }

    #[test]
    fn test_player_ready_json_format() {
        let ev = ServerEvent::PlayerReady {
            player_id: PlayerId("p_1".into()),
            is_ready: true,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "player:ready");
        assert_eq!(json["playerId"], "p_1");
        assert_eq!(json["isReady"], true);
    }

    #[test]
    fn test_game_start_serializes_chars_as_strings() {
        let ev = ServerEvent::GameStart {
            char_sequence: vec!['a', 'b'],
            start_time: 1_700_000_000_000,
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "game:start");
        assert_eq!(json["charSequence"], serde_json::json!(["a", "b"]));
        assert_eq!(json["startTime"], 1_700_000_000_000u64);
    }

    #[test]
    fn test_game_update_round_trip() {
        let ev = ServerEvent::GameUpdate {
            updates: vec![GameUpdate {
                player_id: PlayerId("p_1".into()),
                score: 3,
                errors: 1,
                current_index: 3,
            }],
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_game_end_round_trip() {
        let ev = ServerEvent::GameEnd {
            players: vec![player("p_1"), player("p_2")],
            duration: 60,
        };
        let bytes = serde_json::to_vec(&ev).unwrap();
        let decoded: ServerEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(ev, decoded);
    }

    #[test]
    fn test_error_event_json_format() {
        let ev = ServerEvent::Error {
            message: "room is full".into(),
        };
        let json: serde_json::Value = serde_json::to_value(&ev).unwrap();

        assert_eq!(json["type"], "error");
        assert_eq!(json["message"], "room is full");
    }
}
