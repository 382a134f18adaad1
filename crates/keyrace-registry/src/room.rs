//! The `Room` aggregate: one race instance and the players in it.
//!
//! A room exclusively owns its `Player` entries (composition — the
//! gateway only ever holds ids pointing back at them). All mutation
//! goes through [`crate::RoomRegistry`], which keeps every operation
//! atomic from the caller's perspective.

use keyrace_protocol::{GameConfig, Player, PlayerId, RoomId, RoomStatus, RoomSummary};

/// Fixed room capacity.
pub const MAX_PLAYERS: usize = 4;

/// The identity fields a new player arrives with; the registry fills
/// in zeroed stats and flags when it admits them.
#[derive(Debug, Clone)]
pub struct PlayerIdentity {
    pub id: PlayerId,
    /// Transport connection identifier at join time.
    pub socket_id: String,
    pub name: String,
    pub avatar: Option<String>,
}

impl PlayerIdentity {
    /// Materializes a full `Player` with default per-round state.
    pub(crate) fn into_player(self) -> Player {
        Player {
            id: self.id,
            socket_id: self.socket_id,
            name: self.name,
            avatar: self.avatar,
            score: 0,
            errors: 0,
            current_index: 0,
            is_ready: false,
            is_connected: true,
        }
    }
}

/// One race instance with fixed-capacity membership and shared content.
#[derive(Debug, Clone)]
pub struct Room {
    pub id: RoomId,
    pub name: String,
    /// Members in join order. Lookups are linear — capacity is 4.
    players: Vec<Player>,
    pub max_players: usize,
    pub status: RoomStatus,
    pub game_config: GameConfig,
    /// Empty until the first `playing` transition; frozen for the
    /// duration of a round once generated.
    pub char_sequence: Vec<char>,
    /// Wall-clock millis, set on each `playing` transition.
    pub start_time: Option<u64>,
    pub end_time: Option<u64>,
    pub created_at: u64,
    /// Incremented on every `playing` transition. Duration timers
    /// capture the round they were armed for, so a timer surviving
    /// into a later round can recognize itself as stale.
    pub round: u64,
}

impl Room {
    pub(crate) fn new(
        id: RoomId,
        name: String,
        game_config: GameConfig,
        creator: Player,
        created_at: u64,
    ) -> Self {
        Self {
            id,
            name,
            players: vec![creator],
            max_players: MAX_PLAYERS,
            status: RoomStatus::Waiting,
            game_config,
            char_sequence: Vec::new(),
            start_time: None,
            end_time: None,
            created_at,
            round: 0,
        }
    }

    /// Members in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| &p.id == player_id)
    }

    pub(crate) fn player_mut(&mut self, player_id: &PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| &p.id == player_id)
    }

    pub(crate) fn players_mut(&mut self) -> &mut Vec<Player> {
        &mut self.players
    }

    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= self.max_players
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// `true` only if the room has at least one player and every
    /// member's ready flag is set. An empty room is never "all ready".
    pub fn all_players_ready(&self) -> bool {
        !self.players.is_empty() && self.players.iter().all(|p| p.is_ready)
    }

    /// The lobby projection: occupancy and settings, never the char
    /// sequence or per-player stats.
    pub fn summary(&self) -> RoomSummary {
        RoomSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            player_count: self.players.len(),
            max_players: self.max_players,
            status: self.status,
            game_config: self.game_config.clone(),
        }
    }
}
